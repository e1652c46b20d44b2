//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a stock-keeping unit.
///
/// Allocated by an [`IdAllocator`]; never reused within one inventory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| DomainError::invalid_argument(format!("ItemId: {e}")))
    }
}

/// Identifier of a customer.
///
/// An opaque, stable handle. The email address is the identity key; the id is
/// derived from it so the same email always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

/// Namespace for email-derived customer ids.
const CUSTOMER_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_2f0a_93d4_4b7e_a1f5_0c8d_3e52_9b71);

/// Hex digits of the email digest kept in the id.
const DIGEST_LEN: usize = 12;

impl CustomerId {
    /// Derive `{local-part}_{digest}` from an email address.
    pub fn from_email(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or_default();
        let digest = Uuid::new_v5(&CUSTOMER_NAMESPACE, email.as_bytes())
            .simple()
            .to_string();
        let short: String = digest.chars().take(DIGEST_LEN).collect();
        Self(format!("{local}_{short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CustomerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_argument("CustomerId: empty"));
        }
        Ok(Self(s.to_string()))
    }
}

/// Monotonic item id allocator.
///
/// Owned by the inventory aggregate and advanced under the same mutation scope
/// as item insertion. `u64::MAX` is never handed out so the cursor can always
/// move past an observed id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next inserted item will get, or `None` once the id space is
    /// used up.
    pub fn peek(&self) -> Option<ItemId> {
        (self.next < u64::MAX).then_some(ItemId(self.next))
    }

    /// Whether `id` can be stored without stalling the cursor.
    pub fn accepts(&self, id: ItemId) -> bool {
        id.0 < u64::MAX
    }

    /// Make sure `id` is never handed out again.
    pub fn observe(&mut self, id: ItemId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}
