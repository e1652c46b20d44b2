//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values
/// (`Money`, ledger entries). Entities such as items and customers are
/// compared by identity instead.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
