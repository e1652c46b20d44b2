//! Display-string normalization.

/// Title-case a display string.
///
/// Every alphabetic character that follows a non-alphabetic one (or starts the
/// string) is upper-cased; all other alphabetic characters are lower-cased.
/// `"john o'neil"` becomes `"John O'Neil"`, `"BrandX"` becomes `"Brandx"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
