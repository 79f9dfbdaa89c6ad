pub mod time;

pub use self::time::*;

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// `is_wildcard` reports whether a name in a rule matches anything,
/// i.e. it is left empty or set to `*`.
#[inline]
pub fn is_wildcard(s: &str) -> bool {
    s.is_empty() || s == "*"
}

/// ceiling division on non-zero divisors
#[inline]
pub(crate) fn div_ceil(x: u64, y: u64) -> u64 {
    (x + y - 1) / y
}
