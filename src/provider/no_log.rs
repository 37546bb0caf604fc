//! Keeping secret values out of logs.

use std::fmt;

/// Placeholder written over secret fields in redacted output.
pub const REDACTED_PLACEHOLDER: &str = "***";

/// A string wrapper that prevents the value from being logged.
///
/// `Display` and `Debug` render `[REDACTED]`; use [`expose`](Self::expose)
/// to reach the value when it must leave the process.
///
/// # Example
///
/// ```rust
/// use keydra_iam::provider::SensitiveString;
///
/// let secret = SensitiveString::new("wJalrXUtnFEMI");
/// assert_eq!(format!("{}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "wJalrXUtnFEMI");
/// ```
#[derive(Clone)]
pub struct SensitiveString {
    value: String,
}

impl SensitiveString {
    /// Create a new sensitive string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Expose the underlying value.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Consume and return the underlying value.
    pub fn into_inner(self) -> String {
        self.value
    }

    /// Check if the value is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED])")
    }
}

impl From<String> for SensitiveString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SensitiveString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq for SensitiveString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SensitiveString {}
