//! Type-safe config field path.

use owo_colors::OwoColorize;
use std::{borrow::Cow, fmt};

/// A dot-separated config field path, e.g. `build.assets_prefix`.
///
/// `#[derive(Config)]` generates a `FIELDS` constant per section so
/// diagnostics can name fields without string literals:
///
/// ```ignore
/// diag.error(CrawlConfig::FIELDS.timeout_secs, "must be at least 1");
/// ```
///
/// Route entries live in an array of tables, so their paths are built at
/// runtime with [`FieldPath::indexed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Path into an array-of-tables entry: `routes[2].title`.
    pub fn indexed(array: &str, index: usize, field: &str) -> Self {
        Self(Cow::Owned(format!("{array}[{index}].{field}")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
