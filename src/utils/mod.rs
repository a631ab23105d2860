//! Shared helpers: subprocesses, HTML scanning, MIME types, paths.

pub mod exec;
pub mod html;
pub mod mime;
pub mod path;

/// Format a count with its noun: `1 route`, `3 routes`.
#[inline]
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::plural;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0, "route"), "0 routes");
        assert_eq!(plural(1, "route"), "1 route");
        assert_eq!(plural(4, "asset"), "4 assets");
    }
}
