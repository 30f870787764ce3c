//! Field paths used for per-leaf nonce derivation and domain separation.

use std::fmt;

/// Structural path of a leaf inside a document, filter or update tree.
///
/// Only object keys contribute. Array positions and `$`-prefixed operator
/// keys are transparent, so `{"tags": ["a"]}`, `{"tags": {"$in": ["a"]}}`
/// and `{"$and": [{"tags": "a"}]}` all place `"a"` at the path `tags`.
///
/// # Example
///
/// ```
/// use docvault::context::FieldPath;
///
/// let path = FieldPath::root().child("address").child("city");
/// assert_eq!(path.to_string(), "address.city");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Returns the empty path at the root of a tree.
    #[must_use]
    pub const fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Returns this path extended by one object key.
    ///
    /// Dotted keys (`"address.city"`, as used by `$set`) are split so they
    /// address the same leaf as the nested form.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(key.split('.').filter(|s| !s.is_empty()).map(str::to_string));
        Self { segments }
    }

    /// Returns `true` at the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = FieldPath::root().child("author").child("name");
        assert_eq!(path.to_string(), "author.name");
        assert_eq!(path.segments(), ["author", "name"]);
    }

    #[test]
    fn test_dotted_key_matches_nested_form() {
        let dotted = FieldPath::root().child("address.city");
        let nested = FieldPath::root().child("address").child("city");
        assert_eq!(dotted, nested);
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = FieldPath::root().child("a");
        let _ = parent.child("b");
        assert_eq!(parent.to_string(), "a");
    }
}
