//! Key Module
//!
//! Builds effective store keys from namespace segments and a base key.

use std::borrow::Cow;

// == Namespaced Key ==
/// Joins namespace segments and a base key with `separator`.
///
/// The base key is always the last segment. With no segments the base key is
/// returned untouched. Separators inside segments or the key are not escaped,
/// so `["a:b"] + "c"` and `["a", "b"] + "c"` produce the same key.
pub fn namespaced_key<'a>(separator: &str, key: &'a str, namespace: &[&str]) -> Cow<'a, str> {
    if namespace.is_empty() {
        return Cow::Borrowed(key);
    }

    let mut joined = namespace.join(separator);
    joined.push_str(separator);
    joined.push_str(key);
    Cow::Owned(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_namespace_returns_key() {
        let key = namespaced_key(":", "string_key", &[]);
        assert!(matches!(key, Cow::Borrowed("string_key")));
    }

    #[test]
    fn test_single_namespace() {
        assert_eq!(
            namespaced_key(":", "string_key", &["SECRET-NAMESPACE"]),
            "SECRET-NAMESPACE:string_key"
        );
    }

    #[test]
    fn test_nested_namespaces_keep_order() {
        assert_eq!(
            namespaced_key(":", "42", &["app", "users", "profile"]),
            "app:users:profile:42"
        );
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(namespaced_key("::", "k", &["a", "b"]), "a::b::k");
    }

    #[test]
    fn test_pattern_is_namespaced_like_a_key() {
        assert_eq!(namespaced_key(":", "*", &["sessions"]), "sessions:*");
    }

    #[test]
    fn test_separator_in_key_is_not_escaped() {
        assert_eq!(
            namespaced_key(":", "b:c", &["a"]),
            namespaced_key(":", "c", &["a", "b"])
        );
    }
}
