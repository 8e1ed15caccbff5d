//! Dotted unit names
//!
//! A unit name is a non-empty sequence of identifiers separated by `.`,
//! e.g. `example.Sub`. Identifiers may contain ASCII letters, digits, `_` and
//! `$`, and must not start with a digit.

/// File extension of unit binaries on a search path
pub const UNIT_EXTENSION: &str = "unit";

/// Field type keywords that never name a loadable unit
const PRIMITIVE_TYPES: &[&str] = &["bool", "i8", "i16", "i32", "i64", "f32", "f64", "char"];

/// Check whether `name` is a well-formed dotted unit name
pub fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Check whether a field type names a primitive rather than a unit
pub fn is_primitive_type(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

/// Map a unit name to its resource path: `example.Sub` → `example/Sub.unit`
pub fn resource_path(name: &str) -> String {
    format!("{}.{}", name.replace('.', "/"), UNIT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_unit_name("Foo"));
        assert!(is_valid_unit_name("example.Sub"));
        assert!(is_valid_unit_name("com.ikatas.Outer$Inner"));
        assert!(is_valid_unit_name("_private.v2"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_unit_name(""));
        assert!(!is_valid_unit_name("example."));
        assert!(!is_valid_unit_name(".example"));
        assert!(!is_valid_unit_name("example..Sub"));
        assert!(!is_valid_unit_name("example.2nd"));
        assert!(!is_valid_unit_name("example/Sub"));
        assert!(!is_valid_unit_name("example.Sub-1"));
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("Foo"), "Foo.unit");
        assert_eq!(resource_path("example.Sub"), "example/Sub.unit");
        assert_eq!(resource_path("a.b.c.D"), "a/b/c/D.unit");
    }

    #[test]
    fn test_primitive_types() {
        assert!(is_primitive_type("i32"));
        assert!(is_primitive_type("bool"));
        assert!(!is_primitive_type("example.Sub"));
        assert!(!is_primitive_type("I32"));
    }
}
