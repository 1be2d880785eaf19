//! Typed access to planned resource attributes
//!
//! `before`/`after` values in a plan are arbitrary JSON. Pricing rules only
//! need a handful of scalar fields, read with a default when the key is
//! missing or holds something unexpected. None of these accessors fail.

use serde_json::{Map, Value};

/// Attribute map of a planned resource
pub type Attributes = Map<String, Value>;

pub trait AttributeExt {
    /// String attribute, or `default` when missing or not a string
    fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str;

    /// Numeric attribute, or `default` when missing or not a number
    ///
    /// Integers and floats are both accepted.
    fn get_f64(&self, key: &str, default: f64) -> f64;
}

impl AttributeExt for Attributes {
    fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_str() {
        let a = attrs(json!({"instance_type": "m5.large", "count": 3, "tags": null}));
        assert_eq!(a.get_str("instance_type", "t3.micro"), "m5.large");
        assert_eq!(a.get_str("missing", "t3.micro"), "t3.micro");
        assert_eq!(a.get_str("count", "dflt"), "dflt");
        assert_eq!(a.get_str("tags", "dflt"), "dflt");
    }

    #[test]
    fn test_get_str_keeps_empty_string() {
        let a = attrs(json!({"size": ""}));
        assert_eq!(a.get_str("size", "Standard_B1s"), "");
    }

    #[test]
    fn test_get_f64_accepts_ints_and_floats() {
        let a = attrs(json!({"size": 100, "ratio": 0.5, "neg": -3, "big": 18446744073709551615u64}));
        assert_eq!(a.get_f64("size", 8.0), 100.0);
        assert_eq!(a.get_f64("ratio", 1.0), 0.5);
        assert_eq!(a.get_f64("neg", 1.0), -3.0);
        assert!(a.get_f64("big", 1.0) > 1.0e19);
    }

    #[test]
    fn test_get_f64_defaults_on_unexpected_shape() {
        let a = attrs(json!({"size": "100", "flag": true, "list": [1, 2], "nothing": null}));
        assert_eq!(a.get_f64("size", 8.0), 8.0);
        assert_eq!(a.get_f64("flag", 8.0), 8.0);
        assert_eq!(a.get_f64("list", 8.0), 8.0);
        assert_eq!(a.get_f64("nothing", 8.0), 8.0);
        assert_eq!(a.get_f64("absent", 8.0), 8.0);
    }
}
