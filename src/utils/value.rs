use serde_json::Value;

/// Flatten a JSON scalar into the string form used for opaque identifiers.
/// Control characters are stripped so the result is safe to persist and log.
pub fn value_to_string(value: Value) -> String {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    raw.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(value_to_string(json!("u-1")), "u-1");
        assert_eq!(value_to_string(json!(42)), "42");
        assert_eq!(value_to_string(json!(true)), "true");
        assert_eq!(value_to_string(Value::Null), "");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(value_to_string(json!("ab\ncd\t")), "abcd");
    }
}
