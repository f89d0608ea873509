use crate::flatten::types::NumericListPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Decimal digits with an optional sign and surrounding whitespace
static INTEGER_TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?\d+\s*$").unwrap()
});

/// Turns a resolved value into a single CSV cell
#[derive(Debug, Clone)]
pub struct ValueCoercer {
    delimiter: String,
    numeric_lists: NumericListPolicy,
}

impl ValueCoercer {
    pub fn new(delimiter: impl Into<String>, numeric_lists: NumericListPolicy) -> Self {
        ValueCoercer {
            delimiter: delimiter.into(),
            numeric_lists,
        }
    }

    /// Render a resolved value as text.
    ///
    /// Absent and `null` become an empty cell. Sequences are packed into one
    /// cell with the delimiter token; objects are written as compact JSON.
    pub fn coerce(&self, value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::Array(items)) => self.coerce_sequence(items),
            Some(obj @ Value::Object(_)) => compact_json(obj),
            Some(scalar) => scalar_text(scalar),
        }
    }

    fn coerce_sequence(&self, items: &[Value]) -> String {
        if self.numeric_lists == NumericListPolicy::PassThrough
            && !items.is_empty()
            && items.iter().all(is_integer_like)
        {
            return compact_json(items);
        }

        items
            .iter()
            .map(element_text)
            .collect::<Vec<_>>()
            .join(self.delimiter.as_str())
    }
}

/// Text of one sequence element.
fn element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => compact_json(value),
        scalar => scalar_text(scalar),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => compact_json(other),
    }
}

/// Compact JSON rendering; degrades to an empty cell if serialization fails.
fn compact_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "value not representable as text, writing empty cell");
            String::new()
        }
    }
}

/// Numbers, booleans and integer-looking strings all count as numeric.
fn is_integer_like(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Bool(_) => true,
        Value::String(s) => INTEGER_TEXT_REGEX.is_match(s),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::types::DEFAULT_DELIMITER;
    use serde_json::json;

    fn joiner() -> ValueCoercer {
        ValueCoercer::new(DEFAULT_DELIMITER, NumericListPolicy::Join)
    }

    #[test]
    fn test_absent_and_null_are_empty() {
        assert_eq!(joiner().coerce(None), "");
        assert_eq!(joiner().coerce(Some(&Value::Null)), "");
    }

    #[test]
    fn test_scalars_use_canonical_text() {
        let c = joiner();
        assert_eq!(c.coerce(Some(&json!("Phoenix, AZ"))), "Phoenix, AZ");
        assert_eq!(c.coerce(Some(&json!(42))), "42");
        assert_eq!(c.coerce(Some(&json!(3.5))), "3.5");
        assert_eq!(c.coerce(Some(&json!(true))), "true");
    }

    #[test]
    fn test_string_sequence_is_joined() {
        let tags = json!(["x", "y", "z"]);
        assert_eq!(joiner().coerce(Some(&tags)), "x<+#+>y<+#+>z");
    }

    #[test]
    fn test_numeric_sequence_joined_by_default() {
        let nums = json!([1, 2, 3]);
        assert_eq!(joiner().coerce(Some(&nums)), "1<+#+>2<+#+>3");
    }

    #[test]
    fn test_numeric_sequence_pass_through() {
        let c = ValueCoercer::new(DEFAULT_DELIMITER, NumericListPolicy::PassThrough);

        assert_eq!(c.coerce(Some(&json!([1, 2, 3]))), "[1,2,3]");
        assert_eq!(c.coerce(Some(&json!(["10", " -2 "]))), r#"["10"," -2 "]"#);
        // One non-numeric element switches back to joining
        assert_eq!(c.coerce(Some(&json!([1, "two"]))), "1<+#+>two");
        assert_eq!(c.coerce(Some(&json!([]))), "");
    }

    #[test]
    fn test_mixed_sequence_elements() {
        let mixed = json!(["a", null, 7, {"k": "v"}, [1, 2]]);
        assert_eq!(
            joiner().coerce(Some(&mixed)),
            r#"a<+#+><+#+>7<+#+>{"k":"v"}<+#+>[1,2]"#
        );
    }

    #[test]
    fn test_mapping_renders_as_json() {
        let obj = json!({"b": 1, "a": [true]});
        assert_eq!(joiner().coerce(Some(&obj)), r#"{"b":1,"a":[true]}"#);
    }

    #[test]
    fn test_integer_like_detection() {
        assert!(is_integer_like(&json!(7)));
        assert!(is_integer_like(&json!(2.5)));
        assert!(is_integer_like(&json!(false)));
        assert!(is_integer_like(&json!("+12")));
        assert!(!is_integer_like(&json!("12a")));
        assert!(!is_integer_like(&json!(null)));
        assert!(!is_integer_like(&json!([1])));
    }
}
