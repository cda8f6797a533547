use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form user profile handed to agents. Known fields are read through
/// `text`; everything else is forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Map<String, Value>);

impl UserProfile {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| is_truthy(v))
    }

    /// Renders a field as prompt text. Arrays are joined with ", ";
    /// absent, null or empty values yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(render)
    }

    pub fn has_location(&self) -> bool {
        self.get("location").is_some()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// JSON truthiness: null, false, 0, and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_joins_arrays() {
        let p = profile(json!({"skills": ["Rust", "SQL"]}));
        assert_eq!(p.text("skills").as_deref(), Some("Rust, SQL"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let p = profile(json!({"role": "", "experience": null}));
        assert_eq!(p.text("role"), None);
        assert_eq!(p.text("experience"), None);
        assert_eq!(p.text("missing"), None);
    }

    #[test]
    fn test_has_location() {
        assert!(profile(json!({"location": "Pune"})).has_location());
        assert!(!profile(json!({"location": ""})).has_location());
        assert!(!profile(json!({"role": "dev"})).has_location());
    }
}
