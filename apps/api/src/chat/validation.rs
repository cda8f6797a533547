//! Request-body validation for chat sessions.
//!
//! Bodies are checked field by field and every failure is collected, so a
//! client sees all problems at once. Paths are dotted (`messages.0.role`).
//! Unknown keys are ignored.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::errors::FieldError;
use crate::models::chat::{AttachedFile, ChatMessage, ChatMode, MessageRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateChatSession {
    pub title: Option<String>,
    pub mode: Option<ChatMode>,
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateChatSession {
    pub title: Option<String>,
    pub mode: Option<ChatMode>,
    pub messages: Option<Vec<ChatMessage>>,
    /// Accepted for compatibility; summaries are always derived from messages.
    pub preview: Option<String>,
    pub last_message: Option<String>,
}

pub fn validate_create(body: &Value) -> Result<CreateChatSession, Vec<FieldError>> {
    let mut errors = Vec::new();
    let obj = as_object(body, "", &mut errors);

    let parsed = CreateChatSession {
        title: optional_string(obj, "title", "title", &mut errors),
        mode: optional_mode(obj, &mut errors),
        messages: optional_messages(obj, &mut errors),
    };

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

pub fn validate_update(body: &Value) -> Result<UpdateChatSession, Vec<FieldError>> {
    let mut errors = Vec::new();
    let obj = as_object(body, "", &mut errors);

    let parsed = UpdateChatSession {
        title: optional_string(obj, "title", "title", &mut errors),
        mode: optional_mode(obj, &mut errors),
        messages: optional_messages(obj, &mut errors),
        preview: optional_string(obj, "preview", "preview", &mut errors),
        last_message: optional_string(obj, "lastMessage", "lastMessage", &mut errors),
    };

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(path: &str, expected: &str, got: &Value) -> FieldError {
    FieldError::new(
        path,
        format!("Expected {expected}, received {}", type_name(got)),
    )
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        other => {
            errors.push(expected(path, "object", other));
            None
        }
    }
}

fn optional_string(
    obj: Option<&Map<String, Value>>,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj?.get(key)? {
        Value::String(s) => Some(s.clone()),
        other => {
            errors.push(expected(path, "string", other));
            None
        }
    }
}

/// Like `optional_string` but also accepts an explicit `null`.
fn nullable_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(expected(path, "string", other));
            None
        }
    }
}

fn optional_mode(obj: Option<&Map<String, Value>>, errors: &mut Vec<FieldError>) -> Option<ChatMode> {
    let raw = optional_string(obj, "mode", "mode", errors)?;
    match ChatMode::parse(&raw) {
        Some(mode) => Some(mode),
        None => {
            let allowed = ChatMode::ALL
                .iter()
                .map(|m| format!("'{}'", m.as_str()))
                .collect::<Vec<_>>()
                .join(" | ");
            errors.push(FieldError::new(
                "mode",
                format!("Invalid enum value. Expected {allowed}, received '{raw}'"),
            ));
            None
        }
    }
}

fn optional_messages(
    obj: Option<&Map<String, Value>>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<ChatMessage>> {
    let value = obj?.get("messages")?;
    let Value::Array(items) = value else {
        errors.push(expected("messages", "array", value));
        return None;
    };

    let before = errors.len();
    let messages: Vec<ChatMessage> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| parse_message(item, &format!("messages.{i}"), errors))
        .collect();

    (errors.len() == before).then_some(messages)
}

fn parse_message(value: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<ChatMessage> {
    let obj = as_object(value, path, errors)?;
    let before = errors.len();

    let role = match obj.get("role") {
        Some(Value::String(raw)) => MessageRole::parse(raw).or_else(|| {
            errors.push(FieldError::new(
                join(path, "role"),
                format!("Invalid enum value. Expected 'user' | 'ai', received '{raw}'"),
            ));
            None
        }),
        Some(other) => {
            errors.push(expected(&join(path, "role"), "string", other));
            None
        }
        None => {
            errors.push(FieldError::new(join(path, "role"), "Required"));
            None
        }
    };

    let text = match obj.get("text") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(expected(&join(path, "text"), "string", other));
            None
        }
        None => {
            errors.push(FieldError::new(join(path, "text"), "Required"));
            None
        }
    };

    let translated_text = nullable_string(obj, "translatedText", &join(path, "translatedText"), errors);
    let detected_language =
        nullable_string(obj, "detectedLanguage", &join(path, "detectedLanguage"), errors);
    let files = parse_files(obj.get("files"), &join(path, "files"), errors);

    let timestamp = optional_string(Some(obj), "timestamp", &join(path, "timestamp"), errors);
    if let Some(ts) = &timestamp {
        if DateTime::parse_from_rfc3339(ts).is_err() {
            errors.push(FieldError::new(join(path, "timestamp"), "Invalid datetime"));
        }
    }

    if errors.len() != before {
        return None;
    }

    Some(ChatMessage {
        role: role?,
        text: text?,
        translated_text,
        detected_language,
        files,
        timestamp,
    })
}

fn parse_files(value: Option<&Value>, path: &str, errors: &mut Vec<FieldError>) -> Vec<AttachedFile> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        errors.push(expected(path, "array", value));
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let item_path = format!("{path}.{i}");
            let obj = as_object(item, &item_path, errors)?;
            Some(AttachedFile {
                name: optional_string(Some(obj), "name", &join(&item_path, "name"), errors),
                url: optional_string(Some(obj), "url", &join(&item_path, "url"), errors),
                file_type: optional_string(Some(obj), "type", &join(&item_path, "type"), errors),
            })
        })
        .collect()
}
