use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled Chat";
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Learning,
    Interview,
    Mentorship,
    Explore,
    Roadmap,
}

impl ChatMode {
    pub const ALL: [ChatMode; 5] = [
        ChatMode::Learning,
        ChatMode::Interview,
        ChatMode::Mentorship,
        ChatMode::Explore,
        ChatMode::Roadmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Learning => "learning",
            ChatMode::Interview => "interview",
            ChatMode::Mentorship => "mentorship",
            ChatMode::Explore => "explore",
            ChatMode::Roadmap => "roadmap",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
}

impl MessageRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(MessageRole::User),
            "ai" => Some(MessageRole::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachedFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub files: Vec<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Fields derived from a session's messages. Always recomputed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub message_count: usize,
    pub preview: String,
    pub last_message: String,
}

impl MessageSummary {
    pub fn of(messages: &[ChatMessage]) -> Self {
        Self {
            message_count: messages.len(),
            preview: messages
                .first()
                .map(|m| m.text.chars().take(PREVIEW_CHARS).collect())
                .unwrap_or_default(),
            last_message: messages.last().map(|m| m.text.clone()).unwrap_or_default(),
        }
    }
}

/// A persisted chat session, without its document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub user_id: String,
    pub title: String,
    pub mode: ChatMode,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
    pub preview: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(
        user_id: String,
        title: Option<String>,
        mode: Option<ChatMode>,
        messages: Vec<ChatMessage>,
        now: String,
    ) -> Self {
        let summary = MessageSummary::of(&messages);
        Self {
            user_id,
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            mode: mode.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
            message_count: summary.message_count,
            preview: summary.preview,
            last_message: summary.last_message,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: MessageRole, text: &str) -> ChatMessage {
        ChatMessage {
            role,
            text: text.to_string(),
            translated_text: None,
            detected_language: None,
            files: vec![],
            timestamp: None,
        }
    }

    #[test]
    fn test_summary_of_empty_messages() {
        let s = MessageSummary::of(&[]);
        assert_eq!(s.message_count, 0);
        assert_eq!(s.preview, "");
        assert_eq!(s.last_message, "");
    }

    #[test]
    fn test_preview_truncates_first_message_to_100_chars() {
        let text = format!("Hello world, {}", "x".repeat(150));
        let s = MessageSummary::of(&[msg(MessageRole::User, &text)]);
        assert_eq!(s.message_count, 1);
        assert_eq!(s.preview, text.chars().take(100).collect::<String>());
        assert_eq!(s.preview.chars().count(), 100);
        assert_eq!(s.last_message, text);
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let text = "é".repeat(120);
        let s = MessageSummary::of(&[msg(MessageRole::User, &text)]);
        assert_eq!(s.preview.chars().count(), 100);
    }

    #[test]
    fn test_last_message_is_from_final_entry() {
        let s = MessageSummary::of(&[msg(MessageRole::User, "hi"), msg(MessageRole::Ai, "hello")]);
        assert_eq!(s.preview, "hi");
        assert_eq!(s.last_message, "hello");
    }

    #[test]
    fn test_new_session_defaults() {
        let session = ChatSession::new("u1".into(), None, None, vec![], "now".into());
        assert_eq!(session.title, DEFAULT_TITLE);
        assert_eq!(session.mode, ChatMode::Learning);
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_mode_round_trips_through_str() {
        for mode in ChatMode::ALL {
            assert_eq!(ChatMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(ChatMode::parse("LEARNING"), None);
    }
}
