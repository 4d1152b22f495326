//! Core message types for MAiKO conversations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Image formats accepted as chat attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMediaType {
    Png,
    Jpeg,
}

impl ImageMediaType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub media_type: ImageMediaType,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(media_type: ImageMediaType, data: Vec<u8>) -> Self {
        Self { media_type, data }
    }
}

/// A single role-tagged turn.
///
/// Only `role` and `content` are persisted; attachments live for the
/// duration of one provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub attachment: Option<ImageAttachment>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_attachment(mut self, attachment: ImageAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

impl PartialEq for ChatMessage {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_role_content_only() {
        let msg = ChatMessage::user("hello").with_attachment(ImageAttachment::new(
            ImageMediaType::Png,
            vec![0x89, 0x50],
        ));
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_deserialize_transcript() {
        let json = r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hey"}]"#;
        let messages: Vec<ChatMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1], ChatMessage::assistant("hey"));
        assert!(messages[1].attachment.is_none());
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(ImageMediaType::from_extension("PNG"), Some(ImageMediaType::Png));
        assert_eq!(ImageMediaType::from_extension("jpg"), Some(ImageMediaType::Jpeg));
        assert_eq!(ImageMediaType::from_extension("jpeg"), Some(ImageMediaType::Jpeg));
        assert_eq!(ImageMediaType::from_extension("gif"), None);
        assert_eq!(ImageMediaType::Jpeg.mime_type(), "image/jpeg");
    }
}
