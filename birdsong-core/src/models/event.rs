use serde::{Deserialize, Serialize};

/// The two fields read from an upstream status object; everything else is ignored
#[derive(Debug, Clone, Deserialize)]
pub struct InboundStatus {
    #[serde(default)]
    pub user: Option<StatusAuthor>,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusAuthor {
    #[serde(default)]
    pub screen_name: Option<String>,
}

/// A status reduced to what viewers render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetEvent {
    /// Author screen name, empty when the status carried none
    #[serde(rename = "user")]
    pub author: String,
    pub text: String,
}

impl TweetEvent {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }
}

impl From<InboundStatus> for TweetEvent {
    fn from(status: InboundStatus) -> Self {
        let author = status
            .user
            .and_then(|user| user.screen_name)
            .unwrap_or_default();

        Self {
            author,
            text: status.text,
        }
    }
}

/// Messages pushed to viewers, tagged with the event name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ViewerMessage {
    Tweet(TweetEvent),
}

impl ViewerMessage {
    /// Encode as the JSON text frame sent over the push channel
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(raw: serde_json::Value) -> TweetEvent {
        let status: InboundStatus = serde_json::from_value(raw).unwrap();
        TweetEvent::from(status)
    }

    #[test]
    fn test_author_taken_from_screen_name() {
        let event = normalize(json!({
            "id_str": "1",
            "user": { "screen_name": "alice", "followers_count": 12 },
            "text": "a bird flew by"
        }));

        assert_eq!(event, TweetEvent::new("alice", "a bird flew by"));
    }

    #[test]
    fn test_missing_author_becomes_empty_string() {
        assert_eq!(normalize(json!({ "text": "birds everywhere" })).author, "");
        assert_eq!(
            normalize(json!({ "user": null, "text": "x" })).author,
            ""
        );
        assert_eq!(normalize(json!({ "user": {}, "text": "x" })).author, "");
    }

    #[test]
    fn test_text_kept_verbatim() {
        let text = "  🐦 caw\ncaw &amp; \u{200b}";
        let event = normalize(json!({ "text": text }));

        assert_eq!(event.text, text);
        assert_eq!(normalize(json!({ "text": "" })).text, "");
    }

    #[test]
    fn test_missing_text_is_rejected() {
        let result = serde_json::from_value::<InboundStatus>(json!({
            "user": { "screen_name": "alice" }
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_viewer_message_wire_format() {
        let message = ViewerMessage::Tweet(TweetEvent::new("alice", "a bird flew by"));
        let encoded: serde_json::Value =
            serde_json::from_str(&message.encode().unwrap()).unwrap();

        assert_eq!(
            encoded,
            json!({
                "event": "tweet",
                "data": { "user": "alice", "text": "a bird flew by" }
            })
        );
    }
}
