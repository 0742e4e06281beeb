//! Classification of raw stream lines

use birdsong_core::models::InboundStatus;
use serde_json::Value;

use crate::error::{IngestError, Result};

/// One line read from the upstream stream
#[derive(Debug)]
pub enum StreamLine {
    /// Blank line sent to keep the connection open
    KeepAlive,
    Status(InboundStatus),
    Notice(ControlNotice),
}

/// Non-status message interleaved with statuses
#[derive(Debug, Clone, PartialEq)]
pub struct ControlNotice {
    pub kind: NoticeKind,
    pub detail: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Delete,
    Limit,
    ScrubGeo,
    StatusWithheld,
    UserWithheld,
    Warning,
    Disconnect,
}

impl NoticeKind {
    const ALL: [(&'static str, Self); 7] = [
        ("delete", Self::Delete),
        ("limit", Self::Limit),
        ("scrub_geo", Self::ScrubGeo),
        ("status_withheld", Self::StatusWithheld),
        ("user_withheld", Self::UserWithheld),
        ("warning", Self::Warning),
        ("disconnect", Self::Disconnect),
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Limit => "limit",
            Self::ScrubGeo => "scrub_geo",
            Self::StatusWithheld => "status_withheld",
            Self::UserWithheld => "user_withheld",
            Self::Warning => "warning",
            Self::Disconnect => "disconnect",
        }
    }

    /// Notices an operator should see
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::Warning | Self::Disconnect)
    }
}

/// Decode one line of the stream
///
/// Objects without `text` that carry a known notice key are notices. Anything
/// else must be a status; if it is not, the line is a `MalformedEvent`.
pub fn decode_line(line: &str) -> Result<StreamLine> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(StreamLine::KeepAlive);
    }

    let value: Value = serde_json::from_str(line)?;
    let Value::Object(map) = &value else {
        return Err(IngestError::MalformedEvent(
            "expected a JSON object".to_string(),
        ));
    };

    if !map.contains_key("text") {
        let notice = NoticeKind::ALL.iter().find_map(|(key, kind)| {
            map.get(*key).map(|detail| ControlNotice {
                kind: *kind,
                detail: detail.clone(),
            })
        });
        if let Some(notice) = notice {
            return Ok(StreamLine::Notice(notice));
        }
    }

    Ok(StreamLine::Status(serde_json::from_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use birdsong_core::models::TweetEvent;

    fn status(line: &str) -> TweetEvent {
        match decode_line(line).unwrap() {
            StreamLine::Status(status) => TweetEvent::from(status),
            other => panic!("expected a status, got {other:?}"),
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            status(r#"{"user":{"screen_name":"alice"},"text":"a bird flew by"}"#),
            TweetEvent::new("alice", "a bird flew by")
        );
        assert_eq!(
            status(r#"{"text":"birds everywhere"}"#),
            TweetEvent::new("", "birds everywhere")
        );
    }

    #[test]
    fn test_keep_alive() {
        assert!(matches!(decode_line("").unwrap(), StreamLine::KeepAlive));
        assert!(matches!(decode_line("\r").unwrap(), StreamLine::KeepAlive));
    }

    #[test]
    fn test_notices() {
        let line = r#"{"limit":{"track":1234,"timestamp_ms":"1700000000000"}}"#;
        match decode_line(line).unwrap() {
            StreamLine::Notice(notice) => {
                assert_eq!(notice.kind, NoticeKind::Limit);
                assert_eq!(notice.detail["track"], 1234);
            }
            other => panic!("expected a notice, got {other:?}"),
        }

        let line = r#"{"disconnect":{"code":4,"stream_name":"x","reason":"stall"}}"#;
        match decode_line(line).unwrap() {
            StreamLine::Notice(notice) => assert!(notice.kind.is_warning()),
            other => panic!("expected a notice, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines() {
        for line in [
            "not json",
            "[1, 2]",
            r#""text""#,
            r#"{"user":{"screen_name":"alice"}}"#,
            r#"{"text":42}"#,
        ] {
            assert!(
                matches!(decode_line(line), Err(IngestError::MalformedEvent(_))),
                "{line} should be malformed"
            );
        }
    }
}
