use crate::connection::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait for getting the wire name of an event
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Frames pushed from the server to live channels.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "post")]
    Post { post: Value },
    #[serde(rename = "comment")]
    Comment {
        #[serde(rename = "postID")]
        post_id: String,
        comment: Value,
    },
    #[serde(rename = "status")]
    Status {
        #[serde(rename = "userID")]
        user_id: UserId,
        online: bool,
    },
    #[serde(rename = "message")]
    Message { message: Value },
    #[serde(rename = "token-expired")]
    TokenExpired {
        #[serde(rename = "userID")]
        user_id: UserId,
    },
}

impl EventType for ServerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::Post { .. } => "post",
            ServerEvent::Comment { .. } => "comment",
            ServerEvent::Status { .. } => "status",
            ServerEvent::Message { .. } => "message",
            ServerEvent::TokenExpired { .. } => "token-expired",
        }
    }
}

/// Which open channels a `ServerEvent` goes to.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageScope {
    /// Every registered channel, authenticated or not
    Broadcast,
    /// Every authenticated channel except those of `except`
    AuthenticatedExcept { except: UserId },
    /// Channels associated with any of these users
    Users { user_ids: Vec<UserId> },
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: ServerEvent,
    pub scope: MessageScope,
}

/// Frames a client may send over its channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawClientFrame")]
pub enum ClientFrame {
    Login { user_id: UserId },
    Logout,
}

/// `{type, data}` envelope as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct RawClientFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "userID")]
    user_id: UserId,
}

impl TryFrom<RawClientFrame> for ClientFrame {
    type Error = String;

    fn try_from(raw: RawClientFrame) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "login" => {
                let data: LoginData = serde_json::from_value(raw.data)
                    .map_err(|e| format!("invalid login data: {e}"))?;
                Ok(ClientFrame::Login {
                    user_id: data.user_id,
                })
            }
            "logout" => Ok(ClientFrame::Logout),
            other => Err(format!("unknown frame type `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn status_event_uses_wire_field_names() {
        let user_id = Uuid::new_v4();
        let value = serde_json::to_value(ServerEvent::Status {
            user_id,
            online: true,
        })
        .unwrap();

        assert_eq!(
            value,
            json!({"type": "status", "userID": user_id.to_string(), "online": true})
        );
    }

    #[test]
    fn comment_and_token_expired_events_are_tagged() {
        let comment = serde_json::to_value(ServerEvent::Comment {
            post_id: "p1".to_string(),
            comment: json!({"text": "hi"}),
        })
        .unwrap();
        assert_eq!(
            comment,
            json!({"type": "comment", "postID": "p1", "comment": {"text": "hi"}})
        );

        let user_id = Uuid::new_v4();
        let expired = ServerEvent::TokenExpired { user_id };
        assert_eq!(expired.event_type(), "token-expired");
        assert_eq!(
            serde_json::to_value(expired).unwrap(),
            json!({"type": "token-expired", "userID": user_id.to_string()})
        );
    }

    #[test]
    fn decodes_login_frame() {
        let user_id = Uuid::new_v4();
        let text = json!({"type": "login", "data": {"userID": user_id}}).to_string();

        let frame: ClientFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(frame, ClientFrame::Login { user_id });
    }

    #[test]
    fn decodes_logout_frame_with_or_without_data() {
        let with_data: ClientFrame =
            serde_json::from_str(r#"{"type":"logout","data":{}}"#).unwrap();
        let without_data: ClientFrame = serde_json::from_str(r#"{"type":"logout"}"#).unwrap();

        assert_eq!(with_data, ClientFrame::Logout);
        assert_eq!(without_data, ClientFrame::Logout);
    }

    #[test]
    fn rejects_unknown_or_malformed_frames() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"dance","data":{}}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"login","data":{}}"#).is_err());
        assert!(
            serde_json::from_str::<ClientFrame>(r#"{"type":"login","data":{"userID":"nope"}}"#)
                .is_err()
        );
        assert!(serde_json::from_str::<ClientFrame>("not json").is_err());
    }
}
