//! 클라이언트-서버 메시지 프로토콜 정의

use serde::{Deserialize, Serialize};

/// 입장 요청 (클라이언트 → 서버, `{"type":"hello"}` 프레임의 본문)
///
/// hello 이외의 프레임은 구조를 해석하지 않고 원문 그대로 상대 피어에게
/// 중계되므로, 클라이언트 메시지 중 유일하게 스키마를 가진다.
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    /// 방 코드. 없으면 빈 문자열로 취급되어 "bad room"으로 거절된다.
    #[serde(default)]
    pub room: String,
    /// 역할 태그. "host"만 host 슬롯을 선택한다.
    #[serde(default)]
    pub role: Option<String>,
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 두 피어가 모두 입장해 페어링 완료
    Ok,
    /// 입장은 승인됐고 상대 피어를 대기 중
    OkWait,
    /// 입장 실패
    Err { message: String },
    /// 페어링된 상대가 연결을 끊음
    PeerLeft,
}

impl ServerMessage {
    pub fn err(message: impl Into<String>) -> Self {
        Self::Err {
            message: message.into(),
        }
    }
}

/// 소켓 송신 태스크로 전달되는 프레임
#[derive(Debug, Clone)]
pub enum Outbound {
    /// 직렬화해서 보낼 제어 메시지
    Control(ServerMessage),
    /// 상대 피어가 보낸 텍스트 프레임 원문 (재직렬화 없이 그대로 전송)
    Relay(String),
    /// 남은 프레임을 모두 내보낸 뒤 Close 프레임을 보내고 소켓을 닫음
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_messages_match_the_wire_contract() {
        assert_eq!(
            serde_json::to_string(&ServerMessage::Ok).unwrap(),
            r#"{"type":"ok"}"#
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::OkWait).unwrap(),
            r#"{"type":"ok_wait"}"#
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::err("bad room")).unwrap(),
            r#"{"type":"err","message":"bad room"}"#
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::PeerLeft).unwrap(),
            r#"{"type":"peer_left"}"#
        );
    }

    #[test]
    fn hello_fields_are_optional() {
        let hello: Hello = serde_json::from_str(r#"{"type":"hello"}"#).unwrap();
        assert_eq!(hello.room, "");
        assert_eq!(hello.role, None);

        let hello: Hello =
            serde_json::from_str(r#"{"type":"hello","room":"ab","role":"host"}"#).unwrap();
        assert_eq!(hello.room, "ab");
        assert_eq!(hello.role.as_deref(), Some("host"));
    }
}
