//! 애플리케이션 상태 관리

use crate::config::Config;
use crate::protocol::{Outbound, ServerMessage};
use crate::registry::Registry;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 방 레지스트리
    pub registry: Registry,
    /// 설정
    #[allow(dead_code)]
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Registry::new(),
            config: Arc::new(config),
        }
    }
}

/// 연결 하나를 레지스트리 쪽에서 바라보는 핸들.
/// 소켓 자체가 아니라 송신 채널과 연결 식별자만 들고 다닌다.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: Uuid,
    sender: UnboundedSender<Outbound>,
}

impl PeerHandle {
    pub fn new(sender: UnboundedSender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 송신 태스크가 아직 살아 있는지. 슬롯 점유 시점의 생존 재확인에 쓰인다.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// 제어 메시지 전송. 상대가 이미 끊겼으면 조용히 무시된다.
    pub fn send_control(&self, msg: ServerMessage) {
        let _ = self.sender.send(Outbound::Control(msg));
    }

    /// 수신한 텍스트 프레임을 원문 그대로 전달
    pub fn send_relay(&self, text: &str) {
        let _ = self.sender.send(Outbound::Relay(text.to_owned()));
    }

    /// 남은 프레임을 모두 내보낸 뒤 소켓을 닫도록 지시
    pub fn close(&self) {
        let _ = self.sender.send(Outbound::Close);
    }
}
