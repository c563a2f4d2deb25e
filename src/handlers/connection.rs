//! 연결 핸들러 (입장 핸드셰이크, 프레임 분배, 연결 해제)

use crate::protocol::{Hello, ServerMessage};
use crate::registry::{Admission, Role, RoomCode};
use crate::state::{AppState, PeerHandle};

/// 연결 하나의 수명 주기 상태.
/// 바인딩은 1회성이다: `Bound`가 된 연결은 닫힐 때까지 다시 묶이지 않는다.
#[derive(Debug)]
pub enum Phase {
    /// hello 승인 전. 중계 대상이 없으므로 hello 외의 프레임은 버려진다.
    Unbound,
    /// (방, 역할)에 묶임
    Bound { room: RoomCode, role: Role },
    /// 정리까지 끝난 최종 상태
    Closed,
}

/// 연결 하나의 세션. 소켓 태스크가 소유하며 전송 핸들과 상태 기계를 묶는다.
#[derive(Debug)]
pub struct Session {
    pub handle: PeerHandle,
    phase: Phase,
}

impl Session {
    pub fn new(handle: PeerHandle) -> Self {
        Self {
            handle,
            phase: Phase::Unbound,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    fn bind(&mut self, room: RoomCode, role: Role) {
        self.phase = Phase::Bound { room, role };
    }

    fn close(&mut self) -> Phase {
        std::mem::replace(&mut self.phase, Phase::Closed)
    }
}

/// 프레임 처리 후 소켓을 유지할지 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum FrameOutcome {
    Continue,
    /// 하드 거절. err 전송 후 소켓을 닫는다
    Close,
}

/// 수신한 텍스트 프레임 하나를 처리한다.
/// JSON으로 파싱되지 않는 프레임은 상태와 무관하게 조용히 버린다.
pub fn handle_frame(state: &AppState, session: &mut Session, text: &str) -> FrameOutcome {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return FrameOutcome::Continue;
    };

    if value.get("type").and_then(serde_json::Value::as_str) == Some("hello") {
        return handle_hello(state, session, value);
    }

    crate::handlers::relay::handle_relay(state, session, text);
    FrameOutcome::Continue
}

/// 입장 요청 처리
fn handle_hello(
    state: &AppState,
    session: &mut Session,
    value: serde_json::Value,
) -> FrameOutcome {
    if !matches!(session.phase, Phase::Unbound) {
        // 이미 묶인 연결의 hello는 재바인딩 없이 무시한다
        return FrameOutcome::Continue;
    }

    let Ok(hello) = serde_json::from_value::<Hello>(value) else {
        return FrameOutcome::Continue;
    };

    let room = match RoomCode::parse(&hello.room) {
        Ok(room) => room,
        Err(e) => {
            // 검증 실패는 회복 가능하므로 err만 보내고 연결은 유지
            session.handle.send_control(ServerMessage::err(e.to_string()));
            return FrameOutcome::Continue;
        }
    };
    let role = Role::from_tag(hello.role.as_deref());

    match state.registry.occupy(&room, role, session.handle.clone()) {
        Ok(Admission::Paired { peer }) => {
            session.bind(room.clone(), role);
            peer.send_control(ServerMessage::Ok);
            session.handle.send_control(ServerMessage::Ok);
            tracing::info!(conn_id = %session.handle.id(), room = %room, %role, "Peers paired");
            FrameOutcome::Continue
        }
        Ok(Admission::Waiting) => {
            session.bind(room.clone(), role);
            session.handle.send_control(ServerMessage::OkWait);
            tracing::info!(conn_id = %session.handle.id(), room = %room, %role, "Waiting for peer");
            FrameOutcome::Continue
        }
        Err(e) => {
            // 살아있는 점유자와의 충돌은 회복 불가. err 후 소켓 종료
            session.handle.send_control(ServerMessage::err(e.to_string()));
            session.handle.close();
            tracing::warn!(conn_id = %session.handle.id(), room = %room, %role, "Admission rejected");
            FrameOutcome::Close
        }
    }
}

/// 연결 해제 처리. `Bound`였다면 슬롯을 비우고 남은 피어에게 알린다.
pub fn handle_disconnect(state: &AppState, session: &mut Session) {
    let Phase::Bound { room, role } = session.close() else {
        tracing::info!(conn_id = %session.handle.id(), "Connection closed");
        return;
    };

    state.registry.vacate(&room, role, &session.handle);

    // vacate 이후 기준으로 남은 피어를 다시 조회한다
    if let Some(peer) = state.registry.peer_of(&room, role) {
        peer.send_control(ServerMessage::PeerLeft);
    }

    tracing::info!(conn_id = %session.handle.id(), room = %room, %role, "Connection closed");
}
