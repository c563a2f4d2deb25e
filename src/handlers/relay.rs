//! 중계 핸들러 (바인딩된 연결 사이의 프레임 전달)

use crate::handlers::connection::{Phase, Session};
use crate::state::AppState;

/// hello가 아닌 프레임을 같은 방의 반대 역할 피어에게 원문 그대로 전달한다.
/// 상대가 없거나 이미 끊겼으면 버린다. 큐잉도 전달 확인도 없다.
pub fn handle_relay(state: &AppState, session: &Session, text: &str) {
    let Phase::Bound { room, role } = session.phase() else {
        return;
    };

    if let Some(peer) = state.registry.peer_of(room, *role) {
        peer.send_relay(text);
        tracing::debug!(conn_id = %session.handle.id(), room = %room, "Relayed frame");
    }
}
