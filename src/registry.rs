//! 방 코드별 host/join 슬롯 점유를 관리하는 방 레지스트리

use crate::state::PeerHandle;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::fmt;
use thiserror::Error;

/// 정규화 후 허용되는 방 코드 최대 길이
pub const MAX_CODE_LEN: usize = 10;

/// 방 코드 정규화: 앞뒤 공백 제거 + 대문자화. 멱등이다.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// 정규화된 방 코드. `parse`를 통해서만 만들어지므로
/// 레지스트리에는 검증된 코드만 들어간다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// 정규화 후 비어 있거나 `MAX_CODE_LEN`을 넘는 코드는 거절
    pub fn parse(raw: &str) -> Result<Self, AdmitError> {
        let code = normalize(raw);
        if code.is_empty() || code.chars().count() > MAX_CODE_LEN {
            return Err(AdmitError::BadRoom);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 참여자 역할. 방마다 역할별 슬롯이 하나씩이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Join,
}

impl Role {
    /// "host"만 host 슬롯을 선택하고 그 외 값은 전부 join이 된다.
    /// 태그가 없거나 오타가 나도 조용히 join으로 입장하는, 의도된 기본값 정책.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("host") => Role::Host,
            _ => Role::Join,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Role::Host => Role::Join,
            Role::Join => Role::Host,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Join => f.write_str("join"),
        }
    }
}

/// 입장 거절 사유. Display 문자열이 그대로 와이어의 err message가 된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmitError {
    /// 정규화 후 방 코드가 비었거나 너무 긺. 연결은 유지되고 재시도할 수 있다.
    #[error("bad room")]
    BadRoom,
    /// 살아있는 피어가 이미 해당 슬롯을 점유 중. 이 연결은 종료된다.
    #[error("{0} already exists")]
    SlotTaken(Role),
}

/// `occupy` 성공 결과
#[derive(Debug)]
pub enum Admission {
    /// 반대편 슬롯에도 살아있는 피어가 있어 페어링 완료
    Paired { peer: PeerHandle },
    /// 혼자 입장해 상대를 대기
    Waiting,
}

/// 방 하나의 두 슬롯. 둘 다 비는 순간 레지스트리에서 제거된다.
#[derive(Debug, Default)]
pub struct Room {
    host: Option<PeerHandle>,
    join: Option<PeerHandle>,
}

impl Room {
    fn slot(&self, role: Role) -> &Option<PeerHandle> {
        match role {
            Role::Host => &self.host,
            Role::Join => &self.join,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<PeerHandle> {
        match role {
            Role::Host => &mut self.host,
            Role::Join => &mut self.join,
        }
    }

    fn is_empty(&self) -> bool {
        self.host.is_none() && self.join.is_none()
    }
}

/// 프로세스 전역 방 레지스트리.
///
/// 전역 정적이 아니라 주입되는 객체라서 테스트마다 독립 인스턴스를 쓸 수 있다.
/// 슬롯 변경은 전부 해당 방 코드의 엔트리를 잡은 채로 일어난다.
#[derive(Debug, Default)]
pub struct Registry {
    rooms: DashMap<String, Room>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 코드에 해당하는 방을 찾거나 빈 방을 새로 만든다. 실패하지 않는다.
    fn get_or_create(&self, code: &RoomCode) -> RefMut<'_, String, Room> {
        self.rooms.entry(code.as_str().to_owned()).or_insert_with(|| {
            tracing::info!(room = %code, "Room created");
            Room::default()
        })
    }

    /// 슬롯 점유 시도.
    ///
    /// 점유자의 생존 여부는 장부가 아니라 이 시점의 채널 상태로 재확인한다.
    /// 비정상 종료 직후 잠깐 남아 있는 잔류 참조는 덮어쓴다.
    pub fn occupy(
        &self,
        code: &RoomCode,
        role: Role,
        conn: PeerHandle,
    ) -> Result<Admission, AdmitError> {
        let mut room = self.get_or_create(code);

        let slot = room.slot_mut(role);
        if slot.as_ref().is_some_and(PeerHandle::is_open) {
            return Err(AdmitError::SlotTaken(role));
        }
        *slot = Some(conn);

        match room.slot(role.opposite()).as_ref().filter(|p| p.is_open()) {
            Some(peer) => Ok(Admission::Paired { peer: peer.clone() }),
            None => Ok(Admission::Waiting),
        }
    }

    /// 슬롯 비우기. 정확히 이 연결이 점유 중일 때만 비운다
    /// (이미 교체된 연결에서 늦게 도착한 vacate 방지).
    /// 두 슬롯이 모두 비면 방 자체를 제거한다.
    pub fn vacate(&self, code: &RoomCode, role: Role, conn: &PeerHandle) {
        let now_empty = match self.rooms.get_mut(code.as_str()) {
            Some(mut room) => {
                let slot = room.slot_mut(role);
                if slot.as_ref().is_some_and(|cur| cur.id() == conn.id()) {
                    *slot = None;
                }
                room.is_empty()
            }
            None => return,
        };

        if now_empty
            && self
                .rooms
                .remove_if(code.as_str(), |_, room| room.is_empty())
                .is_some()
        {
            tracing::info!(room = %code, "Room deleted");
        }
    }

    /// 반대 역할 슬롯의 점유자. 방이 없거나 해당 슬롯이 비었으면 None.
    /// 생존 여부는 거르지 않는다. 전송 시점에 확인된다.
    pub fn peer_of(&self, code: &RoomCode, role: Role) -> Option<PeerHandle> {
        self.rooms.get(code.as_str())?.slot(role.opposite()).clone()
    }

    /// 현재 살아있는 방 수
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
