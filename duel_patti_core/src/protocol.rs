use crate::error::ProtocolError;
use crate::external::{AuthDecision, Authenticator, Handshake};
use crate::message::{ClientMessage, ServerMessage};
use crate::state::BettorId;
use crate::table::GameTable;
use tracing::{info, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// 连接的生命周期，只能按顺序前进
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Authenticated,
    Active,
    Disconnected,
}

/// 消息的接收方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// 只发给当前连接
    Sender,
    /// 广播给房间内所有连接
    Room,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Dispatch {
    pub fn sender(message: ServerMessage) -> Self {
        Dispatch { audience: Audience::Sender, message }
    }

    pub fn room(message: ServerMessage) -> Self {
        Dispatch { audience: Audience::Room, message }
    }
}

/// 单个连接的协议处理器。
/// 不做任何 I/O，只把入站文本帧翻译成要发出的消息，由宿主负责投递。
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
    handshake: Handshake,
    bettor_id: Option<BettorId>,
}

impl Connection {
    pub fn new(handshake: Handshake) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConnectionState::Connected,
            handshake,
            bettor_id: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn bettor_id(&self) -> Option<&str> {
        self.bettor_id.as_deref()
    }

    /// 鉴权，每个连接只调用一次。被拒绝的连接直接进入 Disconnected。
    pub fn authenticate(&mut self, auth: &dyn Authenticator) -> Result<(), ProtocolError> {
        if self.state != ConnectionState::Connected {
            return Err(ProtocolError::NotActive);
        }
        match auth.authenticate(&self.handshake) {
            AuthDecision::Allow { bettor_id } => {
                info!("连接 {} 鉴权通过，下注者 {}", self.id, bettor_id);
                self.bettor_id = Some(bettor_id);
                self.state = ConnectionState::Authenticated;
                Ok(())
            }
            AuthDecision::Deny { reason } => {
                warn!("连接 {} 鉴权失败: {}", self.id, reason);
                self.state = ConnectionState::Disconnected;
                Err(ProtocolError::Unauthorized(reason))
            }
        }
    }

    /// 进入 Active，并给客户端回放最近几局
    pub fn activate(&mut self, table: &GameTable) -> Result<Vec<Dispatch>, ProtocolError> {
        if self.state != ConnectionState::Authenticated {
            return Err(ProtocolError::NotActive);
        }
        self.state = ConnectionState::Active;
        Ok(vec![Dispatch::sender(ServerMessage::LastRounds { rounds: table.last_rounds() })])
    }

    /// 处理一帧入站消息
    pub fn handle_frame(&mut self, frame: &str, table: &GameTable) -> Vec<Dispatch> {
        if self.state != ConnectionState::Active {
            return vec![Dispatch::sender(ServerMessage::error(ProtocolError::NotActive))];
        }
        // Active 状态下 bettor_id 一定已经设置
        let bettor_id = self.bettor_id.as_deref().unwrap_or_default();

        let msg = match ClientMessage::parse(frame) {
            Ok(msg) => msg,
            Err(err) => {
                return match err {
                    ProtocolError::UnknownTag(_) | ProtocolError::EmptyFrame => {
                        warn!("连接 {} 发送了无法识别的消息: {}", self.id, frame);
                        vec![Dispatch::sender(ServerMessage::error(err))]
                    }
                    // 只有 BT 的错误算作失败的下注
                    ProtocolError::UnexpectedPayload { tag: "RD", .. } => {
                        warn!("连接 {} 的 RD 请求格式错误: {}", self.id, frame);
                        vec![Dispatch::sender(ServerMessage::error(err))]
                    }
                    _ => {
                        warn!(target: "failed_bets", bettor_id, ip = %self.handshake.ip, frame, "{}", err);
                        vec![Dispatch::sender(ServerMessage::bet_error(err))]
                    }
                };
            }
        };

        match msg {
            ClientMessage::PlaceBet(request) => {
                match table.place_bet(bettor_id, &self.handshake, &request) {
                    Ok(settled) => vec![
                        Dispatch::sender(ServerMessage::bet_result(settled.result.clone(), settled.outcomes())),
                        Dispatch::room(ServerMessage::round_result(settled.result)),
                        Dispatch::room(ServerMessage::LastRounds { rounds: table.last_rounds() }),
                    ],
                    Err(rejection) => {
                        warn!(target: "failed_bets", bettor_id, ip = %self.handshake.ip, frame, "{}", rejection);
                        vec![Dispatch::sender(ServerMessage::bet_error(rejection))]
                    }
                }
            }
            ClientMessage::RequestRound => match table.request_round() {
                Ok(result) => {
                    if table.config().broadcast_requested_rounds {
                        vec![
                            Dispatch::sender(ServerMessage::round(result.clone())),
                            Dispatch::room(ServerMessage::round_result(result)),
                            Dispatch::room(ServerMessage::LastRounds { rounds: table.last_rounds() }),
                        ]
                    } else {
                        vec![Dispatch::sender(ServerMessage::round(result))]
                    }
                }
                Err(rejection) => vec![Dispatch::sender(ServerMessage::error(rejection))],
            },
        }
    }

    /// 连接断开或传输出错。已经算出的结算不受影响。
    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            info!("连接 {} 已断开", self.id);
            self.state = ConnectionState::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::{BetStatus, Side};

    struct DenyAll;

    impl Authenticator for DenyAll {
        fn authenticate(&self, _handshake: &Handshake) -> AuthDecision {
            AuthDecision::Deny { reason: "bad token".to_string() }
        }
    }

    fn handshake() -> Handshake {
        Handshake { token: Some("t".into()), game_id: None, ip: "10.0.0.9".into() }
    }

    fn table() -> GameTable {
        GameTable::standalone(GameConfig { seed: Some(5), ..GameConfig::default() }).unwrap()
    }

    fn active(table: &GameTable) -> Connection {
        let mut conn = Connection::new(handshake());
        conn.authenticate(&crate::external::AllowAll).unwrap();
        conn.activate(table).unwrap();
        conn
    }

    #[test]
    fn test_lifecycle_in_order() {
        let table = table();
        let mut conn = Connection::new(handshake());
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(conn.activate(&table), Err(ProtocolError::NotActive));

        conn.authenticate(&crate::external::AllowAll).unwrap();
        assert_eq!(conn.state(), ConnectionState::Authenticated);
        assert_eq!(conn.bettor_id(), Some("10.0.0.9"));

        let replay = conn.activate(&table).unwrap();
        assert_eq!(replay, vec![Dispatch::sender(ServerMessage::LastRounds { rounds: vec![] })]);
        assert_eq!(conn.state(), ConnectionState::Active);

        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_denied_connection_never_dispatches() {
        let table = table();
        let mut conn = Connection::new(handshake());
        assert_eq!(conn.authenticate(&DenyAll), Err(ProtocolError::Unauthorized("bad token".into())));
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        let out = conn.handle_frame("BT:100:1", &table);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0].message, ServerMessage::Error { code, .. } if code == "NOT_ACTIVE"));
        assert!(table.last_rounds().is_empty());
    }

    #[test]
    fn test_frames_before_activation_are_rejected() {
        let table = table();
        let mut conn = Connection::new(handshake());
        conn.authenticate(&crate::external::AllowAll).unwrap();
        let out = conn.handle_frame("RD", &table);
        assert!(matches!(&out[0].message, ServerMessage::Error { code, .. } if code == "NOT_ACTIVE"));
        assert_eq!(table.open_round_id(), 1);
    }

    #[test]
    fn test_place_bet_replies_and_broadcasts() {
        let table = table();
        let mut conn = active(&table);
        let out = conn.handle_frame("BT:100:2", &table);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].audience, Audience::Sender);
        match &out[0].message {
            ServerMessage::BetResult { result, settlements, .. } => {
                assert_eq!(settlements.len(), 1);
                let settlement = &settlements[0];
                assert_eq!(settlement.chip, Side::Player2);
                let expected = if result.winner == Side::Player2 { BetStatus::Win } else { BetStatus::Loss };
                assert_eq!(settlement.status, expected);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(out[1].audience, Audience::Room);
        assert_eq!(out[1].message.event_name(), "round_result");
        assert_eq!(out[2].message.event_name(), "last_rounds");
    }

    #[test]
    fn test_malformed_bet_gets_typed_rejection() {
        let table = table();
        let mut conn = active(&table);
        let out = conn.handle_frame("BT:abc:1", &table);
        assert_eq!(out, vec![Dispatch::sender(ServerMessage::bet_error(ProtocolError::InvalidStake("abc".into())))]);
        assert!(table.last_rounds().is_empty());
        assert_eq!(conn.state(), ConnectionState::Active);
    }

    #[test]
    fn test_unknown_tag_keeps_connection_active() {
        let table = table();
        let mut conn = active(&table);
        let out = conn.handle_frame("ZZ:1", &table);
        assert!(matches!(&out[0].message, ServerMessage::Error { code, .. } if code == "INVALID_EVENT"));
        assert_eq!(conn.state(), ConnectionState::Active);

        // 之后的合法消息照常处理
        let out = conn.handle_frame("RD", &table);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message.event_name(), "round");
    }

    #[test]
    fn test_two_chips_on_the_same_round() {
        let table = table();
        let mut conn = active(&table);
        let out = conn.handle_frame("BT:100:1,100:3:1", &table);

        assert_eq!(out.len(), 3);
        match &out[0].message {
            ServerMessage::BetResult { result, settlements, .. } => {
                assert_eq!(result.round_id, 1);
                let chips: Vec<_> = settlements.iter().map(|s| s.chip).collect();
                assert_eq!(chips, vec![Side::Player1, Side::Tie]);
                for settlement in settlements {
                    let expected = if result.winner == settlement.chip { BetStatus::Win } else { BetStatus::Loss };
                    assert_eq!(settlement.status, expected);
                }
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(table.last_rounds().len(), 1);
        assert_eq!(table.open_round_id(), 2);
    }

    #[test]
    fn test_bad_round_request_is_not_a_failed_bet() {
        let table = table();
        let mut conn = active(&table);
        let out = conn.handle_frame("RD:5", &table);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0].message, ServerMessage::Error { code, .. } if code == "INVALID_MESSAGE"));
        assert!(table.last_rounds().is_empty());
        assert_eq!(conn.state(), ConnectionState::Active);
    }

    #[test]
    fn test_late_bet_is_rejected() {
        let table = table();
        let mut conn = active(&table);
        conn.handle_frame("RD", &table);
        let out = conn.handle_frame("BT:10:1:1", &table);
        assert!(matches!(&out[0].message, ServerMessage::BetError { code, .. } if code == "ROUND_CLOSED"));
    }

    #[test]
    fn test_requested_round_broadcast_is_configurable() {
        let config = GameConfig { seed: Some(5), broadcast_requested_rounds: true, ..GameConfig::default() };
        let table = GameTable::standalone(config).unwrap();
        let mut conn = active(&table);
        let out = conn.handle_frame("RD", &table);
        let audiences: Vec<_> = out.iter().map(|d| d.audience).collect();
        assert_eq!(audiences, vec![Audience::Sender, Audience::Room, Audience::Room]);
    }
}
