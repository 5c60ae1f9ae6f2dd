use crate::state::RoundId;
use thiserror::Error;

/// 入站消息格式错误。报告给发送者，连接保持打开。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid event: {0}")]
    UnknownTag(String),
    #[error("empty message")]
    EmptyFrame,
    #[error("missing or invalid stake: {0}")]
    InvalidStake(String),
    #[error("unrecognized chip selection: {0}")]
    InvalidChip(String),
    #[error("invalid round id: {0}")]
    InvalidRoundId(String),
    #[error("unexpected payload for {tag}: {payload}")]
    UnexpectedPayload { tag: &'static str, payload: String },
    #[error("connection is not active")]
    NotActive,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// 非法的牌或手牌到达了比牌引擎。不做任何默认值兜底。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("unknown card value: {0}")]
    UnknownValue(String),
    #[error("unknown suit: {0}")]
    UnknownSuit(String),
    #[error("malformed card: {0}")]
    MalformedCard(String),
    #[error("a hand holds exactly 2 cards, got {0}")]
    HandSize(usize),
}

/// 下注无法被受理，注单不会被创建。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementRejection {
    #[error("no active round")]
    NoActiveRound,
    #[error("round {requested} is closed, current round is {current}")]
    RoundClosed { requested: RoundId, current: RoundId },
    #[error("bet carries no chips")]
    NoChips,
}

/// 金额、赔率、发牌策略的文本形式无法解析
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid decimal: {0}")]
    Malformed(String),
    #[error("decimal out of range: {0}")]
    OutOfRange(String),
    #[error("unknown draw policy: {0}")]
    UnknownDrawPolicy(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DuelError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error(transparent)]
    Rejected(#[from] SettlementRejection),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DuelError {
    /// 线上使用的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            DuelError::Protocol(ProtocolError::UnknownTag(_)) => "INVALID_EVENT",
            DuelError::Protocol(ProtocolError::NotActive) => "NOT_ACTIVE",
            DuelError::Protocol(ProtocolError::Unauthorized(_)) => "UNAUTHORIZED",
            DuelError::Protocol(_) => "INVALID_MESSAGE",
            DuelError::Contract(_) => "INTERNAL_ERROR",
            DuelError::Rejected(SettlementRejection::NoActiveRound) => "NO_ACTIVE_ROUND",
            DuelError::Rejected(SettlementRejection::RoundClosed { .. }) => "ROUND_CLOSED",
            DuelError::Rejected(SettlementRejection::NoChips) => "EMPTY_BET",
            DuelError::Config(_) => "INVALID_CONFIG",
        }
    }
}
