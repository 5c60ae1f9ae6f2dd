use crate::error::{DuelError, ProtocolError};
use crate::money::Amount;
use crate::rank::{evaluate, HandCategory};
use crate::state::{RoundId, RoundResult, SettlementOutcome, Side};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 文本帧格式: "<TAG>:<字段1>:<字段2>..." 或 "<TAG>-<载荷>"

/// 入站消息，在协议边界解析一次，之后按变体穷尽匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// BT: 下注
    PlaceBet(BetRequest),
    /// RD: 请求开一局
    RequestRound,
}

/// BT 的载荷: "<金额>:<筹码位置>[,<金额>:<筹码位置>...][:<局号>]"。
/// 一帧里的所有筹码押在同一局上，按同一个结果结算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetRequest {
    pub bets: Vec<ChipBet>,
    /// 指定要下注的局号，为空时下注当前开放的一局
    pub round_id: Option<RoundId>,
}

/// 押在一个位置上的一笔筹码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipBet {
    pub stake: Amount,
    pub chip: Side,
}

impl ClientMessage {
    pub fn parse(frame: &str) -> Result<ClientMessage, ProtocolError> {
        let frame = frame.trim();
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }

        let (tag, payload) = match frame.find(|c: char| c == ':' || c == '-') {
            Some(idx) => (&frame[..idx], &frame[idx + 1..]),
            None => (frame, ""),
        };

        match tag {
            "BT" => BetRequest::parse(payload).map(ClientMessage::PlaceBet),
            "RD" => {
                if payload.trim().is_empty() {
                    Ok(ClientMessage::RequestRound)
                } else {
                    Err(ProtocolError::UnexpectedPayload { tag: "RD", payload: payload.to_string() })
                }
            }
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }

    /// 编码为文本帧，客户端使用
    pub fn to_frame(&self) -> String {
        match self {
            ClientMessage::PlaceBet(request) => {
                let chips = request
                    .bets
                    .iter()
                    .map(|bet| format!("{}:{}", bet.stake, bet.chip.code()))
                    .collect::<Vec<_>>()
                    .join(",");
                match request.round_id {
                    Some(round_id) => format!("BT:{}:{}", chips, round_id),
                    None => format!("BT:{}", chips),
                }
            }
            ClientMessage::RequestRound => "RD".to_string(),
        }
    }
}

impl BetRequest {
    fn parse(payload: &str) -> Result<BetRequest, ProtocolError> {
        let entries: Vec<&str> = payload.split(',').collect();
        let mut bets = Vec::with_capacity(entries.len());
        let mut round_id = None;

        for (idx, entry) in entries.iter().enumerate() {
            let mut fields = entry.split(':').map(str::trim);
            bets.push(ChipBet::parse(&mut fields)?);

            // 局号只能跟在最后一笔筹码后面
            if let Some(raw) = fields.next() {
                if idx + 1 != entries.len() {
                    return Err(ProtocolError::UnexpectedPayload { tag: "BT", payload: payload.to_string() });
                }
                round_id = Some(
                    raw.parse::<RoundId>()
                        .map_err(|_| ProtocolError::InvalidRoundId(raw.to_string()))?,
                );
            }

            if fields.next().is_some() {
                return Err(ProtocolError::UnexpectedPayload { tag: "BT", payload: payload.to_string() });
            }
        }

        Ok(BetRequest { bets, round_id })
    }
}

impl ChipBet {
    fn parse<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<ChipBet, ProtocolError> {
        let stake = match fields.next() {
            Some(raw) if !raw.is_empty() => raw
                .parse::<Amount>()
                .ok()
                .filter(Amount::is_positive)
                .ok_or_else(|| ProtocolError::InvalidStake(raw.to_string()))?,
            _ => return Err(ProtocolError::InvalidStake("missing".to_string())),
        };

        let chip = match fields.next() {
            Some(raw) if !raw.is_empty() => raw.parse::<Side>()?,
            _ => return Err(ProtocolError::InvalidChip("missing".to_string())),
        };

        Ok(ChipBet { stake, chip })
    }
}

// --- 服务器 -> 客户端 的消息 ---
// JSON 格式 {"event": <名称>, ...数据}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 下注结算结果，只发给下注者。每笔筹码一条结算，顺序与下注帧一致
    BetResult {
        result: RoundResult,
        categories: [HandCategory; 2],
        settlements: Vec<SettlementOutcome>,
    },
    /// 已开出的一局，广播给整个房间
    RoundResult {
        result: RoundResult,
        categories: [HandCategory; 2],
    },
    /// RD 请求的结果，默认只发给请求者
    Round {
        result: RoundResult,
        categories: [HandCategory; 2],
    },
    /// 最近几局的结果，从旧到新
    LastRounds { rounds: Vec<RoundResult> },

    /// 下注被拒绝，注单没有创建
    BetError { code: String, message: String },
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn bet_result(result: RoundResult, settlements: Vec<SettlementOutcome>) -> Self {
        let categories = categories_of(&result);
        ServerMessage::BetResult { result, categories, settlements }
    }

    pub fn round_result(result: RoundResult) -> Self {
        let categories = categories_of(&result);
        ServerMessage::RoundResult { result, categories }
    }

    pub fn round(result: RoundResult) -> Self {
        let categories = categories_of(&result);
        ServerMessage::Round { result, categories }
    }

    pub fn bet_error(err: impl Into<DuelError>) -> Self {
        let err = err.into();
        ServerMessage::BetError { code: err.code().to_string(), message: err.to_string() }
    }

    pub fn error(err: impl Into<DuelError>) -> Self {
        let err = err.into();
        ServerMessage::Error { code: err.code().to_string(), message: err.to_string() }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::BetResult { .. } => "bet_result",
            ServerMessage::RoundResult { .. } => "round_result",
            ServerMessage::Round { .. } => "round",
            ServerMessage::LastRounds { .. } => "last_rounds",
            ServerMessage::BetError { .. } => "bet_error",
            ServerMessage::Error { .. } => "error",
        }
    }
}

fn categories_of(result: &RoundResult) -> [HandCategory; 2] {
    [evaluate(&result.hand1).category, evaluate(&result.hand2).category]
}
