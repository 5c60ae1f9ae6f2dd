use crate::card::Hand;
use crate::error::ProtocolError;
use crate::money::{Amount, Multiplier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type RoundId = u64;
pub type BettorId = String;

/// 玩家1、玩家2 或平局。
/// 既用于一局的胜者，也用于下注者选择的筹码位置。
/// 线上编码: 1 / 2 / 3 (3 表示平局)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Side {
    Player1,
    Player2,
    Tie,
}

impl Side {
    pub fn code(&self) -> u8 {
        match self {
            Side::Player1 => 1,
            Side::Player2 => 2,
            Side::Tie => 3,
        }
    }

    /// 交换两位玩家，平局保持不变
    pub fn swapped(&self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
            Side::Tie => Side::Tie,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side.code()
    }
}

impl TryFrom<u8> for Side {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Player1),
            2 => Ok(Side::Player2),
            3 => Ok(Side::Tie),
            other => Err(ProtocolError::InvalidChip(other.to_string())),
        }
    }
}

impl FromStr for Side {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Side::Player1),
            "2" => Ok(Side::Player2),
            "3" | "T" | "tie" => Ok(Side::Tie),
            other => Err(ProtocolError::InvalidChip(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Side::Player1 => "玩家1",
            Side::Player2 => "玩家2",
            Side::Tie => "平局",
        })
    }
}

/// 一局的结果。每局只生成一次，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_id: RoundId,
    pub hand1: Hand,
    pub hand2: Hand,
    pub winner: Side,
    pub created_at: DateTime<Utc>,
}

impl RoundResult {
    /// 胜者的手牌，平局时为 None
    pub fn winning_hand(&self) -> Option<&Hand> {
        match self.winner {
            Side::Player1 => Some(&self.hand1),
            Side::Player2 => Some(&self.hand2),
            Side::Tie => None,
        }
    }
}

/// 注单。在对应的一局结算时被消费一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub chip: Side,
    pub stake: Amount,
    pub bettor_id: BettorId,
    pub round_id: RoundId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Win,
    Loss,
}

/// 一张注单的结算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub chip: Side,
    pub stake: Amount,
    pub payout: Amount,
    pub multiplier: Multiplier,
    pub status: BetStatus,
}

impl SettlementOutcome {
    /// 盈亏 = 派彩 - 本金
    pub fn net(&self) -> Amount {
        Amount::from_minor(self.payout.minor() - self.stake.minor())
    }
}
