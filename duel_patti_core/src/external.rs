//! 核心逻辑依赖的外部协作方: 鉴权、账本、消息总线。
//!
//! 核心只通过这些 trait 与外界交互。账本与消息总线的调用都是"发出即忘"，
//! 实现方不得阻塞调用方，失败也不会回滚已经算出的结果。

use crate::money::{Amount, Multiplier};
use crate::state::{BetStatus, BettorId, RoundId, RoundResult, SettlementOutcome, Side, Wager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 建立连接时客户端提交的握手信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub token: Option<String>,
    /// 客户端所在的游戏/运营方标识，随结算记录一起入账
    pub game_id: Option<String>,
    /// 客户端 IP，优先取 X-Forwarded-For 的第一项
    pub ip: String,
}

impl Handshake {
    /// 从 X-Forwarded-For 头和对端地址中取出客户端 IP
    pub fn client_ip(forwarded_for: Option<&str>, peer: &str) -> String {
        forwarded_for
            .and_then(|header| header.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(peer)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// 通过，附带识别出的下注者
    Allow { bettor_id: BettorId },
    Deny { reason: String },
}

/// 每个连接在进入协议分发前调用一次
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, handshake: &Handshake) -> AuthDecision;
}

/// 追加写入账本的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum LedgerRecord {
    Settlement {
        bettor_id: BettorId,
        round_id: RoundId,
        game_id: Option<String>,
        ip: String,
        chip: Side,
        stake: Amount,
        payout: Amount,
        multiplier: Multiplier,
        status: BetStatus,
        created_at: DateTime<Utc>,
    },
    Lobbies {
        round_id: RoundId,
        result: RoundResult,
    },
}

impl LedgerRecord {
    pub fn settlement(wager: &Wager, handshake: &Handshake, outcome: &SettlementOutcome) -> Self {
        LedgerRecord::Settlement {
            bettor_id: wager.bettor_id.clone(),
            round_id: wager.round_id,
            game_id: handshake.game_id.clone(),
            ip: handshake.ip.clone(),
            chip: outcome.chip,
            stake: outcome.stake,
            payout: outcome.payout,
            multiplier: outcome.multiplier,
            status: outcome.status,
            created_at: Utc::now(),
        }
    }

    pub fn lobby(result: &RoundResult) -> Self {
        LedgerRecord::Lobbies {
            round_id: result.round_id,
            result: result.clone(),
        }
    }
}

pub trait Ledger: Send + Sync {
    fn append(&self, record: LedgerRecord);
}

/// 跨进程广播已开出的局
pub trait RoundNotifier: Send + Sync {
    fn publish(&self, result: &RoundResult);
}

/// 不做任何事的实现，用于不需要账本或总线的场景
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Ledger for Discard {
    fn append(&self, _record: LedgerRecord) {}
}

impl RoundNotifier for Discard {
    fn publish(&self, _result: &RoundResult) {}
}

/// 放行所有握手，以 IP 作为下注者标识
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, handshake: &Handshake) -> AuthDecision {
        AuthDecision::Allow { bettor_id: handshake.ip.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        assert_eq!(Handshake::client_ip(Some("1.2.3.4, 10.0.0.1"), "127.0.0.1"), "1.2.3.4");
        assert_eq!(Handshake::client_ip(Some("  "), "127.0.0.1"), "127.0.0.1");
        assert_eq!(Handshake::client_ip(None, "127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn test_ledger_record_is_tagged_by_table() {
        let outcome = SettlementOutcome {
            chip: Side::Player1,
            stake: Amount::from_major(100),
            payout: Amount::from_major(198),
            multiplier: Multiplier::from_hundredths(198),
            status: BetStatus::Win,
        };
        let wager = Wager {
            chip: Side::Player1,
            stake: Amount::from_major(100),
            bettor_id: "u1".into(),
            round_id: 7,
        };
        let handshake = Handshake {
            token: Some("secret".into()),
            game_id: Some("duel-01".into()),
            ip: "1.2.3.4".into(),
        };
        let json = serde_json::to_value(LedgerRecord::settlement(&wager, &handshake, &outcome)).unwrap();
        assert_eq!(json["table"], "settlement");
        assert_eq!(json["bettor_id"], "u1");
        assert_eq!(json["round_id"], 7);
        assert_eq!(json["game_id"], "duel-01");
        assert_eq!(json["ip"], "1.2.3.4");
        assert!(json.get("token").is_none());
        assert_eq!(json["chip"], 1);
        assert_eq!(json["payout"], "198.00");
        assert_eq!(json["status"], "win");
    }
}
