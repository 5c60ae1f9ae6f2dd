use crate::config::GameConfig;
use crate::error::{ConfigError, SettlementRejection};
use crate::external::{Discard, Handshake, Ledger, LedgerRecord, RoundNotifier};
use crate::logic::{settle, RoundProducer};
use crate::message::BetRequest;
use crate::state::{RoundResult, SettlementOutcome, Wager};
use std::sync::Arc;
use tracing::info;

/// 一次下注的完整结果: 同一局里每笔筹码各自的注单与结算
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetSettled {
    pub result: RoundResult,
    pub wagers: Vec<(Wager, SettlementOutcome)>,
}

impl BetSettled {
    pub fn outcomes(&self) -> Vec<SettlementOutcome> {
        self.wagers.iter().map(|(_, outcome)| outcome.clone()).collect()
    }
}

/// 一张牌桌: 开局、结算，并把结果交给账本和消息总线。
/// 整个进程共享一张，所有连接并发调用。
pub struct GameTable {
    config: GameConfig,
    producer: RoundProducer,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn RoundNotifier>,
}

impl GameTable {
    pub fn new(
        config: GameConfig,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn RoundNotifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let producer = RoundProducer::new(&config);
        Ok(Self { config, producer, ledger, notifier })
    }

    /// 没有账本和消息总线的牌桌
    pub fn standalone(config: GameConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(Discard), Arc::new(Discard))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// 受理一次下注: 开出当前局，帧里的每笔筹码都按这一局的结果结算。
    /// 被拒绝时不会创建任何注单，也不会写账本。
    pub fn place_bet(
        &self,
        bettor_id: &str,
        handshake: &Handshake,
        request: &BetRequest,
    ) -> Result<BetSettled, SettlementRejection> {
        if request.bets.is_empty() {
            return Err(SettlementRejection::NoChips);
        }
        let result = self.producer.resolve_round(request.round_id)?;

        let wagers: Vec<(Wager, SettlementOutcome)> = request
            .bets
            .iter()
            .map(|bet| {
                let wager = Wager {
                    chip: bet.chip,
                    stake: bet.stake,
                    bettor_id: bettor_id.to_string(),
                    round_id: result.round_id,
                };
                let outcome = settle(&wager, &result, &self.config.payout);
                info!(
                    "下注者 {} 在第 {} 局押 {} {}: {:?} 派彩 {}",
                    bettor_id, result.round_id, wager.chip, wager.stake, outcome.status, outcome.payout
                );
                (wager, outcome)
            })
            .collect();

        // 账本与总线的结果不影响已算出的结算
        self.ledger.append(LedgerRecord::lobby(&result));
        for (wager, outcome) in &wagers {
            self.ledger.append(LedgerRecord::settlement(wager, handshake, outcome));
        }
        self.notifier.publish(&result);

        Ok(BetSettled { result, wagers })
    }

    /// 只开一局，不涉及注单
    pub fn request_round(&self) -> Result<RoundResult, SettlementRejection> {
        let result = self.producer.new_round()?;
        self.ledger.append(LedgerRecord::lobby(&result));
        self.notifier.publish(&result);
        Ok(result)
    }

    pub fn last_rounds(&self) -> Vec<RoundResult> {
        self.producer.history_snapshot()
    }

    pub fn open_round_id(&self) -> u64 {
        self.producer.open_round_id()
    }

    /// 锁桌，停止受理下注和开局
    pub fn close(&self) {
        info!("牌桌已锁定");
        self.producer.close();
    }

    pub fn reopen(&self) {
        self.producer.reopen();
    }
}
