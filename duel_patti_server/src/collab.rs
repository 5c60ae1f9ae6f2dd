use std::collections::HashMap;

use duel_patti_core::{
    AuthDecision, Authenticator, Handshake, Ledger, LedgerRecord, RoundNotifier, RoundResult,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

/// 按 token 鉴权。没有配置 token 时放行所有连接，以客户端 IP 作为下注者ID。
pub struct TokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, handshake: &Handshake) -> AuthDecision {
        if self.tokens.is_empty() {
            return AuthDecision::Allow { bettor_id: handshake.ip.clone() };
        }
        match handshake.token.as_deref() {
            None | Some("") => AuthDecision::Deny { reason: "missing token".to_string() },
            Some(token) => match self.tokens.get(token) {
                Some(bettor_id) => AuthDecision::Allow { bettor_id: bettor_id.clone() },
                None => AuthDecision::Deny { reason: "invalid token".to_string() },
            },
        }
    }
}

/// 账本: 记录进入通道后立即返回，由后台任务按 JSON 行写入日志
pub struct ChannelLedger {
    tx: mpsc::UnboundedSender<LedgerRecord>,
}

impl ChannelLedger {
    /// 创建账本并启动后台写入任务
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LedgerRecord>();
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match serde_json::to_string(&record) {
                    Ok(line) => info!(target: "ledger", "{}", line),
                    Err(e) => warn!(target: "ledger", "序列化账本记录失败: {}", e),
                }
            }
        });
        Self { tx }
    }
}

impl Ledger for ChannelLedger {
    fn append(&self, record: LedgerRecord) {
        if self.tx.send(record).is_err() {
            warn!(target: "ledger", "账本写入任务已退出，记录被丢弃");
        }
    }
}

/// 消息总线: 已开出的局发布到广播通道，不等待任何确认
#[derive(Clone)]
pub struct RoundBus {
    tx: broadcast::Sender<RoundResult>,
}

impl RoundBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundResult> {
        self.tx.subscribe()
    }
}

impl RoundNotifier for RoundBus {
    fn publish(&self, result: &RoundResult) {
        // 没有订阅者时 send 会失败，这不算错误
        let _ = self.tx.send(result.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake(token: Option<&str>) -> Handshake {
        Handshake { token: token.map(str::to_string), game_id: None, ip: "10.1.1.1".into() }
    }

    #[test]
    fn test_open_server_allows_everyone() {
        let auth = TokenAuthenticator::new(HashMap::new());
        assert_eq!(
            auth.authenticate(&handshake(None)),
            AuthDecision::Allow { bettor_id: "10.1.1.1".into() }
        );
    }

    #[test]
    fn test_tokens_are_checked() {
        let auth = TokenAuthenticator::new(HashMap::from([("abc".to_string(), "alice".to_string())]));
        assert_eq!(auth.authenticate(&handshake(Some("abc"))), AuthDecision::Allow { bettor_id: "alice".into() });
        assert!(matches!(auth.authenticate(&handshake(Some("nope"))), AuthDecision::Deny { .. }));
        assert!(matches!(auth.authenticate(&handshake(None)), AuthDecision::Deny { .. }));
    }

    #[tokio::test]
    async fn test_round_bus_fans_out() {
        let bus = RoundBus::new(8);
        let mut rx = bus.subscribe();
        let table = duel_patti_core::GameTable::standalone(Default::default()).unwrap();
        let result = table.request_round().unwrap();
        bus.publish(&result);
        assert_eq!(rx.recv().await.unwrap(), result);
    }
}
