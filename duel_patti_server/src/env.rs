use std::collections::HashMap;
use std::str::FromStr;

use duel_patti_core::{DrawPolicy, GameConfig, PayoutConfig};
use tracing::warn;

/// 服务器进程的配置，全部来自环境变量，缺省时回落到默认值
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub game: GameConfig,
    /// token -> 下注者ID；为空时放行所有连接
    pub auth_tokens: HashMap<String, String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GameConfig::default();
        let game = GameConfig {
            payout: PayoutConfig {
                max_cashout: read(&lookup, "DUEL_MAX_CASHOUT", defaults.payout.max_cashout),
                win_multiplier: read(&lookup, "DUEL_WIN_MULTIPLIER", defaults.payout.win_multiplier),
                tie_multiplier: read(&lookup, "DUEL_TIE_MULTIPLIER", defaults.payout.tie_multiplier),
            },
            history_capacity: read(&lookup, "DUEL_HISTORY_CAPACITY", defaults.history_capacity),
            draw_policy: read::<DrawPolicy>(&lookup, "DUEL_DRAW_POLICY", defaults.draw_policy),
            seed: lookup("DUEL_SEED").and_then(|raw| raw.parse().ok()),
            broadcast_requested_rounds: read(&lookup, "DUEL_BROADCAST_ROUNDS", defaults.broadcast_requested_rounds),
        };

        Self {
            host: lookup("DUEL_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: read(&lookup, "DUEL_PORT", 25917),
            game,
            auth_tokens: lookup("DUEL_AUTH_TOKENS")
                .map(|raw| parse_tokens(&raw))
                .unwrap_or_default(),
        }
    }
}

fn read<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("环境变量 {} 的值无效: {}，使用默认值", key, raw);
            fallback
        }),
        None => fallback,
    }
}

/// "tok1=alice,tok2=bob"；只写 token 时 token 本身就是下注者ID
fn parse_tokens(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((token, bettor)) => (token.trim().to_string(), bettor.trim().to_string()),
            None => (entry.to_string(), entry.to_string()),
        })
        .collect()
}
