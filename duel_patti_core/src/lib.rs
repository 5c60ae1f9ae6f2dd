//! # 两张牌对决 核心逻辑库
//!
//! 这个 `core` crate 包含了一局对决的全部决策逻辑:
//! 发牌、比牌、注单结算、开局与最近几局的历史缓存，
//! 以及客户端-服务器通信消息和单个连接的协议状态机。
//! 它不做任何 I/O，可以被服务器、客户端或测试直接复用。

mod card;
mod config;
mod error;
mod external;
mod history;
mod logic;
mod message;
mod money;
mod protocol;
mod rank;
mod state;
mod table;

pub use card::*;

pub use config::*;

pub use error::*;

pub use external::*;

pub use history::*;

pub use logic::*;

pub use message::*;

pub use money::*;

pub use protocol::*;

pub use rank::*;

pub use state::*;

pub use table::*;
