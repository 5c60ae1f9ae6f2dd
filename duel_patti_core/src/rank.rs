use crate::card::{Hand, Suit, Value};
use crate::error::ContractViolation;
use crate::state::Side;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 牌型 (HandCategory)
/// 变体按从小到大排列，可以直接利用 `Ord` 进行比较。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    HighCard,     // 高牌
    Colour,       // 同花 (不连)
    Sequence,     // 顺子 (不同花)
    PureSequence, // 同花顺
    Trio,         // 两张点数相同
}

/// 顺子表，从大到小。键是无序的点数对，存储时小的点数在前。
/// A-2 固定排在最前；K-A 不算顺子。
pub const SEQUENCE_TABLE: [(Value, Value); 12] = [
    (Value::Two, Value::Ace),
    (Value::Queen, Value::King),
    (Value::Jack, Value::Queen),
    (Value::Ten, Value::Jack),
    (Value::Nine, Value::Ten),
    (Value::Eight, Value::Nine),
    (Value::Seven, Value::Eight),
    (Value::Six, Value::Seven),
    (Value::Five, Value::Six),
    (Value::Four, Value::Five),
    (Value::Three, Value::Four),
    (Value::Two, Value::Three),
];

/// 顺子在表中的强度，越大越好；不是顺子返回 None
pub fn sequence_strength(a: Value, b: Value) -> Option<u8> {
    let key = if a <= b { (a, b) } else { (b, a) };
    SEQUENCE_TABLE
        .iter()
        .position(|pair| *pair == key)
        .map(|idx| (SEQUENCE_TABLE.len() - idx) as u8)
}

/// 一手牌的牌力。
/// 字段顺序就是比较顺序，派生的 `Ord` 即为完整的比牌规则:
/// 牌型 -> 主比较值 -> 大牌花色 -> 小牌点数 -> 小牌花色
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
pub struct HandRank {
    pub category: HandCategory,
    /// 三条: 点数；顺子/同花顺: 顺子表中的强度；同花/高牌: 大牌点数
    pub primary: u8,
    pub high_suit: Suit,
    pub low_value: Value,
    pub low_suit: Suit,
}

/// 评估一手两张牌的牌力
pub fn evaluate(hand: &Hand) -> HandRank {
    let (high, low) = hand.sorted_desc();
    let same_suit = high.suit == low.suit;

    let (category, primary) = if high.value == low.value {
        (HandCategory::Trio, high.value as u8)
    } else if let Some(strength) = sequence_strength(high.value, low.value) {
        let category = if same_suit { HandCategory::PureSequence } else { HandCategory::Sequence };
        (category, strength)
    } else if same_suit {
        (HandCategory::Colour, high.value as u8)
    } else {
        (HandCategory::HighCard, high.value as u8)
    };

    HandRank {
        category,
        primary,
        high_suit: high.suit,
        low_value: low.value,
        low_suit: low.suit,
    }
}

/// 比较两手牌，返回胜者
pub fn compare_hands(hand1: &Hand, hand2: &Hand) -> Side {
    match evaluate(hand1).cmp(&evaluate(hand2)) {
        Ordering::Greater => Side::Player1,
        Ordering::Less => Side::Player2,
        Ordering::Equal => Side::Tie,
    }
}

/// 以文本形式比较两手牌，例如 `rank_cards(&["10-S", "10-D"], &["3-H", "4-H"])`
pub fn rank_cards(hand1: &[&str], hand2: &[&str]) -> Result<Side, ContractViolation> {
    Ok(compare_hands(&Hand::parse(hand1)?, &Hand::parse(hand2)?))
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            HandCategory::Trio => "对子",
            HandCategory::PureSequence => "同花顺",
            HandCategory::Sequence => "顺子",
            HandCategory::Colour => "同花",
            HandCategory::HighCard => "高牌",
        })
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.category)
    }
}

// --- 单元测试 ---
