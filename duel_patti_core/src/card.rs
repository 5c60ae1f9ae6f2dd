use crate::error::{ContractViolation, ValueError};
use rand::Rng;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 派生的 Ord 即为比牌时使用的花色大小: 方块 < 梅花 < 红心 < 黑桃
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Diamond, // 方块 ♦️
    Club,    // 梅花 ♣️
    Heart,   // 红心 ♥️
    Spade,   // 黑桃 ♠️
}

/// 点数 (Value)
/// Ord 的派生让 Ace 是最大的
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Value {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

pub const SUITS: [Suit; 4] = [Suit::Diamond, Suit::Club, Suit::Heart, Suit::Spade];

pub const VALUES: [Value; 13] = [
    Value::Two, Value::Three, Value::Four, Value::Five, Value::Six, Value::Seven,
    Value::Eight, Value::Nine, Value::Ten, Value::Jack, Value::Queen, Value::King, Value::Ace,
];

/// 单张扑克牌 (Card)
/// 线上格式为 "<点数>-<花色>"，例如 "10-S"、"A-D"
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    pub value: Value,
    pub suit: Suit,
}

impl Card {
    pub fn new(value: Value, suit: Suit) -> Card {
        Card { value, suit }
    }
}

/// 一手牌，固定两张
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Hand(pub [Card; 2]);

impl Hand {
    pub fn new(first: Card, second: Card) -> Hand {
        Hand([first, second])
    }

    pub fn cards(&self) -> &[Card; 2] {
        &self.0
    }

    /// 按 (点数, 花色) 从大到小排好的两张牌
    pub fn sorted_desc(&self) -> (Card, Card) {
        let [a, b] = self.0;
        if a >= b { (a, b) } else { (b, a) }
    }

    /// 从文本形式解析，例如 ["10-S", "10-D"]
    pub fn parse(cards: &[&str]) -> Result<Hand, ContractViolation> {
        match cards {
            [first, second] => Ok(Hand::new(first.parse()?, second.parse()?)),
            _ => Err(ContractViolation::HandSize(cards.len())),
        }
    }
}

// --- 文本编解码 ---

impl Suit {
    pub fn code(&self) -> char {
        match self {
            Suit::Diamond => 'D',
            Suit::Club => 'C',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        }
    }
}

impl FromStr for Suit {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Suit::Diamond),
            "C" => Ok(Suit::Club),
            "H" => Ok(Suit::Heart),
            "S" => Ok(Suit::Spade),
            other => Err(ContractViolation::UnknownSuit(other.to_string())),
        }
    }
}

impl Value {
    pub fn code(&self) -> &'static str {
        match self {
            Value::Two => "2",
            Value::Three => "3",
            Value::Four => "4",
            Value::Five => "5",
            Value::Six => "6",
            Value::Seven => "7",
            Value::Eight => "8",
            Value::Nine => "9",
            Value::Ten => "10",
            Value::Jack => "J",
            Value::Queen => "Q",
            Value::King => "K",
            Value::Ace => "A",
        }
    }
}

impl FromStr for Value {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VALUES
            .iter()
            .find(|v| v.code() == s)
            .copied()
            .ok_or_else(|| ContractViolation::UnknownValue(s.to_string()))
    }
}

impl FromStr for Card {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, suit) = s
            .split_once('-')
            .ok_or_else(|| ContractViolation::MalformedCard(s.to_string()))?;
        Ok(Card::new(value.parse()?, suit.parse()?))
    }
}

impl TryFrom<String> for Card {
    type Error = ContractViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        format!("{}-{}", card.value.code(), card.suit.code())
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠️",
            Suit::Heart => "♥️",
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.value)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.0[0], self.0[1])
    }
}

// --- 随机发牌 ---

/// 发牌策略。每个进程固定使用一种，不在运行中切换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawPolicy {
    /// 洗一副新牌，依次给玩家1、玩家2各发两张，四张牌互不相同
    #[default]
    ShuffledDeck,
    /// 每张牌的点数和花色各自独立均匀抽取（有放回），可能出现重复的牌
    IndependentSampling,
}

impl FromStr for DrawPolicy {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shuffled_deck" | "deck" => Ok(DrawPolicy::ShuffledDeck),
            "independent_sampling" | "independent" => Ok(DrawPolicy::IndependentSampling),
            other => Err(ValueError::UnknownDrawPolicy(other.to_string())),
        }
    }
}

impl DrawPolicy {
    /// 为一局发出两手牌 (玩家1, 玩家2)
    pub fn deal<R: Rng + ?Sized>(&self, rng: &mut R) -> (Hand, Hand) {
        match self {
            DrawPolicy::ShuffledDeck => {
                let mut deck = create_deck();
                deck.shuffle(rng);
                // 新牌有 52 张，只取 4 张，下标访问不会越界
                let (first, second) = (&deck[..2], &deck[2..4]);
                (
                    Hand::new(first[0], second[0]),
                    Hand::new(first[1], second[1]),
                )
            }
            DrawPolicy::IndependentSampling => {
                let mut draw = || Card::new(
                    VALUES[rng.random_range(0..VALUES.len())],
                    SUITS[rng.random_range(0..SUITS.len())],
                );
                let hand1 = Hand::new(draw(), draw());
                let hand2 = Hand::new(draw(), draw());
                (hand1, hand2)
            }
        }
    }
}

/// 创建一副完整的 52 张扑克牌
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for &suit in &SUITS {
        for &value in &VALUES {
            deck.push(Card { value, suit });
        }
    }
    deck
}

// --- 单元测试 ---
