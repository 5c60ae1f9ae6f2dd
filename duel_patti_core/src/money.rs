//! 定点金额与赔率。
//!
//! 金额以最小货币单位（分）保存为整数，赔率以百分之一为单位保存为整数，
//! 结算过程中从不经过二进制浮点数。

use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 每个货币单位包含的最小单位数
pub const MINOR_UNITS: i64 = 100;

/// 金额，单位为分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Amount {
        Amount(minor)
    }

    pub const fn from_major(major: i64) -> Amount {
        Amount(major * MINOR_UNITS)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// 乘以赔率，截断到分，只做一次
    pub fn apply(&self, multiplier: Multiplier) -> Amount {
        let scaled = (self.0 as i128) * (multiplier.hundredths() as i128) / 100;
        Amount(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl FromStr for Amount {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl TryFrom<String> for Amount {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// 赔率，单位为百分之一（198 即 1.98 倍）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Multiplier(u32);

impl Multiplier {
    pub const fn from_hundredths(hundredths: u32) -> Multiplier {
        Multiplier(hundredths)
    }

    pub const fn hundredths(&self) -> u32 {
        self.0
    }
}

impl FromStr for Multiplier {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = parse_fixed(s, 2)?;
        u32::try_from(raw)
            .map(Multiplier)
            .map_err(|_| ValueError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl TryFrom<String> for Multiplier {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Multiplier> for String {
    fn from(multiplier: Multiplier) -> Self {
        multiplier.to_string()
    }
}

/// 解析十进制文本为 `places` 位小数的定点整数，多余的小数位视为错误
fn parse_fixed(s: &str, places: u32) -> Result<i64, ValueError> {
    let text = s.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    let well_formed = !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.len() <= places as usize
        && !(digits.ends_with('.'));
    if !well_formed {
        return Err(ValueError::Malformed(s.to_string()));
    }

    let scale = 10i64.pow(places);
    let int_value: i64 = int_part.parse().map_err(|_| ValueError::OutOfRange(s.to_string()))?;
    let frac_value: i64 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_part, width = places as usize);
        padded.parse().map_err(|_| ValueError::Malformed(s.to_string()))?
    };

    let value = int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| ValueError::OutOfRange(s.to_string()))?;
    Ok(if negative { -value } else { value })
}
