//! Billing increment value type.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum chargeable unit. Recorded time rounds up to a multiple of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BillingIncrement {
    OneMinute,
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl BillingIncrement {
    pub const ALL: [BillingIncrement; 6] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::TenMinutes => 10,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    pub fn seconds(self) -> i64 {
        i64::from(self.minutes()) * 60
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|increment| increment.minutes() == minutes)
    }
}

impl Default for BillingIncrement {
    fn default() -> Self {
        Self::TenMinutes
    }
}

/// Minute count outside the supported increment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedIncrement(pub u32);

impl Display for UnsupportedIncrement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported billing increment {} minutes; expected 1|5|10|15|30|60",
            self.0
        )
    }
}

impl Error for UnsupportedIncrement {}

impl TryFrom<u32> for BillingIncrement {
    type Error = UnsupportedIncrement;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(value).ok_or(UnsupportedIncrement(value))
    }
}

impl From<BillingIncrement> for u32 {
    fn from(value: BillingIncrement) -> Self {
        value.minutes()
    }
}
