use std::fmt::{Display, Formatter};

use alloy::primitives::U256;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Balance of a wallet for one calendar day, read at the last block produced
/// at or before local midnight of that day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSample {
    pub date: NaiveDate,
    pub block_number: u64,
    /// Amount in the token's smallest unit.
    pub raw_balance: U256,
    /// `raw_balance` scaled by the token decimals.
    pub balance: String,
}

impl Display for BalanceSample {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "On {}: {} (Block: {})",
            self.date.format("%d/%m/%Y"),
            self.balance,
            self.block_number
        )
    }
}

/// A point of a series reduced for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub date: NaiveDate,
    pub balance: String,
}

impl From<&BalanceSample> for DisplayPoint {
    fn from(sample: &BalanceSample) -> Self {
        Self {
            date: sample.date,
            balance: sample.balance.clone(),
        }
    }
}

/// Anything that can be placed on a balance-over-time chart.
pub trait SeriesPoint {
    fn date(&self) -> NaiveDate;

    fn balance(&self) -> &str;

    fn to_display_point(&self) -> DisplayPoint {
        DisplayPoint {
            date: self.date(),
            balance: self.balance().to_string(),
        }
    }
}

impl SeriesPoint for BalanceSample {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn balance(&self) -> &str {
        &self.balance
    }
}

impl SeriesPoint for DisplayPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn balance(&self) -> &str {
        &self.balance
    }
}
