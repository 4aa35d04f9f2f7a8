use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anything that contributes a monetary value to the portfolio.
pub trait Valued {
    fn value(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Stocks,
    RealEstate,
    Bitcoin,
    Cash,
}

impl AssetCategory {
    pub fn all() -> &'static [AssetCategory] {
        &[
            AssetCategory::Stocks,
            AssetCategory::RealEstate,
            AssetCategory::Bitcoin,
            AssetCategory::Cash,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::Stocks => "Stocks",
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Bitcoin => "Bitcoin",
            AssetCategory::Cash => "Cash",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "stocks" | "stock" => Ok(AssetCategory::Stocks),
            "real_estate" | "realestate" | "property" => Ok(AssetCategory::RealEstate),
            "bitcoin" | "btc" => Ok(AssetCategory::Bitcoin),
            "cash" => Ok(AssetCategory::Cash),
            _ => Err(format!("Unknown asset category: '{s}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHolding {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl StockHolding {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> StockHolding {
        StockHolding {
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn update_price(&mut self, price: f64) {
        self.price = price;
    }
}

impl Valued for StockHolding {
    fn value(&self) -> f64 {
        self.quantity * self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyHolding {
    pub name: String,
    pub market_value: f64,
}

impl PropertyHolding {
    pub fn new(name: impl Into<String>, market_value: f64) -> PropertyHolding {
        PropertyHolding {
            name: name.into(),
            market_value,
        }
    }
}

impl Valued for PropertyHolding {
    fn value(&self) -> f64 {
        self.market_value
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BitcoinPosition {
    pub amount: f64,
    pub price: f64,
}

impl BitcoinPosition {
    pub fn new(amount: f64, price: f64) -> BitcoinPosition {
        BitcoinPosition { amount, price }
    }

    pub fn clear(&mut self) {
        *self = BitcoinPosition::default();
    }
}

impl Valued for BitcoinPosition {
    fn value(&self) -> f64 {
        self.amount * self.price
    }
}

/// Cash with a yield rate in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CashBalance {
    pub amount: f64,
    #[serde(default)]
    pub yield_rate: f64,
}

impl CashBalance {
    pub fn new(amount: f64, yield_rate: f64) -> CashBalance {
        CashBalance { amount, yield_rate }
    }
}

impl Valued for CashBalance {
    fn value(&self) -> f64 {
        self.amount * (1.0 + self.yield_rate / 100.0)
    }
}
