//! Reference data: instruments, issuers and counterparties.

use crate::schema::{Column, GraphNode, Label, PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Listed equity
    Equity,
    /// Bond or note
    FixedIncome,
    /// Exchange-traded fund
    Etf,
}

impl AssetClass {
    /// All asset classes, in sampling order.
    pub const ALL: [AssetClass; 3] = [AssetClass::Equity, AssetClass::FixedIncome, AssetClass::Etf];

    /// Stored name
    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::FixedIncome => "fixed_income",
            AssetClass::Etf => "etf",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// ISIN, unique per dataset
    pub isin: String,
    /// Exchange ticker (not unique)
    pub ticker: String,
    /// Asset class
    pub asset_class: AssetClass,
    /// Listing exchange
    pub exchange: String,
    /// Minimum tradable lot, always positive
    pub lot_size: u32,
    /// Trading currency
    pub currency: String,
}

impl GraphNode for Instrument {
    const LABEL: Label = Label::Instrument;
    const COLUMNS: &'static [Column] = &[
        Column::new("ticker", PropertyType::String),
        Column::new("asset_class", PropertyType::String),
        Column::new("exchange", PropertyType::String),
        Column::new("lot_size", PropertyType::Int),
        Column::new("currency", PropertyType::String),
    ];

    fn key(&self) -> &str {
        &self.isin
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.ticker.clone()),
            PropertyValue::Str(self.asset_class.as_str().to_string()),
            PropertyValue::Str(self.exchange.clone()),
            PropertyValue::Int(i64::from(self.lot_size)),
            PropertyValue::Str(self.currency.clone()),
        ]
    }
}

/// An instrument issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issuer {
    /// Issuer identifier (`ISS-000000`)
    pub issuer_id: String,
    /// Company name
    pub name: String,
    /// Domicile country code
    pub country: String,
    /// Industry sector
    pub sector: String,
}

impl GraphNode for Issuer {
    const LABEL: Label = Label::Issuer;
    const COLUMNS: &'static [Column] = &[
        Column::new("name", PropertyType::String),
        Column::new("country", PropertyType::String),
        Column::new("sector", PropertyType::String),
    ];

    fn key(&self) -> &str {
        &self.issuer_id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.name.clone()),
            PropertyValue::Str(self.country.clone()),
            PropertyValue::Str(self.sector.clone()),
        ]
    }
}

/// A counterparty placing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Counterparty identifier (`CP-0000000`)
    pub id: String,
    /// Registered legal name
    pub legal_name: String,
    /// KYC score in [0, 100], 2 dp
    pub kyc_score: f64,
}

impl GraphNode for Counterparty {
    const LABEL: Label = Label::Counterparty;
    const COLUMNS: &'static [Column] = &[
        Column::new("legal_name", PropertyType::String),
        Column::new("kyc_score", PropertyType::Float),
    ];

    fn key(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.legal_name.clone()),
            PropertyValue::Float(self.kyc_score),
        ]
    }
}
