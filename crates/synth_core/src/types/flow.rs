//! Order flow: orders and the trades executing them.

use crate::schema::{Column, GraphNode, Label, PropertyType, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl Side {
    /// Both sides, in sampling order.
    pub const ALL: [Side; 2] = [Side::Buy, Side::Sell];

    /// Stored name
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client order on one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier (`O-00000000`)
    pub order_id: String,
    /// Buy or sell
    pub side: Side,
    /// Order quantity, always positive
    pub quantity: u32,
    /// Limit price, 2 dp, always positive
    pub price: f64,
    /// Submission time
    pub timestamp: DateTime<Utc>,
    /// Placing counterparty
    pub counterparty_id: String,
    /// Ordered instrument
    pub isin: String,
}

impl GraphNode for Order {
    const LABEL: Label = Label::Order;
    const COLUMNS: &'static [Column] = &[
        Column::new("side", PropertyType::String),
        Column::new("qty", PropertyType::Int),
        Column::new("price", PropertyType::Float),
        Column::new("ts", PropertyType::DateTime),
    ];

    fn key(&self) -> &str {
        &self.order_id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.side.as_str().to_string()),
            PropertyValue::Int(i64::from(self.quantity)),
            PropertyValue::Float(self.price),
            PropertyValue::DateTime(self.timestamp),
        ]
    }
}

/// An execution against a parent order.
///
/// The trade inherits the parent's instrument, its quantity never exceeds
/// the parent's, and its price stays within 0.2% of the parent's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier (`T-000000000`)
    pub trade_id: String,
    /// Execution price, 2 dp
    pub price: f64,
    /// Executed quantity
    pub quantity: u32,
    /// Execution time
    pub timestamp: DateTime<Utc>,
    /// Execution venue
    pub venue: String,
    /// Parent order
    pub order_id: String,
    /// Traded instrument (same as the parent order's)
    pub isin: String,
}

impl GraphNode for Trade {
    const LABEL: Label = Label::Trade;
    const COLUMNS: &'static [Column] = &[
        Column::new("price", PropertyType::Float),
        Column::new("qty", PropertyType::Int),
        Column::new("ts", PropertyType::DateTime),
        Column::new("venue", PropertyType::String),
    ];

    fn key(&self) -> &str {
        &self.trade_id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Float(self.price),
            PropertyValue::Int(i64::from(self.quantity)),
            PropertyValue::DateTime(self.timestamp),
            PropertyValue::Str(self.venue.clone()),
        ]
    }
}
