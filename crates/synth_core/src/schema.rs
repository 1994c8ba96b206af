//! Graph schema shared by the transactional loader and the bulk exporter.
//!
//! Label names, key properties, property names and types, and relationship
//! type names are a contract with the downstream query layer. Both writers
//! derive everything they emit from the definitions in this module, so the
//! graph produced by a direct upload and the graph produced by a bulk import
//! are the same graph.
//!
//! Bump [`SCHEMA_VERSION`] whenever any of these names or types change.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Version of the label/property/relationship contract.
pub const SCHEMA_VERSION: u32 = 1;

/// Node labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Tradable instrument, keyed by ISIN
    Instrument,
    /// Instrument issuer
    Issuer,
    /// Order-placing counterparty
    Counterparty,
    /// Client order
    Order,
    /// Execution against an order
    Trade,
    /// Quantitative signal on an instrument
    Signal,
    /// News or corporate event on an instrument
    Event,
}

impl Label {
    /// All labels in load order.
    pub const ALL: [Label; 7] = [
        Label::Instrument,
        Label::Issuer,
        Label::Counterparty,
        Label::Order,
        Label::Trade,
        Label::Signal,
        Label::Event,
    ];

    /// Label name as stored in the graph.
    pub fn name(self) -> &'static str {
        match self {
            Label::Instrument => "Instrument",
            Label::Issuer => "Issuer",
            Label::Counterparty => "Counterparty",
            Label::Order => "Order",
            Label::Trade => "Trade",
            Label::Signal => "Signal",
            Label::Event => "Event",
        }
    }

    /// Primary-key property for this label.
    pub fn key_property(self) -> &'static str {
        match self {
            Label::Instrument => "isin",
            Label::Issuer => "issuer_id",
            Label::Counterparty => "id",
            Label::Order => "order_id",
            Label::Trade => "trade_id",
            Label::Signal => "signal_id",
            Label::Event => "event_id",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelType {
    /// Instrument -> Issuer
    IssuedBy,
    /// Order -> Counterparty
    PlacedBy,
    /// Order -> Instrument
    OrderOn,
    /// Trade -> Order
    Executes,
    /// Trade -> Instrument
    ExecutesOn,
    /// Signal -> Instrument
    AppliesTo,
    /// Event -> Instrument
    Affects,
    /// Instrument -> Instrument
    CorrelatedWith,
}

const CORRELATION_COLUMNS: &[Column] = &[
    Column::new("corr", PropertyType::Float),
    Column::new("window", PropertyType::String),
];

impl RelType {
    /// All relationship types in load order.
    pub const ALL: [RelType; 8] = [
        RelType::IssuedBy,
        RelType::PlacedBy,
        RelType::OrderOn,
        RelType::Executes,
        RelType::ExecutesOn,
        RelType::AppliesTo,
        RelType::Affects,
        RelType::CorrelatedWith,
    ];

    /// Relationship type name as stored in the graph.
    pub fn name(self) -> &'static str {
        match self {
            RelType::IssuedBy => "ISSUED_BY",
            RelType::PlacedBy => "PLACED_BY",
            RelType::OrderOn => "ORDER_ON",
            RelType::Executes => "EXECUTES",
            RelType::ExecutesOn => "EXECUTES_ON",
            RelType::AppliesTo => "APPLIES_TO",
            RelType::Affects => "AFFECTS",
            RelType::CorrelatedWith => "CORRELATED_WITH",
        }
    }

    /// Label of the start node.
    pub fn start_label(self) -> Label {
        match self {
            RelType::IssuedBy | RelType::CorrelatedWith => Label::Instrument,
            RelType::PlacedBy | RelType::OrderOn => Label::Order,
            RelType::Executes | RelType::ExecutesOn => Label::Trade,
            RelType::AppliesTo => Label::Signal,
            RelType::Affects => Label::Event,
        }
    }

    /// Label of the end node.
    pub fn end_label(self) -> Label {
        match self {
            RelType::IssuedBy => Label::Issuer,
            RelType::PlacedBy => Label::Counterparty,
            RelType::Executes => Label::Order,
            RelType::OrderOn
            | RelType::ExecutesOn
            | RelType::AppliesTo
            | RelType::Affects
            | RelType::CorrelatedWith => Label::Instrument,
        }
    }

    /// Relationship properties, in column order.
    pub fn properties(self) -> &'static [Column] {
        match self {
            RelType::CorrelatedWith => CORRELATION_COLUMNS,
            _ => &[],
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// UTF-8 string
    String,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Zoned datetime
    DateTime,
}

impl PropertyType {
    /// Type suffix used in bulk-import headers (`None` for strings).
    pub fn header_suffix(self) -> Option<&'static str> {
        match self {
            PropertyType::String => None,
            PropertyType::Int => Some("int"),
            PropertyType::Float => Some("float"),
            PropertyType::DateTime => Some("datetime"),
        }
    }
}

/// A named, typed property column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Property name
    pub name: &'static str,
    /// Property type
    pub ty: PropertyType,
}

impl Column {
    /// Declare a column
    pub const fn new(name: &'static str, ty: PropertyType) -> Self {
        Self { name, ty }
    }
}

/// A property value ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::DateTime(ts) => f.write_str(&format_timestamp(ts)),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Str(s) => serializer.serialize_str(s),
            PropertyValue::Int(i) => serializer.serialize_i64(*i),
            PropertyValue::Float(x) => serializer.serialize_f64(*x),
            PropertyValue::DateTime(ts) => serializer.serialize_str(&format_timestamp(ts)),
        }
    }
}

/// RFC 3339 with seconds precision and an explicit `+00:00` offset.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// An entity that is written as a graph node.
pub trait GraphNode {
    /// Node label.
    const LABEL: Label;

    /// Non-key properties, in column order.
    const COLUMNS: &'static [Column];

    /// Primary-key value.
    fn key(&self) -> &str;

    /// Property values aligned with [`GraphNode::COLUMNS`].
    fn values(&self) -> Vec<PropertyValue>;
}

/// One relationship instance, identified by its endpoint keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RelRecord {
    /// Start node key
    pub start: String,
    /// End node key
    pub end: String,
    /// Values aligned with [`RelType::properties`]
    pub properties: Vec<PropertyValue>,
}

impl RelRecord {
    /// Relationship without properties
    pub fn bare(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            properties: Vec::new(),
        }
    }
}
