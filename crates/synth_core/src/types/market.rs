//! Instrument-level observations and instrument links.

use crate::schema::{Column, GraphNode, Label, PropertyType, PropertyValue, RelRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A quantitative signal reading on an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal identifier (`SIG-00000000`)
    pub signal_id: String,
    /// Signal family name
    pub name: String,
    /// Score in [-3, 3], 4 dp
    pub score: f64,
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Instrument the signal applies to
    pub isin: String,
}

impl GraphNode for Signal {
    const LABEL: Label = Label::Signal;
    const COLUMNS: &'static [Column] = &[
        Column::new("name", PropertyType::String),
        Column::new("score", PropertyType::Float),
        Column::new("ts", PropertyType::DateTime),
    ];

    fn key(&self) -> &str {
        &self.signal_id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.name.clone()),
            PropertyValue::Float(self.score),
            PropertyValue::DateTime(self.timestamp),
        ]
    }
}

/// A corporate or market event affecting an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier (`E-00000000`)
    pub event_id: String,
    /// Event type
    pub event_type: String,
    /// Sentiment in [-1, 1], 4 dp
    pub sentiment: f64,
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Affected instrument
    pub isin: String,
}

impl GraphNode for Event {
    const LABEL: Label = Label::Event;
    const COLUMNS: &'static [Column] = &[
        Column::new("type", PropertyType::String),
        Column::new("sentiment", PropertyType::Float),
        Column::new("ts", PropertyType::DateTime),
    ];

    fn key(&self) -> &str {
        &self.event_id
    }

    fn values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::Str(self.event_type.clone()),
            PropertyValue::Float(self.sentiment),
            PropertyValue::DateTime(self.timestamp),
        ]
    }
}

/// Instrument to issuer assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerLink {
    /// Issued instrument
    pub isin: String,
    /// Owning issuer
    pub issuer_id: String,
}

impl From<&IssuerLink> for RelRecord {
    fn from(link: &IssuerLink) -> Self {
        RelRecord::bare(link.isin.clone(), link.issuer_id.clone())
    }
}

/// Synthetic directed correlation between two distinct instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEdge {
    /// Source instrument
    pub a_isin: String,
    /// Peer instrument, never equal to `a_isin`
    pub b_isin: String,
    /// Coefficient in [-1, 1], 4 dp
    pub correlation: f64,
    /// Window label, e.g. `30d`
    pub window: String,
}

impl From<&CorrelationEdge> for RelRecord {
    fn from(edge: &CorrelationEdge) -> Self {
        RelRecord {
            start: edge.a_isin.clone(),
            end: edge.b_isin.clone(),
            properties: vec![
                PropertyValue::Float(edge.correlation),
                PropertyValue::Str(edge.window.clone()),
            ],
        }
    }
}
