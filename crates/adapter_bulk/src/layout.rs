//! File set layout for `neo4j-admin database import`.
//!
//! One CSV per label and one per relationship type. Header cells follow the
//! import tool's conventions: `key:ID(Label)` marks the identifier column of
//! a node file, typed columns carry a `:int`, `:float` or `:datetime`
//! suffix, and relationship files bind their endpoints with
//! `:START_ID(Label)` and `:END_ID(Label)` followed by `:TYPE`.

use serde::{Deserialize, Serialize};
use std::fmt;
use synth_core::schema::{Column, GraphNode, Label, RelType};
use synth_core::types::{Counterparty, Event, Instrument, Issuer, Order, Signal, Trade};

/// Name of the manifest written after every data file.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Whether a file holds nodes or relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Node file
    Node,
    /// Relationship file
    Relationship,
}

/// One file of the bulk-import set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkFile {
    /// Nodes of one label
    Nodes(Label),
    /// Relationships of one type
    Relationships(RelType),
}

impl BulkFile {
    /// Every file in the set, nodes first.
    pub const ALL: [BulkFile; 15] = [
        BulkFile::Nodes(Label::Instrument),
        BulkFile::Nodes(Label::Issuer),
        BulkFile::Nodes(Label::Counterparty),
        BulkFile::Nodes(Label::Order),
        BulkFile::Nodes(Label::Trade),
        BulkFile::Nodes(Label::Signal),
        BulkFile::Nodes(Label::Event),
        BulkFile::Relationships(RelType::IssuedBy),
        BulkFile::Relationships(RelType::PlacedBy),
        BulkFile::Relationships(RelType::OrderOn),
        BulkFile::Relationships(RelType::Executes),
        BulkFile::Relationships(RelType::ExecutesOn),
        BulkFile::Relationships(RelType::AppliesTo),
        BulkFile::Relationships(RelType::Affects),
        BulkFile::Relationships(RelType::CorrelatedWith),
    ];

    /// File name within the output directory.
    pub fn file_name(self) -> &'static str {
        match self {
            BulkFile::Nodes(Label::Instrument) => "instruments.csv",
            BulkFile::Nodes(Label::Issuer) => "issuers.csv",
            BulkFile::Nodes(Label::Counterparty) => "counterparties.csv",
            BulkFile::Nodes(Label::Order) => "orders.csv",
            BulkFile::Nodes(Label::Trade) => "trades.csv",
            BulkFile::Nodes(Label::Signal) => "signals.csv",
            BulkFile::Nodes(Label::Event) => "events.csv",
            BulkFile::Relationships(RelType::IssuedBy) => "inst_issued_by_rel.csv",
            BulkFile::Relationships(RelType::PlacedBy) => "order_rel.csv",
            BulkFile::Relationships(RelType::OrderOn) => "order_instrument_rel.csv",
            BulkFile::Relationships(RelType::Executes) => "trade_rel.csv",
            BulkFile::Relationships(RelType::ExecutesOn) => "trade_instrument_rel.csv",
            BulkFile::Relationships(RelType::AppliesTo) => "signal_rel.csv",
            BulkFile::Relationships(RelType::Affects) => "event_rel.csv",
            BulkFile::Relationships(RelType::CorrelatedWith) => "corr_rel.csv",
        }
    }

    /// Node or relationship file
    pub fn kind(self) -> FileKind {
        match self {
            BulkFile::Nodes(_) => FileKind::Node,
            BulkFile::Relationships(_) => FileKind::Relationship,
        }
    }

    /// Label or relationship type name
    pub fn target(self) -> &'static str {
        match self {
            BulkFile::Nodes(label) => label.name(),
            BulkFile::Relationships(rel) => rel.name(),
        }
    }

    /// Header row.
    pub fn header(self) -> Vec<String> {
        match self {
            BulkFile::Nodes(label) => {
                let mut header = vec![format!("{}:ID({})", label.key_property(), label)];
                header.extend(node_columns(label).iter().map(column_header));
                header
            }
            BulkFile::Relationships(rel) => {
                let mut header = vec![
                    format!(":START_ID({})", rel.start_label()),
                    format!(":END_ID({})", rel.end_label()),
                    ":TYPE".to_string(),
                ];
                header.extend(rel.properties().iter().map(column_header));
                header
            }
        }
    }
}

impl fmt::Display for BulkFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Non-key property columns written for `label`.
pub fn node_columns(label: Label) -> &'static [Column] {
    match label {
        Label::Instrument => Instrument::COLUMNS,
        Label::Issuer => Issuer::COLUMNS,
        Label::Counterparty => Counterparty::COLUMNS,
        Label::Order => Order::COLUMNS,
        Label::Trade => Trade::COLUMNS,
        Label::Signal => Signal::COLUMNS,
        Label::Event => Event::COLUMNS,
    }
}

fn column_header(column: &Column) -> String {
    match column.ty.header_suffix() {
        Some(suffix) => format!("{}:{}", column.name, suffix),
        None => column.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_file_names_are_unique() {
        let names: HashSet<&str> = BulkFile::ALL.iter().map(|f| f.file_name()).collect();
        assert_eq!(names.len(), BulkFile::ALL.len());
        assert!(!names.contains(MANIFEST_FILE));
    }

    #[test]
    fn test_instrument_header() {
        assert_eq!(
            BulkFile::Nodes(Label::Instrument).header(),
            vec![
                "isin:ID(Instrument)",
                "ticker",
                "asset_class",
                "exchange",
                "lot_size:int",
                "currency"
            ]
        );
    }

    #[test]
    fn test_trade_header_has_no_foreign_keys() {
        let header = BulkFile::Nodes(Label::Trade).header();
        assert_eq!(header[0], "trade_id:ID(Trade)");
        assert!(header.contains(&"ts:datetime".to_string()));
        assert!(!header.iter().any(|h| h.contains("order_id")));
    }

    #[test]
    fn test_relationship_headers() {
        assert_eq!(
            BulkFile::Relationships(RelType::PlacedBy).header(),
            vec![":START_ID(Order)", ":END_ID(Counterparty)", ":TYPE"]
        );
        assert_eq!(
            BulkFile::Relationships(RelType::CorrelatedWith).header(),
            vec![
                ":START_ID(Instrument)",
                ":END_ID(Instrument)",
                ":TYPE",
                "corr:float",
                "window"
            ]
        );
    }

    #[test]
    fn test_every_label_and_type_has_a_file() {
        for label in Label::ALL {
            assert!(BulkFile::ALL.contains(&BulkFile::Nodes(label)));
        }
        for rel in RelType::ALL {
            assert!(BulkFile::ALL.contains(&BulkFile::Relationships(rel)));
        }
    }
}
