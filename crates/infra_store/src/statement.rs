//! Structured write statements.
//!
//! A [`Statement`] keeps its rows typed so an in-process store can apply it
//! directly, and renders to Cypher text plus a `$batch` parameter for a
//! remote store. Every name in the rendered text comes from
//! [`synth_core::schema`].

use serde_json::{json, Map, Value};
use synth_core::schema::{Column, GraphNode, Label, PropertyType, PropertyValue, RelRecord, RelType};

/// Key and property values of one node to merge.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    /// Primary-key value
    pub key: String,
    /// Values aligned with the statement's columns
    pub values: Vec<PropertyValue>,
}

impl NodeRow {
    /// Row for a generated entity
    pub fn from_node<N: GraphNode>(node: &N) -> Self {
        Self {
            key: node.key().to_string(),
            values: node.values(),
        }
    }
}

/// One write operation inside a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Uniqueness constraint on a label's key property, created if absent
    CreateConstraint {
        /// Constrained label
        label: Label,
    },
    /// Merge nodes by key, then set their properties
    MergeNodes {
        /// Node label
        label: Label,
        /// Non-key properties
        columns: &'static [Column],
        /// Rows to merge
        rows: Vec<NodeRow>,
    },
    /// Match both endpoints by key, then merge the relationship
    MergeRelationships {
        /// Relationship type
        rel: RelType,
        /// Rows to merge
        rows: Vec<RelRecord>,
    },
}

impl Statement {
    /// Merge statement for a slice of entities
    pub fn merge_nodes<N: GraphNode>(nodes: &[N]) -> Self {
        Statement::MergeNodes {
            label: N::LABEL,
            columns: N::COLUMNS,
            rows: nodes.iter().map(NodeRow::from_node).collect(),
        }
    }

    /// Number of rows written by this statement
    pub fn row_count(&self) -> usize {
        match self {
            Statement::CreateConstraint { .. } => 0,
            Statement::MergeNodes { rows, .. } => rows.len(),
            Statement::MergeRelationships { rows, .. } => rows.len(),
        }
    }

    /// Cypher text
    pub fn cypher(&self) -> String {
        match self {
            Statement::CreateConstraint { label } => format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                label.name(),
                label.key_property()
            ),
            Statement::MergeNodes { label, columns, .. } => {
                let key = label.key_property();
                let mut text = format!(
                    "UNWIND $batch AS row MERGE (n:{} {{{}: row.{}}})",
                    label.name(),
                    key,
                    key
                );
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|c| format!("n.{} = {}", c.name, row_expr(c)))
                    .collect();
                if !assignments.is_empty() {
                    text.push_str(" SET ");
                    text.push_str(&assignments.join(", "));
                }
                text
            }
            Statement::MergeRelationships { rel, .. } => {
                let start = rel.start_label();
                let end = rel.end_label();
                let mut text = format!(
                    "UNWIND $batch AS row MATCH (a:{} {{{}: row.start}}) MATCH (b:{} {{{}: row.end}}) MERGE (a)-[r:{}]->(b)",
                    start.name(),
                    start.key_property(),
                    end.name(),
                    end.key_property(),
                    rel.name()
                );
                let properties = rel.properties();
                if !properties.is_empty() {
                    let mut assignments: Vec<String> = properties
                        .iter()
                        .map(|c| format!("r.{} = {}", c.name, row_expr(c)))
                        .collect();
                    if *rel == RelType::CorrelatedWith {
                        assignments.push("r.last_updated = datetime()".to_string());
                    }
                    text.push_str(" SET ");
                    text.push_str(&assignments.join(", "));
                }
                text
            }
        }
    }

    /// Statement parameters: `{"batch": [...]}`, or `{}` for constraints.
    pub fn parameters(&self) -> Value {
        match self {
            Statement::CreateConstraint { .. } => json!({}),
            Statement::MergeNodes { label, columns, rows } => {
                let batch: Vec<Value> = rows
                    .iter()
                    .map(|row| {
                        let mut object = Map::new();
                        object.insert(label.key_property().to_string(), Value::from(row.key.clone()));
                        for (column, value) in columns.iter().zip(&row.values) {
                            object.insert(column.name.to_string(), to_json(value));
                        }
                        Value::Object(object)
                    })
                    .collect();
                json!({ "batch": batch })
            }
            Statement::MergeRelationships { rel, rows } => {
                let batch: Vec<Value> = rows
                    .iter()
                    .map(|row| {
                        let mut object = Map::new();
                        object.insert("start".to_string(), Value::from(row.start.clone()));
                        object.insert("end".to_string(), Value::from(row.end.clone()));
                        for (column, value) in rel.properties().iter().zip(&row.properties) {
                            object.insert(column.name.to_string(), to_json(value));
                        }
                        Value::Object(object)
                    })
                    .collect();
                json!({ "batch": batch })
            }
        }
    }
}

fn row_expr(column: &Column) -> String {
    match column.ty {
        PropertyType::DateTime => format!("datetime(row.{})", column.name),
        _ => format!("row.{}", column.name),
    }
}

fn to_json(value: &PropertyValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use synth_core::types::{AssetClass, CorrelationEdge, Instrument, Order, Side};

    fn instrument() -> Instrument {
        Instrument {
            isin: "US0000000010".to_string(),
            ticker: "ABC".to_string(),
            asset_class: AssetClass::Equity,
            exchange: "NYSE".to_string(),
            lot_size: 100,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_constraint_cypher() {
        let stmt = Statement::CreateConstraint { label: Label::Counterparty };
        assert_eq!(
            stmt.cypher(),
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Counterparty) REQUIRE n.id IS UNIQUE"
        );
        assert_eq!(stmt.parameters(), json!({}));
    }

    #[test]
    fn test_node_merge_cypher_and_parameters() {
        let stmt = Statement::merge_nodes(&[instrument()]);
        assert_eq!(
            stmt.cypher(),
            "UNWIND $batch AS row MERGE (n:Instrument {isin: row.isin}) SET n.ticker = row.ticker, \
             n.asset_class = row.asset_class, n.exchange = row.exchange, n.lot_size = row.lot_size, \
             n.currency = row.currency"
        );
        assert_eq!(
            stmt.parameters(),
            json!({"batch": [{
                "isin": "US0000000010",
                "ticker": "ABC",
                "asset_class": "equity",
                "exchange": "NYSE",
                "lot_size": 100,
                "currency": "USD"
            }]})
        );
    }

    #[test]
    fn test_datetime_columns_use_datetime_function() {
        let order = Order {
            order_id: "O-00000000".to_string(),
            side: Side::Buy,
            quantity: 100,
            price: 10.5,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 13, 9, 30, 0).unwrap(),
            counterparty_id: "CP-0000000".to_string(),
            isin: "US0000000010".to_string(),
        };
        let stmt = Statement::merge_nodes(&[order]);
        assert!(stmt.cypher().contains("n.ts = datetime(row.ts)"));
        assert_eq!(stmt.parameters()["batch"][0]["ts"], "2024-06-13T09:30:00+00:00");
    }

    #[test]
    fn test_correlation_merge_sets_properties() {
        let edge = CorrelationEdge {
            a_isin: "US0000000010".to_string(),
            b_isin: "GB0000000011".to_string(),
            correlation: -0.25,
            window: "30d".to_string(),
        };
        let stmt = Statement::MergeRelationships {
            rel: RelType::CorrelatedWith,
            rows: vec![RelRecord::from(&edge)],
        };
        assert_eq!(
            stmt.cypher(),
            "UNWIND $batch AS row MATCH (a:Instrument {isin: row.start}) \
             MATCH (b:Instrument {isin: row.end}) MERGE (a)-[r:CORRELATED_WITH]->(b) \
             SET r.corr = row.corr, r.window = row.window, r.last_updated = datetime()"
        );
        assert_eq!(
            stmt.parameters(),
            json!({"batch": [{"start": "US0000000010", "end": "GB0000000011", "corr": -0.25, "window": "30d"}]})
        );
    }

    #[test]
    fn test_plain_relationship_has_no_set() {
        let stmt = Statement::MergeRelationships {
            rel: RelType::Executes,
            rows: vec![RelRecord::bare("T-000000000", "O-00000000")],
        };
        let text = stmt.cypher();
        assert!(text.contains("MATCH (a:Trade {trade_id: row.start})"));
        assert!(text.contains("MATCH (b:Order {order_id: row.end})"));
        assert!(text.ends_with("MERGE (a)-[r:EXECUTES]->(b)"));
        assert_eq!(stmt.row_count(), 1);
    }
}
