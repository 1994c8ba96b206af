//! Dataset assembly.
//!
//! [`assemble`] runs the generators and the linker in dependency order and
//! freezes the result into a [`Dataset`]:
//!
//! ```text
//! instruments ─┬─ issuers ──────────── issuer links
//!              ├─ counterparties ─┬─ orders ── trades
//!              └──────────────────┘
//! instruments ── signals, events, correlation edges
//! ```
//!
//! Independent branches run in parallel with rayon. Every generator owns a
//! fixed sub-seed, so the parallel schedule cannot change any value.

use crate::error::{checked_count, SynthError, SynthResult};
use crate::generators::{
    derived_order_count, generate_counterparties, generate_events, generate_instruments,
    generate_issuers, generate_orders, generate_signals, generate_trades, LookbackWindows,
    TradingWindow, ISIN_SEQUENCE_LIMIT, TRADE_PRICE_JITTER,
};
use crate::linker::{generate_correlation_edges, link_issuers, DEFAULT_CORRELATION_WINDOW};
use crate::schema::{GraphNode, Label, RelRecord, RelType};
use crate::types::{
    Counterparty, CorrelationEdge, Event, Instrument, Issuer, IssuerLink, Order, Signal, Trade,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Default ratio between requested trades and derived orders.
pub const DEFAULT_AVG_TRADES_PER_ORDER: f64 = 1.5;

/// Requested collection sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Instruments
    pub instruments: usize,
    /// Issuers
    pub issuers: usize,
    /// Counterparties
    pub counterparties: usize,
    /// Trades (orders are derived from this)
    pub trades: usize,
    /// Signals
    pub signals: usize,
    /// Events
    pub events: usize,
}

/// Generation request as received from callers, with signed counts.
///
/// Validate into [`GenerationParams`] with [`GenerationRequest::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Run seed
    pub seed: i64,
    /// Number of instruments
    pub n_instruments: i64,
    /// Number of issuers
    pub n_issuers: i64,
    /// Number of counterparties
    pub n_counterparties: i64,
    /// Number of trades
    pub n_trades: i64,
    /// Number of signals
    pub n_signals: i64,
    /// Number of events
    pub n_events: i64,
    /// Correlation peers per instrument
    pub corr_top_k: i64,
    /// Trades per order, on average
    pub avg_trades_per_order: f64,
    /// Correlation window label
    pub corr_window: String,
    /// Anchor date for timestamps
    pub as_of: NaiveDate,
    /// Lookback per timestamped class
    pub lookbacks: LookbackWindows,
}

impl GenerationRequest {
    /// Check every argument and produce validated parameters.
    ///
    /// # Errors
    ///
    /// [`SynthError::InvalidArgument`] for negative counts or top-k, a
    /// non-positive trades-per-order ratio, or a combination that would
    /// leave a foreign key without a target.
    pub fn validate(&self) -> SynthResult<GenerationParams> {
        let counts = EntityCounts {
            instruments: checked_count("n_instruments", self.n_instruments)?,
            issuers: checked_count("n_issuers", self.n_issuers)?,
            counterparties: checked_count("n_counterparties", self.n_counterparties)?,
            trades: checked_count("n_trades", self.n_trades)?,
            signals: checked_count("n_signals", self.n_signals)?,
            events: checked_count("n_events", self.n_events)?,
        };
        let params = GenerationParams {
            seed: self.seed as u64,
            counts,
            corr_top_k: checked_count("corr_top_k", self.corr_top_k)?,
            avg_trades_per_order: self.avg_trades_per_order,
            corr_window: self.corr_window.clone(),
            as_of: self.as_of,
            lookbacks: self.lookbacks,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Validated generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Run seed
    pub seed: u64,
    /// Collection sizes
    pub counts: EntityCounts,
    /// Correlation peers per instrument
    pub corr_top_k: usize,
    /// Trades per order, on average
    pub avg_trades_per_order: f64,
    /// Correlation window label
    pub corr_window: String,
    /// Anchor date for timestamps
    pub as_of: NaiveDate,
    /// Lookback per timestamped class
    pub lookbacks: LookbackWindows,
}

impl GenerationParams {
    /// Parameters with default ratio, window label and lookbacks.
    pub fn new(seed: u64, counts: EntityCounts, corr_top_k: usize, as_of: NaiveDate) -> Self {
        Self {
            seed,
            counts,
            corr_top_k,
            avg_trades_per_order: DEFAULT_AVG_TRADES_PER_ORDER,
            corr_window: DEFAULT_CORRELATION_WINDOW.to_string(),
            as_of,
            lookbacks: LookbackWindows::default(),
        }
    }

    /// Orders implied by the trade count.
    pub fn order_count(&self) -> usize {
        derived_order_count(self.counts.trades, self.avg_trades_per_order)
    }

    /// Reject combinations that cannot produce a consistent graph.
    ///
    /// This runs before any generator, so a bad request fails without work.
    pub fn validate(&self) -> SynthResult<()> {
        let c = &self.counts;
        if !(self.avg_trades_per_order.is_finite() && self.avg_trades_per_order > 0.0) {
            return Err(SynthError::invalid_argument(format!(
                "avg_trades_per_order must be positive, got {}",
                self.avg_trades_per_order
            )));
        }
        if c.instruments > ISIN_SEQUENCE_LIMIT {
            return Err(SynthError::invalid_argument(format!(
                "n_instruments must be at most {}, got {}",
                ISIN_SEQUENCE_LIMIT, c.instruments
            )));
        }
        if c.instruments > 0 && c.issuers == 0 {
            return Err(SynthError::invalid_argument(
                "instruments require at least one issuer",
            ));
        }
        if c.trades > 0 && (c.instruments == 0 || c.counterparties == 0) {
            return Err(SynthError::invalid_argument(
                "trades require at least one instrument and one counterparty",
            ));
        }
        if (c.signals > 0 || c.events > 0) && c.instruments == 0 {
            return Err(SynthError::invalid_argument(
                "signals and events require at least one instrument",
            ));
        }
        if self.corr_top_k > 0 && c.instruments < 2 {
            return Err(SynthError::invalid_argument(format!(
                "correlation top-k {} requires at least 2 instruments, got {}",
                self.corr_top_k, c.instruments
            )));
        }
        Ok(())
    }

    fn window(&self, lookback_days: u32) -> TradingWindow {
        TradingWindow::new(self.as_of, lookback_days)
    }
}

/// Immutable aggregate of one generation run.
///
/// Built only by [`assemble`]; read-only afterwards and safe to share
/// across threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    params: GenerationParams,
    instruments: Vec<Instrument>,
    issuers: Vec<Issuer>,
    counterparties: Vec<Counterparty>,
    issuer_links: Vec<IssuerLink>,
    orders: Vec<Order>,
    trades: Vec<Trade>,
    signals: Vec<Signal>,
    events: Vec<Event>,
    correlation_edges: Vec<CorrelationEdge>,
}

/// Build a dataset.
///
/// # Errors
///
/// [`SynthError::InvalidArgument`] when the parameters are inconsistent.
pub fn assemble(params: &GenerationParams) -> SynthResult<Dataset> {
    params.validate()?;
    let seed = params.seed;
    let counts = params.counts;

    let (instruments, (issuers, counterparties)) = rayon::join(
        || generate_instruments(counts.instruments, seed),
        || {
            rayon::join(
                || generate_issuers(counts.issuers, seed),
                || generate_counterparties(counts.counterparties, seed),
            )
        },
    );
    debug!(
        instruments = instruments.len(),
        issuers = issuers.len(),
        counterparties = counterparties.len(),
        "Reference data generated"
    );

    let (issuer_links, orders) = rayon::join(
        || link_issuers(&instruments, &issuers, seed),
        || {
            generate_orders(
                params.order_count(),
                &instruments,
                &counterparties,
                seed,
                params.window(params.lookbacks.orders),
            )
        },
    );
    let (issuer_links, orders) = (issuer_links?, orders?);

    let ((trades, signals), (events, correlation_edges)) = rayon::join(
        || {
            rayon::join(
                || generate_trades(counts.trades, &orders, seed, params.window(params.lookbacks.trades)),
                || generate_signals(counts.signals, &instruments, seed, params.window(params.lookbacks.signals)),
            )
        },
        || {
            rayon::join(
                || generate_events(counts.events, &instruments, seed, params.window(params.lookbacks.events)),
                || generate_correlation_edges(&instruments, params.corr_top_k, seed, &params.corr_window),
            )
        },
    );

    let dataset = Dataset {
        params: params.clone(),
        instruments,
        issuers,
        counterparties,
        issuer_links,
        orders,
        trades: trades?,
        signals: signals?,
        events: events?,
        correlation_edges: correlation_edges?,
    };

    info!(
        seed,
        instruments = dataset.instruments.len(),
        issuers = dataset.issuers.len(),
        counterparties = dataset.counterparties.len(),
        orders = dataset.orders.len(),
        trades = dataset.trades.len(),
        signals = dataset.signals.len(),
        events = dataset.events.len(),
        correlation_edges = dataset.correlation_edges.len(),
        "Dataset assembled"
    );

    Ok(dataset)
}

impl Dataset {
    /// Parameters the dataset was built from
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Instruments
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Issuers
    pub fn issuers(&self) -> &[Issuer] {
        &self.issuers
    }

    /// Counterparties
    pub fn counterparties(&self) -> &[Counterparty] {
        &self.counterparties
    }

    /// Instrument to issuer assignments
    pub fn issuer_links(&self) -> &[IssuerLink] {
        &self.issuer_links
    }

    /// Orders
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Trades
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Signals
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Correlation edges
    pub fn correlation_edges(&self) -> &[CorrelationEdge] {
        &self.correlation_edges
    }

    /// Number of nodes carrying `label`.
    pub fn node_count(&self, label: Label) -> usize {
        match label {
            Label::Instrument => self.instruments.len(),
            Label::Issuer => self.issuers.len(),
            Label::Counterparty => self.counterparties.len(),
            Label::Order => self.orders.len(),
            Label::Trade => self.trades.len(),
            Label::Signal => self.signals.len(),
            Label::Event => self.events.len(),
        }
    }

    /// Number of relationships of type `rel`.
    pub fn relationship_count(&self, rel: RelType) -> usize {
        match rel {
            RelType::IssuedBy => self.issuer_links.len(),
            RelType::PlacedBy | RelType::OrderOn => self.orders.len(),
            RelType::Executes | RelType::ExecutesOn => self.trades.len(),
            RelType::AppliesTo => self.signals.len(),
            RelType::Affects => self.events.len(),
            RelType::CorrelatedWith => self.correlation_edges.len(),
        }
    }

    /// Nodes across all labels
    pub fn total_nodes(&self) -> usize {
        Label::ALL.iter().map(|&label| self.node_count(label)).sum()
    }

    /// Relationships across all types
    pub fn total_relationships(&self) -> usize {
        RelType::ALL.iter().map(|&rel| self.relationship_count(rel)).sum()
    }

    /// Primary keys of all nodes carrying `label`, in generation order.
    pub fn keys(&self, label: Label) -> Vec<&str> {
        fn keys_of<N: GraphNode>(nodes: &[N]) -> Vec<&str> {
            nodes.iter().map(GraphNode::key).collect()
        }
        match label {
            Label::Instrument => keys_of(&self.instruments),
            Label::Issuer => keys_of(&self.issuers),
            Label::Counterparty => keys_of(&self.counterparties),
            Label::Order => keys_of(&self.orders),
            Label::Trade => keys_of(&self.trades),
            Label::Signal => keys_of(&self.signals),
            Label::Event => keys_of(&self.events),
        }
    }

    /// All relationship instances of one type, in generation order.
    pub fn relationships(&self, rel: RelType) -> Vec<RelRecord> {
        match rel {
            RelType::IssuedBy => self.issuer_links.iter().map(RelRecord::from).collect(),
            RelType::PlacedBy => self
                .orders
                .iter()
                .map(|o| RelRecord::bare(o.order_id.clone(), o.counterparty_id.clone()))
                .collect(),
            RelType::OrderOn => self
                .orders
                .iter()
                .map(|o| RelRecord::bare(o.order_id.clone(), o.isin.clone()))
                .collect(),
            RelType::Executes => self
                .trades
                .iter()
                .map(|t| RelRecord::bare(t.trade_id.clone(), t.order_id.clone()))
                .collect(),
            RelType::ExecutesOn => self
                .trades
                .iter()
                .map(|t| RelRecord::bare(t.trade_id.clone(), t.isin.clone()))
                .collect(),
            RelType::AppliesTo => self
                .signals
                .iter()
                .map(|s| RelRecord::bare(s.signal_id.clone(), s.isin.clone()))
                .collect(),
            RelType::Affects => self
                .events
                .iter()
                .map(|e| RelRecord::bare(e.event_id.clone(), e.isin.clone()))
                .collect(),
            RelType::CorrelatedWith => self.correlation_edges.iter().map(RelRecord::from).collect(),
        }
    }

    /// Re-check every foreign key, primary-key uniqueness and the trade
    /// bounds against the parent order.
    pub fn verify_references(&self) -> SynthResult<()> {
        let mut key_sets: HashMap<Label, HashSet<&str>> = HashMap::new();
        for label in Label::ALL {
            let keys = self.keys(label);
            let set: HashSet<&str> = keys.iter().copied().collect();
            if set.len() != keys.len() {
                return Err(SynthError::invariant(format!(
                    "duplicate primary keys among {} nodes",
                    label
                )));
            }
            key_sets.insert(label, set);
        }

        for rel in RelType::ALL {
            let starts = &key_sets[&rel.start_label()];
            let ends = &key_sets[&rel.end_label()];
            for record in self.relationships(rel) {
                if !starts.contains(record.start.as_str()) {
                    return Err(SynthError::invariant(format!(
                        "{} relationship starts at missing {} {}",
                        rel,
                        rel.start_label(),
                        record.start
                    )));
                }
                if !ends.contains(record.end.as_str()) {
                    return Err(dangling(rel.start_label(), &record.start, rel.end_label(), &record.end));
                }
                if rel == RelType::CorrelatedWith && record.start == record.end {
                    return Err(SynthError::invariant(format!(
                        "self correlation edge on {}",
                        record.start
                    )));
                }
            }
        }

        let orders: HashMap<&str, &Order> =
            self.orders.iter().map(|o| (o.order_id.as_str(), o)).collect();
        for trade in &self.trades {
            let Some(order) = orders.get(trade.order_id.as_str()) else {
                return Err(dangling(Label::Trade, &trade.trade_id, Label::Order, &trade.order_id));
            };
            if trade.quantity > order.quantity {
                return Err(SynthError::invariant(format!(
                    "trade {} quantity {} exceeds order quantity {}",
                    trade.trade_id, trade.quantity, order.quantity
                )));
            }
            if (trade.price - order.price).abs() / order.price > TRADE_PRICE_JITTER + 1e-9 {
                return Err(SynthError::invariant(format!(
                    "trade {} price {} too far from order price {}",
                    trade.trade_id, trade.price, order.price
                )));
            }
            if trade.isin != order.isin {
                return Err(SynthError::invariant(format!(
                    "trade {} instrument differs from order {}",
                    trade.trade_id, order.order_id
                )));
            }
        }

        Ok(())
    }
}

fn dangling(entity: Label, id: &str, target: Label, target_id: &str) -> SynthError {
    SynthError::DanglingReference {
        entity: entity.name(),
        id: id.to_string(),
        target: target.name(),
        target_id: target_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            seed: 1,
            n_instruments: 10,
            n_issuers: 2,
            n_counterparties: 3,
            n_trades: 20,
            n_signals: 5,
            n_events: 5,
            corr_top_k: 3,
            avg_trades_per_order: DEFAULT_AVG_TRADES_PER_ORDER,
            corr_window: "30d".to_string(),
            as_of: as_of(),
            lookbacks: LookbackWindows::default(),
        }
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut req = request();
        req.n_signals = -1;
        assert!(matches!(req.validate(), Err(SynthError::InvalidArgument(m)) if m.contains("n_signals")));

        let mut req = request();
        req.corr_top_k = -2;
        assert!(matches!(req.validate(), Err(SynthError::InvalidArgument(m)) if m.contains("corr_top_k")));
    }

    #[test]
    fn test_non_positive_ratio_rejected() {
        let mut req = request();
        req.avg_trades_per_order = 0.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_relationships_match_collections() {
        let dataset = assemble(&request().validate().unwrap()).unwrap();
        assert_eq!(dataset.relationships(RelType::IssuedBy).len(), 10);
        assert_eq!(dataset.relationships(RelType::PlacedBy).len(), dataset.orders().len());
        assert_eq!(dataset.relationships(RelType::ExecutesOn).len(), 20);
        assert_eq!(dataset.relationships(RelType::CorrelatedWith).len(), 30);
        assert_eq!(dataset.keys(Label::Trade).len(), 20);
        for rel in RelType::ALL {
            assert_eq!(dataset.relationship_count(rel), dataset.relationships(rel).len());
        }
        assert_eq!(dataset.total_nodes(), 10 + 2 + 3 + dataset.orders().len() + 20 + 5 + 5);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut dataset = assemble(&request().validate().unwrap()).unwrap();
        assert!(dataset.verify_references().is_ok());
        dataset.trades[0].order_id = "O-99999999".to_string();
        assert!(matches!(
            dataset.verify_references(),
            Err(SynthError::DanglingReference { target: "Order", .. })
        ));
    }

    #[test]
    fn test_verify_reports_missing_start_node() {
        let mut dataset = assemble(&request().validate().unwrap()).unwrap();
        let removed = dataset.instruments.remove(0);
        match dataset.verify_references() {
            Err(SynthError::InvariantViolation(message)) => {
                assert!(message.contains("ISSUED_BY"));
                assert!(message.contains(&removed.isin));
            }
            other => panic!("Expected missing start node, got {:?}", other),
        }
    }

    #[test]
    fn test_instrument_count_is_capped_by_isin_width() {
        let counts = EntityCounts {
            instruments: ISIN_SEQUENCE_LIMIT + 1,
            issuers: 1,
            ..Default::default()
        };
        let params = GenerationParams::new(0, counts, 0, as_of());
        assert!(matches!(
            params.validate(),
            Err(SynthError::InvalidArgument(m)) if m.contains("n_instruments")
        ));
    }

    #[test]
    fn test_empty_run_is_valid() {
        let params = GenerationParams::new(0, EntityCounts::default(), 0, as_of());
        let dataset = assemble(&params).unwrap();
        assert_eq!(dataset.total_nodes(), 0);
        assert_eq!(dataset.total_relationships(), 0);
        assert!(dataset.verify_references().is_ok());
    }
}
