//! Deterministic entity generators.
//!
//! Each generator takes a count, the run seed and (where it links to other
//! collections) the already-built referenced collections. It derives its own
//! [`SynthRng`] from the seed via its [`EntityStream`], so generators are
//! independent of each other's counts and of the order they run in.
//!
//! A count of zero yields an empty collection. Referencing an empty
//! collection with a non-zero count is an [`SynthError::InvalidArgument`].

mod names;
mod timestamps;

pub use names::{company_name, isin, ISIN_SEQUENCE_LIMIT};
pub use timestamps::{LookbackWindows, TradingWindow, SESSION_LENGTH_SECS, SESSION_OPEN_SECS};

use crate::error::{SynthError, SynthResult};
use crate::rng::{round_dp, EntityStream, SynthRng};
use crate::types::{
    AssetClass, Counterparty, Event, Instrument, Issuer, Order, Side, Signal, Trade,
};

const ISIN_PREFIXES: &[&str] = &["US", "GB", "EU", "JP"];
const EXCHANGES: &[&str] = &["NASDAQ", "NYSE", "CBOE", "LSE"];
const CURRENCIES: &[&str] = &["USD", "EUR", "GBP"];
const LOT_SIZES: &[u32] = &[1, 10, 100];
const SECTORS: &[&str] = &["Technology", "Financials", "Healthcare", "Energy", "Industrial"];
const COUNTRIES: &[&str] = &["US", "GB", "DE", "JP", "CN"];
const LEGAL_SUFFIXES: &[&str] = &["LLC", "Ltd", "Group", "Inc"];
const ORDER_QUANTITIES: &[u32] = &[100, 200, 500, 1000];
const VENUES: &[&str] = &["NASDAQ", "NYSE", "CBOE", "ARCA"];
const SIGNAL_NAMES: &[&str] = &["momentum", "value", "quality", "low_vol"];
const EVENT_TYPES: &[&str] = &["earnings", "merger", "regulatory", "downgrade", "upgrade"];

/// Order price range in cents (10.00 to 1000.00).
const ORDER_PRICE_CENTS: (i64, i64) = (1_000, 100_000);

/// Maximum relative distance of a trade price from its order price.
pub const TRADE_PRICE_JITTER: f64 = 0.002;

pub(crate) fn require_non_empty<T>(items: &[T], what: &str, needed_by: &str) -> SynthResult<()> {
    if items.is_empty() {
        return Err(SynthError::invalid_argument(format!(
            "{needed_by} require at least one {what}"
        )));
    }
    Ok(())
}

/// Generate `count` instruments.
pub fn generate_instruments(count: usize, seed: u64) -> Vec<Instrument> {
    let mut rng = SynthRng::for_stream(seed, EntityStream::Instruments);
    (0..count)
        .map(|i| {
            let prefix = *rng.pick(ISIN_PREFIXES);
            let ticker_len = 3 + rng.gen_index(3);
            Instrument {
                isin: isin(prefix, i),
                ticker: rng.gen_upper(ticker_len),
                asset_class: *rng.pick(&AssetClass::ALL),
                exchange: rng.pick(EXCHANGES).to_string(),
                lot_size: *rng.pick(LOT_SIZES),
                currency: rng.pick(CURRENCIES).to_string(),
            }
        })
        .collect()
}

/// Generate `count` issuers.
pub fn generate_issuers(count: usize, seed: u64) -> Vec<Issuer> {
    let mut rng = SynthRng::for_stream(seed, EntityStream::Issuers);
    (0..count)
        .map(|i| Issuer {
            issuer_id: format!("ISS-{:06}", i),
            name: company_name(&mut rng),
            country: rng.pick(COUNTRIES).to_string(),
            sector: rng.pick(SECTORS).to_string(),
        })
        .collect()
}

/// Generate `count` counterparties.
pub fn generate_counterparties(count: usize, seed: u64) -> Vec<Counterparty> {
    let mut rng = SynthRng::for_stream(seed, EntityStream::Counterparties);
    (0..count)
        .map(|i| {
            let legal_name = format!("{} {}", company_name(&mut rng), rng.pick(LEGAL_SUFFIXES));
            Counterparty {
                id: format!("CP-{:07}", i),
                legal_name,
                kyc_score: round_dp(rng.gen_uniform() * 100.0, 2),
            }
        })
        .collect()
}

/// Number of orders backing `n_trades` trades.
///
/// Zero trades need no orders; otherwise at least one order is created.
pub fn derived_order_count(n_trades: usize, avg_trades_per_order: f64) -> usize {
    if n_trades == 0 {
        return 0;
    }
    ((n_trades as f64 / avg_trades_per_order).floor() as usize).max(1)
}

/// Generate `count` orders, each placed by a sampled counterparty on a
/// sampled instrument.
pub fn generate_orders(
    count: usize,
    instruments: &[Instrument],
    counterparties: &[Counterparty],
    seed: u64,
    window: TradingWindow,
) -> SynthResult<Vec<Order>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    require_non_empty(instruments, "instrument", "orders")?;
    require_non_empty(counterparties, "counterparty", "orders")?;

    let mut rng = SynthRng::for_stream(seed, EntityStream::Orders);
    Ok((0..count)
        .map(|i| {
            let instrument = rng.pick(instruments);
            let counterparty = rng.pick(counterparties);
            let cents = rng.gen_int(ORDER_PRICE_CENTS.0, ORDER_PRICE_CENTS.1);
            Order {
                order_id: format!("O-{:08}", i),
                side: *rng.pick(&Side::ALL),
                quantity: *rng.pick(ORDER_QUANTITIES),
                price: cents as f64 / 100.0,
                timestamp: window.sample(&mut rng),
                counterparty_id: counterparty.id.clone(),
                isin: instrument.isin.clone(),
            }
        })
        .collect())
}

/// Generate `count` trades, each executing a sampled order.
///
/// Trades inherit their order's instrument. Price is the order price moved
/// by at most [`TRADE_PRICE_JITTER`], computed in whole cents so the bound
/// survives rounding; quantity is a fraction of the order quantity.
pub fn generate_trades(
    count: usize,
    orders: &[Order],
    seed: u64,
    window: TradingWindow,
) -> SynthResult<Vec<Trade>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    require_non_empty(orders, "order", "trades")?;

    let mut rng = SynthRng::for_stream(seed, EntityStream::Trades);
    Ok((0..count)
        .map(|i| {
            let order = rng.pick(orders);
            let order_cents = (order.price * 100.0).round() as i64;
            let max_delta = order_cents * 2 / 1000;
            let jitter = rng.gen_between(-TRADE_PRICE_JITTER, TRADE_PRICE_JITTER);
            let delta = ((order_cents as f64 * jitter).trunc() as i64).clamp(-max_delta, max_delta);
            let fill = rng.gen_between(0.1, 1.0);
            let quantity = ((f64::from(order.quantity) * fill).floor() as u32).clamp(1, order.quantity);
            Trade {
                trade_id: format!("T-{:09}", i),
                price: (order_cents + delta) as f64 / 100.0,
                quantity,
                timestamp: window.sample(&mut rng),
                venue: rng.pick(VENUES).to_string(),
                order_id: order.order_id.clone(),
                isin: order.isin.clone(),
            }
        })
        .collect())
}

/// Generate `count` signals on sampled instruments.
pub fn generate_signals(
    count: usize,
    instruments: &[Instrument],
    seed: u64,
    window: TradingWindow,
) -> SynthResult<Vec<Signal>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    require_non_empty(instruments, "instrument", "signals")?;

    let mut rng = SynthRng::for_stream(seed, EntityStream::Signals);
    Ok((0..count)
        .map(|i| {
            let instrument = rng.pick(instruments);
            Signal {
                signal_id: format!("SIG-{:08}", i),
                name: rng.pick(SIGNAL_NAMES).to_string(),
                score: round_dp(rng.gen_between(-3.0, 3.0), 4),
                timestamp: window.sample(&mut rng),
                isin: instrument.isin.clone(),
            }
        })
        .collect())
}

/// Generate `count` events on sampled instruments.
pub fn generate_events(
    count: usize,
    instruments: &[Instrument],
    seed: u64,
    window: TradingWindow,
) -> SynthResult<Vec<Event>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    require_non_empty(instruments, "instrument", "events")?;

    let mut rng = SynthRng::for_stream(seed, EntityStream::Events);
    Ok((0..count)
        .map(|i| {
            let instrument = rng.pick(instruments);
            Event {
                event_id: format!("E-{:08}", i),
                event_type: rng.pick(EVENT_TYPES).to_string(),
                sentiment: round_dp(rng.gen_between(-1.0, 1.0), 4),
                timestamp: window.sample(&mut rng),
                isin: instrument.isin.clone(),
            }
        })
        .collect())
}
