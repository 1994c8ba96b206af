//! Entity records of the synthetic market graph.
//!
//! All records are plain immutable values. Cross-entity references are
//! stored as primary-key strings and are resolved by key, never by position.

mod flow;
mod market;
mod reference;

pub use flow::{Order, Side, Trade};
pub use market::{CorrelationEdge, Event, IssuerLink, Signal};
pub use reference::{AssetClass, Counterparty, Instrument, Issuer};
