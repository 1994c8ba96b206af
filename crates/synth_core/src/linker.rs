//! Referential linker.
//!
//! Assigns foreign keys that are not produced alongside an entity: the
//! issuer owning each instrument, and the synthetic correlation peers of
//! each instrument. Sampling into the referenced collection is with
//! replacement (many instruments may share an issuer), except for the
//! correlation peers of one instrument, which are distinct.

use crate::error::{SynthError, SynthResult};
use crate::generators::require_non_empty;
use crate::rng::{round_dp, EntityStream, SynthRng};
use crate::types::{CorrelationEdge, Instrument, Issuer, IssuerLink};

/// Default correlation window label.
pub const DEFAULT_CORRELATION_WINDOW: &str = "30d";

/// Assign one issuer to every instrument.
pub fn link_issuers(
    instruments: &[Instrument],
    issuers: &[Issuer],
    seed: u64,
) -> SynthResult<Vec<IssuerLink>> {
    if instruments.is_empty() {
        return Ok(Vec::new());
    }
    require_non_empty(issuers, "issuer", "instruments")?;

    let mut rng = SynthRng::for_stream(seed, EntityStream::IssuerLinks);
    Ok(instruments
        .iter()
        .map(|instrument| IssuerLink {
            isin: instrument.isin.clone(),
            issuer_id: rng.pick(issuers).issuer_id.clone(),
        })
        .collect())
}

/// Out-degree of every instrument for a given `top_k`.
pub fn correlation_degree(n_instruments: usize, top_k: usize) -> usize {
    top_k.min(n_instruments.saturating_sub(1))
}

/// For every instrument, sample `min(top_k, n - 1)` distinct peers (never
/// itself) and give each edge a coefficient in [-1, 1] at 4 dp.
///
/// # Errors
///
/// [`SynthError::InvalidArgument`] when `top_k > 0` and fewer than two
/// instruments exist.
pub fn generate_correlation_edges(
    instruments: &[Instrument],
    top_k: usize,
    seed: u64,
    window: &str,
) -> SynthResult<Vec<CorrelationEdge>> {
    if top_k == 0 {
        return Ok(Vec::new());
    }
    if instruments.len() < 2 {
        return Err(SynthError::invalid_argument(format!(
            "correlation top-k {} requires at least 2 instruments, got {}",
            top_k,
            instruments.len()
        )));
    }

    let n = instruments.len();
    let degree = correlation_degree(n, top_k);
    let mut rng = SynthRng::for_stream(seed, EntityStream::Correlations);
    let mut edges = Vec::with_capacity(n * degree);

    for (a, instrument) in instruments.iter().enumerate() {
        // Sample over the n - 1 other positions, then skip past `a`.
        for slot in rng.sample_distinct(n - 1, degree) {
            let b = if slot >= a { slot + 1 } else { slot };
            edges.push(CorrelationEdge {
                a_isin: instrument.isin.clone(),
                b_isin: instruments[b].isin.clone(),
                correlation: round_dp(rng.gen_between(-1.0, 1.0), 4),
                window: window.to_string(),
            });
        }
    }

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{generate_instruments, generate_issuers};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_every_instrument_gets_an_existing_issuer() {
        let instruments = generate_instruments(50, 1);
        let issuers = generate_issuers(3, 1);
        let ids: HashSet<_> = issuers.iter().map(|i| i.issuer_id.as_str()).collect();
        let links = link_issuers(&instruments, &issuers, 1).unwrap();
        assert_eq!(links.len(), 50);
        assert!(links.iter().all(|l| ids.contains(l.issuer_id.as_str())));
        for (link, ins) in links.iter().zip(&instruments) {
            assert_eq!(link.isin, ins.isin);
        }
    }

    #[test]
    fn test_instruments_without_issuers_fail() {
        let instruments = generate_instruments(2, 1);
        assert!(matches!(
            link_issuers(&instruments, &[], 1),
            Err(SynthError::InvalidArgument(_))
        ));
        assert!(link_issuers(&[], &[], 1).unwrap().is_empty());
    }

    #[test]
    fn test_correlation_degree_and_no_self_edges() {
        let instruments = generate_instruments(10, 4);
        let edges = generate_correlation_edges(&instruments, 3, 4, "30d").unwrap();
        assert_eq!(edges.len(), 30);

        let mut out: HashMap<&str, HashSet<&str>> = HashMap::new();
        for e in &edges {
            assert_ne!(e.a_isin, e.b_isin);
            assert!((-1.0..=1.0).contains(&e.correlation));
            assert!(out.entry(&e.a_isin).or_default().insert(&e.b_isin));
        }
        assert!(out.values().all(|peers| peers.len() == 3));
    }

    #[test]
    fn test_top_k_larger_than_peers() {
        let instruments = generate_instruments(4, 4);
        let edges = generate_correlation_edges(&instruments, 10, 4, "30d").unwrap();
        assert_eq!(edges.len(), 4 * 3);
    }

    #[test]
    fn test_single_instrument_fails() {
        let instruments = generate_instruments(1, 4);
        let err = generate_correlation_edges(&instruments, 3, 4, "30d").unwrap_err();
        assert!(matches!(err, SynthError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_top_k_needs_no_peers() {
        let instruments = generate_instruments(1, 4);
        assert!(generate_correlation_edges(&instruments, 0, 4, "30d")
            .unwrap()
            .is_empty());
    }
}
