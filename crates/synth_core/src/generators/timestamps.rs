//! Trading-hours timestamp sampling.
//!
//! Timestamps fall on one of the `lookback_days` calendar days before the
//! as-of date, uniformly within 09:30 to 16:00 UTC. Calendars and holidays
//! are not modelled.

use crate::rng::SynthRng;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Session open, seconds after midnight UTC (09:30).
pub const SESSION_OPEN_SECS: i64 = 9 * 3600 + 30 * 60;

/// Session length in seconds (09:30 to 16:00).
pub const SESSION_LENGTH_SECS: i64 = 6 * 3600 + 30 * 60;

/// Lookback per timestamped entity class, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindows {
    /// Orders
    pub orders: u32,
    /// Trades
    pub trades: u32,
    /// Signals
    pub signals: u32,
    /// Events
    pub events: u32,
}

impl Default for LookbackWindows {
    fn default() -> Self {
        Self {
            orders: 7,
            trades: 7,
            signals: 30,
            events: 90,
        }
    }
}

/// Sampling window anchored on an as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    as_of: NaiveDate,
    lookback_days: u32,
}

impl TradingWindow {
    /// Window covering `lookback_days` days before `as_of` (at least one day).
    pub fn new(as_of: NaiveDate, lookback_days: u32) -> Self {
        Self {
            as_of,
            lookback_days: lookback_days.max(1),
        }
    }

    /// Draw one timestamp.
    pub fn sample(&self, rng: &mut SynthRng) -> DateTime<Utc> {
        let days_back = rng.gen_int(1, i64::from(self.lookback_days));
        let secs = rng.gen_int(0, SESSION_LENGTH_SECS);
        let day = self
            .as_of
            .checked_sub_days(Days::new(days_back.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN);
        let open = day.and_time(NaiveTime::MIN) + TimeDelta::seconds(SESSION_OPEN_SECS);
        (open + TimeDelta::seconds(secs)).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_samples_fall_in_session_and_lookback() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let window = TradingWindow::new(as_of, 7);
        let mut rng = SynthRng::from_seed(11);
        for _ in 0..500 {
            let ts = window.sample(&mut rng);
            let secs = i64::from(ts.num_seconds_from_midnight());
            assert!(secs >= SESSION_OPEN_SECS);
            assert!(secs <= SESSION_OPEN_SECS + SESSION_LENGTH_SECS);
            let day = ts.date_naive();
            assert!(day < as_of);
            assert!(day >= as_of - Days::new(7));
        }
    }

    #[test]
    fn test_zero_lookback_is_one_day() {
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let window = TradingWindow::new(as_of, 0);
        let mut rng = SynthRng::from_seed(1);
        assert_eq!(
            window.sample(&mut rng).date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }
}
