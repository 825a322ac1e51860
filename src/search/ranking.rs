/// Ranking primitives for derivative search results
use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::types::{Instrument, MatchKind, SearchMatch};
use crate::utils::parse_expiry_date;

/// Sentinel distance for candidates with no usable strike
pub const STRIKE_DISTANCE_MAX: f64 = 99_999_999.0;

/// Distance between a candidate's strike and the requested strike.
///
/// No requested strike means no penalty. Stored strikes above
/// `scale_multiplier` times the target are treated as x100-scaled rows and
/// divided down before comparing.
pub fn strike_distance(inst: &Instrument, target_strike: Option<f64>, scale_multiplier: f64) -> f64 {
    let Some(target) = target_strike else {
        return 0.0;
    };

    let mut stored = match inst.strike_price {
        Some(strike) if strike != 0.0 => strike,
        _ => return STRIKE_DISTANCE_MAX,
    };

    if stored > target * scale_multiplier {
        stored /= 100.0;
    }

    (stored - target).abs()
}

/// Primary sort rank, lower is better. Index flagships first, futures
/// ahead of options within each band, stocks last.
pub fn instrument_rank(inst: &Instrument) -> i32 {
    let symbol = inst.symbol.to_uppercase();
    let is_future = inst.is_future();

    if symbol.starts_with("NIFTY")
        && !symbol.starts_with("NIFTYNXT")
        && !symbol.starts_with("NIFTYMID")
    {
        return if is_future { 10 } else { 11 };
    }
    if symbol.starts_with("BANKNIFTY") {
        return if is_future { 20 } else { 21 };
    }
    if symbol.starts_with("FINNIFTY") {
        return if is_future { 30 } else { 31 };
    }
    if matches!(inst.instrument_type, 5 | 6) {
        return if is_future { 40 } else { 41 };
    }
    if is_future {
        50
    } else {
        51
    }
}

/// A candidate carrying its transient sort keys. Projected into a
/// `SearchMatch` at the response boundary so the keys never leak out.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    display_name: String,
    symbol: String,
    kind: MatchKind,
    rank: i32,
    expiry_sort: NaiveDate,
    dist_score: f64,
    strike_val: f64,
}

impl RankedCandidate {
    pub fn score(inst: &Instrument, target_strike: Option<f64>, scale_multiplier: f64) -> Self {
        RankedCandidate {
            display_name: inst.display_name(),
            symbol: inst.symbol.clone(),
            kind: if inst.is_future() {
                MatchKind::Fut
            } else {
                MatchKind::Opt
            },
            rank: instrument_rank(inst),
            expiry_sort: parse_expiry_date(inst.expiry_date.as_deref()),
            dist_score: strike_distance(inst, target_strike, scale_multiplier),
            strike_val: inst.strike_price.unwrap_or(0.0),
        }
    }

    /// Sort tuple: rank, then expiry, then strike distance, then raw strike
    pub fn cmp_by_sort_keys(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.expiry_sort.cmp(&other.expiry_sort))
            .then_with(|| self.dist_score.total_cmp(&other.dist_score))
            .then_with(|| self.strike_val.total_cmp(&other.strike_val))
    }

    pub fn into_match(self) -> SearchMatch {
        SearchMatch {
            display_name: self.display_name,
            symbol: self.symbol,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(instrument_type: i32, symbol: &str, expiry: Option<&str>, strike: Option<f64>) -> Instrument {
        Instrument {
            instrument_id: 1,
            instrument_type,
            symbol: symbol.to_string(),
            display_symbol: None,
            exchange: None,
            segment: None,
            trading_symbol: None,
            isin: None,
            underlying_instrument_id: Some(7),
            expiry_date: expiry.map(|s| s.to_string()),
            expiry_type: None,
            option_type: None,
            strike_price: strike,
        }
    }

    #[test]
    fn test_rank_table() {
        assert_eq!(instrument_rank(&candidate(6, "NIFTY", None, None)), 10);
        assert_eq!(instrument_rank(&candidate(5, "NIFTY", None, None)), 11);
        assert_eq!(instrument_rank(&candidate(6, "BANKNIFTY", None, None)), 20);
        assert_eq!(instrument_rank(&candidate(5, "BANKNIFTY", None, None)), 21);
        assert_eq!(instrument_rank(&candidate(6, "FINNIFTY", None, None)), 30);
        assert_eq!(instrument_rank(&candidate(5, "FINNIFTY", None, None)), 31);
        // NIFTYNXT and NIFTYMID fall through to the generic index band
        assert_eq!(instrument_rank(&candidate(6, "NIFTYNXT50", None, None)), 40);
        assert_eq!(instrument_rank(&candidate(5, "NIFTYMIDSELECT", None, None)), 41);
        assert_eq!(instrument_rank(&candidate(4, "RELIANCE", None, None)), 50);
        assert_eq!(instrument_rank(&candidate(3, "RELIANCE", None, None)), 51);
    }

    #[test]
    fn test_strike_distance_no_target() {
        let inst = candidate(5, "NIFTY", None, Some(26000.0));
        assert_eq!(strike_distance(&inst, None, 5.0), 0.0);
    }

    #[test]
    fn test_strike_distance_no_strike_is_sentinel() {
        let inst = candidate(6, "NIFTY", None, None);
        assert_eq!(strike_distance(&inst, Some(26000.0), 5.0), STRIKE_DISTANCE_MAX);
        let inst = candidate(6, "NIFTY", None, Some(0.0));
        assert_eq!(strike_distance(&inst, Some(26000.0), 5.0), STRIKE_DISTANCE_MAX);
    }

    #[test]
    fn test_strike_distance_plain() {
        let inst = candidate(5, "NIFTY", None, Some(26500.0));
        assert_eq!(strike_distance(&inst, Some(26000.0), 5.0), 500.0);
    }

    #[test]
    fn test_strike_distance_scale_correction() {
        // 2600000 stored is 26000 x 100; corrected before comparing
        let inst = candidate(5, "NIFTY", None, Some(2_600_000.0));
        assert_eq!(strike_distance(&inst, Some(26000.0), 5.0), 0.0);

        // below the multiplier boundary no correction happens
        let inst = candidate(5, "NIFTY", None, Some(120_000.0));
        assert_eq!(strike_distance(&inst, Some(26000.0), 5.0), 94_000.0);
    }

    #[test]
    fn test_strike_distance_deterministic_and_non_negative() {
        let inst = candidate(5, "NIFTY", None, Some(25000.0));
        let a = strike_distance(&inst, Some(26000.0), 5.0);
        let b = strike_distance(&inst, Some(26000.0), 5.0);
        assert_eq!(a, b);
        assert!(a >= 0.0);
    }

    #[test]
    fn test_rank_dominates_other_keys() {
        // A far-away BANKNIFTY option still sorts after the NIFTY one
        let near = RankedCandidate::score(
            &candidate(5, "BANKNIFTY", Some("27-JAN-26"), Some(26000.0)),
            Some(26000.0),
            5.0,
        );
        let far = RankedCandidate::score(
            &candidate(5, "NIFTY", Some("31-DEC-26"), Some(30000.0)),
            Some(26000.0),
            5.0,
        );
        assert_eq!(far.cmp_by_sort_keys(&near), Ordering::Less);
    }

    #[test]
    fn test_expiry_breaks_rank_ties() {
        let later = RankedCandidate::score(
            &candidate(5, "NIFTY", Some("24-FEB-26"), Some(26000.0)),
            Some(26000.0),
            5.0,
        );
        let sooner = RankedCandidate::score(
            &candidate(5, "NIFTY", Some("27-JAN-26"), Some(26000.0)),
            Some(26000.0),
            5.0,
        );
        assert_eq!(sooner.cmp_by_sort_keys(&later), Ordering::Less);
    }

    #[test]
    fn test_distance_breaks_expiry_ties() {
        let near = RankedCandidate::score(
            &candidate(5, "NIFTY", Some("27-JAN-26"), Some(26100.0)),
            Some(26000.0),
            5.0,
        );
        let far = RankedCandidate::score(
            &candidate(5, "NIFTY", Some("27-JAN-26"), Some(26500.0)),
            Some(26000.0),
            5.0,
        );
        assert_eq!(near.cmp_by_sort_keys(&far), Ordering::Less);
    }

    #[test]
    fn test_projection_drops_sort_keys() {
        let ranked = RankedCandidate::score(
            &candidate(6, "NIFTY", Some("27-JAN-26"), None),
            None,
            5.0,
        );
        let entry = ranked.into_match();
        assert_eq!(entry.symbol, "NIFTY");
        assert_eq!(entry.kind, MatchKind::Fut);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("rank").is_none());
        assert!(json.get("expiry_sort").is_none());
    }
}
