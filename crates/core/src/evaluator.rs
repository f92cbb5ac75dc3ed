//! Joins market caps with open interest and ranks the assets over the threshold.

use crate::types::{MarketCaps, OpenInterestMap, RatioAlert};
use std::cmp::Ordering;

/// Computes every OI/MC ratio above `threshold`, ranked highest first.
///
/// Only symbols present in both mappings are considered. Every market cap in
/// `caps` must be strictly positive; the market-data source guarantees this.
/// Ties on ratio are broken by symbol, ascending, so the output does not depend
/// on map iteration order.
///
/// The full ranked list is returned; presentation limits are applied by the formatter.
#[must_use]
pub fn evaluate(caps: &MarketCaps, oi: &OpenInterestMap, threshold: f64) -> Vec<RatioAlert> {
    let mut alerts: Vec<RatioAlert> = caps
        .iter()
        .filter_map(|(symbol, snapshot)| {
            let open_interest = *oi.get(symbol)?;
            let alert = RatioAlert::new(symbol.clone(), snapshot.market_cap_usd, open_interest);
            (alert.ratio.is_finite() && alert.ratio > threshold).then_some(alert)
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.ratio
            .partial_cmp(&a.ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    alerts
}

/// Number of symbols present in both mappings.
#[must_use]
pub fn matched_symbols(caps: &MarketCaps, oi: &OpenInterestMap) -> usize {
    caps.keys().filter(|s| oi.contains_key(*s)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetSnapshot;

    fn caps(entries: &[(&str, f64)]) -> MarketCaps {
        entries
            .iter()
            .map(|(s, mc)| ((*s).to_string(), AssetSnapshot::new(*s, *s, *mc)))
            .collect()
    }

    fn oi(entries: &[(&str, f64)]) -> OpenInterestMap {
        entries.iter().map(|(s, v)| ((*s).to_string(), *v)).collect()
    }

    #[test]
    fn test_single_alert_above_threshold() {
        let alerts = evaluate(&caps(&[("BTC", 50e6)]), &oi(&[("BTC", 20e6)]), 0.25);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "BTC");
        assert!((alerts[0].ratio - 0.40).abs() < 1e-12);
        assert_eq!(alerts[0].market_cap_usd, 50e6);
        assert_eq!(alerts[0].open_interest_usd, 20e6);
    }

    #[test]
    fn test_below_threshold_produces_nothing() {
        let alerts = evaluate(&caps(&[("ETH", 80e6)]), &oi(&[("ETH", 15e6)]), 0.25);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_ratio_equal_to_threshold_is_excluded() {
        let alerts = evaluate(&caps(&[("ABC", 100.0)]), &oi(&[("ABC", 25.0)]), 0.25);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_empty_caps_produce_nothing() {
        let alerts = evaluate(&caps(&[]), &oi(&[("AAA", 10.0)]), 0.0);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_join_ignores_one_sided_symbols() {
        let alerts = evaluate(
            &caps(&[("AAA", 10.0), ("BBB", 10.0)]),
            &oi(&[("BBB", 9.0), ("CCC", 1e12)]),
            0.1,
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "BBB");
        for alert in &alerts {
            assert!(alert.symbol != "AAA" && alert.symbol != "CCC");
        }
    }

    #[test]
    fn test_sorted_descending_with_symbol_tiebreak() {
        let alerts = evaluate(
            &caps(&[
                ("LOW", 100.0),
                ("HIGH", 100.0),
                ("ZED", 100.0),
                ("ALPHA", 100.0),
                ("MID", 100.0),
            ]),
            &oi(&[
                ("LOW", 30.0),
                ("HIGH", 90.0),
                ("ZED", 50.0),
                ("ALPHA", 50.0),
                ("MID", 40.0),
            ]),
            0.25,
        );

        let order: Vec<&str> = alerts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(order, vec!["HIGH", "ALPHA", "ZED", "MID", "LOW"]);
        assert!(alerts.windows(2).all(|w| w[0].ratio >= w[1].ratio));
    }

    #[test]
    fn test_all_alerts_exceed_threshold() {
        let c = caps(&[("A", 10.0), ("B", 20.0), ("C", 30.0), ("D", 40.0)]);
        let o = oi(&[("A", 1.0), ("B", 8.0), ("C", 9.0), ("D", 100.0)]);

        for threshold in [0.0, 0.1, 0.3, 0.4, 2.5, 10.0] {
            for alert in evaluate(&c, &o, threshold) {
                assert!(alert.ratio > threshold);
                assert!((alert.ratio - alert.open_interest_usd / alert.market_cap_usd).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_returns_more_than_ten() {
        let symbols: Vec<String> = (0..25).map(|i| format!("S{i:02}")).collect();
        let c: MarketCaps = symbols
            .iter()
            .map(|s| (s.clone(), AssetSnapshot::new(s.clone(), s.clone(), 100.0)))
            .collect();
        let o: OpenInterestMap = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), 50.0 + i as f64))
            .collect();

        assert_eq!(evaluate(&c, &o, 0.25).len(), 25);
    }

    #[test]
    fn test_zero_open_interest_never_alerts() {
        let alerts = evaluate(&caps(&[("ZERO", 10.0)]), &oi(&[("ZERO", 0.0)]), 0.0);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_matched_symbols() {
        let c = caps(&[("A", 1.0), ("B", 1.0)]);
        let o = oi(&[("B", 1.0), ("C", 1.0)]);
        assert_eq!(matched_symbols(&c, &o), 1);
    }
}
