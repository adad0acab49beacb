use chrono::NaiveDate;

use crate::data::types::MarketRecord;

/// Survival mass at or below this is treated as exhausted when deriving
/// hazard, instead of dividing toward infinity.
pub const SURVIVAL_EPSILON: f64 = 0.001;

/// Discrete-time probability curve for one cycle.
///
/// All series are index-aligned to the same record ordering: ascending
/// resolved date, upstream order breaking ties. Rebuilt in full every
/// cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionCurve {
    pub labels: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub cdf: Vec<f64>,
    pub pmf: Vec<f64>,
    pub survival: Vec<f64>,
    pub hazard: Vec<f64>,
    pub volume: Vec<f64>,
    pub liquidity: Vec<f64>,
    pub spread: Vec<f64>,
}

impl DistributionCurve {
    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }

    /// Highest cumulative probability on the curve, in percent.
    pub fn peak_cdf_percent(&self) -> f64 {
        self.cdf.iter().copied().fold(0.0, f64::max) * 100.0
    }
}

/// Assemble the distribution curve from one cycle's surviving records.
///
/// CDF values are the raw Yes prices: the venue prices "by this date"
/// contracts cumulatively, so no summation is applied on top, and a dip
/// between successive contracts (independently priced, so not guaranteed
/// consistent) is clamped to zero mass rather than carried through as
/// negative probability.
pub fn assemble_curve(records: &[MarketRecord]) -> DistributionCurve {
    let mut ordered: Vec<&MarketRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.resolved_date);

    let mut curve = DistributionCurve::default();

    for (i, record) in ordered.iter().enumerate() {
        let cdf = record.probability;

        // No interval precedes the first observed date; all mass up to it
        // is attributed to it.
        let pmf = if i == 0 {
            cdf
        } else {
            (cdf - curve.cdf[i - 1]).max(0.0)
        };

        let survival = 1.0 - cdf;

        let hazard = if i == 0 {
            pmf
        } else if curve.survival[i - 1] > SURVIVAL_EPSILON {
            pmf / curve.survival[i - 1]
        } else {
            0.0
        };

        curve.labels.push(record.label.clone());
        curve.dates.push(record.resolved_date);
        curve.cdf.push(cdf);
        curve.pmf.push(pmf);
        curve.survival.push(survival);
        curve.hazard.push(hazard);
        curve.volume.push(record.volume);
        curve.liquidity.push(record.liquidity);
        curve.spread.push(record.spread);
    }

    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::sentinel_date;

    fn record(label: &str, date: (i32, u32, u32), probability: f64) -> MarketRecord {
        MarketRecord {
            label: label.to_string(),
            resolved_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            probability,
            volume: 0.0,
            liquidity: 0.0,
            spread: 0.0,
            outcome_token_id: None,
        }
    }

    #[test]
    fn test_first_point_identities() {
        let curve = assemble_curve(&[record("Feb 15", (2026, 2, 15), 0.30)]);

        assert_eq!(curve.pmf[0], curve.cdf[0]);
        assert_eq!(curve.hazard[0], curve.pmf[0]);
        assert!((curve.survival[0] - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_series_identities() {
        let curve = assemble_curve(&[
            record("Feb 15", (2026, 2, 15), 0.30),
            record("Mar 31", (2026, 3, 31), 0.55),
            record("Jun 30", (2026, 6, 30), 0.70),
        ]);

        for i in 1..curve.len() {
            assert_eq!(curve.pmf[i], (curve.cdf[i] - curve.cdf[i - 1]).max(0.0));
            assert_eq!(curve.survival[i], 1.0 - curve.cdf[i]);
            if curve.survival[i - 1] > SURVIVAL_EPSILON {
                assert_eq!(curve.hazard[i], curve.pmf[i] / curve.survival[i - 1]);
            } else {
                assert_eq!(curve.hazard[i], 0.0);
            }
        }
    }

    #[test]
    fn test_monotonicity_violation_clamped() {
        // Independent contracts can price a later date cheaper; the dip
        // becomes zero mass, not negative mass.
        let curve = assemble_curve(&[
            record("Feb 15", (2026, 2, 15), 0.30),
            record("Mar 31", (2026, 3, 31), 0.25),
            record("Jun 30", (2026, 6, 30), 0.40),
        ]);

        assert_eq!(curve.pmf, vec![0.30, 0.0, 0.40 - 0.25]);
    }

    #[test]
    fn test_hazard_guard_near_exhausted_survival() {
        let curve = assemble_curve(&[
            record("Feb 15", (2026, 2, 15), 0.9995),
            record("Mar 31", (2026, 3, 31), 0.9999),
        ]);

        // survival[0] = 0.0005 <= epsilon, so hazard collapses to zero
        assert_eq!(curve.hazard[1], 0.0);
    }

    #[test]
    fn test_records_sorted_with_sentinel_last() {
        let sentinel = MarketRecord {
            label: "Q2 Window".to_string(),
            resolved_date: sentinel_date(),
            probability: 0.10,
            volume: 0.0,
            liquidity: 0.0,
            spread: 0.0,
            outcome_token_id: None,
        };

        let curve = assemble_curve(&[
            sentinel,
            record("Jun 30", (2026, 6, 30), 0.70),
            record("Feb 15", (2026, 2, 15), 0.30),
        ]);

        assert_eq!(curve.labels, vec!["Feb 15", "Jun 30", "Q2 Window"]);
    }

    #[test]
    fn test_date_ties_keep_upstream_order() {
        let curve = assemble_curve(&[
            record("Feb 15 first", (2026, 2, 15), 0.30),
            record("Feb 15 second", (2026, 2, 15), 0.35),
        ]);

        assert_eq!(curve.labels, vec!["Feb 15 first", "Feb 15 second"]);
    }

    #[test]
    fn test_empty_record_set_yields_empty_curve() {
        let curve = assemble_curve(&[]);
        assert!(curve.is_empty());
        assert_eq!(curve.peak_cdf_percent(), 0.0);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let records = vec![
            record("Feb 15", (2026, 2, 15), 0.30),
            record("Mar 31", (2026, 3, 31), 0.25),
            record("Jun 30", (2026, 6, 30), 0.40),
        ];

        assert_eq!(assemble_curve(&records), assemble_curve(&records));
    }

    #[test]
    fn test_peak_cdf_percent() {
        let curve = assemble_curve(&[
            record("Feb 15", (2026, 2, 15), 0.30),
            record("Mar 31", (2026, 3, 31), 0.55),
        ]);

        assert!((curve.peak_cdf_percent() - 55.0).abs() < 1e-9);
    }
}
