use std::fmt;

use crate::model::curve::DistributionCurve;

/// Discrete threat tier shown on the dashboard, driven by the curve's
/// peak cumulative probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatTier {
    High,
    Elevated,
    Low,
}

impl ThreatTier {
    /// Classify a peak cumulative probability given in percent. Boundary
    /// values belong to the higher tier.
    pub fn from_peak_percent(peak: f64) -> Self {
        if peak >= 50.0 {
            ThreatTier::High
        } else if peak >= 20.0 {
            ThreatTier::Elevated
        } else {
            ThreatTier::Low
        }
    }

    pub fn classify(curve: &DistributionCurve) -> Self {
        Self::from_peak_percent(curve.peak_cdf_percent())
    }
}

impl Default for ThreatTier {
    fn default() -> Self {
        ThreatTier::Low
    }
}

impl fmt::Display for ThreatTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatTier::High => write!(f, "HIGH"),
            ThreatTier::Elevated => write!(f, "ELEVATED"),
            ThreatTier::Low => write!(f, "LOW"),
        }
    }
}
