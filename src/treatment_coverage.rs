//! C9: per-location/age probability that a clinical episode results in a treatment-seeking
//! attempt. Kept as its own small component (rather than folded into `Config`) because
//! `ChangeTreatmentCoverage` events mutate it mid-run, while `Config` itself is read-only.
use crate::HashMap;

#[derive(Clone, Debug)]
pub struct TreatmentCoverage {
    pr_treatment_under5: f64,
    pr_treatment_over5: f64,
    /// Per-location overrides, set by `ChangeTreatmentCoverage` events (e.g. an MDA campaign
    /// temporarily raising coverage in one district).
    overrides: HashMap<u32, f64>,
}

impl TreatmentCoverage {
    #[must_use]
    pub fn new(pr_treatment_under5: f64, pr_treatment_over5: f64) -> Self {
        TreatmentCoverage {
            pr_treatment_under5,
            pr_treatment_over5,
            overrides: HashMap::default(),
        }
    }

    /// Probability that a clinical episode at `location` for a person of age `age_days` results
    /// in treatment. A location-level override, if set, takes precedence over the age-banded
    /// default.
    #[must_use]
    pub fn probability(&self, location: u32, age_days: u32) -> f64 {
        if let Some(&override_probability) = self.overrides.get(&location) {
            return override_probability;
        }
        if age_days < 5 * 365 {
            self.pr_treatment_under5
        } else {
            self.pr_treatment_over5
        }
    }

    pub fn set_override(&mut self, location: u32, probability: f64) {
        self.overrides.insert(location, probability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_band_selects_correct_default() {
        let coverage = TreatmentCoverage::new(0.6, 0.4);
        assert_eq!(coverage.probability(0, 365), 0.6);
        assert_eq!(coverage.probability(0, 6 * 365), 0.4);
    }

    #[test]
    fn location_override_takes_precedence() {
        let mut coverage = TreatmentCoverage::new(0.6, 0.4);
        coverage.set_override(3, 1.0);
        assert_eq!(coverage.probability(3, 6 * 365), 1.0);
        assert_eq!(coverage.probability(4, 6 * 365), 0.4);
    }
}
