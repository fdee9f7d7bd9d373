//! The immune component: a single scalar "immunity level" per person that decays over time and
//! is boosted by clinical/asymptomatic exposure, with age-dependent acquire/decay rates that
//! differ between infants and everyone else.
use crate::config::ImmuneSystemInfo;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImmuneVariant {
    Infant,
    NonInfant,
}

#[derive(Clone, Debug)]
pub struct ImmuneComponent {
    pub variant: ImmuneVariant,
    pub latest_value: f64,
    pub latest_update_day: i32,
}

impl ImmuneComponent {
    #[must_use]
    pub fn new(variant: ImmuneVariant, day: i32) -> Self {
        ImmuneComponent {
            variant,
            latest_value: 0.0,
            latest_update_day: day,
        }
    }

    /// Age-dependent acquire rate: infants acquire immunity faster per-exposure, consistent
    /// with maternal-antibody-assisted acquisition in the original model.
    fn acquire_rate(&self, info: &ImmuneSystemInfo) -> f64 {
        match self.variant {
            ImmuneVariant::Infant => info.acquire_rate * info.infant_acquire_rate_multiplier,
            ImmuneVariant::NonInfant => info.acquire_rate,
        }
    }

    fn decay_rate(&self, info: &ImmuneSystemInfo) -> f64 {
        info.decay_rate
    }

    /// Advances the immunity level by one day given whether the person currently has a
    /// detectable-or-clinical parasite burden (`is_exposed_today`). Immunity saturates toward 1
    /// under continued exposure and decays exponentially toward 0 otherwise.
    pub fn daily_update(&mut self, info: &ImmuneSystemInfo, day: i32, is_exposed_today: bool) {
        if self.latest_update_day >= day {
            return;
        }
        let days_elapsed = f64::from(day - self.latest_update_day);
        if is_exposed_today {
            let rate = self.acquire_rate(info);
            self.latest_value += (1.0 - self.latest_value) * rate * days_elapsed;
        } else {
            let rate = self.decay_rate(info);
            self.latest_value *= (-rate * days_elapsed).exp();
        }
        self.latest_value = self.latest_value.clamp(0.0, 1.0);
        self.latest_update_day = day;
    }

    /// The probability that this person's immune system clears a clinical episode without
    /// treatment, a logistic function of `latest_value` centered on `info.sigmoid_midpoint`.
    #[must_use]
    pub fn clinical_clearance_probability(&self, info: &ImmuneSystemInfo) -> f64 {
        let x = (self.latest_value - info.sigmoid_midpoint) * info.sigmoid_steepness;
        1.0 / (1.0 + (-x).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ImmuneSystemInfo {
        ImmuneSystemInfo {
            acquire_rate: 0.02,
            decay_rate: 0.01,
            infant_acquire_rate_multiplier: 2.0,
            sigmoid_midpoint: 0.5,
            sigmoid_steepness: 10.0,
        }
    }

    #[test]
    fn exposure_increases_immunity_decay_reduces_it() {
        let info = sample_info();
        let mut immune = ImmuneComponent::new(ImmuneVariant::NonInfant, 0);
        immune.daily_update(&info, 1, true);
        let after_exposure = immune.latest_value;
        assert!(after_exposure > 0.0);
        immune.daily_update(&info, 2, false);
        assert!(immune.latest_value < after_exposure);
    }

    #[test]
    fn infant_acquires_immunity_faster() {
        let info = sample_info();
        let mut infant = ImmuneComponent::new(ImmuneVariant::Infant, 0);
        let mut adult = ImmuneComponent::new(ImmuneVariant::NonInfant, 0);
        infant.daily_update(&info, 1, true);
        adult.daily_update(&info, 1, true);
        assert!(infant.latest_value > adult.latest_value);
    }
}
