//! Drug pharmacokinetics: drug type parameters (loaded from `drug_db`) and a person's
//! currently-circulating drug doses.

/// A stable identifier for a drug type, indexing into `DrugDb`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DrugId(pub u32);

/// Immutable pharmacokinetic/pharmacodynamic parameters for one drug, loaded once from
/// `Config::drug_db` and shared by reference from every `DrugInBlood` instance of that type.
#[derive(Clone, Debug)]
pub struct DrugType {
    pub id: DrugId,
    pub elimination_half_life: f64,
    pub maximum_killing_rate: f64,
    /// Hill coefficient of the dose-response killing-rate curve.
    pub n_param: f64,
    /// Which genotype loci this drug's resistance mutations can occur at.
    pub affecting_loci: Vec<u8>,
    /// Per-day, per-clone probability that an affected locus mutates while this drug's
    /// concentration is active.
    pub p_mutation: f64,
}

impl DrugType {
    /// Exponential-decay killing rate at `concentration_fraction` (current concentration over
    /// starting concentration, in `[0, 1]`), per the Hill-type dose-response curve:
    /// `k_max * c^n / (c^n + ec50^n)` with a fixed `ec50 = 0.5`, matching the original model's
    /// `SCDrugType` curve shape.
    #[must_use]
    pub fn killing_rate(&self, concentration_fraction: f64) -> f64 {
        if concentration_fraction <= 0.0 {
            return 0.0;
        }
        let ec50 = 0.5_f64;
        let c_n = concentration_fraction.powf(self.n_param);
        self.maximum_killing_rate * c_n / (c_n + ec50.powf(self.n_param))
    }

    /// Fraction of the elimination half-life's decay constant applied per day.
    #[must_use]
    fn decay_per_day(&self) -> f64 {
        std::f64::consts::LN_2 / self.elimination_half_life
    }
}

/// A dose of a drug currently circulating in a person's blood.
#[derive(Clone, Debug)]
pub struct DrugInBlood {
    pub drug_type_id: DrugId,
    pub dosing_days_remaining: u32,
    pub starting_value: f64,
    pub last_update_value: f64,
    pub last_update_day: i32,
}

impl DrugInBlood {
    #[must_use]
    pub fn new(drug_type_id: DrugId, dosing_days_remaining: u32, starting_value: f64, day: i32) -> Self {
        DrugInBlood {
            drug_type_id,
            dosing_days_remaining,
            starting_value,
            last_update_value: starting_value,
            last_update_day: day,
        }
    }

    /// Advances this dose's concentration by one day's exponential decay. Returns `false` once
    /// the dose has fully cleared (caller should drop it from the person's drug list).
    pub fn daily_decay(&mut self, drug_type: &DrugType, day: i32) -> bool {
        if self.last_update_day >= day {
            return true;
        }
        let days_elapsed = f64::from(day - self.last_update_day);
        self.last_update_value *= (-drug_type.decay_per_day() * days_elapsed).exp();
        self.last_update_day = day;
        if self.dosing_days_remaining > 0 {
            self.dosing_days_remaining -= 1;
        }
        self.last_update_value > 1e-6
    }

    #[must_use]
    pub fn concentration_fraction(&self) -> f64 {
        if self.starting_value <= 0.0 {
            return 0.0;
        }
        self.last_update_value / self.starting_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_drug() -> DrugType {
        DrugType {
            id: DrugId(0),
            elimination_half_life: 7.0,
            maximum_killing_rate: 0.9999,
            n_param: 15.0,
            affecting_loci: vec![0],
            p_mutation: 1e-5,
        }
    }

    #[test]
    fn decay_reduces_concentration_over_time() {
        let drug = sample_drug();
        let mut dose = DrugInBlood::new(DrugId(0), 3, 1.0, 0);
        assert!(dose.daily_decay(&drug, 1));
        assert!(dose.last_update_value < 1.0);
        let first_value = dose.last_update_value;
        assert!(dose.daily_decay(&drug, 2));
        assert!(dose.last_update_value < first_value);
    }

    #[test]
    fn killing_rate_increases_with_concentration() {
        let drug = sample_drug();
        assert!(drug.killing_rate(1.0) > drug.killing_rate(0.1));
        assert_eq!(drug.killing_rate(0.0), 0.0);
    }
}
