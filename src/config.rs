//! C11: the read-only, typed configuration bundle every other component is built from.
//!
//! `Config` is loaded once, at startup, from a YAML document (`Config::from_str` /
//! `Config::from_path`); a malformed document or an out-of-range id/reference surfaces as
//! `SimError::Config` before the first tick, never a panic mid-run.
use std::collections::HashMap as StdHashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::SimError;
use crate::person::{DrugId, DrugType};
use crate::therapy::{Therapy, TherapyId};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub starting_date: NaiveDate,
    pub ending_date: NaiveDate,
    #[serde(default)]
    pub start_of_comparison_period: Option<NaiveDate>,

    pub number_of_age_classes: usize,
    pub age_structure: Vec<u32>,

    pub number_of_locations: usize,

    #[serde(default)]
    pub seasonal_info: SeasonalInfo,

    #[serde(default)]
    pub pr_treatment_under5: f64,
    #[serde(default)]
    pub pr_treatment_over5: f64,

    pub drug_db: StdHashMap<String, DrugConfig>,
    pub therapy_db: StdHashMap<String, TherapyConfig>,
    pub strategy_db: StdHashMap<String, StrategyConfig>,
    pub initial_strategy_id: u32,

    pub genotype_info: GenotypeInfo,

    pub parasite_density_level: ParasiteDensityLevel,
    pub immune_system_information: ImmuneSystemInfo,

    #[serde(default)]
    pub relative_biting_info: RelativeRateInfo,
    #[serde(default)]
    pub relative_moving_info: RelativeRateInfo,

    #[serde(default)]
    pub events: Vec<EventConfig>,

    /// Paths to the ASC rasters backing `spatial::SpatialData`. Absent entirely (or with every
    /// field `None`) when a run has no spatial inputs, in which case every location is treated
    /// as belonging to a single district with no beta/population weighting and a flat travel
    /// kernel (`spatial::SpatialData::uniform`).
    #[serde(default)]
    pub spatial_info: Option<SpatialInfo>,

    /// Base seed for the PRNG (`random::SimulationContext::init_random`). Not a named key in
    /// the abridged config table, but every run needs one; defaults to a fixed value so unseeded
    /// test configs are at least deterministic.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Number of consecutive days a clone's net growth rate must stay positive under active
    /// drug pressure before it is flagged as drug-resistant-surviving (§4.5 supplement).
    #[serde(default = "default_resistant_escape_days")]
    pub resistant_escape_days_threshold: u32,

    /// Day offset (relative to the start of a clinical episode) at which
    /// `TestTreatmentFailureEvent` checks whether the causing clone is still present.
    #[serde(default = "default_test_treatment_failure_day")]
    pub test_treatment_failure_day: u32,

    #[serde(default)]
    pub biological_rates: BiologicalRates,
}

/// Within-host timing/probability constants that aren't broken out into their own config-key
/// table in the abridged key list but are load-bearing for the individual state machine
/// (`person::dispatch_individual_event`). Defaults are taken from the original model's
/// `Model::CONFIG` singleton (`original_source/Config.cpp`) so an abridged config still runs.
#[derive(Clone, Debug, Deserialize)]
pub struct BiologicalRates {
    /// Days from an infective bite (EXPOSED) to the parasite emerging from the liver stage
    /// (ASYMPTOMATIC), i.e. the `MoveParasiteToBlood` delay.
    #[serde(default = "default_liver_duration_days")]
    pub liver_duration_days: i32,
    /// Inclusive day-offset range, from the ASYMPTOMATIC clone's first update, in which a
    /// `ProgressToClinical` event (if rolled) is scheduled.
    #[serde(default = "default_progression_min_days")]
    pub progression_min_days: i32,
    #[serde(default = "default_progression_max_days")]
    pub progression_max_days: i32,
    /// Probability that a newly-asymptomatic clone progresses to a clinical episode at all.
    #[serde(default = "default_p_clinical_progression")]
    pub p_clinical_progression: f64,
    /// Inclusive day-offset range for an untreated clinical episode's spontaneous resolution
    /// (`EndClinicalByNoTreatment`).
    #[serde(default = "default_untreated_clinical_min_days")]
    pub untreated_clinical_min_days: i32,
    #[serde(default = "default_untreated_clinical_max_days")]
    pub untreated_clinical_max_days: i32,
    #[serde(default = "default_p_death_on_treatment")]
    pub p_death_on_treatment: f64,
    #[serde(default = "default_p_death_no_treatment")]
    pub p_death_no_treatment: f64,
    /// Per-person, per-day probability of rolling a destination in the movement step. Defaults
    /// to `0.0` (movement disabled) so a config that never names a movement rate reproduces the
    /// single-location behavior every earlier scenario was written against.
    #[serde(default = "default_daily_movement_probability")]
    pub daily_movement_probability: f64,
}

impl Default for BiologicalRates {
    fn default() -> Self {
        BiologicalRates {
            liver_duration_days: default_liver_duration_days(),
            progression_min_days: default_progression_min_days(),
            progression_max_days: default_progression_max_days(),
            p_clinical_progression: default_p_clinical_progression(),
            untreated_clinical_min_days: default_untreated_clinical_min_days(),
            untreated_clinical_max_days: default_untreated_clinical_max_days(),
            p_death_on_treatment: default_p_death_on_treatment(),
            p_death_no_treatment: default_p_death_no_treatment(),
            daily_movement_probability: default_daily_movement_probability(),
        }
    }
}

fn default_liver_duration_days() -> i32 {
    10
}
fn default_progression_min_days() -> i32 {
    7
}
fn default_progression_max_days() -> i32 {
    14
}
fn default_p_clinical_progression() -> f64 {
    0.3
}
fn default_untreated_clinical_min_days() -> i32 {
    7
}
fn default_untreated_clinical_max_days() -> i32 {
    21
}
fn default_p_death_on_treatment() -> f64 {
    0.001
}
fn default_p_death_no_treatment() -> f64 {
    0.01
}
fn default_daily_movement_probability() -> f64 {
    0.0
}

fn default_random_seed() -> u64 {
    0
}

fn default_resistant_escape_days() -> u32 {
    7
}

fn default_test_treatment_failure_day() -> u32 {
    28
}

impl Config {
    /// Parses a `Config` from a YAML document.
    pub fn from_str(yaml: &str) -> Result<Self, SimError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a `Config` from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Cross-field validation that `serde`'s structural deserialization cannot express: ids that
    /// must reference other tables, strictly-increasing boundary lists, etc.
    fn validate(&self) -> Result<(), SimError> {
        if self.ending_date < self.starting_date {
            return Err(SimError::Config(
                "ending_date must not precede starting_date".into(),
            ));
        }
        if self.age_structure.len() != self.number_of_age_classes {
            return Err(SimError::Config(format!(
                "age_structure has {} entries but number_of_age_classes is {}",
                self.age_structure.len(),
                self.number_of_age_classes
            )));
        }
        if !self
            .strategy_db
            .values()
            .any(|strategy| strategy.id == self.initial_strategy_id)
        {
            return Err(SimError::Config(format!(
                "initial_strategy_id {} does not match any entry in strategy_db",
                self.initial_strategy_id
            )));
        }
        for (name, therapy) in &self.therapy_db {
            for drug_name in &therapy.drug_ids {
                if !self.drug_db.contains_key(drug_name) {
                    return Err(SimError::Config(format!(
                        "therapy_db[{name}] references unknown drug '{drug_name}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// A minimal, always-valid `Config` used by `SimulationContext::new()` and by tests that
    /// don't care about a real scenario's parameters: one location, one age class, a single SFT
    /// strategy, one drug and one therapy.
    #[must_use]
    pub fn minimal_default() -> Self {
        let mut drug_db = StdHashMap::new();
        drug_db.insert(
            "default_drug".to_string(),
            DrugConfig {
                elimination_half_life: 7.0,
                maximum_killing_rate: 0.9999,
                n_param: 15.0,
                affecting_loci: Vec::new(),
                p_mutation: 0.0,
            },
        );
        let mut therapy_db = StdHashMap::new();
        therapy_db.insert(
            "default_therapy".to_string(),
            TherapyConfig {
                drug_ids: vec!["default_drug".to_string()],
                dosing_days: 3,
            },
        );
        let mut strategy_db = StdHashMap::new();
        strategy_db.insert(
            "default_strategy".to_string(),
            StrategyConfig {
                id: 0,
                kind: StrategyKindConfig::Sft { therapy_id: 0 },
            },
        );
        Config {
            starting_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            ending_date: NaiveDate::from_ymd_opt(2000, 12, 31).unwrap(),
            start_of_comparison_period: None,
            number_of_age_classes: 1,
            age_structure: vec![100],
            number_of_locations: 1,
            seasonal_info: SeasonalInfo::default(),
            pr_treatment_under5: 0.6,
            pr_treatment_over5: 0.4,
            drug_db,
            therapy_db,
            strategy_db,
            initial_strategy_id: 0,
            genotype_info: GenotypeInfo {
                loci_vector: vec![LocusInfo {
                    name: "locus_0".to_string(),
                    number_of_alleles: 2,
                }],
            },
            parasite_density_level: ParasiteDensityLevel {
                log_density_cured: -3.0,
                log_density_from_liver: 2.0,
                log_density_clinical_from: 5.0,
                log_density_clinical_to: 7.0,
                log_density_detectable: 1.0,
                log_density_pyrogenic: 4.0,
            },
            immune_system_information: ImmuneSystemInfo {
                acquire_rate: 0.02,
                decay_rate: 0.01,
                infant_acquire_rate_multiplier: default_infant_multiplier(),
                sigmoid_midpoint: default_sigmoid_midpoint(),
                sigmoid_steepness: default_sigmoid_steepness(),
            },
            relative_biting_info: RelativeRateInfo::default(),
            relative_moving_info: RelativeRateInfo::default(),
            events: Vec::new(),
            spatial_info: None,
            random_seed: default_random_seed(),
            resistant_escape_days_threshold: default_resistant_escape_days(),
            test_treatment_failure_day: default_test_treatment_failure_day(),
            biological_rates: BiologicalRates::default(),
        }
    }

    #[must_use]
    pub fn total_days(&self) -> i32 {
        (self.ending_date - self.starting_date).num_days() as i32
    }

    /// Builds the immutable `DrugType` table from `drug_db`, in deterministic (sorted by name)
    /// id-assignment order so two loads of the same config yield the same `DrugId`s.
    #[must_use]
    pub fn build_drug_types(&self) -> Vec<DrugType> {
        let mut names: Vec<&String> = self.drug_db.keys().collect();
        names.sort();
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let entry = &self.drug_db[name];
                DrugType {
                    id: DrugId(index as u32),
                    elimination_half_life: entry.elimination_half_life,
                    maximum_killing_rate: entry.maximum_killing_rate,
                    n_param: entry.n_param,
                    affecting_loci: entry.affecting_loci.clone(),
                    p_mutation: entry.p_mutation,
                }
            })
            .collect()
    }

    /// Builds the immutable `Therapy` table from `therapy_db`, resolving drug name references
    /// to the `DrugId`s assigned by `build_drug_types`.
    #[must_use]
    pub fn build_therapies(&self) -> Vec<Therapy> {
        let mut drug_names: Vec<&String> = self.drug_db.keys().collect();
        drug_names.sort();
        let drug_id_of: StdHashMap<&str, DrugId> = drug_names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), DrugId(index as u32)))
            .collect();

        let mut names: Vec<&String> = self.therapy_db.keys().collect();
        names.sort();
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let entry = &self.therapy_db[name];
                Therapy {
                    id: TherapyId(index as u32),
                    drug_ids: entry
                        .drug_ids
                        .iter()
                        .map(|drug_name| drug_id_of[drug_name.as_str()])
                        .collect(),
                    dosing_days: entry.dosing_days,
                }
            })
            .collect()
    }

    /// Builds the run's `SpatialData` from `spatial_info`'s raster paths, or
    /// `SpatialData::uniform` if `spatial_info` is absent or names no rasters. Each named raster
    /// is read and parsed independently; a path that fails to read or parse fails the whole load
    /// rather than silently falling back, since a misconfigured raster path is almost always a
    /// typo the run should surface rather than mask.
    pub fn build_spatial_data(&self) -> Result<crate::spatial::SpatialData, SimError> {
        let Some(spatial_info) = self.spatial_info.as_ref() else {
            return Ok(crate::spatial::SpatialData::uniform(self.number_of_locations));
        };

        let load = |path: &Option<String>| -> Result<Option<crate::spatial::AscGrid>, SimError> {
            path.as_ref()
                .map(|path| {
                    let contents = std::fs::read_to_string(path)?;
                    crate::spatial::AscGrid::parse(&contents)
                })
                .transpose()
        };

        let district_grid = load(&spatial_info.district_raster)?;
        let population_grid = load(&spatial_info.population_raster)?;
        let beta_grid = load(&spatial_info.beta_raster)?;
        let travel_grid = load(&spatial_info.travel_raster)?;

        Ok(crate::spatial::SpatialData::from_grids(
            self.number_of_locations,
            district_grid.as_ref(),
            population_grid.as_ref(),
            beta_grid.as_ref(),
            travel_grid.as_ref(),
        ))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeasonalInfo {
    #[serde(default)]
    pub amplitude: f64,
    #[serde(default)]
    pub phase_shift_days: f64,
}

impl SeasonalInfo {
    /// Seasonal multiplier on the biting rate for the given day-of-year, a simple sinusoid
    /// matching the original model's `SeasonalInfo::get_seasonal_factor`.
    #[must_use]
    pub fn factor(&self, day_of_year: u32) -> f64 {
        let radians = 2.0 * std::f64::consts::PI * (f64::from(day_of_year) - self.phase_shift_days)
            / 365.0;
        1.0 + self.amplitude * radians.cos()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DrugConfig {
    pub elimination_half_life: f64,
    pub maximum_killing_rate: f64,
    pub n_param: f64,
    #[serde(default)]
    pub affecting_loci: Vec<u8>,
    #[serde(default)]
    pub p_mutation: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TherapyConfig {
    pub drug_ids: Vec<String>,
    pub dosing_days: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StrategyConfig {
    pub id: u32,
    #[serde(flatten)]
    pub kind: StrategyKindConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKindConfig {
    Sft { therapy_id: u32 },
    Cycling { therapy_ids: Vec<u32>, cycle_days: u32 },
    Mft { therapy_ids: Vec<u32>, distribution: Vec<f64> },
    MftAgeBased { therapy_ids: Vec<u32>, age_boundaries: Vec<u32> },
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenotypeInfo {
    pub loci_vector: Vec<LocusInfo>,
}

impl GenotypeInfo {
    /// Decodes a config-level `genotype_id` (as named by `introduce_parasites`'s
    /// `parasite_info[].genotype_id`) into the per-locus allele vector `GenotypeDb::intern`
    /// expects, via mixed-radix decomposition over `loci_vector`'s allele counts,
    /// least-significant locus first. This gives every integer in
    /// `0..product(number_of_alleles)` a distinct, stable allele combination without requiring
    /// a separately-configured enumeration table.
    #[must_use]
    pub fn decode_genotype_id(&self, genotype_id: u32) -> Vec<u8> {
        let mut remainder = u64::from(genotype_id);
        let mut alleles = Vec::with_capacity(self.loci_vector.len());
        for locus in &self.loci_vector {
            let radix = u64::from(locus.number_of_alleles).max(1);
            alleles.push((remainder % radix) as u8);
            remainder /= radix;
        }
        alleles
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocusInfo {
    pub name: String,
    pub number_of_alleles: u8,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParasiteDensityLevel {
    pub log_density_cured: f64,
    pub log_density_from_liver: f64,
    pub log_density_clinical_from: f64,
    pub log_density_clinical_to: f64,
    pub log_density_detectable: f64,
    pub log_density_pyrogenic: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImmuneSystemInfo {
    pub acquire_rate: f64,
    pub decay_rate: f64,
    #[serde(default = "default_infant_multiplier")]
    pub infant_acquire_rate_multiplier: f64,
    #[serde(default = "default_sigmoid_midpoint")]
    pub sigmoid_midpoint: f64,
    #[serde(default = "default_sigmoid_steepness")]
    pub sigmoid_steepness: f64,
}

fn default_infant_multiplier() -> f64 {
    1.5
}
fn default_sigmoid_midpoint() -> f64 {
    0.5
}
fn default_sigmoid_steepness() -> f64 {
    10.0
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RelativeRateInfo {
    /// Relative weight of each discrete level, used as the categorical draw's weights. An empty
    /// distribution (the default) means "no heterogeneity configured" — every person gets the
    /// neutral level 0 / rate 1.0 rather than a sampled one.
    #[serde(default)]
    pub distribution: Vec<f64>,
    /// The biting/moving-rate multiplier each level in `distribution` corresponds to, matching
    /// the original model's paired `v_biting_level_value`/`v_biting_level_density` (or
    /// `v_moving_level_value`/`v_moving_level_density`) tables. Indexed the same as
    /// `distribution`; a level past the end of `values` falls back to a multiplier of `1.0`.
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "name", content = "info", rename_all = "snake_case")]
pub enum EventConfig {
    IntroduceParasites(Vec<IntroduceParasitesInfo>),
    ChangeTreatmentStrategy(Vec<ChangeStrategyInfo>),
    DistrictImportationDailyEvent(Vec<DistrictImportationInfo>),
    RotateStrategy(Vec<RotateStrategyInfo>),
    SingleRoundMda(Vec<SingleRoundMdaInfo>),
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntroduceParasitesInfo {
    pub location: u32,
    pub parasite_info: Vec<ParasiteIntroductionInfo>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParasiteIntroductionInfo {
    pub day: i32,
    pub genotype_id: u32,
    pub number_of_cases: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangeStrategyInfo {
    pub day: i32,
    pub strategy_id: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DistrictImportationInfo {
    pub district: u32,
    pub locus: u8,
    pub mutant_allele: u8,
    pub daily_rate: f64,
    pub start_date: NaiveDate,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RotateStrategyInfo {
    pub day: i32,
    pub years: u32,
    pub first_strategy_id: u32,
    pub second_strategy_id: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SingleRoundMdaInfo {
    pub day: i32,
    pub fraction_population_targeted: f64,
    pub days_to_complete_all_treatments: u32,
}

/// Raster file paths named by the abridged config key table (`beta_raster`, `population_raster`,
/// `district_raster`, `travel_raster`). `ecoclimatic_raster` is accepted for forward
/// compatibility but unused: nothing in this crate's biting-rate model consumes it yet.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SpatialInfo {
    #[serde(default)]
    pub beta_raster: Option<String>,
    #[serde(default)]
    pub population_raster: Option<String>,
    #[serde(default)]
    pub district_raster: Option<String>,
    #[serde(default)]
    pub travel_raster: Option<String>,
    #[serde(default)]
    pub ecoclimatic_raster: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
starting_date: 2000-01-01
ending_date: 2000-12-31
number_of_age_classes: 1
age_structure: [100]
number_of_locations: 1
drug_db:
  AL:
    elimination_half_life: 7.0
    maximum_killing_rate: 0.9999
    n_param: 15.0
therapy_db:
  AL_therapy:
    drug_ids: [AL]
    dosing_days: 3
strategy_db:
  sft:
    id: 0
    type: sft
    therapy_id: 0
initial_strategy_id: 0
genotype_info:
  loci_vector:
    - name: pfcrt
      number_of_alleles: 2
parasite_density_level:
  log_density_cured: -3.0
  log_density_from_liver: 2.0
  log_density_clinical_from: 5.0
  log_density_clinical_to: 7.0
  log_density_detectable: 1.0
  log_density_pyrogenic: 4.0
immune_system_information:
  acquire_rate: 0.02
  decay_rate: 0.01
"#;

    #[test]
    fn loads_minimal_valid_config() {
        let config = Config::from_str(MINIMAL_YAML).expect("should parse");
        assert_eq!(config.number_of_locations, 1);
        assert_eq!(config.total_days(), 365);
    }

    #[test]
    fn rejects_strategy_id_mismatch() {
        let broken = MINIMAL_YAML.replace("initial_strategy_id: 0", "initial_strategy_id: 99");
        let error = Config::from_str(&broken).unwrap_err();
        assert!(matches!(error, SimError::Config(_)));
    }

    #[test]
    fn rejects_unknown_drug_reference() {
        let broken = MINIMAL_YAML.replace("drug_ids: [AL]", "drug_ids: [NOPE]");
        let error = Config::from_str(&broken).unwrap_err();
        assert!(matches!(error, SimError::Config(_)));
    }

    #[test]
    fn build_drug_types_assigns_deterministic_ids() {
        let config = Config::from_str(MINIMAL_YAML).unwrap();
        let drugs = config.build_drug_types();
        assert_eq!(drugs.len(), 1);
        assert_eq!(drugs[0].id, DrugId(0));
    }

    #[test]
    fn decode_genotype_id_round_trips_through_distinct_combinations() {
        let info = GenotypeInfo {
            loci_vector: vec![
                LocusInfo { name: "a".to_string(), number_of_alleles: 2 },
                LocusInfo { name: "b".to_string(), number_of_alleles: 3 },
            ],
        };
        assert_eq!(info.decode_genotype_id(0), vec![0, 0]);
        assert_eq!(info.decode_genotype_id(1), vec![1, 0]);
        assert_eq!(info.decode_genotype_id(2), vec![0, 1]);
        assert_eq!(info.decode_genotype_id(5), vec![1, 2]);
    }

    #[test]
    fn without_spatial_info_build_spatial_data_is_uniform() {
        let config = Config::from_str(MINIMAL_YAML).unwrap();
        let spatial = config.build_spatial_data().unwrap();
        assert_eq!(spatial.number_of_locations(), 1);
        assert_eq!(spatial.district_count(), 1);
    }

    #[test]
    fn spatial_info_loads_named_district_raster() {
        let dir = tempfile::tempdir().unwrap();
        let district_path = dir.path().join("district.asc");
        std::fs::write(&district_path, "ncols 2\nnrows 1\ncellsize 1\nNODATA_value -9999\n0 1\n").unwrap();

        let mut config = Config::from_str(MINIMAL_YAML).unwrap();
        config.number_of_locations = 2;
        config.spatial_info = Some(SpatialInfo {
            district_raster: Some(district_path.to_string_lossy().into_owned()),
            ..SpatialInfo::default()
        });

        let spatial = config.build_spatial_data().unwrap();
        assert_eq!(spatial.district_count(), 2);
    }

    #[test]
    fn spatial_info_with_missing_file_fails_to_load() {
        let mut config = Config::from_str(MINIMAL_YAML).unwrap();
        config.spatial_info = Some(SpatialInfo {
            district_raster: Some("/no/such/file.asc".to_string()),
            ..SpatialInfo::default()
        });
        assert!(config.build_spatial_data().is_err());
    }
}
