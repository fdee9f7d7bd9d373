//! C8: therapy-selection policies. `Strategy::get_therapy` is the one contract every variant
//! implements; `StrategyRegistry` owns the full set loaded from `Config::strategy_db` plus
//! which one is currently active.
use crate::config::{Config, StrategyKindConfig};
use crate::therapy::TherapyId;
use crate::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StrategyId(pub u32);

#[derive(Clone, Debug)]
pub enum Strategy {
    /// Single first-line therapy: always the same id.
    Sft { therapy_id: TherapyId },
    /// Rotates through `therapy_ids` every `cycle_days`, advanced by a `ChangeStrategy` event
    /// rather than computed from the day directly.
    Cycling {
        therapy_ids: Vec<TherapyId>,
        cycle_days: u32,
        current_index: usize,
        last_rotation_day: i32,
    },
    /// Multiple first-line therapies, picked by a categorical (weighted) draw.
    Mft {
        therapy_ids: Vec<TherapyId>,
        distribution: Vec<f64>,
    },
    /// Multiple first-line therapies picked by age boundary. `age_boundaries` has length
    /// `therapy_ids.len() - 1` and must be strictly increasing. The edge-case rule is strict
    /// greater: therapy index = count of boundaries `b` with `b <= age`, so an age exactly
    /// equal to a boundary maps to the higher-indexed therapy.
    MftAgeBased {
        therapy_ids: Vec<TherapyId>,
        age_boundaries: Vec<u32>,
    },
}

impl Strategy {
    pub fn from_config(kind: &StrategyKindConfig, current_day: i32) -> Self {
        match kind {
            StrategyKindConfig::Sft { therapy_id } => Strategy::Sft {
                therapy_id: TherapyId(*therapy_id),
            },
            StrategyKindConfig::Cycling {
                therapy_ids,
                cycle_days,
            } => Strategy::Cycling {
                therapy_ids: therapy_ids.iter().copied().map(TherapyId).collect(),
                cycle_days: *cycle_days,
                current_index: 0,
                last_rotation_day: current_day,
            },
            StrategyKindConfig::Mft {
                therapy_ids,
                distribution,
            } => Strategy::Mft {
                therapy_ids: therapy_ids.iter().copied().map(TherapyId).collect(),
                distribution: distribution.clone(),
            },
            StrategyKindConfig::MftAgeBased {
                therapy_ids,
                age_boundaries,
            } => Strategy::MftAgeBased {
                therapy_ids: therapy_ids.iter().copied().map(TherapyId).collect(),
                age_boundaries: age_boundaries.clone(),
            },
        }
    }

    /// Selects a therapy for a person of the given age (in whole years). `sample_weighted`
    /// performs a weighted categorical draw over the given distribution (`Mft` only) — it is
    /// passed in rather than drawn here so `Strategy` stays free of a dependency on
    /// `SimulationContext`'s PRNG streams.
    pub fn get_therapy(&self, age_years: u32, sample_weighted: impl FnOnce(&[f64]) -> usize) -> TherapyId {
        match self {
            Strategy::Sft { therapy_id } => *therapy_id,
            Strategy::Cycling {
                therapy_ids,
                current_index,
                ..
            } => therapy_ids[*current_index],
            Strategy::Mft {
                therapy_ids,
                distribution,
            } => therapy_ids[sample_weighted(distribution)],
            Strategy::MftAgeBased {
                therapy_ids,
                age_boundaries,
            } => {
                let index = age_boundaries.partition_point(|&boundary| boundary <= age_years);
                therapy_ids[index.min(therapy_ids.len() - 1)]
            }
        }
    }

    /// Swaps the therapy at `index` in a multi-therapy strategy's list for `replacement`,
    /// matching `ModifyNestedMft`'s "replace one arm of an MFT policy mid-run" semantics. A
    /// no-op on `Sft` (which has no indexed list) or an out-of-range index.
    pub fn replace_therapy_at(&mut self, index: usize, replacement: TherapyId) {
        let therapy_ids = match self {
            Strategy::Sft { .. } => return,
            Strategy::Cycling { therapy_ids, .. } | Strategy::Mft { therapy_ids, .. } | Strategy::MftAgeBased { therapy_ids, .. } => therapy_ids,
        };
        if let Some(slot) = therapy_ids.get_mut(index) {
            *slot = replacement;
        }
    }

    /// Advances a `Cycling` strategy to its next therapy. A no-op on any other variant (a
    /// `ChangeStrategy` event fired against the wrong strategy kind is a configuration mistake,
    /// not a crash).
    pub fn advance_cycle(&mut self, day: i32) {
        if let Strategy::Cycling {
            therapy_ids,
            current_index,
            last_rotation_day,
            ..
        } = self
        {
            *current_index = (*current_index + 1) % therapy_ids.len();
            *last_rotation_day = day;
        }
    }
}

/// Owns every configured strategy plus which one is currently in effect. `RotateStrategy`
/// events flip `active_strategy_id` between two configured strategies on a fixed period; this
/// is a registry-level operation distinct from a single `Strategy::Cycling`'s internal rotation.
pub struct StrategyRegistry {
    strategies: HashMap<StrategyId, Strategy>,
    active_strategy_id: StrategyId,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new(strategies: HashMap<StrategyId, Strategy>, active_strategy_id: StrategyId) -> Self {
        StrategyRegistry {
            strategies,
            active_strategy_id,
        }
    }

    /// Builds the full registry from `Config::strategy_db`, at day 0 (the only point a
    /// `Cycling` strategy's `last_rotation_day` can be seeded from outside a running context).
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let strategies = config
            .strategy_db
            .values()
            .map(|entry| (StrategyId(entry.id), Strategy::from_config(&entry.kind, 0)))
            .collect();
        StrategyRegistry::new(strategies, StrategyId(config.initial_strategy_id))
    }

    #[must_use]
    pub fn active_strategy(&self) -> &Strategy {
        &self.strategies[&self.active_strategy_id]
    }

    #[must_use]
    pub fn active_strategy_id(&self) -> StrategyId {
        self.active_strategy_id
    }

    pub fn set_active(&mut self, id: StrategyId) {
        self.active_strategy_id = id;
    }

    pub fn strategy_mut(&mut self, id: StrategyId) -> &mut Strategy {
        self.strategies.get_mut(&id).expect("unknown strategy id")
    }

    #[must_use]
    pub fn contains(&self, id: StrategyId) -> bool {
        self.strategies.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_based() -> Strategy {
        Strategy::MftAgeBased {
            therapy_ids: vec![TherapyId(0), TherapyId(1), TherapyId(2)],
            age_boundaries: vec![5, 18],
        }
    }

    #[test]
    fn age_based_selection_matches_scenario_3() {
        let strategy = age_based();
        let pick = |age| strategy.get_therapy(age, |_| 0);
        assert_eq!(pick(3), TherapyId(0));
        assert_eq!(pick(5), TherapyId(1));
        assert_eq!(pick(17), TherapyId(1));
        assert_eq!(pick(18), TherapyId(2));
        assert_eq!(pick(40), TherapyId(2));
    }

    #[test]
    fn replace_therapy_at_swaps_one_arm() {
        let mut strategy = age_based();
        strategy.replace_therapy_at(1, TherapyId(9));
        assert_eq!(strategy.get_therapy(10, |_| 0), TherapyId(9));
        assert_eq!(strategy.get_therapy(3, |_| 0), TherapyId(0));
    }

    #[test]
    fn cycling_advances_and_wraps() {
        let mut strategy = Strategy::Cycling {
            therapy_ids: vec![TherapyId(0), TherapyId(1)],
            cycle_days: 100,
            current_index: 0,
            last_rotation_day: 0,
        };
        assert_eq!(strategy.get_therapy(0, |_| 0), TherapyId(0));
        strategy.advance_cycle(100);
        assert_eq!(strategy.get_therapy(0, |_| 0), TherapyId(1));
        strategy.advance_cycle(200);
        assert_eq!(strategy.get_therapy(0, |_| 0), TherapyId(0));
    }

    #[test]
    fn registry_rotation_matches_scenario_5() {
        let mut strategies = HashMap::default();
        strategies.insert(
            StrategyId(0),
            Strategy::Sft {
                therapy_id: TherapyId(0),
            },
        );
        strategies.insert(
            StrategyId(1),
            Strategy::Sft {
                therapy_id: TherapyId(1),
            },
        );
        let mut registry = StrategyRegistry::new(strategies, StrategyId(0));
        assert_eq!(
            registry.active_strategy().get_therapy(0, |_| 0),
            TherapyId(0)
        );
        registry.set_active(StrategyId(1));
        assert_eq!(
            registry.active_strategy().get_therapy(0, |_| 0),
            TherapyId(1)
        );
        registry.set_active(StrategyId(0));
        assert_eq!(
            registry.active_strategy().get_therapy(0, |_| 0),
            TherapyId(0)
        );
    }
}
