//! C1/C3: the simulation's central object. Owns the two event queues, the resident population,
//! the run's configuration-derived reference tables, and the lazily-initialized data-plugin
//! slots (PRNG streams, reporters) every other module reaches it through.
use std::any::Any;
use std::cell::OnceCell;

use crate::calendar::Calendar;
use crate::config::Config;
use crate::data_plugin::{get_data_plugin_count, DataPlugin};
use crate::event::{self, Event, EventId, EventKind, EventOwner};
use crate::person::{GenotypeDb, PersonId};
use crate::plan::Queue;
use crate::population::Population;
use crate::report::ReporterState;
use crate::spatial::SpatialData;
use crate::strategy::StrategyRegistry;
use crate::therapy::TherapyDb;
use crate::treatment_coverage::TreatmentCoverage;

/// A manager for the state of the discrete-event simulation described by a `Config`.
///
/// Time advances in whole simulated days. Each day, every population-targeted event due that
/// day is dispatched, then the population's biological/biting update runs, then every
/// individual-targeted event due that day is dispatched (including any individual event a
/// population event or the biological update scheduled for the same day — the queue's FIFO tie
/// break means those run after what was already pending, never before).
pub struct SimulationContext {
    population_queue: Queue<Event, ()>,
    individual_queue: Queue<Event, ()>,
    current_day: i32,
    total_days: i32,
    population: Population,
    config: Config,
    strategy_registry: StrategyRegistry,
    therapy_db: TherapyDb,
    treatment_coverage: TreatmentCoverage,
    calendar: Calendar,
    pub(crate) reporter: ReporterState,
    pub(crate) spatial: SpatialData,
    data_plugins: Vec<OnceCell<Box<dyn Any>>>,
}

impl SimulationContext {
    /// A context built from `Config::minimal_default()`. Mainly useful for unit tests of
    /// modules (PRNG streams, data plugins) that need *a* context but don't exercise a real
    /// scenario.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(Config::minimal_default())
    }

    /// Builds a context from a fully-validated `Config`: the drug/therapy/strategy reference
    /// tables, the (initially empty) population, and the PRNG seed are all derived from it.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let drug_types = config.build_drug_types();
        let genotype_db = GenotypeDb::new();
        let population = Population::new(config.number_of_locations, drug_types, genotype_db);
        let therapy_db = TherapyDb::new(config.build_therapies());
        let strategy_registry = StrategyRegistry::from_config(&config);
        let treatment_coverage = TreatmentCoverage::new(config.pr_treatment_under5, config.pr_treatment_over5);
        let calendar = Calendar::new(config.starting_date);
        let total_days = config.total_days();
        let random_seed = config.random_seed;
        let reporter = ReporterState::new(config.number_of_locations);
        let spatial = config.build_spatial_data().unwrap_or_else(|error| {
            crate::log::warn!("failed to load spatial_info rasters, falling back to a uniform grid: {error}");
            SpatialData::uniform(config.number_of_locations)
        });
        let data_plugins = std::iter::repeat_with(OnceCell::new).take(get_data_plugin_count()).collect();

        let mut context = SimulationContext {
            population_queue: Queue::new(),
            individual_queue: Queue::new(),
            current_day: 0,
            total_days,
            population,
            config,
            strategy_registry,
            therapy_db,
            treatment_coverage,
            calendar,
            reporter,
            spatial,
            data_plugins,
        };
        context.init_random(random_seed);
        context
    }

    #[must_use]
    pub fn current_day(&self) -> i32 {
        self.current_day
    }

    #[must_use]
    pub fn total_days(&self) -> i32 {
        self.total_days
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[must_use]
    pub fn spatial(&self) -> &SpatialData {
        &self.spatial
    }

    /// Replaces the run's spatial reference data. `from_config` already loads `spatial_info`'s
    /// rasters at construction time; this exists for tests and tools that build rasters
    /// programmatically instead of from config-named paths.
    pub fn set_spatial_data(&mut self, spatial: SpatialData) {
        self.spatial = spatial;
    }

    #[must_use]
    pub fn therapy_db(&self) -> &TherapyDb {
        &self.therapy_db
    }

    #[must_use]
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategy_registry
    }

    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategy_registry
    }

    #[must_use]
    pub fn treatment_coverage(&self) -> &TreatmentCoverage {
        &self.treatment_coverage
    }

    pub fn treatment_coverage_mut(&mut self) -> &mut TreatmentCoverage {
        &mut self.treatment_coverage
    }

    /// Schedules `kind` against a specific person, to run on `day`. `day` must be `>=
    /// current_day()`; scheduling into the past is a programmer error, not a recoverable
    /// condition (fail-fast per the design notes).
    pub fn schedule_individual(&mut self, person_id: PersonId, day: i32, kind: EventKind) -> EventId {
        if day < self.current_day {
            crate::fail_invariant(self.current_day, format!("attempted to schedule {kind:?} in the past (day {day})"));
        }
        let event = Event {
            owner: EventOwner::Individual(person_id),
            scheduled_day: day,
            kind,
        };
        self.individual_queue.add_plan(day, event, ())
    }

    /// Schedules `kind` against the population as a whole.
    pub fn schedule_population(&mut self, day: i32, kind: EventKind) -> EventId {
        if day < self.current_day {
            crate::fail_invariant(self.current_day, format!("attempted to schedule {kind:?} in the past (day {day})"));
        }
        let event = Event {
            owner: EventOwner::Population,
            scheduled_day: day,
            kind,
        };
        self.population_queue.add_plan(day, event, ())
    }

    /// Cancels a previously scheduled event. Idempotent; cancelling an event that already ran or
    /// was already cancelled is a no-op, matching `plan::Queue::cancel_plan`.
    pub fn cancel_event(&mut self, id: EventId) {
        self.population_queue.cancel_plan(&id);
        self.individual_queue.cancel_plan(&id);
    }

    /// Runs the simulation from day 0 through `total_days()` inclusive, calling `tick` once per
    /// day in order.
    pub fn run(&mut self) {
        self.seed_configured_events();
        while self.current_day <= self.total_days {
            self.tick();
            self.current_day += 1;
        }
        self.report_after_run();
    }

    /// Schedules the one-time `events` table from `Config` (importation campaigns, strategy
    /// rotations, MDA rounds, ...) against the day each is configured for.
    fn seed_configured_events(&mut self) {
        let events = self.config.events.clone();
        for entry in events {
            match entry {
                crate::config::EventConfig::IntroduceParasites(infos) => {
                    for info in infos {
                        for introduction in info.parasite_info {
                            let alleles = self.config.genotype_info.decode_genotype_id(introduction.genotype_id);
                            let genotype = self.population_mut().genotype_db_mut().intern(alleles);
                            self.schedule_population(
                                introduction.day,
                                EventKind::IntroduceParasitesCases {
                                    location: info.location,
                                    genotype,
                                    number_of_cases: introduction.number_of_cases,
                                },
                            );
                        }
                    }
                }
                crate::config::EventConfig::ChangeTreatmentStrategy(infos) => {
                    for info in infos {
                        self.schedule_population(info.day, EventKind::ChangeStrategy { strategy_id: info.strategy_id });
                    }
                }
                crate::config::EventConfig::DistrictImportationDailyEvent(infos) => {
                    for info in infos {
                        let start_day = self.calendar.day_of(info.start_date);
                        self.schedule_population(
                            start_day.max(0),
                            EventKind::DistrictImportationDaily {
                                district: info.district,
                                locus: info.locus,
                                mutant_allele: info.mutant_allele,
                                daily_rate: info.daily_rate,
                            },
                        );
                    }
                }
                crate::config::EventConfig::RotateStrategy(infos) => {
                    for info in infos {
                        self.schedule_population(
                            info.day,
                            EventKind::RotateStrategy {
                                first_strategy_id: info.first_strategy_id,
                                second_strategy_id: info.second_strategy_id,
                                period_days: info.years * 365,
                            },
                        );
                    }
                }
                crate::config::EventConfig::SingleRoundMda(infos) => {
                    for info in infos {
                        self.schedule_population(
                            info.day,
                            EventKind::SingleRoundMda {
                                fraction_population_targeted: info.fraction_population_targeted,
                                days_to_complete: info.days_to_complete_all_treatments,
                            },
                        );
                    }
                }
            }
        }
    }

    /// Advances the simulation by exactly one day: drain every population event due today, then
    /// every individual event due today (including any the population step scheduled for today),
    /// then run the population's biological/biting update, then report `begin_time_step`.
    fn tick(&mut self) {
        let day = self.current_day;
        while matches!(self.population_queue.next_day(), Some(next) if next == day) {
            let Some((id, plan)) = self.population_queue.get_next_plan_with_id() else { break };
            let _ = id;
            event::dispatch(&plan.data, self);
        }

        while matches!(self.individual_queue.next_day(), Some(next) if next == day) {
            let Some((id, plan)) = self.individual_queue.get_next_plan_with_id() else { break };
            if let EventOwner::Individual(person_id) = plan.data.owner {
                self.population_mut().person_mut(person_id).forget_pending(id);
            }
            event::dispatch(&plan.data, self);
        }

        self.daily_population_update();
        self.report_begin_time_step();
        self.report_monthly_if_due();
    }

    /// Retrieves a mutable reference to the data container associated with a `DataPlugin`,
    /// initializing it via `DataPlugin::init` on first use.
    #[allow(clippy::needless_pass_by_value)]
    pub fn get_data_mut<T: DataPlugin>(&mut self, _data_plugin: T) -> &mut T::DataContainer {
        let index = T::index_within_context();
        if self.data_plugins[index].get().is_some() {
            return self.data_plugins[index]
                .get_mut()
                .unwrap()
                .downcast_mut::<T::DataContainer>()
                .expect("TypeId does not match data plugin type");
        }
        let data = T::init(self);
        let cell = self
            .data_plugins
            .get_mut(index)
            .unwrap_or_else(|| panic!("no data plugin slot at index {index}; use define_data_plugin!"));
        let _ = cell.set(Box::new(data));
        cell.get_mut()
            .unwrap()
            .downcast_mut::<T::DataContainer>()
            .expect("TypeId does not match data plugin type")
    }

    /// Retrieves a reference to the data container associated with a `DataPlugin`, initializing
    /// it via `DataPlugin::init` on first use.
    #[allow(clippy::needless_pass_by_value)]
    pub fn get_data<T: DataPlugin>(&self, _data_plugin: T) -> &T::DataContainer {
        let index = T::index_within_context();
        self.data_plugins
            .get(index)
            .unwrap_or_else(|| panic!("no data plugin slot at index {index}; use define_data_plugin!"))
            .get_or_init(|| Box::new(T::init(self)))
            .downcast_ref::<T::DataContainer>()
            .expect("TypeId does not match data plugin type")
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::HostState;

    #[test]
    fn new_context_has_no_population_and_day_zero() {
        let context = SimulationContext::new();
        assert_eq!(context.current_day(), 0);
        assert_eq!(context.population().len(), 0);
    }

    #[test]
    fn schedule_and_cancel_individual_event() {
        let mut context = SimulationContext::new();
        let person_id = context.population_mut().add_person(0, 9125, 0, 0);
        let id = context.schedule_individual(person_id, 5, EventKind::Birthday);
        context.cancel_event(id);
        context.individual_queue.get_next_plan_with_id();
        assert!(context.individual_queue.is_empty());
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn scheduling_into_the_past_panics() {
        let mut context = SimulationContext::new();
        context.current_day = 5;
        let person_id = context.population_mut().add_person(0, 9125, 0, 0);
        context.schedule_individual(person_id, 1, EventKind::Birthday);
    }

    #[test]
    fn single_untreated_infection_clears_to_susceptible() {
        let mut config = Config::minimal_default();
        config.pr_treatment_under5 = 0.0;
        config.pr_treatment_over5 = 0.0;
        let mut context = SimulationContext::from_config(config);
        let person_id = context.population_mut().add_person(0, 25 * 365, 0, 0);
        context.population_mut().person_mut(person_id).host_state = HostState::Susceptible;

        let genotype = context.population_mut().genotype_db_mut().intern(vec![0]);
        context.population_mut().person_mut(person_id).host_state = HostState::Exposed;
        crate::person::schedule_exposure(&mut context, person_id, 1, genotype);

        for _ in 0..120 {
            context.tick();
            context.current_day += 1;
            if context.population().person(person_id).host_state == HostState::Susceptible
                && context.current_day > 1
            {
                break;
            }
        }
        assert_eq!(context.population().person(person_id).host_state, HostState::Susceptible);
    }
}
