//! C5/C6: the person arena, its indices, and the daily population-level update (biological
//! update of every resident clone/dose/immune level, the biting/infection step, and dispatch of
//! population-targeted events).
pub mod index;

use crate::context::SimulationContext;
use crate::define_rng;
use crate::event::EventKind;
use crate::person::{DrugType, GenotypeDb, GenotypeId, HostState, Person, PersonId, UpdateFn};
use index::{AllIndex, BucketIndex};

define_rng!(BitingRng);
define_rng!(RecipientRng);
define_rng!(MutationRng);
define_rng!(ImportationRng);
define_rng!(LevelAssignmentRng);
define_rng!(MovementRng);

fn state_tag(state: HostState) -> u8 {
    match state {
        HostState::Susceptible => 0,
        HostState::Exposed => 1,
        HostState::Asymptomatic => 2,
        HostState::Clinical => 3,
        HostState::Dead => 4,
    }
}

/// The full resident population plus its indices and the immutable biological reference tables
/// (`drug_types`, `genotype_db`) every person's clones and doses are interpreted against.
pub struct Population {
    persons: Vec<Person>,
    drug_types: Vec<DrugType>,
    genotype_db: GenotypeDb,
    all_index: AllIndex,
    state_index: BucketIndex<(u32, u8, u8)>,
    moving_index: BucketIndex<(u32, u16)>,
    /// Per-location baseline biting rate, adjustable by `AnnualBetaUpdate`/`UpdateBetaRaster`.
    beta: Vec<f64>,
    /// Fraction of bites that successfully seed a new infection, adjustable by
    /// `ChangeCirculationPercent`.
    circulation_percent: f64,
    /// Whether a donor's drug-selected allele can mutate into a recipient's new infection
    /// during the biting step. Toggled by `TurnOnMutation`/`TurnOffMutation`.
    mutation_enabled: bool,
}

impl Population {
    #[must_use]
    pub fn new(number_of_locations: usize, drug_types: Vec<DrugType>, genotype_db: GenotypeDb) -> Self {
        Population {
            persons: Vec::new(),
            drug_types,
            genotype_db,
            all_index: AllIndex::new(),
            state_index: BucketIndex::new(),
            moving_index: BucketIndex::new(),
            beta: vec![1.0; number_of_locations],
            circulation_percent: 1.0,
            mutation_enabled: true,
        }
    }

    pub fn add_person(&mut self, location: u32, age_days: u32, birthday_offset: u32, day: i32) -> PersonId {
        let id = PersonId(self.persons.len() as u32);
        let person = Person::new(id, location, age_days, birthday_offset, day);
        self.all_index.insert(id);
        self.state_index.insert((location, state_tag(HostState::Susceptible), 0), id);
        self.moving_index.insert((location, 0), id);
        self.persons.push(person);
        id
    }

    #[must_use]
    pub fn person(&self, id: PersonId) -> &Person {
        &self.persons[id.0 as usize]
    }

    pub fn person_mut(&mut self, id: PersonId) -> &mut Person {
        &mut self.persons[id.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    #[must_use]
    pub fn living_count(&self) -> usize {
        self.all_index.len()
    }

    /// Every currently-living person, in no particular order. Used by reporters building a
    /// point-in-time snapshot (prevalence, infected-individual counts); not an ordering any
    /// caller should rely on.
    #[must_use]
    pub fn living_people(&self) -> &[PersonId] {
        self.all_index.members()
    }

    #[must_use]
    pub fn drug_type(&self, id: crate::person::DrugId) -> &DrugType {
        &self.drug_types[id.0 as usize]
    }

    #[must_use]
    pub fn drug_types(&self) -> &[DrugType] {
        &self.drug_types
    }

    #[must_use]
    pub fn genotype_db(&self) -> &GenotypeDb {
        &self.genotype_db
    }

    pub fn genotype_db_mut(&mut self) -> &mut GenotypeDb {
        &mut self.genotype_db
    }

    #[must_use]
    pub fn persons_in_location_state_age_class(&self, location: u32, state: HostState, age_class: u8) -> &[PersonId] {
        self.state_index.bucket(&(location, state_tag(state), age_class))
    }

    #[must_use]
    pub fn persons_in_location_moving_level(&self, location: u32, moving_level: u16) -> &[PersonId] {
        self.moving_index.bucket(&(location, moving_level))
    }

    #[must_use]
    pub fn beta(&self, location: u32) -> f64 {
        self.beta.get(location as usize).copied().unwrap_or(0.0)
    }

    pub fn set_beta(&mut self, location: u32, value: f64) {
        if let Some(slot) = self.beta.get_mut(location as usize) {
            *slot = value;
        }
    }

    #[must_use]
    pub fn circulation_percent(&self) -> f64 {
        self.circulation_percent
    }

    #[must_use]
    pub fn mutation_enabled(&self) -> bool {
        self.mutation_enabled
    }
}

impl SimulationContext {
    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Adds a person the same way `population_mut().add_person` does, then assigns their
    /// innate biting/moving levels by sampling `relative_biting_info`/`relative_moving_info`'s
    /// discretized level distributions (falling back to the neutral level 0 / rate 1.0 each
    /// field already defaults to, when the corresponding distribution is empty). There is no
    /// demographic population generator in this crate — building an initial population from
    /// `Config::age_structure` is left to the caller (see DESIGN.md) — so this is the entry
    /// point such a caller should use instead of `population_mut().add_person` directly
    /// whenever a run configures biting/moving heterogeneity.
    pub fn add_person_with_sampled_levels(&mut self, location: u32, age_days: u32, birthday_offset: u32, day: i32) -> PersonId {
        let person_id = self.population_mut().add_person(location, age_days, birthday_offset, day);

        let biting_info = self.config().relative_biting_info.clone();
        let (biting_level, biting_rate) = sample_relative_rate_level(self, &biting_info);
        let person = self.population_mut().person_mut(person_id);
        person.biting_level_index = biting_level;
        person.innate_relative_biting_rate = biting_rate;

        let moving_info = self.config().relative_moving_info.clone();
        let (moving_level, _moving_rate) = sample_relative_rate_level(self, &moving_info);
        self.population_mut().person_mut(person_id).moving_level_index = moving_level;
        self.recompute_moving_cell(person_id);

        person_id
    }

    #[must_use]
    pub fn drug_type(&self, id: crate::person::DrugId) -> &DrugType {
        self.population.drug_type(id)
    }

    /// Recomputes `age_class_index` from `Config::age_structure` (the age, in years, below
    /// which each class's upper bound lies) and re-files the person in the state index if its
    /// cell changed.
    pub fn recompute_age_class(&mut self, person_id: PersonId) {
        let age_years = self.population.person(person_id).age_years();
        let boundaries = &self.config().age_structure;
        let new_class = boundaries.partition_point(|&bound| bound <= age_years).min(boundaries.len().saturating_sub(1)) as u8;
        if self.population.person(person_id).age_class_index != new_class {
            self.population.person_mut(person_id).age_class_index = new_class;
            self.recompute_state_cell(person_id);
        }
    }

    /// Re-files `person_id` in `state_index` using its current (location, host_state,
    /// age_class_index). Must be called any time one of those three fields changes (Invariant
    /// 5). A person who has just died is instead dropped from every index via `remove_person`.
    pub fn recompute_state_cell(&mut self, person_id: PersonId) {
        let person = self.population.person(person_id);
        if person.host_state == HostState::Dead {
            self.population.state_index.remove(person_id);
            self.population.moving_index.remove(person_id);
            self.population.all_index.remove(person_id);
            return;
        }
        let key = (person.location, state_tag(person.host_state), person.age_class_index);
        self.population.state_index.change(person_id, key);
    }

    pub fn recompute_moving_cell(&mut self, person_id: PersonId) {
        let person = self.population.person(person_id);
        if person.host_state == HostState::Dead {
            return;
        }
        let key = (person.location, person.moving_level_index);
        self.population.moving_index.change(person_id, key);
    }

    /// C6: the once-per-tick population update. Runs after every population-owned event for the
    /// day has been dispatched and before the day's individual events: per-person biological
    /// update (clone density, drug decay, immunity), then the biting/infection step.
    pub fn daily_population_update(&mut self) {
        self.daily_biological_update();
        self.daily_biting_step();
        self.daily_movement_step();
    }

    /// Gravity-style movement: each living person independently rolls
    /// `biological_rates.daily_movement_probability`; a person who moves picks a destination
    /// location with probability proportional to `spatial::SpatialData::travel_weight`. A
    /// person never "moves" to their own location (`travel_weight` is `0.0` for `from == to`),
    /// and a run with no travel raster loaded falls back to a flat weight across every other
    /// location.
    fn daily_movement_step(&mut self) {
        let probability = self.config().biological_rates.daily_movement_probability;
        if probability <= 0.0 {
            return;
        }
        let number_of_locations = self.config().number_of_locations as u32;
        if number_of_locations <= 1 {
            return;
        }
        let members = self.population.all_index.members().to_vec();
        for person_id in members {
            if !self.sample_bool(MovementRng, probability) {
                continue;
            }
            let current_location = self.population.person(person_id).location;
            let weights: Vec<f64> = (0..number_of_locations).map(|to| self.spatial().travel_weight(current_location, to)).collect();
            if weights.iter().all(|&weight| weight <= 0.0) {
                continue;
            }
            let destination = self.sample_weighted(MovementRng, &weights) as u32;
            if destination == current_location {
                continue;
            }
            self.population_mut().person_mut(person_id).location = destination;
            self.recompute_state_cell(person_id);
            self.recompute_moving_cell(person_id);
        }
    }

    fn daily_biological_update(&mut self) {
        let day = self.current_day();
        let density_level = self.config().parasite_density_level.clone();
        let immune_info = self.config().immune_system_information.clone();
        let rates = self.config().biological_rates.clone();

        let living: Vec<PersonId> = self.population.all_index.members().to_vec();
        for person_id in living {
            let mut exposed_today = false;
            let mut any_live_clone = false;

            let drug_snapshot: Vec<DrugType> = self.population.drug_types.clone();
            {
                let person = self.population.person_mut(person_id);
                for clone_slot in &mut person.clones {
                    let Some(clone) = clone_slot else { continue };
                    if clone.last_update_day >= day {
                        any_live_clone = true;
                        continue;
                    }
                    let days_elapsed = f64::from(day - clone.last_update_day);
                    let growth = match clone.update_fn {
                        UpdateFn::Liver | UpdateFn::ClinicalProgression => 0.1,
                        UpdateFn::Clinical => 0.05,
                        UpdateFn::ImmunityClearance => -0.2,
                        UpdateFn::Drug => -0.5,
                    };
                    let mut net_growth = growth;
                    if matches!(clone.update_fn, UpdateFn::Drug) {
                        let killing: f64 = person
                            .drugs
                            .iter()
                            .map(|dose| {
                                let drug_type = &drug_snapshot[dose.drug_type_id.0 as usize];
                                drug_type.killing_rate(dose.concentration_fraction())
                            })
                            .sum();
                        net_growth = growth - killing;
                        if net_growth > 0.0 {
                            clone.resistant_escape_days += 1;
                        } else {
                            clone.resistant_escape_days = 0;
                        }
                    }
                    clone.last_update_log10_density += net_growth * days_elapsed;
                    clone.last_update_day = day;

                    if clone.last_update_log10_density >= density_level.log_density_detectable {
                        exposed_today = true;
                    }
                    if clone.last_update_log10_density > density_level.log_density_cured {
                        any_live_clone = true;
                    } else {
                        *clone_slot = None;
                    }
                }
                person.drugs.retain_mut(|dose| {
                    let drug_type = &drug_snapshot[dose.drug_type_id.0 as usize];
                    dose.daily_decay(drug_type, day)
                });
                person.immune.daily_update(&immune_info, day, exposed_today);
            }

            let resistance_escape = self
                .population
                .person(person_id)
                .clones
                .iter()
                .enumerate()
                .find(|(_, slot)| {
                    slot.as_ref()
                        .is_some_and(|clone| clone.resistant_escape_days >= rates.resistant_escape_days_threshold)
                })
                .map(|(index, _)| index as u32);
            if let Some(clone_id) = resistance_escape {
                crate::person::cancel_all_events_except(self, person_id, None);
                let event_id = self.schedule_individual(
                    person_id,
                    day,
                    EventKind::EndClinicalDueToDrugResistance { clone_id },
                );
                self.population_mut().person_mut(person_id).pending_events.push((
                    event_id,
                    EventKind::EndClinicalDueToDrugResistance { clone_id },
                ));
            }

            let host_state = self.population.person(person_id).host_state;
            if !any_live_clone && matches!(host_state, HostState::Exposed | HostState::Asymptomatic) {
                self.population_mut().person_mut(person_id).host_state = HostState::Susceptible;
                self.recompute_state_cell(person_id);
            }
        }
    }

    /// C6 biting/infection step: per location, draw a Poisson count of new infectious bites from
    /// the expected value `beta * seasonal_factor * circulation_percent * sum(relative biting
    /// rate of infectious persons)`, then for each bite pick a weighted-random recipient and, if
    /// they are susceptible or already exposed, schedule `MoveParasiteToBlood` with a genotype
    /// drawn from a randomly-chosen infectious donor (subject to the per-drug mutation hook).
    fn daily_biting_step(&mut self) {
        let day = self.current_day();
        let day_of_year = self.calendar().day_of_year(day);
        let seasonal_factor = self.config().seasonal_info.factor(day_of_year);
        let number_of_locations = self.config().number_of_locations;
        let circulation_percent = self.population.circulation_percent();

        for location in 0..number_of_locations as u32 {
            let members = self.population.all_index.members().to_vec();
            let in_location: Vec<PersonId> = members.into_iter().filter(|&id| self.population.person(id).location == location).collect();
            if in_location.is_empty() {
                continue;
            }

            let infectious: Vec<PersonId> = in_location
                .iter()
                .copied()
                .filter(|&id| {
                    let person = self.population.person(id);
                    matches!(person.host_state, HostState::Asymptomatic | HostState::Clinical) && person.has_live_clone()
                })
                .collect();
            if infectious.is_empty() {
                continue;
            }

            let biting_weight_sum: f64 = infectious.iter().map(|&id| self.population.person(id).innate_relative_biting_rate).sum();
            let expected_bites = self.population.beta(location) * seasonal_factor * circulation_percent * biting_weight_sum;
            let bite_count = self.sample_poisson(BitingRng, expected_bites.max(0.0));
            self.record_bites(location, bite_count);
            if bite_count == 0 {
                continue;
            }

            let recipient_weights: Vec<f64> = in_location.iter().map(|&id| self.population.person(id).innate_relative_biting_rate.max(1e-9)).collect();

            for _ in 0..bite_count {
                let recipient_index = self.sample_weighted(RecipientRng, &recipient_weights);
                let recipient = in_location[recipient_index];
                let recipient_state = self.population.person(recipient).host_state;
                if !matches!(recipient_state, HostState::Susceptible | HostState::Exposed) {
                    continue;
                }

                let donor_index: usize = self.sample_range(RecipientRng, 0..infectious.len());
                let donor = infectious[donor_index];
                let donor_genotype = self
                    .population
                    .person(donor)
                    .clones
                    .iter()
                    .find_map(Option::as_ref)
                    .map(|clone| clone.genotype);
                let Some(mut genotype) = donor_genotype else { continue };

                let donor_drug = self.population.person(donor).drugs.first().map(|dose| dose.drug_type_id);
                if self.population.mutation_enabled() {
                    if let Some(drug_id) = donor_drug {
                        let drug_type = self.population.drug_type(drug_id).clone();
                        if !drug_type.affecting_loci.is_empty() && self.sample_bool(MutationRng, drug_type.p_mutation) {
                            let locus = drug_type.affecting_loci[0];
                            let new_allele: u8 = self.sample_range(MutationRng, 0..2);
                            genotype = self.population_mut().genotype_db_mut().mutate_locus(genotype, locus, new_allele);
                        }
                    }
                }

                self.population_mut().person_mut(recipient).host_state = HostState::Exposed;
                self.recompute_state_cell(recipient);
                let liver_duration = self.config().biological_rates.liver_duration_days;
                crate::person::schedule_exposure(self, recipient, day + liver_duration, genotype);
            }
        }
    }
}

/// Dispatches a population-targeted `EventKind`. Population events are drained for the current
/// day before individual events (see `context::SimulationContext::tick`).
pub fn dispatch_population_event(context: &mut SimulationContext, kind: &EventKind) {
    match kind.clone() {
        EventKind::ChangeStrategy { strategy_id } => {
            context.strategies_mut().set_active(crate::strategy::StrategyId(strategy_id));
        }
        EventKind::RotateStrategy {
            first_strategy_id,
            second_strategy_id,
            period_days,
        } => {
            let day = context.current_day();
            let active = context.strategies().active_strategy_id().0;
            let next_active = if active == first_strategy_id { second_strategy_id } else { first_strategy_id };
            context.strategies_mut().set_active(crate::strategy::StrategyId(next_active));
            context.schedule_population(
                day + i32::try_from(period_days).unwrap_or(0),
                EventKind::RotateStrategy {
                    first_strategy_id,
                    second_strategy_id,
                    period_days,
                },
            );
        }
        EventKind::ChangeTreatmentCoverage { location, p_treatment } => {
            context.treatment_coverage_mut().set_override(location, p_treatment);
        }
        EventKind::ChangeCirculationPercent { new_percent } => {
            context.population_mut().circulation_percent = new_percent;
        }
        EventKind::DistrictImportationDaily {
            district,
            locus,
            mutant_allele,
            daily_rate,
        } => {
            let day = context.current_day();
            if day + 1 <= context.total_days() {
                context.schedule_population(
                    day + 1,
                    EventKind::DistrictImportationDaily { district, locus, mutant_allele, daily_rate },
                );
            }
            import_into_district(context, district, locus, mutant_allele, daily_rate);
        }
        EventKind::IntroduceParasitesCases { location, genotype, number_of_cases } => {
            introduce_parasites_cases(context, location, genotype, number_of_cases);
        }
        EventKind::IntroduceMutant { locus, allele, fraction } => {
            introduce_mutant(context, locus, allele, fraction);
        }
        // The three named markers are fixed locus/allele pairs into the configured genotype,
        // matching the original project's hard-coded resistance-marker event builders.
        EventKind::IntroduceAQMutant { fraction } => introduce_mutant(context, 0, 1, fraction),
        EventKind::IntroduceLumefantrineMutant { fraction } => introduce_mutant(context, 1, 1, fraction),
        EventKind::IntroducePlas2Copy { fraction } => introduce_mutant(context, 2, 1, fraction),
        EventKind::SingleRoundMda {
            fraction_population_targeted,
            days_to_complete,
        } => {
            schedule_single_round_mda(context, fraction_population_targeted, days_to_complete);
        }
        EventKind::AnnualBetaUpdate | EventKind::UpdateBetaRaster => {
            // Re-reading the beta raster is a startup/IO-bound concern (`spatial::SpatialData`);
            // between raster reloads beta stays at its last-set value. Still self-reschedules so
            // the annual cadence is observable even with no raster configured.
            let day = context.current_day();
            context.schedule_population(day + 365, kind.clone());
        }
        EventKind::AnnualCoverageUpdate => {
            let day = context.current_day();
            context.schedule_population(day + 365, kind.clone());
        }
        EventKind::TurnOnMutation => context.population_mut().mutation_enabled = true,
        EventKind::TurnOffMutation => context.population_mut().mutation_enabled = false,
        EventKind::ModifyNestedMft {
            strategy_id,
            therapy_index,
            replacement_therapy_id,
        } => {
            let strategy = context.strategies_mut().strategy_mut(crate::strategy::StrategyId(strategy_id));
            strategy.replace_therapy_at(therapy_index, crate::therapy::TherapyId(replacement_therapy_id));
        }
        // No payload fields carry a source district/locus/allele to import from; wiring this up
        // needs `EventConfig` to grow an importation-rate table first (see DESIGN.md).
        EventKind::ImportationPeriodically => {}
        ref other => {
            crate::fail_invariant(context.current_day(), format!("event kind {other:?} is not a valid population-targeted event"));
        }
    }
}

/// A recurring district-level importation firing: draws a Poisson case count from
/// `daily_rate`, then distributes the cases across the district's locations weighted by each
/// location's current asymptomatic-plus-clinical count (imported cases are more likely to seed
/// further transmission where the parasite is already circulating), matching the original
/// model's `DistrictImportationDailyEvent::execute`. Each case does not seed a fresh infection:
/// it picks an already-infected (asymptomatic/clinical) resident of the chosen location and
/// flips one of their carried clones' allele at `locus` to `mutant_allele`
/// (`combine_mutation_to` in the original), so the mutant spreads through the existing infected
/// pool rather than through newly-infected susceptibles.
fn import_into_district(context: &mut SimulationContext, district: u32, locus: u8, mutant_allele: u8, daily_rate: f64) {
    let number_of_cases = context.sample_poisson(ImportationRng, daily_rate);
    if number_of_cases == 0 {
        return;
    }
    let locations = context.spatial().locations_in_district(crate::spatial::DistrictId(district));
    if locations.is_empty() {
        return;
    }
    let number_of_age_classes = context.config().number_of_age_classes as u8;
    let infected_at = |context: &SimulationContext, location: u32| -> Vec<PersonId> {
        (0..number_of_age_classes)
            .flat_map(|age_class| {
                context
                    .population()
                    .persons_in_location_state_age_class(location, HostState::Asymptomatic, age_class)
                    .iter()
                    .chain(context.population().persons_in_location_state_age_class(location, HostState::Clinical, age_class))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .collect()
    };
    let weights: Vec<f64> = locations.iter().map(|&location| infected_at(context, location).len() as f64).collect();
    if weights.iter().all(|&weight| weight <= 0.0) {
        return;
    }
    for _ in 0..number_of_cases {
        let chosen = locations[context.sample_weighted(ImportationRng, &weights)];
        let candidates = infected_at(context, chosen);
        if candidates.is_empty() {
            continue;
        }
        let target = candidates[context.sample_range(ImportationRng, 0..candidates.len())];
        mutate_one_clone(context, target, locus, mutant_allele);
    }
}

/// Flips the allele at `locus` to `mutant_allele` on one of `person_id`'s carried clones (the
/// first live one), re-interning the mutated allele vector. A no-op if the person has since lost
/// every clone.
fn mutate_one_clone(context: &mut SimulationContext, person_id: PersonId, locus: u8, mutant_allele: u8) {
    let genotype_opt = context.population().person(person_id).clones.iter().find_map(Option::as_ref).map(|clone| clone.genotype);
    let Some(genotype) = genotype_opt else { return };
    let mutated = context.population_mut().genotype_db_mut().mutate_locus(genotype, locus, mutant_allele);
    if let Some(clone) = context.population_mut().person_mut(person_id).clones.iter_mut().find_map(Option::as_mut) {
        clone.genotype = mutated;
    }
}

fn introduce_parasites_cases(context: &mut SimulationContext, location: u32, genotype: GenotypeId, number_of_cases: u32) {
    for _ in 0..number_of_cases {
        infect_one_susceptible(context, location, genotype);
    }
}

/// Picks one uniformly-random susceptible person at `location` (across every age class) and
/// seeds a liver-stage clone of `genotype` in them. A silent no-op if the location has no
/// susceptible residents, since an importation event racing against a fully-infected location
/// is not an error.
fn infect_one_susceptible(context: &mut SimulationContext, location: u32, genotype: GenotypeId) {
    let number_of_age_classes = context.config().number_of_age_classes as u8;
    let candidates: Vec<PersonId> = (0..number_of_age_classes)
        .flat_map(|age_class| context.population().persons_in_location_state_age_class(location, HostState::Susceptible, age_class).to_vec())
        .collect();
    if candidates.is_empty() {
        return;
    }
    let target = candidates[context.sample_range(ImportationRng, 0..candidates.len())];
    let density_level = context.config().parasite_density_level.clone();
    let day = context.current_day();
    context.population_mut().person_mut(target).host_state = HostState::Asymptomatic;
    context.population_mut().person_mut(target).clones.push(Some(crate::person::ParasiteClone::new(
        genotype,
        density_level.log_density_from_liver,
        day,
        UpdateFn::Liver,
    )));
    context.recompute_state_cell(target);
}

/// Draws a discrete level index from `info.distribution` (weights, need not sum to 1) using
/// `LevelAssignmentRng`, paired with the multiplier `info.values` names for that level. An
/// unconfigured (empty) distribution draws nothing and returns the neutral `(0, 1.0)`.
fn sample_relative_rate_level(context: &mut SimulationContext, info: &crate::config::RelativeRateInfo) -> (u16, f64) {
    if info.distribution.is_empty() {
        return (0, 1.0);
    }
    let level = context.sample_weighted(LevelAssignmentRng, &info.distribution);
    let rate = info.values.get(level).copied().unwrap_or(1.0);
    (level as u16, rate)
}

fn introduce_mutant(context: &mut SimulationContext, locus: u8, allele: u8, fraction: f64) {
    let targets: Vec<PersonId> = context.population().all_index.members().to_vec();
    let take = ((targets.len() as f64) * fraction).round() as usize;
    for &person_id in targets.iter().take(take) {
        let genotype_opt = context
            .population()
            .person(person_id)
            .clones
            .iter()
            .find_map(Option::as_ref)
            .map(|clone| clone.genotype);
        if let Some(genotype) = genotype_opt {
            let mutated = context.population_mut().genotype_db_mut().mutate_locus(genotype, locus, allele);
            if let Some(clone) = context.population_mut().person_mut(person_id).clones.iter_mut().find_map(Option::as_mut) {
                clone.genotype = mutated;
            }
        }
    }
}

/// Selects the MDA round's targets immediately (one independent `fraction_population_targeted`
/// coin flip per person) but spreads the actual treatment over `[day, day + days_to_complete]`
/// by scheduling one `ApplyMdaTreatment` individual event per selected person on a day drawn
/// uniformly from that window, so nobody is dosed twice and the round's clinical load doesn't
/// land on a single simulated day.
fn schedule_single_round_mda(context: &mut SimulationContext, fraction_population_targeted: f64, days_to_complete: u32) {
    let day = context.current_day();
    let targets: Vec<PersonId> = context.population().all_index.members().to_vec();
    for &person_id in &targets {
        if context.sample_bool(ImportationRng, fraction_population_targeted) {
            let offset: i32 = if days_to_complete == 0 {
                0
            } else {
                i32::try_from(context.sample_range(ImportationRng, 0..=days_to_complete)).unwrap_or(0)
            };
            context.schedule_individual(person_id, day + offset, EventKind::ApplyMdaTreatment);
        }
    }
}

/// Clears a person's live infection and drug doses and reverts an `Exposed`/`Asymptomatic` host
/// to `Susceptible`, as the individual-level effect of being dosed during an MDA round.
pub(crate) fn apply_mda_treatment(context: &mut SimulationContext, person_id: PersonId) {
    let location = context.population().person(person_id).location;
    let age_class = context.population().person(person_id).age_class_index;
    for clone_slot in &mut context.population_mut().person_mut(person_id).clones {
        if clone_slot.is_some() {
            *clone_slot = None;
        }
    }
    context.population_mut().person_mut(person_id).drugs.clear();
    if matches!(
        context.population().person(person_id).host_state,
        HostState::Asymptomatic | HostState::Exposed
    ) {
        context.population_mut().person_mut(person_id).host_state = HostState::Susceptible;
        context.recompute_state_cell(person_id);
    }
    context.record_treatment(location, age_class);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{DrugId, GenotypeDb};

    fn empty_population() -> Population {
        Population::new(2, Vec::new(), GenotypeDb::new())
    }

    #[test]
    fn add_person_indexes_into_susceptible_bucket() {
        let mut population = empty_population();
        let id = population.add_person(0, 9125, 0, 0);
        assert_eq!(population.persons_in_location_state_age_class(0, HostState::Susceptible, 0), &[id]);
    }

    #[test]
    fn beta_defaults_to_one_and_is_settable() {
        let mut population = empty_population();
        assert_eq!(population.beta(0), 1.0);
        population.set_beta(0, 2.5);
        assert_eq!(population.beta(0), 2.5);
        assert_eq!(population.beta(5), 0.0);
    }

    #[test]
    fn drug_type_lookup_by_id() {
        let population = Population::new(
            1,
            vec![DrugType {
                id: DrugId(0),
                elimination_half_life: 7.0,
                maximum_killing_rate: 0.99,
                n_param: 10.0,
                affecting_loci: vec![],
                p_mutation: 0.0,
            }],
            GenotypeDb::new(),
        );
        assert_eq!(population.drug_type(DrugId(0)).id, DrugId(0));
    }

    #[test]
    fn movement_step_relocates_when_probability_is_one() {
        let mut config = crate::config::Config::minimal_default();
        config.number_of_locations = 2;
        let mut context = SimulationContext::from_config(config);
        context.config_mut().biological_rates.daily_movement_probability = 1.0;
        let person_id = context.population_mut().add_person(0, 9125, 0, 0);
        context.daily_movement_step();
        assert_eq!(context.population().person(person_id).location, 1);
    }

    #[test]
    fn movement_step_is_a_no_op_with_default_probability() {
        let mut config = crate::config::Config::minimal_default();
        config.number_of_locations = 2;
        let mut context = SimulationContext::from_config(config);
        let person_id = context.population_mut().add_person(0, 9125, 0, 0);
        context.daily_movement_step();
        assert_eq!(context.population().person(person_id).location, 0);
    }

    #[test]
    fn introduce_parasites_cases_infects_requested_count() {
        let mut context = SimulationContext::new();
        for _ in 0..5 {
            context.population_mut().add_person(0, 9125, 0, 0);
        }
        let genotype = context.population_mut().genotype_db_mut().intern(vec![1]);
        introduce_parasites_cases(&mut context, 0, genotype, 3);
        let infected = context.population().persons_in_location_state_age_class(0, HostState::Asymptomatic, 0).len();
        assert_eq!(infected, 3);
        let susceptible = context.population().persons_in_location_state_age_class(0, HostState::Susceptible, 0).len();
        assert_eq!(susceptible, 2);
    }

    #[test]
    fn import_into_district_is_a_no_op_with_no_infected_seed_locations() {
        let mut context = SimulationContext::new();
        for _ in 0..5 {
            context.population_mut().add_person(0, 9125, 0, 0);
        }
        // Every location starts fully susceptible, so the infected-count weighting has nothing
        // to distribute across and the import is skipped even with a high rate.
        import_into_district(&mut context, 0, 0, 1, 10.0);
        let infected = context.population().persons_in_location_state_age_class(0, HostState::Asymptomatic, 0).len();
        assert_eq!(infected, 0);
    }

    #[test]
    fn import_into_district_seeds_new_cases_where_the_district_already_has_infections() {
        let mut context = SimulationContext::new();
        for _ in 0..5 {
            context.population_mut().add_person(0, 9125, 0, 0);
        }
        let genotype = context.population_mut().genotype_db_mut().intern(vec![0]);
        introduce_parasites_cases(&mut context, 0, genotype, 1);
        import_into_district(&mut context, 0, 0, 1, 50.0);
        let infected = context.population().persons_in_location_state_age_class(0, HostState::Asymptomatic, 0).len();
        assert!(infected > 1, "expected additional imported cases, got {infected}");
    }
}
