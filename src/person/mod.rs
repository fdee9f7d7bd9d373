//! C2/C4: the per-individual state machine. `Person` holds everything the model tracks about
//! one host; `dispatch_individual_event` is the single place `EventKind`s that target a person
//! are interpreted, matching the state table and the `ProgressToClinicalEvent.execute`
//! pseudocode (see `original_source/src/Events/ProgressToClinicalEvent.cpp`).
pub mod drug;
pub mod immune;
pub mod parasite;

pub use drug::{DrugId, DrugInBlood, DrugType};
pub use immune::{ImmuneComponent, ImmuneVariant};
pub use parasite::{GenotypeDb, GenotypeId, ParasiteClone, UpdateFn};

use crate::context::SimulationContext;
use crate::define_rng;
use crate::event::{EventId, EventKind};
use crate::strategy::Strategy;

define_rng!(ProgressionRng);
define_rng!(TreatmentRng);
define_rng!(OutcomeRng);
define_rng!(ClinicalDensityRng);

/// A stable identifier indexing into `Population::persons`. Persons are arena-allocated and
/// never removed (Invariant 3: a `DEAD` person is tombstoned in place, not freed), so an id
/// handed out once stays valid for the life of the run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PersonId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HostState {
    Susceptible,
    Exposed,
    Asymptomatic,
    Clinical,
    Dead,
}

/// One host's full state: demographic attributes, the three index keys the population's
/// auxiliary slot-maps track (`location`, `host_state`, `age_class_index`, `moving_level_index`),
/// and within-host biology.
#[derive(Clone, Debug)]
pub struct Person {
    pub id: PersonId,
    pub location: u32,
    pub residence_location: u32,
    pub host_state: HostState,
    pub age_days: u32,
    pub age_class_index: u8,
    pub biting_level_index: u16,
    pub moving_level_index: u16,
    pub innate_relative_biting_rate: f64,
    /// Day-of-year offset at which this person's `Birthday` event fires each year, assigned at
    /// creation so birthdays don't all land on the same calendar day.
    pub birthday_offset: u32,
    /// Parasite clones this person currently carries. A cleared clone is tombstoned to `None`
    /// rather than removed so any `clone_id` (a `Vec` index) referenced by an in-flight event
    /// stays valid — a vanished clone is then a silent `TransientBiologicalMiss`, not a panic.
    pub clones: Vec<Option<ParasiteClone>>,
    pub drugs: Vec<DrugInBlood>,
    pub immune: ImmuneComponent,
    /// Every event currently scheduled against this person, with enough of the payload kept
    /// around to answer "is this a `ProgressToClinical` event" without a second lookup into the
    /// event queue. Mandatory bookkeeping for `cancel_all_events_except` and
    /// `cancel_all_other_progress_to_clinical_events_except` (Invariant 1).
    pub pending_events: Vec<(EventId, EventKind)>,
}

impl Person {
    #[must_use]
    pub fn new(id: PersonId, location: u32, age_days: u32, birthday_offset: u32, day: i32) -> Self {
        let variant = if age_days < 365 {
            ImmuneVariant::Infant
        } else {
            ImmuneVariant::NonInfant
        };
        Person {
            id,
            location,
            residence_location: location,
            host_state: HostState::Susceptible,
            age_days,
            age_class_index: 0,
            biting_level_index: 0,
            moving_level_index: 0,
            innate_relative_biting_rate: 1.0,
            birthday_offset,
            clones: Vec::new(),
            drugs: Vec::new(),
            immune: ImmuneComponent::new(variant, day),
            pending_events: Vec::new(),
        }
    }

    #[must_use]
    pub fn age_years(&self) -> u32 {
        self.age_days / 365
    }

    /// True if this person carries at least one live (non-tombstoned) parasite clone.
    #[must_use]
    pub fn has_live_clone(&self) -> bool {
        self.clones.iter().any(Option::is_some)
    }

    fn record_pending(&mut self, id: EventId, kind: EventKind) {
        self.pending_events.push((id, kind));
    }

    pub(crate) fn forget_pending(&mut self, id: EventId) {
        self.pending_events.retain(|(pending_id, _)| *pending_id != id);
    }
}

/// Schedules `kind` against `person_id` and records it in the person's pending-event list.
/// Every `Person`-targeted event must be scheduled through this helper (never directly through
/// `context.schedule_individual`) so the pending list stays authoritative.
fn schedule_for(context: &mut SimulationContext, person_id: PersonId, day: i32, kind: EventKind) -> EventId {
    let event_id = context.schedule_individual(person_id, day, kind.clone());
    context.population_mut().person_mut(person_id).record_pending(event_id, kind);
    event_id
}

/// Cancels every event currently pending against `person_id` except `keep` (if given). Used on
/// death and on transition into `CLINICAL` to enforce Invariant 3 / Invariant 1.
pub fn cancel_all_events_except(context: &mut SimulationContext, person_id: PersonId, keep: Option<EventId>) {
    let pending = context.population().person(person_id).pending_events.clone();
    for (id, _) in &pending {
        if Some(*id) != keep {
            context.cancel_event(*id);
        }
    }
    context
        .population_mut()
        .person_mut(person_id)
        .pending_events
        .retain(|(id, _)| Some(*id) == keep);
}

/// Cancels every other in-flight `ProgressToClinical` event for this person, keeping `keep`.
/// Enforces the single-in-flight-progression-per-person invariant; other event kinds are left
/// untouched (a clinical transition does not cancel, say, a pending `Birthday`).
fn cancel_other_progress_to_clinical_events(context: &mut SimulationContext, person_id: PersonId, keep: EventId) {
    let pending = context.population().person(person_id).pending_events.clone();
    for (id, kind) in &pending {
        if *id != keep && matches!(kind, EventKind::ProgressToClinical { .. }) {
            context.cancel_event(*id);
        }
    }
    context.population_mut().person_mut(person_id).pending_events.retain(|(id, kind)| {
        *id == keep || !matches!(kind, EventKind::ProgressToClinical { .. })
    });
}

/// Entry point for the SUSCEPTIBLE -> EXPOSED leg of the state table, called from the
/// population's daily biting step once a bite has been attributed to a susceptible recipient.
/// The recipient's `host_state` is already set to `Exposed` by the caller; this only schedules
/// the liver-stage emergence event.
pub fn schedule_exposure(context: &mut SimulationContext, person_id: PersonId, day: i32, genotype: GenotypeId) {
    schedule_for(context, person_id, day, EventKind::MoveParasiteToBlood { genotype });
}

/// The one place individual-targeted `EventKind`s are interpreted. Matches the state table: row
/// by row, the transition each variant drives is documented inline.
pub fn dispatch_individual_event(context: &mut SimulationContext, person_id: PersonId, kind: &EventKind) {
    // Invariant 3: a DEAD person holds no events; anything still in flight for them when they
    // die is a lazily-cancelled tombstone that should never reach here, but a defensive check
    // keeps a late-arriving event from corrupting reports.
    if context.population().person(person_id).host_state == HostState::Dead {
        return;
    }

    match *kind {
        EventKind::Birthday => on_birthday(context, person_id),
        EventKind::MoveParasiteToBlood { genotype } => on_move_parasite_to_blood(context, person_id, genotype),
        EventKind::ProgressToClinical { clone_id } => on_progress_to_clinical(context, person_id, clone_id),
        EventKind::EndClinicalByNoTreatment { clone_id } => on_end_clinical(context, person_id, clone_id),
        EventKind::EndClinical { clone_id } => on_end_clinical(context, person_id, clone_id),
        EventKind::EndClinicalDueToDrugResistance { clone_id } => {
            on_end_clinical_due_to_drug_resistance(context, person_id, clone_id);
        }
        EventKind::TestTreatmentFailure { clone_id } => on_test_treatment_failure(context, person_id, clone_id),
        EventKind::MatureGametocyte { clone_id } => {
            // Gametocyte maturation affects onward infectiousness weighting only; no state
            // transition. A vanished clone is a silent TransientBiologicalMiss.
            let _ = clone_id;
        }
        EventKind::UpdateEveryKDays => {
            // Periodic per-person bookkeeping hook (age-class re-check outside of birthdays);
            // the daily population update already recomputes age_class_index, so this is a
            // no-op placeholder kept for event-kind completeness.
        }
        EventKind::ReportTreatmentFailureDeath => {
            // The death itself was already recorded by `kill_person`; this delayed event exists
            // only so a reporter flushing monthly statistics sees the death attributed to the
            // day it is confirmed rather than the day it occurred, matching the original
            // reporter's accounting lag.
        }
        EventKind::DrugDecay { .. } => {
            // Drug decay is applied per-person in the daily biological update
            // (`population::daily_biological_update`), not through a discrete event; this
            // variant is never scheduled but is matched explicitly so it cannot silently panic
            // if something ever does.
        }
        EventKind::ApplyMdaTreatment => crate::population::apply_mda_treatment(context, person_id),
        ref other => {
            crate::fail_invariant(
                context.current_day(),
                format!("event kind {other:?} is not a valid individual-targeted event"),
            );
        }
    }
}

fn on_birthday(context: &mut SimulationContext, person_id: PersonId) {
    let day = context.current_day();
    context.population_mut().person_mut(person_id).age_days += 365;
    context.recompute_age_class(person_id);
    schedule_for(context, person_id, day + 365, EventKind::Birthday);
}

/// SUSCEPTIBLE --infective bite--> EXPOSED is driven directly from the population's daily biting
/// step (it has no dedicated event of its own); this handles the EXPOSED -> ASYMPTOMATIC leg:
/// add a clone at liver-emergence density and probabilistically schedule `ProgressToClinical`.
fn on_move_parasite_to_blood(context: &mut SimulationContext, person_id: PersonId, genotype: GenotypeId) {
    let day = context.current_day();
    let density_level = context.config().parasite_density_level.clone();
    let rates = context.config().biological_rates.clone();

    {
        let population = context.population_mut();
        let person = population.person_mut(person_id);
        if person.host_state != HostState::Exposed {
            return;
        }
        person.host_state = HostState::Asymptomatic;
        let clone = ParasiteClone::new(genotype, density_level.log_density_from_liver, day, UpdateFn::Liver);
        person.clones.push(Some(clone));
    }
    context.recompute_state_cell(person_id);

    let clone_id = (context.population().person(person_id).clones.len() - 1) as u32;
    let will_progress = context.sample_bool(ProgressionRng, rates.p_clinical_progression);
    let delay = will_progress.then(|| context.sample_range(ProgressionRng, rates.progression_min_days..=rates.progression_max_days));

    context
        .population_mut()
        .person_mut(person_id)
        .clones
        .get_mut(clone_id as usize)
        .and_then(Option::as_mut)
        .expect("just-created clone")
        .update_fn = if will_progress { UpdateFn::ClinicalProgression } else { UpdateFn::ImmunityClearance };

    if let Some(delay) = delay {
        schedule_for(context, person_id, day + delay, EventKind::ProgressToClinical { clone_id });
    }
}

/// `ProgressToClinicalEvent.execute`, reproduced step for step:
/// 1. Vanished clone -> silent no-op.
/// 2. Already CLINICAL -> rewrite this clone to IMMUNITY_CLEARANCE and return (no double
///    progression).
/// 3. Otherwise: draw clinical density, set CLINICAL, cancel other in-flight progress events,
///    rewrite every other clone's update function to clearance, count the episode.
/// 4. Roll treatment; on treatment apply therapy and roll the on-treatment death probability; on
///    no treatment roll the no-treatment death probability. Either way a death cancels every
///    remaining event and schedules the delayed death report.
fn on_progress_to_clinical(context: &mut SimulationContext, person_id: PersonId, clone_id: u32) {
    let day = context.current_day();

    let clone_alive = context
        .population()
        .person(person_id)
        .clones
        .get(clone_id as usize)
        .map(|slot| slot.is_some())
        .unwrap_or(false);
    if !clone_alive {
        return; // TransientBiologicalMiss: the clone was already cleared.
    }

    if context.population().person(person_id).host_state == HostState::Clinical {
        if let Some(clone) = context.population_mut().person_mut(person_id).clones[clone_id as usize].as_mut() {
            clone.update_fn = UpdateFn::ImmunityClearance;
        }
        return;
    }

    let density_level = context.config().parasite_density_level.clone();
    let density = context.sample_range(
        ClinicalDensityRng,
        density_level.log_density_clinical_from..=density_level.log_density_clinical_to,
    );

    let (location, age_years, age_class) = {
        let population = context.population_mut();
        let person = population.person_mut(person_id);
        person.host_state = HostState::Clinical;
        for (index, slot) in person.clones.iter_mut().enumerate() {
            if let Some(clone) = slot {
                clone.update_fn = if index as u32 == clone_id {
                    UpdateFn::Clinical
                } else {
                    UpdateFn::ImmunityClearance
                };
                clone.last_update_log10_density = if index as u32 == clone_id {
                    density
                } else {
                    clone.last_update_log10_density
                };
            }
        }
        (person.location, person.age_years(), person.age_class_index)
    };
    context.recompute_state_cell(person_id);
    context.record_clinical_episode(location, age_class);

    // Re-borrow the event id the scheduler assigned to *this* event: the currently executing
    // plan has already been popped off the queue by the time dispatch runs, so there is no
    // "current event id" to cancel around except what we just looked up from pending_events.
    let own_event_id = context
        .population()
        .person(person_id)
        .pending_events
        .iter()
        .find(|(_, k)| matches!(k, EventKind::ProgressToClinical { clone_id: id } if *id == clone_id))
        .map(|(id, _)| *id);
    if let Some(own_id) = own_event_id {
        cancel_other_progress_to_clinical_events(context, person_id, own_id);
    }

    let treatment_probability = context.treatment_coverage().probability(location, context.population().person(person_id).age_days);
    let rates = context.config().biological_rates.clone();
    let rolled: f64 = context.sample_range(ClinicalDensityRng, 0.0..1.0);

    if rolled <= treatment_probability {
        apply_treatment(context, person_id, clone_id, location, age_years, age_class, day);
        let dies = context.sample_bool(OutcomeRng, rates.p_death_on_treatment);
        if dies {
            kill_person(context, person_id, location, age_class, day);
        }
    } else {
        let delay = context.sample_range(
            OutcomeRng,
            rates.untreated_clinical_min_days..=rates.untreated_clinical_max_days,
        );
        let dies = context.sample_bool(OutcomeRng, rates.p_death_no_treatment);
        if dies {
            kill_person(context, person_id, location, age_class, day);
        } else {
            schedule_for(context, person_id, day + delay, EventKind::EndClinicalByNoTreatment { clone_id });
        }
    }
}

fn apply_treatment(
    context: &mut SimulationContext,
    person_id: PersonId,
    clone_id: u32,
    location: u32,
    age_years: u32,
    age_class: u8,
    day: i32,
) {
    let therapy_id = {
        let strategy = context.strategies().active_strategy().clone();
        sample_therapy(context, &strategy, age_years)
    };
    let therapy = context.therapy_db().get(therapy_id).clone();
    let max_dosing_day = therapy.dosing_days;

    for drug_id in &therapy.drug_ids {
        let drug_type = context.drug_type(*drug_id).clone();
        let dose = DrugInBlood::new(*drug_id, drug_type.elimination_half_life.ceil() as u32, 1.0, day);
        context.population_mut().person_mut(person_id).drugs.push(dose);
    }
    if let Some(clone) = context.population_mut().person_mut(person_id).clones[clone_id as usize].as_mut() {
        clone.update_fn = UpdateFn::Drug;
    }
    context.record_treatment(location, age_class);

    schedule_for(
        context,
        person_id,
        day + i32::from(context.config().test_treatment_failure_day.min(max_dosing_day * 4)),
        EventKind::TestTreatmentFailure { clone_id },
    );
    schedule_for(
        context,
        person_id,
        day + i32::try_from(max_dosing_day).unwrap_or(0) + 7,
        EventKind::EndClinical { clone_id },
    );
}

fn sample_therapy(context: &mut SimulationContext, strategy: &Strategy, age_years: u32) -> crate::therapy::TherapyId {
    match strategy {
        Strategy::Mft { distribution, .. } => {
            let distribution = distribution.clone();
            let index = context.sample_weighted(TreatmentRng, &distribution);
            strategy.get_therapy(age_years, |_| index)
        }
        _ => strategy.get_therapy(age_years, |_| 0),
    }
}

fn kill_person(context: &mut SimulationContext, person_id: PersonId, location: u32, age_class: u8, day: i32) {
    cancel_all_events_except(context, person_id, None);
    {
        let population = context.population_mut();
        let person = population.person_mut(person_id);
        person.host_state = HostState::Dead;
        person.clones.clear();
        person.drugs.clear();
    }
    context.recompute_state_cell(person_id);
    context.record_death(location, age_class);
    schedule_for(context, person_id, day + 1, EventKind::ReportTreatmentFailureDeath);
}

/// CLINICAL -> ASYMPTOMATIC via {EndClinical, EndClinicalByNoTreatment,
/// EndClinicalDueToDrugResistance}: the causing clone's update function switches to
/// IMMUNITY_CLEARANCE; the population's daily update finishes the job once density crosses the
/// cured threshold.
fn on_end_clinical(context: &mut SimulationContext, person_id: PersonId, clone_id: u32) {
    if context.population().person(person_id).host_state != HostState::Clinical {
        return; // already resolved by a concurrent path (e.g. death, or a duplicate event)
    }
    if let Some(clone) = context.population_mut().person_mut(person_id).clones.get_mut(clone_id as usize).and_then(Option::as_mut) {
        clone.update_fn = UpdateFn::ImmunityClearance;
    }
    context.population_mut().person_mut(person_id).host_state = HostState::Asymptomatic;
    context.recompute_state_cell(person_id);
}

fn on_end_clinical_due_to_drug_resistance(context: &mut SimulationContext, person_id: PersonId, clone_id: u32) {
    on_end_clinical(context, person_id, clone_id);
}

/// Checks, `test_treatment_failure_day` days after treatment began, whether the causing clone is
/// still present with a clinical-range density — if so the episode is recorded as a treatment
/// failure (the therapy did not clear the infection).
fn on_test_treatment_failure(context: &mut SimulationContext, person_id: PersonId, clone_id: u32) {
    let density_level = context.config().parasite_density_level.clone();
    let still_failing = context
        .population()
        .person(person_id)
        .clones
        .get(clone_id as usize)
        .and_then(Option::as_ref)
        .is_some_and(|clone| clone.last_update_log10_density >= density_level.log_density_detectable);
    if still_failing {
        let location = context.population().person(person_id).location;
        let age_class = context.population().person(person_id).age_class_index;
        context.record_treatment_failure(location, age_class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_person_starts_susceptible_with_age_appropriate_immune_variant() {
        let infant = Person::new(PersonId(0), 0, 100, 0, 0);
        assert_eq!(infant.host_state, HostState::Susceptible);
        assert_eq!(infant.immune.variant, ImmuneVariant::Infant);

        let adult = Person::new(PersonId(1), 0, 10_000, 0, 0);
        assert_eq!(adult.immune.variant, ImmuneVariant::NonInfant);
    }

    #[test]
    fn has_live_clone_ignores_tombstoned_slots() {
        let mut person = Person::new(PersonId(0), 0, 9000, 0, 0);
        assert!(!person.has_live_clone());
        person.clones.push(None);
        assert!(!person.has_live_clone());
        person.clones.push(Some(ParasiteClone::new(GenotypeId(0), 2.0, 0, UpdateFn::Liver)));
        assert!(person.has_live_clone());
    }
}
