//! C3: the event type and its dispatcher.
//!
//! Per the design notes, events are not trait objects dispatched through virtual calls on a
//! `Dispatcher` base class; they are a tagged `EventKind` enum executed through a single
//! `dispatch` function. The "owner" an event fires against is either a specific person or the
//! population as a whole.
use crate::context::SimulationContext;
use crate::person::{DrugId, GenotypeId, PersonId};

/// Who an event's side effects apply to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventOwner {
    Individual(PersonId),
    Population,
}

/// A stable handle to a scheduled event, returned by `SimulationContext::schedule_*` and
/// consumed by `SimulationContext::cancel_event`. This is exactly the `plan::PlanId` the
/// underlying queue assigned it; the event module does not need a second layer of ids.
pub type EventId = crate::plan::PlanId;

/// The tagged variant replacing the source corpus's `Event` base class hierarchy. Each variant
/// carries exactly the payload its `execute` logic needs.
#[derive(Clone, Debug)]
pub enum EventKind {
    Birthday,
    UpdateEveryKDays,
    /// `clone_id` identifies which `ParasiteClone` caused this progression, so that if the
    /// clone has since been cleared by the immune system the event becomes a silent no-op.
    ProgressToClinical { clone_id: u32 },
    EndClinicalByNoTreatment { clone_id: u32 },
    EndClinicalDueToDrugResistance { clone_id: u32 },
    EndClinical { clone_id: u32 },
    MoveParasiteToBlood { genotype: GenotypeId },
    MatureGametocyte { clone_id: u32 },
    TestTreatmentFailure { clone_id: u32 },
    ReportTreatmentFailureDeath,
    ChangeStrategy { strategy_id: u32 },
    ImportationPeriodically,
    /// Self-rescheduling (day + 1) district-level importation: each firing draws a
    /// Poisson-distributed case count from `daily_rate` and distributes it across the
    /// district's locations weighted by their current asymptomatic-plus-clinical count.
    DistrictImportationDaily { district: u32, locus: u8, mutant_allele: u8, daily_rate: f64 },
    /// A one-time introduction of `number_of_cases` infections of a specific genotype at
    /// `location`, from the `introduce_parasites` config table.
    IntroduceParasitesCases { location: u32, genotype: GenotypeId, number_of_cases: u32 },
    IntroduceMutant { locus: u8, allele: u8, fraction: f64 },
    IntroduceMutantRaster { locus: u8, allele: u8 },
    /// Named convenience wrappers around `IntroduceMutant` for the three resistance markers the
    /// original project schedules by name rather than by raw locus/allele pair. `fraction` is
    /// the fraction of the population mutated, matching `IntroduceMutant`.
    IntroduceAQMutant { fraction: f64 },
    IntroduceLumefantrineMutant { fraction: f64 },
    IntroducePlas2Copy { fraction: f64 },
    SingleRoundMda { fraction_population_targeted: f64, days_to_complete: u32 },
    /// One person's share of a `SingleRoundMda` round, fired on the random day within
    /// `days_to_complete` the population event assigned them.
    ApplyMdaTreatment,
    TurnOnMutation,
    TurnOffMutation,
    AnnualBetaUpdate,
    AnnualCoverageUpdate,
    ChangeCirculationPercent { new_percent: f64 },
    UpdateBetaRaster,
    RotateStrategy { first_strategy_id: u32, second_strategy_id: u32, period_days: u32 },
    ChangeTreatmentCoverage { location: u32, p_treatment: f64 },
    ModifyNestedMft { strategy_id: u32, therapy_index: usize, replacement_therapy_id: u32 },
    /// Used only by `EndClinical`/`TestTreatmentFailure` payloads that also need the drug id
    /// administered, e.g. for resistance-escape bookkeeping (`person::drug`).
    DrugDecay { drug_id: DrugId },
}

/// An entry in a `SimulationContext` event queue: the owner, the day it is due, and the
/// tagged payload. `executable` implements lazy cancellation (Invariant: cancelled events
/// remain queued but are skipped and freed on dispatch, per the scheduler's O(1) cancel
/// contract).
#[derive(Clone, Debug)]
pub struct Event {
    pub owner: EventOwner,
    pub scheduled_day: i32,
    pub kind: EventKind,
}

/// Dispatches a single event against the context. This is the one place a match over
/// `EventKind` occurs; every other module treats events opaquely via `SimulationContext`'s
/// scheduling API.
pub fn dispatch(event: &Event, context: &mut SimulationContext) {
    match event.owner {
        EventOwner::Individual(person_id) => {
            crate::person::dispatch_individual_event(context, person_id, &event.kind);
        }
        EventOwner::Population => {
            crate::population::dispatch_population_event(context, &event.kind);
        }
    }
}
