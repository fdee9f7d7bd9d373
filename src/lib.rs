//! An individual-based simulation engine for malaria transmission: a discrete-event scheduler,
//! a per-individual state machine (host state, parasite clones, drug pharmacokinetics, immune
//! level), and a spatially-indexed population store.
//!
//! A simulation is built from a [`config::Config`] and driven through a
//! [`context::SimulationContext`], which owns:
//! * Two event queues (population-targeted and individual-targeted), drained once per
//!   simulated day.
//! * The resident [`population::Population`] and its indices.
//! * The read-only reference tables ([`therapy::TherapyDb`], drug types,
//!   [`strategy::StrategyRegistry`]) a run is configured with.
//! * Lazily-initialized [`data_plugin::DataPlugin`] state slots, used by the PRNG streams
//!   ([`random`]) and the reporting pipeline ([`report`]).
pub mod calendar;
pub mod config;
pub mod context;
pub mod data_plugin;
pub mod error;
pub mod event;
pub mod hashing;
pub mod log;
pub mod person;
pub mod plan;
pub mod population;
pub mod random;
pub mod report;
pub mod spatial;
pub mod strategy;
pub mod therapy;
pub mod treatment_coverage;

pub use data_plugin::get_data_plugin_count;
pub use error::{fail_invariant, SimError};
pub use hashing::{HashMap, HashMapExt, HashSet, HashSetExt};

/// Re-exported so `define_data_plugin!`/`define_rng!`'s expansion, which refers to its helpers
/// through `$crate::...`, resolves against this crate without every caller needing its own
/// direct dependency on `ctor`/`paste`.
pub use ctor;
pub use paste;
