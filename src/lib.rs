#![forbid(unsafe_code)]
//! Longcall : attribution des gardes tardives d'un bloc de planning.
//!
//! - Stretches et week chunks dérivés du planning de jour.
//! - Week-ends et fériés par couplage biparti, semaine par fenêtre glissante.
//! - Garde minimale, doublons, rééquilibrage ; flags plutôt qu'erreurs.
//! - Déterministe pour (planning, configuration, seed).

pub mod calendar;
pub mod config;
#[cfg(feature = "io")]
pub mod io;
pub mod model;
pub mod scheduler;
#[cfg(feature = "io")]
pub mod storage;
pub mod summary;

pub use calendar::{Calendar, IsoWeek};
#[cfg(feature = "io")]
pub use config::{export_config_json, load_config_from_file};
pub use config::{BlockConfig, Rules};
pub use model::{Category, DailyRoster, DateRange, RosterDay, RosterEntry, Worker, WorkerId};
pub use scheduler::{
    audit, run, run_variations, EngineOptions, Flag, FlagKind, PreparedBlock, RunOutput,
    SchedError, Scheduler, WorkerState,
};
#[cfg(feature = "io")]
pub use storage::{JsonStorage, Storage};
pub use summary::{best_seed, summarize, SummaryRenderer, TextSummary, VariationSummary};
