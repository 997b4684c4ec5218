mod conflict;
mod error;
mod generate;
mod interval;
mod resolve;

pub use conflict::{detect_conflicts, first_overlap, touches_maintenance};
pub use error::EngineError;
pub use generate::generate;
pub use interval::{free_windows, merge_overlapping, to_minutes};
pub use resolve::{
    ResolutionSession, ResolutionState, ResolutionSummary, SessionState, TimeField,
};
