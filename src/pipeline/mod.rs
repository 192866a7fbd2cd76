mod evaluation;
mod model;
mod pending;
mod progression;
mod records;
mod registry;
mod state;
mod transitions;

pub use evaluation::{BatchEvaluator, EvaluationOutcome, EvaluationSummary, ScoreBand};
pub use model::{
    Candidate, CandidateId, CandidateRoundRecord, CandidateStatus, JobOpeningId, RoundStatus,
    RoundTemplate, RoundTemplateId,
};
pub use pending::{PendingChangeSet, StageOutcome};
pub use progression::{PipelineSettings, ProgressionReport, RoundProgressionController};
pub use records::{CandidateRoundRecordStore, FetchOptions, PagingConfig, RoundListing};
pub use registry::RoundTemplateRegistry;
pub use state::{RoundCommand, RoundState, RoundStateMachine, Transition};
pub use transitions::{CommitReport, StatusTransitionManager};
