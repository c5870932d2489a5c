//! Domain model (ids, specs, status, records, outcomes, errors).

pub mod attempt;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod spec;
pub mod state;
pub mod task;

pub use attempt::{AttemptPosition, AttemptRecord};
pub use errors::{FieldError, ValidationError};
pub use ids::{AttemptId, ParseIdError, TaskId};
pub use outcome::{AttemptOutcome, OutcomeKind};
pub use spec::{CredentialMode, StartRequest, TaskSpec};
pub use state::TaskStatus;
pub use task::{TaskRecord, TaskSnapshot};
