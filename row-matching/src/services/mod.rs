//! Services module for row-matching.

pub mod amount_range;
pub mod cache;
pub mod candidate_query;
pub mod committer;
pub mod dialog;
pub mod metrics;
pub mod notifier;
pub mod raw_values;
pub mod selection;

pub use amount_range::{amount_range_filter, AmountRange};
pub use cache::{EntityCache, EntityKey};
pub use candidate_query::{CandidateFilters, CandidateQuery, CandidateQueryAdapter, DateRange, QueryState};
pub use committer::ReconciliationCommitter;
pub use dialog::{Collaborators, DialogOutcome, MatchDialog};
pub use metrics::{init_metrics, record_commit, record_error};
pub use notifier::{Notifier, RecordingNotifier, Toast, ToastKind, TracingNotifier};
pub use raw_values::displayable_raw_values;
pub use selection::{PrimaryAction, SelectionEvent, SelectionState, Stage};
