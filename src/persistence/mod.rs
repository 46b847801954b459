//! Snapshots, project storage and the editor-to-project binding

mod envelope;
mod error;
mod session;
mod store;

pub use envelope::{
    check_shape, default_persisted_data, export_filename, is_valid_persisted_data,
    timestamp_now, PersistedData, PERSISTED_VERSION,
};
pub use error::{PersistenceError, StorageError};
pub use session::{LoadOutcome, LoadTicket, ProjectSession, SaveOutcome, SkipReason};
pub use store::{
    duplicate_project, FileProjectStore, MemoryProjectStore, ProjectKey, ProjectLimits,
    ProjectStore, ProjectSummary,
};
