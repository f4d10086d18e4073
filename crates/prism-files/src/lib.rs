//! Uploaded-artifact storage and chat context injection
//!
//! Artifacts live in an object store under `files/<id>-<name>` keys. When a
//! chat request references them by id, their content is extracted by media
//! type and framed into a context preamble for the first user message.

mod context;
mod error;
mod extract;
mod routes;
mod store;
mod types;

pub use context::FileContextService;
pub use error::FilesError;
pub use extract::{ExtractionLimits, extract_text, is_extractable};
pub use routes::{FilesState, files_router};
pub use store::{ArtifactStore, MemoryStore, S3Store};
pub use types::{ArtifactRecord, ArtifactStatus, FILE_ID_PREFIX, new_file_id, sanitize_filename};
