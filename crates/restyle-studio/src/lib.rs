//! restyle-studio: Generation orchestration and run lifecycle (sans-IO).
//!
//! Sits between the mask authoring canvas (`restyle-canvas`) and the two
//! external AI collaborators:
//!
//! ```text
//! upload ─► Session ─► WorkingCanvasPair ─► finish_mask ─► punched PNG
//!                                                              │
//!            ProgressModel ◄── Orchestrator ◄──────────────────┘
//!            (watch channel)   analyze once, then generate each
//!                              style in order, one call at a time
//! ```
//!
//! The collaborators are reached only through the [`Analyzer`] and
//! [`Generator`] traits, so this crate performs no I/O of its own. Any
//! async runtime can drive it.

pub mod collaborator;
pub mod config;
pub mod download;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod session;

pub use collaborator::{Analyzer, CollaboratorError, Generator};
pub use config::StudioConfig;
pub use download::{download_filename, style_slug};
pub use error::{GENERIC_FAILURE_MESSAGE, StudioError};
pub use model::{AnalysisResult, EncodedImage, HairstyleSuggestion, StyleDescriptor};
pub use orchestrator::{ANALYZING_MESSAGE, Orchestrator, generating_message};
pub use progress::{ProgressModel, ProgressSnapshot, RunId, RunState};
pub use session::Session;
