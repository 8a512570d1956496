//! Docflow client engine
//!
//! The state synchronization core of a client for the Docflow document
//! conversion service: a typed API client, a polled registry of tracked
//! conversion files, a sequential upload orchestrator with coarse progress,
//! and the per-representation content retrieval state machine.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod preview;
pub mod registry;
pub mod upload;
pub mod util;
pub mod validate;

pub use api::ApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use preview::ContentViewer;
pub use registry::FileRegistry;
pub use upload::UploadOrchestrator;
