//! # wfresolve-core
//!
//! Workflow transition resolution.
//!
//! This crate provides:
//! - Catalog loading from raw state/transition records
//! - Acceptance token parsing
//! - Automatic transition resolution with default fallback
//! - A swappable shared catalog slot for concurrent readers

pub mod catalog;
pub mod error;
pub mod handle;
pub mod loader;
pub mod record;
pub mod resolver;
pub mod tokens;

pub use catalog::{
    CatalogBuilder, IntegrityViolation, StateId, TransitionId, Workflow, WorkflowCatalog,
    WorkflowId, WorkflowState, WorkflowTransition,
};
pub use error::CoreError;
pub use handle::CatalogHandle;
pub use loader::{load_catalog, LoadOptions, LoadReport, Loaded};
pub use record::{StateRecord, TransitionRecord};
pub use resolver::{
    is_acceptable_state, resolve_transition, Resolution, ResolutionKind, ResolverOptions,
    TieBreak, TransitionResolver,
};
pub use tokens::AcceptTokens;
