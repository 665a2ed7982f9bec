//! Catalog loading from raw records.
//!
//! The loader is lenient by default: a record with a missing or unparsable
//! required field is skipped with a warning and the rest of the catalog is
//! still built. Partial catalogs are legitimate input.

use crate::catalog::{
    CatalogBuilder, StateId, TransitionId, WorkflowCatalog, WorkflowId, WorkflowState,
    WorkflowTransition,
};
use crate::error::CoreError;
use crate::record::{StateRecord, TransitionRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Loader behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Abort on the first bad record instead of skipping it.
    pub strict: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Kind of record being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    State,
    Transition,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::State => "state",
            RecordKind::Transition => "transition",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record the loader dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// Position in the input slice.
    pub index: usize,
    pub reason: String,
}

/// Summary of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub states_loaded: usize,
    pub transitions_loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Loaded transitions with at least one endpoint missing from their workflow.
    pub dangling_transitions: usize,
}

impl LoadReport {
    /// True if every record was loaded and every transition resolves.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.dangling_transitions == 0
    }
}

/// A loaded catalog and how it was loaded.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub catalog: WorkflowCatalog,
    pub report: LoadReport,
}

/// Builds a catalog from raw state and transition records.
pub fn load_catalog(
    states: &[StateRecord],
    transitions: &[TransitionRecord],
    options: &LoadOptions,
) -> Result<Loaded, CoreError> {
    let mut builder = CatalogBuilder::new();
    let mut report = LoadReport::default();

    for (index, record) in states.iter().enumerate() {
        let outcome = parse_state(record).and_then(|state| {
            builder.add_state(state).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(()) => report.states_loaded += 1,
            Err(reason) => skip(&mut report, options, RecordKind::State, index, reason)?,
        }
    }

    for (index, record) in transitions.iter().enumerate() {
        let outcome = parse_transition(record).and_then(|transition| {
            builder.add_transition(transition).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(()) => report.transitions_loaded += 1,
            Err(reason) => skip(&mut report, options, RecordKind::Transition, index, reason)?,
        }
    }

    let catalog = builder.build()?;

    let violations = catalog.integrity_violations();
    let mut dangling = HashSet::new();
    for v in &violations {
        tracing::warn!("{}", v);
        dangling.insert((v.workflow_id, v.transition_id));
    }
    report.dangling_transitions = dangling.len();

    tracing::debug!(
        "Loaded catalog {}: {} workflows, {} states, {} transitions ({} skipped, {} dangling)",
        catalog.fingerprint(),
        catalog.len(),
        report.states_loaded,
        report.transitions_loaded,
        report.skipped.len(),
        report.dangling_transitions
    );

    Ok(Loaded { catalog, report })
}

fn skip(
    report: &mut LoadReport,
    options: &LoadOptions,
    kind: RecordKind,
    index: usize,
    reason: String,
) -> Result<(), CoreError> {
    if options.strict {
        return Err(CoreError::MalformedRecord {
            kind: kind.as_str(),
            index,
            reason,
        });
    }

    tracing::warn!("Skipping {} record #{}: {}", kind, index, reason);
    report.skipped.push(SkippedRecord {
        kind,
        index,
        reason,
    });
    Ok(())
}

fn parse_state(record: &StateRecord) -> Result<WorkflowState, String> {
    let workflow_id = required_id(&record.workflow_id, "workflow_id")?;
    let state_id = required_id(&record.state_id, "state_id")?;
    let sort_order = required_int(&record.sort_order, "sort_order")?;
    let token = required(&record.validity_token, "validity_token")?;

    let mut chars = token.chars();
    let validity_token = chars
        .next()
        .ok_or_else(|| "missing validity_token".to_string())?;
    if chars.next().is_some() {
        tracing::debug!(
            "State {} in workflow {}: validity token '{}' truncated to '{}'",
            state_id,
            workflow_id,
            token,
            validity_token
        );
    }

    Ok(WorkflowState::new(
        WorkflowId(workflow_id),
        StateId(state_id),
        sort_order,
        validity_token,
    ))
}

fn parse_transition(record: &TransitionRecord) -> Result<WorkflowTransition, String> {
    Ok(WorkflowTransition::new(
        WorkflowId(required_id(&record.workflow_id, "workflow_id")?),
        TransitionId(required_id(&record.transition_id, "transition_id")?),
        StateId(required_id(&record.from_state_id, "from_state_id")?),
        StateId(required_id(&record.to_state_id, "to_state_id")?),
        parse_flag(record.is_default.as_deref()),
    ))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("missing {}", field)),
    }
}

fn required_int(value: &Option<String>, field: &str) -> Result<i64, String> {
    let text = required(value, field)?;
    text.parse()
        .map_err(|_| format!("{} '{}' is not an integer", field, text))
}

/// IDs must be positive so every loaded state stays queryable.
fn required_id(value: &Option<String>, field: &str) -> Result<i64, String> {
    match required_int(value, field)? {
        id if id > 0 => Ok(id),
        id => Err(format!("{} must be positive, got {}", field, id)),
    }
}

/// Absent or unrecognized values read as false.
fn parse_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "y" | "yes" | "t"
        ),
        None => false,
    }
}
