//! Workflow catalog types.
//!
//! A catalog groups states and transitions by workflow. It is assembled once
//! through [`CatalogBuilder`] and is read-only afterwards:
//!
//! ```
//! use wfresolve_core::catalog::{
//!     CatalogBuilder, StateId, TransitionId, WorkflowId, WorkflowState, WorkflowTransition,
//! };
//!
//! let mut builder = CatalogBuilder::new();
//! builder.add_state(WorkflowState::new(WorkflowId(1), StateId(10), 5, 'n')).unwrap();
//! builder.add_state(WorkflowState::new(WorkflowId(1), StateId(20), 2, 'y')).unwrap();
//! builder
//!     .add_transition(WorkflowTransition::new(
//!         WorkflowId(1),
//!         TransitionId(100),
//!         StateId(10),
//!         StateId(20),
//!         false,
//!     ))
//!     .unwrap();
//! let catalog = builder.build().unwrap();
//!
//! assert_eq!(catalog.transitions_from(WorkflowId(1), StateId(10)).count(), 1);
//! ```

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a workflow.
    WorkflowId
);
id_type!(
    /// Identifier of a state, unique within its workflow.
    StateId
);
id_type!(
    /// Identifier of a transition, unique within its workflow.
    TransitionId
);

/// A node in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: WorkflowId,
    pub state_id: StateId,

    /// Ordering signal; lower values take priority.
    pub sort_order: i64,

    /// Single-character classification compared against acceptance tokens.
    pub validity_token: char,
}

impl WorkflowState {
    pub fn new(
        workflow_id: WorkflowId,
        state_id: StateId,
        sort_order: i64,
        validity_token: char,
    ) -> Self {
        Self {
            workflow_id,
            state_id,
            sort_order,
            validity_token,
        }
    }
}

/// A directed edge between two states of the same workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub workflow_id: WorkflowId,
    pub transition_id: TransitionId,
    pub from_state_id: StateId,
    pub to_state_id: StateId,

    /// Fallback choice when no acceptable destination is reachable.
    pub is_default: bool,
}

impl WorkflowTransition {
    pub fn new(
        workflow_id: WorkflowId,
        transition_id: TransitionId,
        from_state_id: StateId,
        to_state_id: StateId,
        is_default: bool,
    ) -> Self {
        Self {
            workflow_id,
            transition_id,
            from_state_id,
            to_state_id,
            is_default,
        }
    }
}

/// Which end of a transition failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    From,
    To,
}

/// A transition whose source or destination state is not in its workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub workflow_id: WorkflowId,
    pub transition_id: TransitionId,
    pub endpoint: Endpoint,
    pub missing_state: StateId,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = match self.endpoint {
            Endpoint::From => "source",
            Endpoint::To => "destination",
        };
        write!(
            f,
            "workflow {}: transition {} has unknown {} state {}",
            self.workflow_id, self.transition_id, end, self.missing_state
        )
    }
}

/// States and transitions of a single workflow, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Workflow {
    id: WorkflowId,
    states: Vec<WorkflowState>,
    transitions: Vec<WorkflowTransition>,

    state_index: HashMap<StateId, usize>,
    transition_index: HashMap<TransitionId, usize>,

    /// from_state -> positions in `transitions`, ascending.
    outgoing: HashMap<StateId, Vec<usize>>,
}

impl Workflow {
    fn new(id: WorkflowId) -> Self {
        Self {
            id,
            states: Vec::new(),
            transitions: Vec::new(),
            state_index: HashMap::new(),
            transition_index: HashMap::new(),
            outgoing: HashMap::new(),
        }
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn states(&self) -> &[WorkflowState] {
        &self.states
    }

    pub fn transitions(&self) -> &[WorkflowTransition] {
        &self.transitions
    }

    pub fn state(&self, state_id: StateId) -> Option<&WorkflowState> {
        self.state_index.get(&state_id).map(|&i| &self.states[i])
    }

    pub fn transition(&self, transition_id: TransitionId) -> Option<&WorkflowTransition> {
        self.transition_index
            .get(&transition_id)
            .map(|&i| &self.transitions[i])
    }

    pub fn has_state(&self, state_id: StateId) -> bool {
        self.state_index.contains_key(&state_id)
    }

    /// Returns the transitions leaving `from`, in insertion order.
    pub fn transitions_from(
        &self,
        from: StateId,
    ) -> impl Iterator<Item = &WorkflowTransition> + '_ {
        self.outgoing
            .get(&from)
            .into_iter()
            .flatten()
            .map(move |&i| &self.transitions[i])
    }

    /// Returns every endpoint that does not resolve to a state of this workflow.
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();
        for t in &self.transitions {
            let endpoints = [(Endpoint::From, t.from_state_id), (Endpoint::To, t.to_state_id)];
            for (endpoint, state) in endpoints {
                if !self.has_state(state) {
                    violations.push(IntegrityViolation {
                        workflow_id: self.id,
                        transition_id: t.transition_id,
                        endpoint,
                        missing_state: state,
                    });
                }
            }
        }
        violations
    }

    fn insert_state(&mut self, state: WorkflowState) -> Result<(), CoreError> {
        if self.state_index.contains_key(&state.state_id) {
            return Err(CoreError::DuplicateState {
                workflow: self.id,
                state: state.state_id,
            });
        }
        self.state_index.insert(state.state_id, self.states.len());
        self.states.push(state);
        Ok(())
    }

    fn insert_transition(&mut self, transition: WorkflowTransition) -> Result<(), CoreError> {
        if self.transition_index.contains_key(&transition.transition_id) {
            return Err(CoreError::DuplicateTransition {
                workflow: self.id,
                transition: transition.transition_id,
            });
        }
        let pos = self.transitions.len();
        self.transition_index.insert(transition.transition_id, pos);
        self.outgoing
            .entry(transition.from_state_id)
            .or_default()
            .push(pos);
        self.transitions.push(transition);
        Ok(())
    }
}

/// Immutable catalog of workflows.
#[derive(Debug, Clone)]
pub struct WorkflowCatalog {
    workflows: HashMap<WorkflowId, Workflow>,

    /// CRC32C over the accepted records, for change detection.
    fingerprint: String,
}

impl WorkflowCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Creates a catalog with no workflows.
    pub fn empty() -> Self {
        Self {
            workflows: HashMap::new(),
            fingerprint: format!("{:08x}", 0u32),
        }
    }

    pub fn workflow(&self, workflow_id: WorkflowId) -> Option<&Workflow> {
        self.workflows.get(&workflow_id)
    }

    pub fn state(&self, workflow_id: WorkflowId, state_id: StateId) -> Option<&WorkflowState> {
        self.workflow(workflow_id).and_then(|w| w.state(state_id))
    }

    /// Returns the transitions of `workflow_id` leaving `from`, in insertion order.
    /// Unknown workflows and states yield nothing.
    pub fn transitions_from(
        &self,
        workflow_id: WorkflowId,
        from: StateId,
    ) -> impl Iterator<Item = &WorkflowTransition> + '_ {
        self.workflow(workflow_id)
            .into_iter()
            .flat_map(move |w| w.transitions_from(from))
    }

    /// Returns all workflow IDs in ascending order.
    pub fn workflow_ids(&self) -> Vec<WorkflowId> {
        let mut ids: Vec<WorkflowId> = self.workflows.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Returns all workflows ordered by ID.
    pub fn workflows(&self) -> Vec<&Workflow> {
        let mut workflows: Vec<&Workflow> = self.workflows.values().collect();
        workflows.sort_by_key(|w| w.id);
        workflows
    }

    /// Number of workflows.
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    pub fn state_count(&self) -> usize {
        self.workflows.values().map(|w| w.states.len()).sum()
    }

    pub fn transition_count(&self) -> usize {
        self.workflows.values().map(|w| w.transitions.len()).sum()
    }

    /// Lists transitions whose endpoints are missing, ordered by workflow.
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        self.workflows()
            .into_iter()
            .flat_map(|w| w.integrity_violations())
            .collect()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for WorkflowCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

/// Accumulates states and transitions into a [`WorkflowCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    workflows: HashMap<WorkflowId, Workflow>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state. Fails if the workflow already has a state with this ID.
    pub fn add_state(&mut self, state: WorkflowState) -> Result<(), CoreError> {
        self.workflows
            .entry(state.workflow_id)
            .or_insert_with(|| Workflow::new(state.workflow_id))
            .insert_state(state)
    }

    /// Adds a transition. Fails if the workflow already has a transition with
    /// this ID. Endpoints are not checked here; see
    /// [`WorkflowCatalog::integrity_violations`].
    pub fn add_transition(&mut self, transition: WorkflowTransition) -> Result<(), CoreError> {
        self.workflows
            .entry(transition.workflow_id)
            .or_insert_with(|| Workflow::new(transition.workflow_id))
            .insert_transition(transition)
    }

    /// Freezes the builder into a catalog.
    pub fn build(self) -> Result<WorkflowCatalog, CoreError> {
        let mut ids: Vec<&WorkflowId> = self.workflows.keys().collect();
        ids.sort();

        let mut crc = 0u32;
        for id in ids {
            let w = &self.workflows[id];
            crc = crc32c::crc32c_append(crc, &serde_json::to_vec(&w.states)?);
            crc = crc32c::crc32c_append(crc, &serde_json::to_vec(&w.transitions)?);
        }

        Ok(WorkflowCatalog {
            workflows: self.workflows,
            fingerprint: format!("{:08x}", crc),
        })
    }
}
