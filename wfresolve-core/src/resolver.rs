//! Transition resolution.
//!
//! Given a workflow, a current state and a set of acceptance tokens, pick the
//! transition that should fire automatically:
//!
//! 1. Outgoing transitions whose destination carries an accepted token are
//!    *direct* matches. The one with the lowest destination sort order wins.
//! 2. Otherwise, if fallback is enabled, non-matching transitions flagged as
//!    default are ranked the same way.
//! 3. Otherwise nothing fires.
//!
//! A transition that matches directly is never considered as a default, even
//! if it carries the default flag.
//!
//! Destinations missing from the catalog never match and rank after every
//! known destination when chosen as a default.

use crate::catalog::{
    StateId, TransitionId, WorkflowCatalog, WorkflowId, WorkflowState, WorkflowTransition,
};
use crate::error::CoreError;
use crate::tokens::AcceptTokens;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to choose between candidates whose destinations share a sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The transition listed first in the catalog wins.
    #[default]
    FirstSeen,
    /// The transition to the lowest destination state ID wins.
    LowestStateId,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::FirstSeen => "first_seen",
            TieBreak::LowestStateId => "lowest_state_id",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_seen" => Ok(TieBreak::FirstSeen),
            "lowest_state_id" => Ok(TieBreak::LowestStateId),
            other => Err(CoreError::InvalidArgument {
                reason: format!("unknown tie-break policy '{}'", other),
            }),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    pub tie_break: TieBreak,
    /// Used by [`TransitionResolver::resolve_with`].
    pub use_default_fallback: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::FirstSeen,
            use_default_fallback: true,
        }
    }
}

/// Why a transition was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    /// Destination satisfies the acceptance tokens.
    Direct,
    /// Fallback via the default flag.
    Default,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::Direct => f.write_str("direct"),
            ResolutionKind::Default => f.write_str("default"),
        }
    }
}

/// The transition selected by [`TransitionResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub transition_id: TransitionId,
    pub to_state_id: StateId,
    /// `None` when the destination is missing from the catalog.
    pub sort_order: Option<i64>,
    pub kind: ResolutionKind,
}

/// An outgoing transition together with its destination, if known.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub transition: &'a WorkflowTransition,
    pub destination: Option<&'a WorkflowState>,
}

impl Candidate<'_> {
    /// Sort order used for ranking; unknown destinations rank last.
    pub fn rank(&self) -> i64 {
        self.destination.map_or(i64::MAX, |s| s.sort_order)
    }
}

/// Outgoing transitions of a state, partitioned against an acceptance filter.
#[derive(Debug, Clone, Default)]
pub struct Candidates<'a> {
    pub direct: Vec<Candidate<'a>>,
    /// Non-matching transitions flagged as default.
    pub defaults: Vec<Candidate<'a>>,
    /// Non-matching, non-default transitions.
    pub rejected: Vec<Candidate<'a>>,
}

impl Candidates<'_> {
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.defaults.is_empty() && self.rejected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.direct.len() + self.defaults.len() + self.rejected.len()
    }
}

/// Read-only query layer over a [`WorkflowCatalog`].
#[derive(Debug, Clone, Copy)]
pub struct TransitionResolver<'a> {
    catalog: &'a WorkflowCatalog,
    options: ResolverOptions,
}

impl<'a> TransitionResolver<'a> {
    pub fn new(catalog: &'a WorkflowCatalog) -> Self {
        Self::with_options(catalog, ResolverOptions::default())
    }

    pub fn with_options(catalog: &'a WorkflowCatalog, options: ResolverOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &'a WorkflowCatalog {
        self.catalog
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Returns true if the state exists and its validity token is accepted.
    ///
    /// Unknown workflows and states are never acceptable.
    pub fn is_acceptable_state(
        &self,
        workflow_id: WorkflowId,
        state_id: StateId,
        tokens: &AcceptTokens,
    ) -> Result<bool, CoreError> {
        check_id("workflow", workflow_id.get())?;
        check_id("state", state_id.get())?;
        Ok(self.accepts(workflow_id, state_id, tokens))
    }

    /// Partitions the transitions leaving `from` into direct matches, default
    /// candidates and the rest, preserving catalog order within each group.
    pub fn candidates(
        &self,
        workflow_id: WorkflowId,
        from: StateId,
        tokens: &AcceptTokens,
    ) -> Result<Candidates<'a>, CoreError> {
        check_id("workflow", workflow_id.get())?;
        check_id("state", from.get())?;

        let catalog = self.catalog;
        let mut candidates = Candidates::default();
        for transition in catalog.transitions_from(workflow_id, from) {
            let candidate = Candidate {
                transition,
                destination: catalog.state(workflow_id, transition.to_state_id),
            };
            if candidate
                .destination
                .is_some_and(|s| tokens.contains(s.validity_token))
            {
                candidates.direct.push(candidate);
            } else if transition.is_default {
                candidates.defaults.push(candidate);
            } else {
                candidates.rejected.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// Picks the transition to fire from `from`, or `None` if nothing applies.
    pub fn resolve(
        &self,
        workflow_id: WorkflowId,
        from: StateId,
        tokens: &AcceptTokens,
        use_default_fallback: bool,
    ) -> Result<Option<Resolution>, CoreError> {
        let candidates = self.candidates(workflow_id, from, tokens)?;

        let resolution = if let Some(c) = self.select(&candidates.direct) {
            Some(to_resolution(c, ResolutionKind::Direct))
        } else if use_default_fallback {
            self.select(&candidates.defaults)
                .map(|c| to_resolution(c, ResolutionKind::Default))
        } else {
            None
        };

        match &resolution {
            Some(r) => tracing::debug!(
                "Resolved workflow {} state {} [{}]: transition {} -> state {} ({})",
                workflow_id,
                from,
                tokens,
                r.transition_id,
                r.to_state_id,
                r.kind
            ),
            None => tracing::debug!(
                "No transition for workflow {} state {} [{}] ({} candidates, fallback={})",
                workflow_id,
                from,
                tokens,
                candidates.len(),
                use_default_fallback
            ),
        }

        Ok(resolution)
    }

    /// Like [`resolve`](Self::resolve), with fallback taken from the options.
    pub fn resolve_with(
        &self,
        workflow_id: WorkflowId,
        from: StateId,
        tokens: &AcceptTokens,
    ) -> Result<Option<Resolution>, CoreError> {
        self.resolve(workflow_id, from, tokens, self.options.use_default_fallback)
    }

    fn accepts(&self, workflow_id: WorkflowId, state_id: StateId, tokens: &AcceptTokens) -> bool {
        self.catalog
            .state(workflow_id, state_id)
            .is_some_and(|s| tokens.contains(s.validity_token))
    }

    // min_by_key keeps the first of equal minima.
    fn select<'c>(&self, candidates: &'c [Candidate<'a>]) -> Option<&'c Candidate<'a>> {
        match self.options.tie_break {
            TieBreak::FirstSeen => candidates.iter().min_by_key(|c| c.rank()),
            TieBreak::LowestStateId => candidates
                .iter()
                .min_by_key(|c| (c.rank(), c.transition.to_state_id)),
        }
    }
}

fn to_resolution(candidate: &Candidate<'_>, kind: ResolutionKind) -> Resolution {
    Resolution {
        transition_id: candidate.transition.transition_id,
        to_state_id: candidate.transition.to_state_id,
        sort_order: candidate.destination.map(|s| s.sort_order),
        kind,
    }
}

fn check_id(what: &str, id: i64) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::InvalidArgument {
            reason: format!("{} id must be positive, got {}", what, id),
        });
    }
    Ok(())
}

/// Returns true if the state exists and its validity token is accepted.
pub fn is_acceptable_state(
    catalog: &WorkflowCatalog,
    workflow_id: WorkflowId,
    state_id: StateId,
    tokens: &AcceptTokens,
) -> Result<bool, CoreError> {
    TransitionResolver::new(catalog).is_acceptable_state(workflow_id, state_id, tokens)
}

/// Returns the ID of the transition to fire from `from`, using first-seen
/// tie-breaking.
pub fn resolve_transition(
    catalog: &WorkflowCatalog,
    workflow_id: WorkflowId,
    from: StateId,
    tokens: &AcceptTokens,
    use_default_fallback: bool,
) -> Result<Option<TransitionId>, CoreError> {
    Ok(TransitionResolver::new(catalog)
        .resolve(workflow_id, from, tokens, use_default_fallback)?
        .map(|r| r.transition_id))
}
