//! Worker lifecycle states and transition guards.
//!
//! A cache instance moves through these states in order:
//!
//! ```text
//! Parsed -> Installing -> Waiting -> Activating -> Active
//!               |                        ^           |
//!               v                        +-----------+
//!           Redundant -> Installing
//! ```
//!
//! A generation starts answering requests once its cache reaches `Active`.
//! `Active -> Activating` exists so that activation can be re-run without an
//! intervening install.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed but never registered.
    Parsed,
    /// Fetching and storing the manifest batch.
    Installing,
    /// Installed; not serving until activated.
    Waiting,
    /// Deleting stale generations.
    Activating,
    /// Serving requests cache-first.
    Active,
    /// Install failed; only a new install attempt can leave this state.
    Redundant,
}

impl WorkerState {
    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::{Activating, Active, Installing, Parsed, Redundant, Waiting};

        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Waiting)
                | (Installing, Redundant)
                | (Waiting, Activating)
                | (Active, Activating)
                | (Activating, Active)
                | (Redundant, Installing)
        )
    }

    /// Return `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` otherwise.
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, Error> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition { from: self, to: next })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
