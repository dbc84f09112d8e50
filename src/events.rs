//! Framework notifications and their mapping onto registry operations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{NodeHandle, ViewRegistry};
use crate::traits::{BridgeError, EngineFactory, Result};
use crate::transaction::CommitOutcome;

/// One notification from the declarative framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ViewEvent {
    /// A view node was instantiated.
    Create {
        /// Framework tag of the node.
        node: u64,
    },
    /// A property was set on a node.
    Set {
        /// Framework tag of the node.
        node: u64,
        /// Wire name of the property.
        prop: String,
        /// New value, as sent by the framework.
        #[serde(default)]
        value: Value,
    },
    /// The update transaction for a node ended.
    Commit {
        /// Framework tag of the node.
        node: u64,
    },
    /// A view node was torn down.
    Destroy {
        /// Framework tag of the node.
        node: u64,
    },
}

impl ViewEvent {
    /// The node this event targets.
    #[must_use]
    pub const fn node(&self) -> NodeHandle {
        match self {
            Self::Create { node }
            | Self::Set { node, .. }
            | Self::Commit { node }
            | Self::Destroy { node } => NodeHandle::from_raw(*node),
        }
    }
}

/// Result of dispatching one [`ViewEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The node has an engine.
    Resolved,
    /// A property write; `true` if the value changed.
    Set(bool),
    /// A transaction commit.
    Committed(CommitOutcome),
    /// A teardown; `true` if the node was registered.
    Released(bool),
}

impl<F: EngineFactory> ViewRegistry<F> {
    /// Route a framework notification to the matching registry operation.
    pub fn dispatch(&self, event: &ViewEvent) -> Result<EventOutcome> {
        let node = event.node();
        match event {
            ViewEvent::Create { .. } => self.resolve(node).map(|_| EventOutcome::Resolved),
            ViewEvent::Set { prop, value, .. } => {
                let changed = self.set_field_json(node, prop, value)?;
                Ok(EventOutcome::Set(changed))
            }
            ViewEvent::Commit { .. } => self.commit(node).map(EventOutcome::Committed),
            ViewEvent::Destroy { .. } => Ok(EventOutcome::Released(self.release(node))),
        }
    }
}

/// Read a recorded framework session: a JSON array of [`ViewEvent`]s.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<ViewEvent>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|err| BridgeError::Config(format!("{}: {err}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}
