//! Per-node update transactions: dirty tracking and the commit protocol.
//!
//! Field writes reach the engine as soon as they arrive. Only the
//! notification is deferred: names of fields that really changed pile up in
//! the node's [`ChangeSet`] and are handed to [`CameraEngine::apply`] once,
//! when the framework signals the end of the transaction.

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::field::ChangeSet;
use crate::props::PropUpdate;
use crate::registry::{NodeHandle, ViewRegistry};
use crate::traits::{BridgeError, CameraEngine, EngineFactory, Result};

/// Transaction state of a registered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Nothing pending.
    Idle,
    /// At least one field changed since the last commit.
    Dirty,
}

/// What a successful [`ViewRegistry::commit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The node is not registered; nothing happened.
    Skipped,
    /// No field changed since the last commit; `apply` was not called.
    Clean,
    /// `apply` ran once with these fields.
    Applied(ChangeSet),
}

impl<F: EngineFactory> ViewRegistry<F> {
    /// Write one field on `node`'s engine and mark it pending if it changed.
    ///
    /// Returns `true` if the value differed from the current one. Unknown
    /// nodes are ignored.
    pub fn set_field(&self, node: NodeHandle, update: PropUpdate) -> bool {
        let Some(handle) = self.get(node) else {
            trace!(%node, field = %update.field(), "set on unregistered node ignored");
            return false;
        };

        let field = update.field();
        let mut slot = handle.slot();
        if !update.write_to(slot.engine.props_mut()) {
            return false;
        }
        let newly_pending = slot.pending.insert(field);
        drop(slot);

        if newly_pending {
            trace!(%node, %field, "field marked pending");
        }
        true
    }

    /// Decode a dynamic framework value and apply it as [`Self::set_field`].
    pub fn set_field_json(&self, node: NodeHandle, name: &str, value: &Value) -> Result<bool> {
        let update = PropUpdate::from_json(name, value)?;
        Ok(self.set_field(node, update))
    }

    /// End the current transaction for `node`.
    ///
    /// Hands every pending field to the engine in a single `apply` call and
    /// clears the pending set whether or not `apply` succeeds.
    pub fn commit(&self, node: NodeHandle) -> Result<CommitOutcome> {
        let Some(handle) = self.get(node) else {
            trace!(%node, "commit on unregistered node ignored");
            return Ok(CommitOutcome::Skipped);
        };

        let mut slot = handle.slot();
        if slot.pending.is_empty() {
            return Ok(CommitOutcome::Clean);
        }

        let changed = slot.pending.take();
        debug!(%node, fields = %changed, "applying transaction");
        let applied = slot.engine.apply(&changed);
        drop(slot);

        match applied {
            Ok(()) => Ok(CommitOutcome::Applied(changed)),
            Err(err) => {
                warn!(%node, fields = %changed, error = %err, "apply failed");
                Err(BridgeError::ApplyFailed {
                    node,
                    fields: changed,
                    source: Box::new(err),
                })
            }
        }
    }

    /// Transaction state of `node`, or `None` if it is not registered.
    pub fn state(&self, node: NodeHandle) -> Option<NodeState> {
        self.pending(node).map(|pending| {
            if pending.is_empty() {
                NodeState::Idle
            } else {
                NodeState::Dirty
            }
        })
    }
}
