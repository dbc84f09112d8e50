//! Identity registry mapping view nodes to live engines.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::field::ChangeSet;
use crate::traits::{EngineFactory, Result};

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a view node.
///
/// Two handles are the same node only if they carry the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u64);

impl NodeHandle {
    /// Allocate a process-unique handle.
    pub fn next() -> Self {
        Self(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a tag assigned by the view framework.
    #[must_use]
    pub const fn from_raw(tag: u64) -> Self {
        Self(tag)
    }

    /// The raw token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Engine plus the fields changed since its last commit.
pub(crate) struct Slot<E> {
    pub(crate) engine: E,
    pub(crate) pending: ChangeSet,
}

/// Shared handle to the engine owned by one node.
pub struct EngineHandle<E> {
    slot: Arc<Mutex<Slot<E>>>,
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<E> fmt::Debug for EngineHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("slot", &Arc::as_ptr(&self.slot))
            .finish()
    }
}

impl<E> EngineHandle<E> {
    /// Lock the engine for reading. Blocks while a commit for the same node
    /// is running.
    ///
    /// Property writes go through [`ViewRegistry::set_field`], which records
    /// the change for the next commit.
    ///
    /// ```compile_fail
    /// use camera_view_bridge::{CameraEngine, NodeHandle, V4L2EngineFactory, ViewRegistry};
    ///
    /// let registry = ViewRegistry::new(V4L2EngineFactory::default());
    /// let handle = registry.resolve(NodeHandle::next()).expect("resolve");
    /// handle.lock().props_mut().zoom = 0.5;
    /// ```
    ///
    /// ```compile_fail
    /// use camera_view_bridge::{CameraEngine, NodeHandle, V4L2EngineFactory, ViewRegistry};
    /// use camera_view_bridge::ChangeSet;
    ///
    /// let registry = ViewRegistry::new(V4L2EngineFactory::default());
    /// let handle = registry.resolve(NodeHandle::next()).expect("resolve");
    /// handle.lock().apply(&ChangeSet::new()).expect("apply");
    /// ```
    #[must_use]
    pub fn lock(&self) -> EngineGuard<'_, E> {
        EngineGuard {
            slot: self.slot.lock(),
        }
    }

    /// Whether both handles refer to the same engine instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub(crate) fn slot(&self) -> MutexGuard<'_, Slot<E>> {
        self.slot.lock()
    }
}

/// Shared borrow of a node's engine, returned by [`EngineHandle::lock`].
pub struct EngineGuard<'a, E> {
    slot: MutexGuard<'a, Slot<E>>,
}

impl<E> Deref for EngineGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.slot.engine
    }
}

/// Owns one engine per live view node.
///
/// The node map sits behind one lock held only for lookups and structural
/// changes; each node's engine and pending set sit behind their own lock, so
/// transactions for different nodes do not serialize on each other.
pub struct ViewRegistry<F: EngineFactory> {
    factory: F,
    nodes: Mutex<HashMap<NodeHandle, EngineHandle<F::Engine>>>,
}

impl<F: EngineFactory> ViewRegistry<F> {
    /// Create an empty registry building engines with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// The engine factory.
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Return the engine for `node`, creating it on first sight.
    ///
    /// A factory failure leaves `node` unregistered.
    pub fn resolve(&self, node: NodeHandle) -> Result<EngineHandle<F::Engine>> {
        let mut nodes = self.nodes.lock();
        if let Some(handle) = nodes.get(&node) {
            return Ok(handle.clone());
        }

        let engine = self.factory.create(node)?;
        let handle = EngineHandle {
            slot: Arc::new(Mutex::new(Slot {
                engine,
                pending: ChangeSet::new(),
            })),
        };
        nodes.insert(node, handle.clone());
        drop(nodes);

        debug!(%node, "engine created");
        Ok(handle)
    }

    /// Drop the engine and pending changes for `node`.
    ///
    /// Returns `false` if the node was not registered.
    pub fn release(&self, node: NodeHandle) -> bool {
        let removed = self.nodes.lock().remove(&node);
        match removed {
            Some(handle) => {
                let discarded = handle.slot().pending.take();
                if discarded.is_empty() {
                    debug!(%node, "engine released");
                } else {
                    debug!(%node, discarded = %discarded, "engine released with pending changes");
                }
                true
            }
            None => false,
        }
    }

    /// Engine for `node` if registered, without creating one.
    pub fn get(&self, node: NodeHandle) -> Option<EngineHandle<F::Engine>> {
        self.nodes.lock().get(&node).cloned()
    }

    /// Whether `node` has a live engine.
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.nodes.lock().contains_key(&node)
    }

    /// Number of live engines.
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Whether no engines are live.
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Handles of all registered nodes, in no particular order.
    pub fn nodes(&self) -> Vec<NodeHandle> {
        self.nodes.lock().keys().copied().collect()
    }

    /// Snapshot of the fields pending commit for `node`.
    pub fn pending(&self, node: NodeHandle) -> Option<ChangeSet> {
        let handle = self.get(node)?;
        let pending = handle.slot().pending.clone();
        Some(pending)
    }
}

impl<F: EngineFactory> fmt::Debug for ViewRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("nodes", &self.len())
            .finish_non_exhaustive()
    }
}
