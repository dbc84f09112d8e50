//! Camera-View-Bridge: property batching between a declarative view framework
//! and stateful camera engines.
//!
//! The framework describes each camera view as a set of named properties on a
//! view node. This library keeps one engine per node, writes property values
//! through as they arrive, and hands the engine the set of fields that really
//! changed exactly once per update transaction.

pub mod config;
pub mod device;
pub mod events;
pub mod field;
pub mod logs;
pub mod props;
pub mod registry;
pub mod traits;
pub mod transaction;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use config::BridgeConfig;
pub use device::{V4L2Engine, V4L2EngineFactory};
pub use events::{EventOutcome, ViewEvent};
pub use field::{ChangeSet, FieldName};
pub use props::{CameraProps, PropUpdate};
pub use registry::{EngineGuard, EngineHandle, NodeHandle, ViewRegistry};
pub use traits::{BridgeError, CameraEngine, CaptureFormat, EngineFactory, FourCC};
pub use transaction::{CommitOutcome, NodeState};
