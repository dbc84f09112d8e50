//! Mock engine implementation for testing without hardware.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::field::{ChangeSet, FieldName};
use crate::props::CameraProps;
use crate::registry::NodeHandle;
use crate::traits::{BridgeError, CameraEngine, EngineFactory, Result};

/// One recorded `apply` call.
#[derive(Debug, Clone)]
pub struct AppliedCall {
    /// Fields handed to `apply`.
    pub fields: ChangeSet,
    /// Zoom value on the engine when `apply` ran.
    pub zoom: f32,
}

/// Engine that records every `apply` call.
pub struct MockEngine {
    node: NodeHandle,
    props: CameraProps,
    applied: Vec<AppliedCall>,
    fail_on: Option<FieldName>,
}

impl MockEngine {
    /// Create a mock engine for `node`.
    #[must_use]
    pub fn new(node: NodeHandle) -> Self {
        Self {
            node,
            props: CameraProps::default(),
            applied: Vec::new(),
            fail_on: None,
        }
    }

    /// Node this engine was built for.
    #[must_use]
    pub const fn node(&self) -> NodeHandle {
        self.node
    }

    /// Every `apply` call so far, oldest first.
    #[must_use]
    pub fn applied(&self) -> &[AppliedCall] {
        &self.applied
    }
}

impl CameraEngine for MockEngine {
    fn props(&self) -> &CameraProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut CameraProps {
        &mut self.props
    }

    fn apply(&mut self, changed: &ChangeSet) -> Result<()> {
        assert!(!changed.is_empty(), "apply called with an empty field set");
        self.applied.push(AppliedCall {
            fields: changed.clone(),
            zoom: self.props.zoom,
        });

        match self.fail_on {
            Some(field) if changed.contains(field) => {
                let reason = format!("mock rejects `{field}`");
                Err(BridgeError::InvalidConfiguration(reason))
            }
            _ => Ok(()),
        }
    }
}

/// Factory producing [`MockEngine`]s and counting constructions.
pub struct MockFactory {
    available: bool,
    fail_on: Option<FieldName>,
    created: AtomicUsize,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFactory {
    /// Create a factory that always succeeds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            available: true,
            fail_on: None,
            created: AtomicUsize::new(0),
        }
    }

    /// Create a factory whose execution context is missing.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            available: false,
            fail_on: None,
            created: AtomicUsize::new(0),
        }
    }

    /// Make engines reject any commit that includes `field`.
    #[must_use]
    pub const fn failing_on(mut self, field: FieldName) -> Self {
        self.fail_on = Some(field);
        self
    }

    /// Number of engines built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn create(&self, node: NodeHandle) -> Result<MockEngine> {
        if !self.available {
            return Err(BridgeError::EngineUnavailable(
                "mock execution context missing".to_owned(),
            ));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let mut engine = MockEngine::new(node);
        engine.fail_on = self.fail_on;
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_factory_counts_engines() {
        let factory = MockFactory::new();
        let engine = factory
            .create(NodeHandle::from_raw(7))
            .expect("create should succeed");

        assert_eq!(engine.node(), NodeHandle::from_raw(7));
        assert_eq!(factory.created(), 1);
        assert!(engine.applied().is_empty());
    }

    #[test]
    fn test_mock_factory_unavailable() {
        let factory = MockFactory::unavailable();
        assert!(factory.create(NodeHandle::next()).is_err());
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn test_mock_engine_records_zoom_at_apply() {
        let mut engine = MockEngine::new(NodeHandle::next());
        engine.props_mut().zoom = 0.25;

        let changed: ChangeSet = [FieldName::Zoom].into_iter().collect();
        engine.apply(&changed).expect("apply should succeed");

        let call = engine.applied().first().expect("call recorded");
        assert!((call.zoom - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_mock_engine_failure() {
        let factory = MockFactory::new().failing_on(FieldName::Hdr);
        let mut engine = factory
            .create(NodeHandle::next())
            .expect("create should succeed");

        let changed: ChangeSet = [FieldName::Hdr].into_iter().collect();
        let err = engine.apply(&changed).expect_err("apply should fail");
        assert!(matches!(err, BridgeError::InvalidConfiguration(_)));
        assert_eq!(engine.applied().len(), 1);
    }
}
