//! Shared helpers for the canonlink integration tests.

pub mod testroot;

use log::Level;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use canonlink::logging::{AuditSink, FactsEmitter};
use canonlink::{Client, Linker, Options, Roots, Scope};

pub use testroot::TestRoot;

/// In-memory emitter capturing facts.
#[derive(Clone, Default, Debug)]
pub struct TestEmitter {
    pub events: Arc<Mutex<Vec<(String, String, String, Value)>>>,
}

impl FactsEmitter for TestEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        self.events
            .lock()
            .unwrap()
            .push((subsystem.into(), event.into(), decision.into(), fields));
    }
}

impl TestEmitter {
    pub fn count(&self, event: &str, decision: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e, d, _)| e == event && d == decision)
            .count()
    }
}

/// No-op audit sink.
#[derive(Clone, Default)]
pub struct TestAudit;

impl AuditSink for TestAudit {
    fn log(&self, _level: Level, _msg: &str) {}
}

pub fn options(root: &TestRoot, clients: &[Client]) -> Options {
    let roots = Roots::resolve(Scope::Global, None, Some(root.path())).unwrap();
    Options::new(roots, clients.iter().copied())
}

pub fn linker(root: &TestRoot, clients: &[Client]) -> (Linker<TestEmitter, TestAudit>, TestEmitter) {
    let facts = TestEmitter::default();
    (
        Linker::new(facts.clone(), TestAudit, options(root, clients)),
        facts,
    )
}
