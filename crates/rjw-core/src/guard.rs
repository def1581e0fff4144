//! SystemGuard: the single enforcement point for code writes.
//!
//! With `strict_mode` on, no code unit is written unless its tests, specs and
//! evidence form a complete chain. With it off, writes go straight through;
//! the bypass is recorded in the operation log and emitted as a warning.

use crate::error::Result;
use crate::store::ArtifactStore;
use crate::traceability::{ChainInfo, TraceabilityChain};
use crate::types::TestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Operation log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
    Create,
    Configure,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Create => "create",
            OperationKind::Configure => "configure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: OperationKind,
    pub target: String,
    pub message: String,
    pub success: bool,
}

// ---------------------------------------------------------------------------
// SystemGuard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemGuard {
    chain: TraceabilityChain,
    operation_log: Vec<OperationRecord>,
    strict_mode: bool,
}

impl Default for SystemGuard {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SystemGuard {
    pub fn new(strict_mode: bool) -> Self {
        Self {
            chain: TraceabilityChain::new(),
            operation_log: Vec::new(),
            strict_mode,
        }
    }

    pub fn chain(&self) -> &TraceabilityChain {
        &self.chain
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    pub fn set_strict_mode(&mut self, enabled: bool) {
        self.strict_mode = enabled;
        let state = if enabled { "enabled" } else { "disabled" };
        if enabled {
            tracing::info!("strict traceability mode enabled");
        } else {
            tracing::warn!("strict traceability mode disabled: code writes are no longer gated");
        }
        self.log(
            OperationKind::Configure,
            "system",
            format!("strict mode {state}"),
            true,
        );
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Evidence may be created freely: research comes first.
    pub fn register_evidence(&mut self, evidence_id: &str, location: &str) {
        let added = self.chain.register_evidence(evidence_id);
        let message = if added {
            format!("evidence {evidence_id} registered")
        } else {
            format!("evidence {evidence_id} already registered")
        };
        self.log(OperationKind::Create, location, message, true);
    }

    pub fn register_spec(&mut self, spec_id: &str, evidence_refs: &[String], location: &str) -> Result<()> {
        let outcome = self.chain.register_spec(spec_id, evidence_refs.iter().cloned());
        let message = format!("spec {spec_id} registered with evidence [{}]", evidence_refs.join(", "));
        self.record(OperationKind::Create, location, message, outcome)
    }

    /// Drop a spec whose document could not be stored.
    pub(crate) fn withdraw_spec(&mut self, spec_id: &str, reason: &str) {
        self.chain.remove_spec(spec_id);
        self.log(OperationKind::Create, spec_id, format!("spec {spec_id} withdrawn: {reason}"), false);
    }

    pub fn register_test(
        &mut self,
        test_id: &str,
        spec_refs: &[String],
        status: TestStatus,
        location: &str,
    ) -> Result<()> {
        let outcome = self
            .chain
            .register_test(test_id, spec_refs.iter().cloned(), status);
        let message = format!(
            "test {test_id} registered with specs [{}], status: {status}",
            spec_refs.join(", ")
        );
        self.record(OperationKind::Create, location, message, outcome)
    }

    // -----------------------------------------------------------------------
    // Guarded operations
    // -----------------------------------------------------------------------

    /// Write `content` for `code_unit` through `store`.
    ///
    /// In strict mode the unit is linked to `test_refs` and the whole chain is
    /// validated first; any violation aborts before the store is touched.
    pub fn write_code(
        &mut self,
        store: &mut dyn ArtifactStore,
        code_unit: &str,
        content: &str,
        test_refs: &[String],
    ) -> Result<()> {
        let previous = self.chain.linked_tests(code_unit).map(<[String]>::to_vec);
        if self.strict_mode {
            let checked = self
                .chain
                .link_code_to_test(code_unit, test_refs.iter().cloned())
                .and_then(|()| self.chain.validate_chain(code_unit).map(|_| ()));
            if let Err(e) = checked {
                self.chain.restore_code_link(code_unit, previous);
                tracing::warn!(code_unit, error = %e, "code write rejected");
                self.log(OperationKind::Write, code_unit, format!("write rejected: {e}"), false);
                return Err(e);
            }
        } else {
            tracing::warn!(code_unit, "strict mode off: writing without traceability check");
        }

        match store.persist(code_unit, content) {
            Ok(()) => {
                tracing::info!(code_unit, tests = ?test_refs, strict = self.strict_mode, "code written");
                let mut message = format!("code written with test refs [{}]", test_refs.join(", "));
                if !self.strict_mode {
                    message.push_str(" (strict mode off, chain not checked)");
                }
                self.log(OperationKind::Write, code_unit, message, true);
                Ok(())
            }
            Err(e) => {
                if self.strict_mode {
                    self.chain.restore_code_link(code_unit, previous);
                }
                self.log(OperationKind::Write, code_unit, format!("write failed: {e}"), false);
                Err(e)
            }
        }
    }

    /// Reads are never blocked, only logged.
    pub fn read_file(&mut self, store: &dyn ArtifactStore, name: &str) -> Result<String> {
        match store.read(name) {
            Ok(content) => {
                self.log(OperationKind::Read, name, "file read".to_string(), true);
                Ok(content)
            }
            Err(e) => {
                self.log(OperationKind::Read, name, format!("read failed: {e}"), false);
                Err(e)
            }
        }
    }

    pub fn validate_chain(&self, code_unit: &str) -> Result<bool> {
        self.chain.validate_chain(code_unit)
    }

    pub fn traceability_info(&self, code_unit: &str) -> Option<ChainInfo> {
        self.chain.chain_info(code_unit)
    }

    // -----------------------------------------------------------------------
    // Log
    // -----------------------------------------------------------------------

    /// Most recent `limit` entries, or the whole log.
    pub fn operation_log(&self, limit: Option<usize>) -> &[OperationRecord] {
        tail(&self.operation_log, limit)
    }

    fn record(&mut self, op: OperationKind, target: &str, message: String, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.log(op, target, message, true);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(artifact = target, error = %e, "registration rejected");
                self.log(op, target, e.to_string(), false);
                Err(e)
            }
        }
    }

    fn log(&mut self, operation: OperationKind, target: &str, message: String, success: bool) {
        self.operation_log.push(OperationRecord {
            timestamp: Utc::now(),
            operation,
            target: target.to_string(),
            message,
            success,
        });
    }
}

pub(crate) fn tail<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) if n < items.len() => &items[items.len() - n..],
        _ => items,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RjwError;
    use crate::store::{FsStore, MemoryStore};

    fn refs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn seeded(strict: bool) -> SystemGuard {
        let mut guard = SystemGuard::new(strict);
        guard.register_evidence("EVD-0001", "research/evidence/EVD-0001.md");
        guard
            .register_spec("SPEC-0001", &refs(&["EVD-0001"]), "specs/SPEC-0001.md")
            .unwrap();
        guard
            .register_test("TEST-0001", &refs(&["SPEC-0001"]), TestStatus::Failing, "tests/test_app.py")
            .unwrap();
        guard
    }

    #[test]
    fn strict_write_with_full_chain_succeeds() {
        let mut guard = seeded(true);
        let mut store = MemoryStore::new();
        guard
            .write_code(&mut store, "app.py", "print('hi')", &refs(&["TEST-0001"]))
            .unwrap();
        assert_eq!(store.read("app.py").unwrap(), "print('hi')");
        let last = guard.operation_log(Some(1))[0].clone();
        assert_eq!(last.operation, OperationKind::Write);
        assert!(last.success);
    }

    #[test]
    fn strict_write_without_tests_is_rejected_and_nothing_written() {
        let mut guard = seeded(true);
        let mut store = MemoryStore::new();
        let err = guard
            .write_code(&mut store, "app.py", "x", &[])
            .unwrap_err();
        assert!(err.is_guard_violation());
        assert!(!store.exists("app.py"));
        assert!(!guard.operation_log(Some(1))[0].success);
        assert!(guard.chain().linked_tests("app.py").is_none());
    }

    #[test]
    fn failed_store_write_keeps_error_and_unlinks_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut guard = seeded(true);
        let mut store = FsStore::new(dir.path());
        let err = guard
            .write_code(&mut store, "../escape.rs", "x", &refs(&["TEST-0001"]))
            .unwrap_err();
        assert!(matches!(err, RjwError::InvalidInput(_)));
        assert!(!err.is_guard_violation());
        assert!(guard.chain().linked_tests("../escape.rs").is_none());
        assert!(guard.validate_chain("../escape.rs").is_err());
        assert!(!guard.operation_log(Some(1))[0].success);
    }

    #[test]
    fn relaxed_write_succeeds_without_tests() {
        let mut guard = SystemGuard::new(false);
        let mut store = MemoryStore::new();
        guard.write_code(&mut store, "app.py", "x", &[]).unwrap();
        assert!(store.exists("app.py"));
        assert!(guard.operation_log(Some(1))[0]
            .message
            .contains("strict mode off"));
    }

    #[test]
    fn strict_write_with_unknown_test_is_rejected() {
        let mut guard = seeded(true);
        let mut store = MemoryStore::new();
        let err = guard
            .write_code(&mut store, "app.py", "x", &refs(&["TEST-0042"]))
            .unwrap_err();
        assert!(err.to_string().contains("TEST-0042"));
        assert!(!store.exists("app.py"));
    }

    #[test]
    fn toggling_strict_mode_is_logged() {
        let mut guard = SystemGuard::new(true);
        guard.set_strict_mode(false);
        let entry = &guard.operation_log(None)[0];
        assert_eq!(entry.operation, OperationKind::Configure);
        assert_eq!(entry.target, "system");
        assert!(entry.message.contains("disabled"));
        assert!(!guard.strict_mode());
    }

    #[test]
    fn reads_are_logged_even_when_missing() {
        let mut guard = SystemGuard::new(true);
        let mut store = MemoryStore::new();
        store.persist("README.md", "hello").unwrap();
        assert_eq!(guard.read_file(&store, "README.md").unwrap(), "hello");
        assert!(guard.read_file(&store, "nope.md").is_err());
        let log = guard.operation_log(None);
        assert_eq!(log.len(), 2);
        assert!(log[0].success);
        assert!(!log[1].success);
    }

    #[test]
    fn rejected_registration_is_logged_as_failure() {
        let mut guard = SystemGuard::new(true);
        let err = guard
            .register_spec("SPEC-0001", &refs(&["EVD-9999"]), "specs/SPEC-0001.md")
            .unwrap_err();
        assert!(err.to_string().contains("EVD-9999"));
        assert!(!guard.chain().has_spec("SPEC-0001"));
        assert!(!guard.operation_log(None)[0].success);
    }

    #[test]
    fn operation_log_limit_returns_most_recent() {
        let mut guard = SystemGuard::new(true);
        for i in 1..=5 {
            guard.register_evidence(&format!("EVD-000{i}"), "research");
        }
        let recent = guard.operation_log(Some(2));
        assert_eq!(recent.len(), 2);
        assert!(recent[1].message.contains("EVD-0005"));
        assert_eq!(guard.operation_log(Some(50)).len(), 5);
    }
}
