use crate::error::{Result, RjwError};
use crate::evidence::EvidenceOracle;
use crate::types::TestStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Edge types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEntry {
    pub spec_refs: Vec<String>,
    pub status: TestStatus,
}

// ---------------------------------------------------------------------------
// ChainInfo (read model)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
    pub code_unit: String,
    pub tests: Vec<TestLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestLink {
    pub test_id: String,
    pub status: TestStatus,
    pub specs: Vec<SpecLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecLink {
    pub spec_id: String,
    pub evidence: Vec<String>,
}

// ---------------------------------------------------------------------------
// TraceabilityChain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceabilityChain {
    evidence: BTreeSet<String>,
    specs: BTreeMap<String, Vec<String>>,
    tests: BTreeMap<String, TestEntry>,
    code: BTreeMap<String, Vec<String>>,
}

fn collect_refs<I, S>(refs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    refs.into_iter().map(Into::into).collect()
}

fn join_ids(ids: &[&String]) -> String {
    ids.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

impl TraceabilityChain {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Record an evidence id. Re-registering is a no-op; returns whether the
    /// id was new.
    pub fn register_evidence(&mut self, id: impl Into<String>) -> bool {
        self.evidence.insert(id.into())
    }

    pub fn register_spec<I, S>(&mut self, spec_id: &str, evidence_refs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let refs = collect_refs(evidence_refs);
        let invalid: Vec<&String> = refs.iter().filter(|r| !self.evidence.contains(*r)).collect();
        if !invalid.is_empty() {
            return Err(RjwError::GuardViolation(format!(
                "cannot register SPEC {spec_id}: invalid evidence references [{}]. \
                 Evidence must exist before a SPEC can reference it",
                join_ids(&invalid)
            )));
        }
        self.specs.insert(spec_id.to_string(), refs);
        Ok(())
    }

    pub(crate) fn remove_spec(&mut self, spec_id: &str) {
        self.specs.remove(spec_id);
    }

    /// Register or re-register a test. The status is taken as given; a test
    /// may be re-registered as passing without first having been failing.
    pub fn register_test<I, S>(&mut self, test_id: &str, spec_refs: I, status: TestStatus) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let refs = collect_refs(spec_refs);
        let invalid: Vec<&String> = refs.iter().filter(|r| !self.specs.contains_key(*r)).collect();
        if !invalid.is_empty() {
            return Err(RjwError::GuardViolation(format!(
                "cannot register TEST {test_id}: invalid spec references [{}]. \
                 SPEC must exist before a TEST can reference it",
                join_ids(&invalid)
            )));
        }
        self.tests.insert(
            test_id.to_string(),
            TestEntry {
                spec_refs: refs,
                status,
            },
        );
        Ok(())
    }

    pub fn link_code_to_test<I, S>(&mut self, code_unit: &str, test_refs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let refs = collect_refs(test_refs);
        let invalid: Vec<&String> = refs.iter().filter(|r| !self.tests.contains_key(*r)).collect();
        if !invalid.is_empty() {
            return Err(RjwError::GuardViolation(format!(
                "cannot link code unit {code_unit}: invalid test references [{}]. \
                 TEST must exist before code can reference it",
                join_ids(&invalid)
            )));
        }
        self.code.insert(code_unit.to_string(), refs);
        Ok(())
    }

    /// Put a code unit's link back to what it was before a rejected write.
    pub(crate) fn restore_code_link(&mut self, code_unit: &str, previous: Option<Vec<String>>) {
        match previous {
            Some(refs) => {
                self.code.insert(code_unit.to_string(), refs);
            }
            None => {
                self.code.remove(code_unit);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check the full backward chain for `code_unit`. Pure read.
    ///
    /// Fails when the unit has no linked tests, a linked test has no spec
    /// references, or a reachable spec has no evidence references.
    pub fn validate_chain(&self, code_unit: &str) -> Result<bool> {
        let test_refs = match self.code.get(code_unit) {
            Some(refs) if !refs.is_empty() => refs,
            _ => {
                return Err(RjwError::GuardViolation(format!(
                    "code unit {code_unit} has no linked tests. \
                     A failing TEST must exist before code can be written"
                )))
            }
        };

        for test_id in test_refs {
            let entry = self.tests.get(test_id).ok_or_else(|| {
                RjwError::GuardViolation(format!(
                    "code unit {code_unit} links unknown test {test_id}"
                ))
            })?;
            if entry.spec_refs.is_empty() {
                return Err(RjwError::GuardViolation(format!(
                    "test {test_id} has no linked specifications. \
                     TEST must reference at least one SPEC"
                )));
            }
            for spec_id in &entry.spec_refs {
                let evidence = self.specs.get(spec_id).ok_or_else(|| {
                    RjwError::GuardViolation(format!(
                        "test {test_id} references unknown spec {spec_id}"
                    ))
                })?;
                if evidence.is_empty() {
                    return Err(RjwError::GuardViolation(format!(
                        "spec {spec_id} has no evidence references. \
                         SPEC must reference at least one EVD"
                    )));
                }
            }
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn has_spec(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }

    pub fn has_test(&self, id: &str) -> bool {
        self.tests.contains_key(id)
    }

    pub fn spec_evidence(&self, spec_id: &str) -> Option<&[String]> {
        self.specs.get(spec_id).map(Vec::as_slice)
    }

    pub fn test(&self, test_id: &str) -> Option<&TestEntry> {
        self.tests.get(test_id)
    }

    pub fn linked_tests(&self, code_unit: &str) -> Option<&[String]> {
        self.code.get(code_unit).map(Vec::as_slice)
    }

    pub fn evidence_ids(&self) -> impl Iterator<Item = &str> {
        self.evidence.iter().map(String::as_str)
    }

    pub fn spec_ids(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn test_ids(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    /// Nested view of what `code_unit` traces back to, or `None` when it was
    /// never linked.
    pub fn chain_info(&self, code_unit: &str) -> Option<ChainInfo> {
        let test_refs = self.code.get(code_unit)?;
        let tests = test_refs
            .iter()
            .filter_map(|test_id| {
                let entry = self.tests.get(test_id)?;
                let specs = entry
                    .spec_refs
                    .iter()
                    .map(|spec_id| SpecLink {
                        spec_id: spec_id.clone(),
                        evidence: self.specs.get(spec_id).cloned().unwrap_or_default(),
                    })
                    .collect();
                Some(TestLink {
                    test_id: test_id.clone(),
                    status: entry.status,
                    specs,
                })
            })
            .collect();
        Some(ChainInfo {
            code_unit: code_unit.to_string(),
            tests,
        })
    }
}

impl EvidenceOracle for TraceabilityChain {
    fn exists(&self, evidence_id: &str) -> bool {
        self.evidence.contains(evidence_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> TraceabilityChain {
        let mut chain = TraceabilityChain::new();
        chain.register_evidence("EVD-0001");
        chain.register_spec("SPEC-0001", ["EVD-0001"]).unwrap();
        chain
            .register_test("TEST-0001", ["SPEC-0001"], TestStatus::Failing)
            .unwrap();
        chain
    }

    #[test]
    fn full_chain_validates() {
        let mut chain = seeded();
        chain.link_code_to_test("app.py", ["TEST-0001"]).unwrap();
        assert!(chain.validate_chain("app.py").unwrap());
    }

    #[test]
    fn spec_with_missing_evidence_is_rejected_and_not_stored() {
        let mut chain = TraceabilityChain::new();
        chain.register_evidence("EVD-0001");
        let err = chain
            .register_spec("SPEC-0001", ["EVD-0001", "EVD-9999"])
            .unwrap_err();
        assert!(err.is_guard_violation());
        assert!(err.to_string().contains("EVD-9999"));
        assert!(!err.to_string().contains("EVD-0001,"));
        assert!(!chain.has_spec("SPEC-0001"));
    }

    #[test]
    fn test_with_missing_spec_is_rejected_and_not_stored() {
        let mut chain = seeded();
        let err = chain
            .register_test("TEST-0002", ["SPEC-0404"], TestStatus::Failing)
            .unwrap_err();
        assert!(err.to_string().contains("SPEC-0404"));
        assert!(!chain.has_test("TEST-0002"));
    }

    #[test]
    fn link_with_missing_test_is_rejected() {
        let mut chain = seeded();
        let err = chain
            .link_code_to_test("src/lib.rs", ["TEST-0001", "TEST-0099"])
            .unwrap_err();
        assert!(err.to_string().contains("TEST-0099"));
        assert!(chain.linked_tests("src/lib.rs").is_none());
    }

    #[test]
    fn evidence_registration_is_idempotent() {
        let mut chain = TraceabilityChain::new();
        assert!(chain.register_evidence("EVD-0001"));
        assert!(!chain.register_evidence("EVD-0001"));
        assert_eq!(chain.evidence_ids().count(), 1);
    }

    #[test]
    fn unlinked_code_fails_validation() {
        let chain = seeded();
        let err = chain.validate_chain("orphan.rs").unwrap_err();
        assert!(err.to_string().contains("orphan.rs"));
        assert!(err.to_string().contains("no linked tests"));
    }

    #[test]
    fn empty_test_link_fails_validation() {
        let mut chain = seeded();
        chain
            .link_code_to_test("empty.rs", Vec::<String>::new())
            .unwrap();
        assert!(chain.validate_chain("empty.rs").is_err());
    }

    #[test]
    fn test_without_specs_fails_validation() {
        let mut chain = seeded();
        chain
            .register_test("TEST-0002", Vec::<String>::new(), TestStatus::Failing)
            .unwrap();
        chain.link_code_to_test("b.rs", ["TEST-0002"]).unwrap();
        let err = chain.validate_chain("b.rs").unwrap_err();
        assert!(err.to_string().contains("TEST-0002"));
    }

    #[test]
    fn spec_without_evidence_fails_validation() {
        let mut chain = seeded();
        chain.register_spec("SPEC-0002", Vec::<String>::new()).unwrap();
        chain
            .register_test("TEST-0002", ["SPEC-0001", "SPEC-0002"], TestStatus::Failing)
            .unwrap();
        chain.link_code_to_test("c.rs", ["TEST-0002"]).unwrap();
        let err = chain.validate_chain("c.rs").unwrap_err();
        assert!(err.to_string().contains("SPEC-0002"));
    }

    #[test]
    fn test_can_be_reregistered_as_passing() {
        let mut chain = seeded();
        chain
            .register_test("TEST-0001", ["SPEC-0001"], TestStatus::Passing)
            .unwrap();
        assert_eq!(chain.test("TEST-0001").unwrap().status, TestStatus::Passing);
    }

    #[test]
    fn chain_info_nests_references() {
        let mut chain = seeded();
        chain.link_code_to_test("app.py", ["TEST-0001"]).unwrap();
        let info = chain.chain_info("app.py").unwrap();
        assert_eq!(info.tests.len(), 1);
        assert_eq!(info.tests[0].specs[0].spec_id, "SPEC-0001");
        assert_eq!(info.tests[0].specs[0].evidence, vec!["EVD-0001"]);
        assert!(chain.chain_info("missing.py").is_none());
    }
}
