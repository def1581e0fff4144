use crate::error::{Result, RjwError};
use crate::evidence::EvidenceRegistry;
use crate::guard::SystemGuard;
use crate::ids::{next_artifact_id, ArtifactKind};
use crate::paths;
use crate::store::ArtifactStore;
use crate::types::TestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: String,
    pub title: String,
    pub evidence_refs: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen: Option<String>,
    #[serde(default)]
    pub rationale: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecRecord {
    pub id: String,
    pub title: String,
    pub evidence_refs: Vec<String>,
    #[serde(default)]
    pub decision_refs: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewDecision {
    pub title: String,
    pub evidence_refs: Vec<String>,
    pub options: Vec<String>,
    pub chosen: Option<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewSpec {
    pub title: String,
    pub evidence_refs: Vec<String>,
    pub decision_refs: Vec<String>,
    pub requirements: Vec<String>,
    /// A requirement stated directly by the user needs no evidence.
    pub user_requirement: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub evidence: usize,
    pub decisions: usize,
    pub specs: usize,
    pub tests: usize,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    decisions: BTreeMap<String, DecisionRecord>,
    #[serde(default)]
    specs: BTreeMap<String, SpecRecord>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_decision(
        &mut self,
        registry: &EvidenceRegistry,
        store: &mut dyn ArtifactStore,
        new: NewDecision,
    ) -> Result<DecisionRecord> {
        if new.title.trim().is_empty() {
            return Err(RjwError::InvalidInput("decision title cannot be empty".to_string()));
        }
        registry.require_evidence_for(ArtifactKind::Decision, &new.evidence_refs, false)?;
        if let Some(chosen) = &new.chosen {
            if !new.options.is_empty() && !new.options.contains(chosen) {
                return Err(RjwError::InvalidInput(format!(
                    "chosen option '{chosen}' is not one of [{}]",
                    new.options.join(", ")
                )));
            }
        }

        let id = next_artifact_id(ArtifactKind::Decision, self.decisions.keys().map(String::as_str));
        let record = DecisionRecord {
            id: id.clone(),
            title: new.title.trim().to_string(),
            evidence_refs: new.evidence_refs,
            options: new.options,
            chosen: new.chosen,
            rationale: new.rationale,
            created_at: Utc::now(),
        };
        store.persist(&paths::decision_artifact(&id), &render_decision(&record))?;
        tracing::info!(id = %id, evidence = ?record.evidence_refs, "decision recorded");
        self.decisions.insert(id, record.clone());
        Ok(record)
    }

    /// Create a spec and register it in the guard's traceability chain.
    ///
    /// Evidence is checked against `registry`; decision refs must name
    /// decisions already in this ledger.
    pub fn create_spec(
        &mut self,
        registry: &EvidenceRegistry,
        guard: &mut SystemGuard,
        store: &mut dyn ArtifactStore,
        new: NewSpec,
    ) -> Result<SpecRecord> {
        if new.title.trim().is_empty() {
            return Err(RjwError::InvalidInput("spec title cannot be empty".to_string()));
        }
        let kind = if new.user_requirement {
            ArtifactKind::Requirement
        } else {
            ArtifactKind::Spec
        };
        registry.require_evidence_for(kind, &new.evidence_refs, new.user_requirement)?;

        let missing: Vec<&str> = new
            .decision_refs
            .iter()
            .map(String::as_str)
            .filter(|d| !self.decisions.contains_key(*d))
            .collect();
        if !missing.is_empty() {
            return Err(RjwError::InvalidInput(format!(
                "unknown decision references [{}]",
                missing.join(", ")
            )));
        }

        // ids already in the chain are taken even when the ledger lacks them
        let id = next_artifact_id(
            ArtifactKind::Spec,
            self.specs.keys().map(String::as_str).chain(guard.chain().spec_ids()),
        );
        let path = paths::spec_artifact(&id);
        guard.register_spec(&id, &new.evidence_refs, &path)?;

        let record = SpecRecord {
            id: id.clone(),
            title: new.title.trim().to_string(),
            evidence_refs: new.evidence_refs,
            decision_refs: new.decision_refs,
            requirements: new.requirements,
            created_at: Utc::now(),
        };
        if let Err(e) = store.persist(&path, &render_spec(&record)) {
            guard.withdraw_spec(&id, &e.to_string());
            return Err(e);
        }
        self.specs.insert(id, record.clone());
        Ok(record)
    }

    /// Register a new test against `spec_refs` and return its id.
    pub fn register_test(
        &self,
        guard: &mut SystemGuard,
        spec_refs: &[String],
        status: TestStatus,
        location: &str,
    ) -> Result<String> {
        let id = next_artifact_id(ArtifactKind::Test, guard.chain().test_ids());
        guard.register_test(&id, spec_refs, status, location)?;
        Ok(id)
    }

    /// Re-register an existing test, typically to record a status change.
    pub fn update_test(
        &self,
        guard: &mut SystemGuard,
        test_id: &str,
        status: TestStatus,
        location: &str,
    ) -> Result<()> {
        let spec_refs = guard
            .chain()
            .test(test_id)
            .map(|t| t.spec_refs.clone())
            .ok_or_else(|| RjwError::ArtifactNotFound(test_id.to_string()))?;
        guard.register_test(test_id, &spec_refs, status, location)
    }

    pub fn decision(&self, id: &str) -> Option<&DecisionRecord> {
        self.decisions.get(id)
    }

    pub fn spec(&self, id: &str) -> Option<&SpecRecord> {
        self.specs.get(id)
    }

    pub fn decisions(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.decisions.values()
    }

    pub fn specs(&self) -> impl Iterator<Item = &SpecRecord> {
        self.specs.values()
    }

    pub fn summary(&self, registry: &EvidenceRegistry, guard: &SystemGuard) -> WorkflowSummary {
        WorkflowSummary {
            evidence: registry.len(),
            decisions: self.decisions.len(),
            specs: self.specs.len(),
            tests: guard.chain().test_ids().count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn bullet_list(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "- {empty}");
    }
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

fn render_decision(d: &DecisionRecord) -> String {
    let mut out = format!("# {}: {}\n\n", d.id, d.title);
    let _ = writeln!(out, "**Date:** {}\n", d.created_at.format("%Y-%m-%d"));
    out.push_str("## Evidence\n\n");
    bullet_list(&mut out, &d.evidence_refs, "none");
    out.push_str("\n## Options\n\n");
    bullet_list(&mut out, &d.options, "none recorded");
    if let Some(chosen) = &d.chosen {
        let _ = writeln!(out, "\n## Decision\n\n{chosen}");
    }
    if !d.rationale.is_empty() {
        let _ = writeln!(out, "\n## Rationale\n\n{}", d.rationale);
    }
    out
}

fn render_spec(s: &SpecRecord) -> String {
    let mut out = format!("# {}: {}\n\n", s.id, s.title);
    out.push_str("## Evidence\n\n");
    bullet_list(&mut out, &s.evidence_refs, "user requirement");
    out.push_str("\n## Decisions\n\n");
    bullet_list(&mut out, &s.decision_refs, "none");
    out.push_str("\n## Requirements\n\n");
    bullet_list(&mut out, &s.requirements, "none");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
