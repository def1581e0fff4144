use crate::error::Result;
use crate::types::{ChecklistStatus, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub item: &'static str,
    pub required: bool,
}

const fn required(item: &'static str) -> ChecklistItem {
    ChecklistItem {
        item,
        required: true,
    }
}

const RESEARCH: &[ChecklistItem] = &[
    required("Evidence harvested"),
    required("Sources documented"),
    required("Key insights extracted"),
];

const DECISION: &[ChecklistItem] = &[
    required("Evidence references provided"),
    required("Options evaluated"),
    required("Rationale documented"),
];

const SPECIFICATION: &[ChecklistItem] = &[
    required("Requirements defined"),
    required("Evidence backing provided"),
    required("Technical design complete"),
];

const IMPLEMENTATION: &[ChecklistItem] = &[
    required("Tests written"),
    required("Code implements spec"),
    required("Tests passing"),
];

pub fn checklist_for(phase: Phase) -> &'static [ChecklistItem] {
    match phase {
        Phase::Research => RESEARCH,
        Phase::Decision => DECISION,
        Phase::Specification => SPECIFICATION,
        Phase::Implementation => IMPLEMENTATION,
    }
}

// ---------------------------------------------------------------------------
// PhaseFacts
// ---------------------------------------------------------------------------

/// What the caller can show for a phase. Empty lists count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseFacts {
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub test_files: Vec<String>,
    #[serde(default)]
    pub tests_passing: bool,
}

// ---------------------------------------------------------------------------
// Item rules
// ---------------------------------------------------------------------------

struct ItemRule {
    phase: Phase,
    needle: &'static str,
    check: fn(&PhaseFacts) -> bool,
}

fn has_evidence(f: &PhaseFacts) -> bool {
    !f.evidence_ids.is_empty()
}

fn has_evidence_refs(f: &PhaseFacts) -> bool {
    !f.evidence_refs.is_empty()
}

fn has_options(f: &PhaseFacts) -> bool {
    !f.options.is_empty()
}

fn has_requirements(f: &PhaseFacts) -> bool {
    !f.requirements.is_empty()
}

fn has_test_files(f: &PhaseFacts) -> bool {
    !f.test_files.is_empty()
}

fn tests_passing(f: &PhaseFacts) -> bool {
    f.tests_passing
}

const ITEM_RULES: &[ItemRule] = &[
    ItemRule { phase: Phase::Research, needle: "Evidence harvested", check: has_evidence },
    ItemRule { phase: Phase::Research, needle: "Sources documented", check: has_evidence },
    ItemRule { phase: Phase::Decision, needle: "Evidence references", check: has_evidence_refs },
    ItemRule { phase: Phase::Decision, needle: "Options evaluated", check: has_options },
    ItemRule { phase: Phase::Specification, needle: "Requirements defined", check: has_requirements },
    ItemRule { phase: Phase::Specification, needle: "Evidence backing", check: has_evidence_refs },
    ItemRule { phase: Phase::Implementation, needle: "Tests written", check: has_test_files },
    ItemRule { phase: Phase::Implementation, needle: "Tests passing", check: tests_passing },
];

/// Whether `item` is satisfied by `facts`. Items with no matching rule pass.
pub fn check_item(phase: Phase, item: &str, facts: &PhaseFacts) -> bool {
    ITEM_RULES
        .iter()
        .find(|r| r.phase == phase && item.contains(r.needle))
        .map_or(true, |r| (r.check)(facts))
}

// ---------------------------------------------------------------------------
// ChecklistEnforcer
// ---------------------------------------------------------------------------

/// Keeps only the outcome of the latest validation per phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecklistEnforcer {
    results: BTreeMap<Phase, ChecklistStatus>,
}

impl ChecklistEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every required item of `phase`. Unknown phase names are an
    /// error; a failing item is not.
    pub fn validate_phase(&mut self, phase: &str, facts: &PhaseFacts) -> Result<bool> {
        let phase: Phase = phase.parse()?;
        let passed = checklist_for(phase)
            .iter()
            .filter(|i| i.required)
            .all(|i| check_item(phase, i.item, facts));
        let status = if passed {
            ChecklistStatus::Passed
        } else {
            ChecklistStatus::Failed
        };
        self.results.insert(phase, status);
        Ok(passed)
    }

    pub fn checklist(&self, phase: &str) -> Result<&'static [ChecklistItem]> {
        Ok(checklist_for(phase.parse()?))
    }

    pub fn status(&self, phase: Phase) -> ChecklistStatus {
        self.results
            .get(&phase)
            .copied()
            .unwrap_or(ChecklistStatus::NotStarted)
    }

    pub fn results(&self) -> &BTreeMap<Phase, ChecklistStatus> {
        &self.results
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
