use crate::checklist::{ChecklistEnforcer, PhaseFacts};
use crate::error::Result;
use crate::guard::tail;
use crate::types::{ChecklistStatus, Pathway, Phase, RiskLevel, TrustLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Yolo,
    TrustBased,
    ManualRequired,
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalMode::Yolo => "yolo",
            ApprovalMode::TrustBased => "trust_based",
            ApprovalMode::ManualRequired => "manual_required",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub phase: String,
    pub approved: bool,
    pub mode: ApprovalMode,
    pub reason: String,
    pub risk_level: RiskLevel,
    pub trust_level: TrustLevel,
    pub checklist_passed: bool,
    pub yolo_mode: bool,
}

/// One line of the governance audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GovernanceEntry {
    Approval(ApprovalRecord),
    YoloModeChange {
        timestamp: DateTime<Utc>,
        previous: bool,
        current: bool,
        reason: String,
    },
    TrustLevelChange {
        timestamp: DateTime<Utc>,
        previous: TrustLevel,
        current: TrustLevel,
        reason: String,
    },
}

impl GovernanceEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GovernanceEntry::Approval(r) => r.timestamp,
            GovernanceEntry::YoloModeChange { timestamp, .. }
            | GovernanceEntry::TrustLevelChange { timestamp, .. } => *timestamp,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            GovernanceEntry::Approval(r) => {
                let verdict = if r.approved { "approved" } else { "not approved" };
                format!("{} [{}] {verdict} ({}): {}", r.action, r.phase, r.mode, r.reason)
            }
            GovernanceEntry::YoloModeChange {
                previous, current, ..
            } => format!("yolo mode {previous} -> {current}"),
            GovernanceEntry::TrustLevelChange {
                previous, current, ..
            } => format!("trust level {previous} -> {current}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GovernanceStatus {
    pub yolo_mode: bool,
    pub trust_level: TrustLevel,
    pub approval_count: usize,
    pub checklist_results: BTreeMap<Phase, ChecklistStatus>,
}

// ---------------------------------------------------------------------------
// GovernanceManager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceManager {
    yolo_mode: bool,
    trust_level: TrustLevel,
    checklist: ChecklistEnforcer,
    log: Vec<GovernanceEntry>,
}

impl GovernanceManager {
    pub fn new(yolo_mode: bool, trust_level: TrustLevel) -> Self {
        Self {
            yolo_mode,
            trust_level,
            checklist: ChecklistEnforcer::new(),
            log: Vec::new(),
        }
    }

    pub fn yolo_mode(&self) -> bool {
        self.yolo_mode
    }

    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    pub fn checklist(&self) -> &ChecklistEnforcer {
        &self.checklist
    }

    /// Decide whether `action` may proceed without a human.
    ///
    /// The checklist for `phase` always runs first and can veto. In YOLO mode
    /// a passing checklist is sufficient; otherwise the current trust level
    /// must also authorize `risk`. The record is logged whatever the outcome.
    /// Only an unknown phase is an error.
    pub fn request_approval(
        &mut self,
        action: &str,
        phase: &str,
        facts: &PhaseFacts,
        risk: RiskLevel,
    ) -> Result<ApprovalRecord> {
        let checklist_passed = self.checklist.validate_phase(phase, facts)?;
        let trust = self.trust_level;

        let (approved, mode, reason) = if self.yolo_mode {
            if checklist_passed {
                (true, ApprovalMode::Yolo, "auto-approved (yolo mode): checklist passed".to_string())
            } else {
                (false, ApprovalMode::Yolo, "auto-rejected (yolo mode): checklist failed".to_string())
            }
        } else {
            let authorized = self.trust_level_authorizes(risk);
            match (authorized, checklist_passed) {
                (true, true) => (
                    true,
                    ApprovalMode::TrustBased,
                    format!("auto-approved: trust level {trust} authorized for {risk} risk"),
                ),
                (false, _) => (
                    false,
                    ApprovalMode::ManualRequired,
                    format!(
                        "manual approval required: trust level {trust} insufficient for {risk} risk (needs {})",
                        risk.minimum_trust()
                    ),
                ),
                (true, false) => (
                    false,
                    ApprovalMode::ManualRequired,
                    format!("manual approval required: {phase} checklist failed"),
                ),
            }
        };

        let record = ApprovalRecord {
            timestamp: Utc::now(),
            action: action.to_string(),
            phase: phase.to_string(),
            approved,
            mode,
            reason,
            risk_level: risk,
            trust_level: trust,
            checklist_passed,
            yolo_mode: self.yolo_mode,
        };
        tracing::info!(
            action,
            phase,
            approved,
            mode = %mode,
            risk = %risk,
            "approval decided"
        );
        self.log.push(GovernanceEntry::Approval(record.clone()));
        Ok(record)
    }

    pub fn trust_level_authorizes(&self, risk: RiskLevel) -> bool {
        self.trust_level >= risk.minimum_trust()
    }

    pub fn set_yolo_mode(&mut self, enabled: bool) {
        let previous = self.yolo_mode;
        self.yolo_mode = enabled;
        tracing::info!(previous, current = enabled, "yolo mode changed");
        self.log.push(GovernanceEntry::YoloModeChange {
            timestamp: Utc::now(),
            previous,
            current: enabled,
            reason: "yolo mode toggled by user".to_string(),
        });
    }

    pub fn set_trust_level(&mut self, level: TrustLevel) {
        let previous = self.trust_level;
        self.trust_level = level;
        tracing::info!(%previous, current = %level, "trust level changed");
        self.log.push(GovernanceEntry::TrustLevelChange {
            timestamp: Utc::now(),
            previous,
            current: level,
            reason: "trust level updated".to_string(),
        });
    }

    /// Most recent `limit` log entries, oldest first.
    pub fn approval_history(&self, limit: Option<usize>) -> &[GovernanceEntry] {
        tail(&self.log, limit)
    }

    pub fn status(&self) -> GovernanceStatus {
        GovernanceStatus {
            yolo_mode: self.yolo_mode,
            trust_level: self.trust_level,
            approval_count: self.log.len(),
            checklist_results: self.checklist.results().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RiskClassifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChangeFacts {
    #[serde(default)]
    pub is_prototype: bool,
    #[serde(default)]
    pub yolo_mode: bool,
}

pub struct RiskClassifier;

impl RiskClassifier {
    /// Prototype work wins over YOLO; everything else is streamlined.
    pub fn classify(facts: ChangeFacts) -> Pathway {
        if facts.is_prototype {
            Pathway::Prototype
        } else if facts.yolo_mode {
            Pathway::Yolo
        } else {
            Pathway::Streamlined
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RjwError;
    use crate::types::LegacyRisk;

    fn risk(s: &str) -> RiskLevel {
        s.parse().unwrap()
    }

    fn research_facts(pass: bool) -> PhaseFacts {
        PhaseFacts {
            evidence_ids: if pass { vec!["EVD-0001".to_string()] } else { Vec::new() },
            ..Default::default()
        }
    }

    #[test]
    fn supervised_never_approves_medium() {
        let mut gov = GovernanceManager::new(false, TrustLevel::Supervised);
        for pass in [true, false] {
            let rec = gov
                .request_approval("edit", "research", &research_facts(pass), risk("medium"))
                .unwrap();
            assert!(!rec.approved);
            assert_eq!(rec.mode, ApprovalMode::ManualRequired);
        }
    }

    #[test]
    fn trusted_partner_approves_critical_with_passing_checklist() {
        let mut gov = GovernanceManager::new(false, TrustLevel::TrustedPartner);
        let rec = gov
            .request_approval("deploy", "research", &research_facts(true), risk("critical"))
            .unwrap();
        assert!(rec.approved);
        assert_eq!(rec.mode, ApprovalMode::TrustBased);
        assert!(rec.checklist_passed);
    }

    #[test]
    fn failing_checklist_vetoes_authorized_trust() {
        let mut gov = GovernanceManager::new(false, TrustLevel::TrustedPartner);
        let rec = gov
            .request_approval("deploy", "research", &research_facts(false), risk("low"))
            .unwrap();
        assert!(!rec.approved);
        assert_eq!(rec.mode, ApprovalMode::ManualRequired);
        assert!(rec.reason.contains("checklist failed"));
    }

    #[test]
    fn yolo_overrides_trust() {
        let mut gov = GovernanceManager::new(true, TrustLevel::Supervised);
        let rec = gov
            .request_approval("edit", "research", &research_facts(true), risk("critical"))
            .unwrap();
        assert!(rec.approved);
        assert_eq!(rec.mode, ApprovalMode::Yolo);

        let rec = gov
            .request_approval("edit", "research", &research_facts(false), risk("minimal"))
            .unwrap();
        assert!(!rec.approved);
        assert_eq!(rec.mode, ApprovalMode::Yolo);
    }

    #[test]
    fn unknown_phase_is_rejected_without_logging() {
        let mut gov = GovernanceManager::default();
        let err = gov
            .request_approval("edit", "shipping", &PhaseFacts::default(), risk("low"))
            .unwrap_err();
        assert!(matches!(err, RjwError::InvalidPhase(_)));
        assert!(gov.approval_history(None).is_empty());
    }

    #[test]
    fn legacy_scale_is_monotonic() {
        let legacy = [
            LegacyRisk::Minimal,
            LegacyRisk::Low,
            LegacyRisk::Medium,
            LegacyRisk::High,
            LegacyRisk::Critical,
        ];
        for pair in TrustLevel::all().windows(2) {
            let lower = GovernanceManager::new(false, pair[0]);
            let higher = GovernanceManager::new(false, pair[1]);
            for r in legacy {
                if lower.trust_level_authorizes(RiskLevel::Legacy(r)) {
                    assert!(higher.trust_level_authorizes(RiskLevel::Legacy(r)));
                }
            }
        }
    }

    #[test]
    fn pathway_scale_thresholds() {
        let guided = GovernanceManager::new(false, TrustLevel::Guided);
        assert!(guided.trust_level_authorizes(risk("streamlined")));
        assert!(guided.trust_level_authorizes(risk("prototype")));
        assert!(!guided.trust_level_authorizes(risk("yolo")));

        let autonomous = GovernanceManager::new(false, TrustLevel::Autonomous);
        assert!(autonomous.trust_level_authorizes(risk("yolo")));
        assert!(!autonomous.trust_level_authorizes(risk("critical")));

        let supervised = GovernanceManager::default();
        assert!(supervised.trust_level_authorizes(risk("low")));
        assert!(!supervised.trust_level_authorizes(risk("streamlined")));
    }

    #[test]
    fn mode_changes_are_audited() {
        let mut gov = GovernanceManager::default();
        gov.set_yolo_mode(true);
        gov.set_trust_level(TrustLevel::Autonomous);
        let history = gov.approval_history(None);
        assert_eq!(history.len(), 2);
        assert!(matches!(
            history[0],
            GovernanceEntry::YoloModeChange { previous: false, current: true, .. }
        ));
        assert!(matches!(
            history[1],
            GovernanceEntry::TrustLevelChange {
                previous: TrustLevel::Supervised,
                current: TrustLevel::Autonomous,
                ..
            }
        ));
        assert_eq!(gov.approval_history(Some(1)).len(), 1);
        assert_eq!(gov.status().approval_count, 2);
    }

    #[test]
    fn status_reports_checklist_results() {
        let mut gov = GovernanceManager::default();
        gov.request_approval("edit", "research", &research_facts(true), risk("minimal"))
            .unwrap();
        let status = gov.status();
        assert_eq!(
            status.checklist_results.get(&Phase::Research),
            Some(&ChecklistStatus::Passed)
        );
        assert_eq!(status.trust_level, TrustLevel::Supervised);
    }

    #[test]
    fn classifier_precedence() {
        let both = ChangeFacts { is_prototype: true, yolo_mode: true };
        assert_eq!(RiskClassifier::classify(both), Pathway::Prototype);
        let yolo = ChangeFacts { is_prototype: false, yolo_mode: true };
        assert_eq!(RiskClassifier::classify(yolo), Pathway::Yolo);
        assert_eq!(RiskClassifier::classify(ChangeFacts::default()), Pathway::Streamlined);
    }

    #[test]
    fn approval_records_roundtrip_through_json() {
        let mut gov = GovernanceManager::new(false, TrustLevel::Guided);
        gov.request_approval("edit", "research", &research_facts(true), risk("streamlined"))
            .unwrap();
        let json = serde_json::to_string(&gov).unwrap();
        let back: GovernanceManager = serde_json::from_str(&json).unwrap();
        assert_eq!(back.approval_history(None).len(), 1);
        assert_eq!(back.trust_level(), TrustLevel::Guided);
    }
}
