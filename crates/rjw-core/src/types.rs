use crate::error::RjwError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Research,
    Decision,
    Specification,
    Implementation,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Research,
            Phase::Decision,
            Phase::Specification,
            Phase::Implementation,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Research => "research",
            Phase::Decision => "decision",
            Phase::Specification => "specification",
            Phase::Implementation => "implementation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(Phase::Research),
            "decision" => Ok(Phase::Decision),
            "specification" => Ok(Phase::Specification),
            "implementation" => Ok(Phase::Implementation),
            _ => Err(RjwError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ChecklistStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    NotStarted,
    InProgress,
    Passed,
    Failed,
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChecklistStatus::NotStarted => "not_started",
            ChecklistStatus::InProgress => "in_progress",
            ChecklistStatus::Passed => "passed",
            ChecklistStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TrustLevel
// ---------------------------------------------------------------------------

/// Agent autonomy tier. Ordered: a higher tier may self-approve everything a
/// lower tier may on the legacy risk scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Supervised = 0,
    Guided = 1,
    Autonomous = 2,
    TrustedPartner = 3,
}

impl TrustLevel {
    pub fn all() -> &'static [TrustLevel] {
        &[
            TrustLevel::Supervised,
            TrustLevel::Guided,
            TrustLevel::Autonomous,
            TrustLevel::TrustedPartner,
        ]
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TrustLevel::Supervised => "SUPERVISED",
            TrustLevel::Guided => "GUIDED",
            TrustLevel::Autonomous => "AUTONOMOUS",
            TrustLevel::TrustedPartner => "TRUSTED_PARTNER",
        }
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        TrustLevel::Supervised
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrustLevel {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "supervised" | "0" => Ok(TrustLevel::Supervised),
            "guided" | "1" => Ok(TrustLevel::Guided),
            "autonomous" | "2" => Ok(TrustLevel::Autonomous),
            "trusted_partner" | "3" => Ok(TrustLevel::TrustedPartner),
            _ => Err(RjwError::InvalidInput(format!(
                "unknown trust level '{s}': must be supervised, guided, autonomous, or trusted_partner"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Risk scales
// ---------------------------------------------------------------------------

/// The original five-tier risk vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyRisk {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl LegacyRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            LegacyRisk::Minimal => "minimal",
            LegacyRisk::Low => "low",
            LegacyRisk::Medium => "medium",
            LegacyRisk::High => "high",
            LegacyRisk::Critical => "critical",
        }
    }

    /// Lowest trust level allowed to self-approve this risk.
    pub fn minimum_trust(self) -> TrustLevel {
        match self {
            LegacyRisk::Minimal | LegacyRisk::Low => TrustLevel::Supervised,
            LegacyRisk::Medium => TrustLevel::Guided,
            LegacyRisk::High => TrustLevel::Autonomous,
            LegacyRisk::Critical => TrustLevel::TrustedPartner,
        }
    }
}

/// The three-pathway vocabulary produced by [`crate::governance::RiskClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    Streamlined,
    Yolo,
    Prototype,
}

impl Pathway {
    pub fn as_str(self) -> &'static str {
        match self {
            Pathway::Streamlined => "streamlined",
            Pathway::Yolo => "yolo",
            Pathway::Prototype => "prototype",
        }
    }

    pub fn minimum_trust(self) -> TrustLevel {
        match self {
            Pathway::Streamlined | Pathway::Prototype => TrustLevel::Guided,
            Pathway::Yolo => TrustLevel::Autonomous,
        }
    }
}

/// A risk descriptor from either scale. The string form picks the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RiskLevel {
    Legacy(LegacyRisk),
    Pathway(Pathway),
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Legacy(r) => r.as_str(),
            RiskLevel::Pathway(p) => p.as_str(),
        }
    }

    pub fn minimum_trust(self) -> TrustLevel {
        match self {
            RiskLevel::Legacy(r) => r.minimum_trust(),
            RiskLevel::Pathway(p) => p.minimum_trust(),
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Legacy(LegacyRisk::Medium)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let risk = match s {
            "minimal" => RiskLevel::Legacy(LegacyRisk::Minimal),
            "low" => RiskLevel::Legacy(LegacyRisk::Low),
            "medium" => RiskLevel::Legacy(LegacyRisk::Medium),
            "high" => RiskLevel::Legacy(LegacyRisk::High),
            "critical" => RiskLevel::Legacy(LegacyRisk::Critical),
            "streamlined" => RiskLevel::Pathway(Pathway::Streamlined),
            "yolo" => RiskLevel::Pathway(Pathway::Yolo),
            "prototype" => RiskLevel::Pathway(Pathway::Prototype),
            _ => {
                return Err(RjwError::InvalidInput(format!(
                    "unknown risk level '{s}'"
                )))
            }
        };
        Ok(risk)
    }
}

impl From<RiskLevel> for String {
    fn from(r: RiskLevel) -> Self {
        r.as_str().to_string()
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = RjwError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// TestStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Failing,
    Passing,
}

impl Default for TestStatus {
    fn default() -> Self {
        TestStatus::Failing
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Failing => f.write_str("failing"),
            TestStatus::Passing => f.write_str("passing"),
        }
    }
}

impl FromStr for TestStatus {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failing" => Ok(TestStatus::Failing),
            "passing" => Ok(TestStatus::Passing),
            _ => Err(RjwError::InvalidInput(format!(
                "unknown test status '{s}': must be failing or passing"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_roundtrip() {
        for phase in Phase::all() {
            assert_eq!(Phase::from_str(phase.as_str()).unwrap(), *phase);
        }
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let err = Phase::from_str("deployment").unwrap_err();
        assert!(matches!(err, RjwError::InvalidPhase(p) if p == "deployment"));
    }

    #[test]
    fn trust_level_ordering() {
        assert!(TrustLevel::Supervised < TrustLevel::Guided);
        assert!(TrustLevel::Autonomous < TrustLevel::TrustedPartner);
        assert_eq!(TrustLevel::TrustedPartner.rank(), 3);
    }

    #[test]
    fn trust_level_parses_names_and_ranks() {
        assert_eq!("GUIDED".parse::<TrustLevel>().unwrap(), TrustLevel::Guided);
        assert_eq!(
            "trusted-partner".parse::<TrustLevel>().unwrap(),
            TrustLevel::TrustedPartner
        );
        assert_eq!("2".parse::<TrustLevel>().unwrap(), TrustLevel::Autonomous);
        assert!("root".parse::<TrustLevel>().is_err());
    }

    #[test]
    fn risk_string_selects_scale() {
        assert_eq!(
            "critical".parse::<RiskLevel>().unwrap(),
            RiskLevel::Legacy(LegacyRisk::Critical)
        );
        assert_eq!(
            "prototype".parse::<RiskLevel>().unwrap(),
            RiskLevel::Pathway(Pathway::Prototype)
        );
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn risk_level_serializes_as_plain_string() {
        let json = serde_json::to_string(&RiskLevel::Pathway(Pathway::Yolo)).unwrap();
        assert_eq!(json, "\"yolo\"");
        let parsed: RiskLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, RiskLevel::Legacy(LegacyRisk::High));
    }
}
