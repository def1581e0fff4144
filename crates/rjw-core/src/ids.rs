use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Evidence,
    Decision,
    Requirement,
    Spec,
    Test,
    Context,
}

impl ArtifactKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Evidence => "EVD",
            ArtifactKind::Decision => "DEC",
            ArtifactKind::Requirement => "REQ",
            ArtifactKind::Spec => "SPEC",
            ArtifactKind::Test => "TEST",
            ArtifactKind::Context => "CTX",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Numeric suffix of `id` when it carries `kind`'s prefix.
pub fn sequence_of(kind: ArtifactKind, id: &str) -> Option<u32> {
    let rest = id.strip_prefix(kind.prefix())?.strip_prefix('-')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Next id for `kind`: one past the highest existing suffix, never a gap fill.
///
/// Ids with other prefixes are ignored, so callers may pass a mixed list.
pub fn next_artifact_id<'a, I>(kind: ArtifactKind, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let next = existing
        .into_iter()
        .filter_map(|id| sequence_of(kind, id))
        .max()
        .map_or(1, |n| n + 1);
    format!("{}-{next:04}", kind.prefix())
}

static ARTIFACT_ID_RE: OnceLock<Regex> = OnceLock::new();

fn artifact_id_re() -> &'static Regex {
    ARTIFACT_ID_RE
        .get_or_init(|| Regex::new(r"(EVD|DEC|SPEC|REQ|TEST|CTX)-\d{4}").expect("static regex"))
}

/// Pull the first artifact id out of a file name such as `EVD-0003-auth.md`.
pub fn artifact_id_from_filename(name: &str) -> Option<String> {
    artifact_id_re().find(name).map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_starts_at_one() {
        assert_eq!(next_artifact_id(ArtifactKind::Evidence, []), "EVD-0001");
    }

    #[test]
    fn sequential_generation() {
        let mut ids: Vec<String> = Vec::new();
        for _ in 0..3 {
            let id = next_artifact_id(ArtifactKind::Spec, ids.iter().map(String::as_str));
            ids.push(id);
        }
        assert_eq!(ids, vec!["SPEC-0001", "SPEC-0002", "SPEC-0003"]);
    }

    #[test]
    fn next_id_is_max_plus_one_not_first_gap() {
        let existing = ["DEC-0001", "DEC-0003"];
        assert_eq!(
            next_artifact_id(ArtifactKind::Decision, existing),
            "DEC-0004"
        );
    }

    #[test]
    fn other_prefixes_are_ignored() {
        let existing = ["EVD-0009", "TEST-0002", "SPEC-0001"];
        assert_eq!(next_artifact_id(ArtifactKind::Test, existing), "TEST-0003");
        assert_eq!(
            next_artifact_id(ArtifactKind::Context, existing),
            "CTX-0001"
        );
    }

    #[test]
    fn spec_prefix_does_not_match_evidence_lookalikes() {
        assert_eq!(sequence_of(ArtifactKind::Spec, "SPEC-0012"), Some(12));
        assert_eq!(sequence_of(ArtifactKind::Spec, "SPECX-0012"), None);
        assert_eq!(sequence_of(ArtifactKind::Spec, "SPEC-"), None);
    }

    #[test]
    fn id_from_filename() {
        assert_eq!(
            artifact_id_from_filename("research/evidence/EVD-0042.md").as_deref(),
            Some("EVD-0042")
        );
        assert_eq!(
            artifact_id_from_filename("SPEC-0007-login-flow.md").as_deref(),
            Some("SPEC-0007")
        );
        assert!(artifact_id_from_filename("notes.md").is_none());
    }
}
