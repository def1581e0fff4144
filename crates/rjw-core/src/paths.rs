use crate::error::{Result, RjwError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RJW_DIR: &str = ".rjw";
pub const SESSIONS_DIR: &str = ".rjw/sessions";
pub const CONFIG_FILE: &str = ".rjw/config.yaml";

pub const EVIDENCE_DIR: &str = "research/evidence";
pub const DECISIONS_DIR: &str = "decisions";
pub const SPECS_DIR: &str = "specs";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rjw_dir(root: &Path) -> PathBuf {
    root.join(RJW_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join(SESSIONS_DIR)
}

pub fn session_path(root: &Path, id: &str) -> PathBuf {
    sessions_dir(root).join(format!("{id}.json"))
}

/// Store-relative name of an evidence document.
pub fn evidence_artifact(id: &str) -> String {
    format!("{EVIDENCE_DIR}/{id}.md")
}

pub fn decision_artifact(id: &str) -> String {
    format!("{DECISIONS_DIR}/{id}.md")
}

pub fn spec_artifact(id: &str) -> String {
    format!("{SPECS_DIR}/{id}.md")
}

// ---------------------------------------------------------------------------
// Session id validation
// ---------------------------------------------------------------------------

static SESSION_ID_RE: OnceLock<Regex> = OnceLock::new();

fn session_id_re() -> &'static Regex {
    SESSION_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").unwrap())
}

pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 96 || !session_id_re().is_match(id) {
        return Err(RjwError::InvalidInput(format!(
            "invalid session id '{id}': use letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_session_ids() {
        for id in ["default", "session_20260101_120000_abc123", "x-1"] {
            validate_session_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_session_ids() {
        for id in ["", "../escape", "has space", "-leading", "a/b"] {
            assert!(validate_session_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(config_path(root), PathBuf::from("/tmp/proj/.rjw/config.yaml"));
        assert_eq!(
            session_path(root, "default"),
            PathBuf::from("/tmp/proj/.rjw/sessions/default.json")
        );
        assert_eq!(evidence_artifact("EVD-0001"), "research/evidence/EVD-0001.md");
    }
}
