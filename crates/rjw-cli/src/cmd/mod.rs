pub mod approve;
pub mod code;
pub mod config;
pub mod context;
pub mod decision;
pub mod evidence;
pub mod governance;
pub mod init;
pub mod log;
pub mod session;
pub mod spec;
pub mod test;

use anyhow::Context;
use rjw_core::config::Config;
use rjw_core::session::Session;
use rjw_core::store::FsStore;
use std::path::{Path, PathBuf};

/// An initialized project with one session loaded for a single command.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub session: Session,
    pub store: FsStore,
}

impl Project {
    /// Load config and the named session, starting the session if it was
    /// never saved.
    pub fn open(root: &Path, session_id: &str) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let session = Session::load_or_new(root, session_id, &config)
            .with_context(|| format!("failed to load session '{session_id}'"))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            session,
            store: FsStore::new(root),
        })
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.session
            .save(&self.root)
            .with_context(|| format!("failed to save session '{}'", self.session.id))
    }
}

pub fn parse_toggle(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => anyhow::bail!("expected on or off, got '{other}'"),
    }
}

/// Read inline text or the contents of `file`, whichever was given.
pub fn text_or_file(text: Option<String>, file: Option<PathBuf>, what: &str) -> anyhow::Result<String> {
    match (text, file) {
        (Some(t), None) => Ok(t),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        (Some(_), Some(_)) => anyhow::bail!("pass either --{what} or --file, not both"),
        (None, None) => anyhow::bail!("one of --{what} or --file is required"),
    }
}
