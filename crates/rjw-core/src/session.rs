use crate::brain::Brain;
use crate::config::Config;
use crate::context::ContextCurator;
use crate::error::{Result, RjwError};
use crate::evidence::{EvidenceRecord, EvidenceRegistry, HarvestRequest};
use crate::governance::GovernanceManager;
use crate::guard::SystemGuard;
use crate::paths;
use crate::store::ArtifactStore;
use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub registry: EvidenceRegistry,
    #[serde(default)]
    pub ledger: Workflow,
    #[serde(default)]
    pub guard: SystemGuard,
    #[serde(default)]
    pub governance: GovernanceManager,
    #[serde(default)]
    pub curator: ContextCurator,
}

impl Session {
    /// Fresh session seeded from the project settings.
    pub fn new_from_config(id: impl Into<String>, config: &Config) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            registry: EvidenceRegistry::new(),
            ledger: Workflow::new(),
            guard: SystemGuard::new(config.guard.strict_mode),
            governance: GovernanceManager::new(
                config.governance.yolo_mode,
                config.governance.trust_level,
            ),
            curator: ContextCurator::new(config.context.max_depth),
        }
    }

    /// `session_<YYYYmmdd_HHMMSS>_<6 hex>`
    pub fn generate_id() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &suffix[..6])
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        paths::validate_session_id(id)?;
        let path = paths::session_path(root, id);
        if !path.exists() {
            return Err(RjwError::SessionNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let session: Session = serde_json::from_str(&data)?;
        Ok(session)
    }

    pub fn load_or_new(root: &Path, id: &str, config: &Config) -> Result<Self> {
        match Self::load(root, id) {
            Err(RjwError::SessionNotFound(_)) => {
                tracing::debug!(session = id, "starting new session");
                Ok(Self::new_from_config(id, config))
            }
            other => other,
        }
    }

    pub fn save(&mut self, root: &Path) -> Result<()> {
        paths::validate_session_id(&self.id)?;
        self.updated_at = Utc::now();
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(&paths::session_path(root, &self.id), data.as_bytes())
    }

    /// Saved session ids, sorted. Empty when nothing was saved yet.
    pub fn list(root: &Path) -> Result<Vec<String>> {
        let dir = paths::sessions_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Evidence intake
    // -----------------------------------------------------------------------

    /// Harvest evidence and make it citable by specs in the guard's chain.
    pub fn harvest_evidence(
        &mut self,
        store: &mut dyn ArtifactStore,
        request: HarvestRequest,
        brain: Option<&dyn Brain>,
    ) -> Result<EvidenceRecord> {
        let record = self.registry.harvest(store, request, brain)?;
        self.guard.register_evidence(&record.id, &record.path);
        Ok(record)
    }

    pub fn add_user_research(
        &mut self,
        store: &mut dyn ArtifactStore,
        raw: &str,
        user_priority: bool,
        curator: &str,
    ) -> Result<EvidenceRecord> {
        let record = self
            .registry
            .harvest_user_research(store, raw, user_priority, curator)?;
        self.guard.register_evidence(&record.id, &record.path);
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
