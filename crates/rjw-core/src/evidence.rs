//! Evidence registry: the source of truth for which EVD ids exist.
//!
//! Evidence is the root of every traceability chain, so creating it is never
//! gated. Decisions, specs and requirements are checked against this
//! registry before they are created.

use crate::brain::{string_list, Brain};
use crate::error::{Result, RjwError};
use crate::ids::{artifact_id_from_filename, next_artifact_id, ArtifactKind};
use crate::paths;
use crate::research::{parse_user_research, SourceKind, SourceRef};
use crate::store::ArtifactStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Answers "does this evidence id exist". The traceability core trusts
/// whichever oracle it is wired to.
pub trait EvidenceOracle {
    fn exists(&self, evidence_id: &str) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: String,
    pub topic: String,
    pub source_type: String,
    pub source_url: String,
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusions: Option<String>,
    pub path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_provided: bool,
    #[serde(default)]
    pub user_priority: bool,
    pub curator: String,
}

#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub topic: String,
    pub source_type: String,
    pub source_url: Option<String>,
    pub raw_content: Option<String>,
    pub curator: String,
}

impl HarvestRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            source_type: "Research".to_string(),
            source_url: None,
            raw_content: None,
            curator: "ResearchAgent".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// EvidenceRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceRegistry {
    records: BTreeMap<String, EvidenceRecord>,
}

impl EvidenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evidence record for `request.topic` and persist its
    /// document through `store`.
    ///
    /// Summary and insights come from `brain` when one is supplied and no raw
    /// content was given; otherwise deterministic placeholder findings are
    /// recorded so the chain can still be built offline.
    pub fn harvest(
        &mut self,
        store: &mut dyn ArtifactStore,
        request: HarvestRequest,
        brain: Option<&dyn Brain>,
    ) -> Result<EvidenceRecord> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(RjwError::InvalidInput("topic cannot be empty".to_string()));
        }

        let id = self.next_id();
        let (summary, key_insights) = research_findings(topic, request.raw_content.as_deref(), brain);
        let record = EvidenceRecord {
            path: paths::evidence_artifact(&id),
            source_url: request
                .source_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| format!("Research query: {topic}")),
            id,
            topic: topic.to_string(),
            source_type: request.source_type,
            summary,
            key_insights,
            sources: Vec::new(),
            methodology: None,
            conclusions: None,
            created_at: Utc::now(),
            user_provided: false,
            user_priority: false,
            curator: request.curator,
        };
        self.commit(store, record)
    }

    /// Register research pasted by the user. `user_priority` marks it as
    /// carrying extra weight; otherwise it ranks equal to harvested research.
    pub fn harvest_user_research(
        &mut self,
        store: &mut dyn ArtifactStore,
        raw: &str,
        user_priority: bool,
        curator: &str,
    ) -> Result<EvidenceRecord> {
        let parsed = parse_user_research(raw)?;
        let id = self.next_id();
        let source_url = parsed
            .sources
            .first()
            .filter(|s| s.kind == SourceKind::Url)
            .map_or_else(|| "User input".to_string(), |s| s.reference.clone());
        let record = EvidenceRecord {
            path: paths::evidence_artifact(&id),
            id,
            topic: parsed.title,
            source_type: "User-Provided".to_string(),
            source_url,
            summary: parsed.summary,
            key_insights: parsed.key_insights,
            sources: parsed.sources,
            methodology: parsed.methodology,
            conclusions: parsed.conclusions,
            created_at: Utc::now(),
            user_provided: true,
            user_priority,
            curator: curator.to_string(),
        };
        self.commit(store, record)
    }

    fn next_id(&self) -> String {
        next_artifact_id(ArtifactKind::Evidence, self.records.keys().map(String::as_str))
    }

    fn commit(&mut self, store: &mut dyn ArtifactStore, record: EvidenceRecord) -> Result<EvidenceRecord> {
        store.persist(&record.path, &render_markdown(&record))?;
        tracing::info!(id = %record.id, topic = %record.topic, "evidence harvested");
        self.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Option<&EvidenceRecord> {
        self.records.get(id)
    }

    /// Look up a record by id or by its document path
    /// (`research/evidence/EVD-0003.md`).
    pub fn find(&self, id_or_path: &str) -> Option<&EvidenceRecord> {
        self.get(id_or_path)
            .or_else(|| self.records.get(&artifact_id_from_filename(id_or_path)?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Evidence ids in id order, optionally restricted to topics containing
    /// `topic_filter` (case-insensitive).
    pub fn list(&self, topic_filter: Option<&str>) -> Vec<&str> {
        let needle = topic_filter.map(str::to_lowercase);
        self.records
            .values()
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |n| r.topic.to_lowercase().contains(n))
            })
            .map(|r| r.id.as_str())
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.records.values()
    }

    /// Check that an artifact of `kind` may be created citing `evidence_refs`.
    ///
    /// Decisions, specs and requirements must cite at least one piece of
    /// evidence, except requirements stated by the user. Every cited id must
    /// exist regardless.
    pub fn require_evidence_for(
        &self,
        kind: ArtifactKind,
        evidence_refs: &[String],
        is_user_requirement: bool,
    ) -> Result<()> {
        let needs_evidence = matches!(
            kind,
            ArtifactKind::Decision | ArtifactKind::Spec | ArtifactKind::Requirement
        );
        if needs_evidence && evidence_refs.is_empty() && !is_user_requirement {
            return Err(RjwError::InvalidInput(format!(
                "cannot create {kind} without evidence references: harvest evidence first, \
                 or mark it as a user requirement"
            )));
        }

        let invalid: Vec<&str> = evidence_refs
            .iter()
            .map(String::as_str)
            .filter(|r| !self.exists(r))
            .collect();
        if !invalid.is_empty() {
            return Err(RjwError::InvalidInput(format!(
                "invalid evidence references [{}]; available: [{}]",
                invalid.join(", "),
                self.list(None).join(", ")
            )));
        }
        Ok(())
    }
}

impl EvidenceOracle for EvidenceRegistry {
    fn exists(&self, evidence_id: &str) -> bool {
        self.records.contains_key(evidence_id)
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

fn research_findings(topic: &str, raw: Option<&str>, brain: Option<&dyn Brain>) -> (String, Vec<String>) {
    let raw = raw.filter(|r| !r.trim().is_empty());

    if let (Some(brain), None) = (brain, raw) {
        match findings_from_brain(brain, topic) {
            Ok(Some(found)) => return found,
            Ok(None) => tracing::warn!(topic, "model returned no findings, using placeholder"),
            Err(e) => tracing::warn!(topic, error = %e, "research generation failed, using placeholder"),
        }
    }

    if raw.is_some() {
        (
            format!("Research findings on '{topic}' based on provided content."),
            vec![
                "Content has been analyzed for relevant patterns.".to_string(),
                "Key concepts extracted from source material.".to_string(),
                "Findings documented for traceability.".to_string(),
            ],
        )
    } else {
        (
            format!("Comprehensive research conducted on '{topic}' to establish evidence base."),
            vec![
                format!("Industry best practices for {topic} have been documented."),
                format!("Technical specifications and standards related to {topic} have been reviewed."),
                format!("Trade-offs and considerations for {topic} have been identified."),
            ],
        )
    }
}

fn findings_from_brain(brain: &dyn Brain, topic: &str) -> Result<Option<(String, Vec<String>)>> {
    let prompt = format!(
        "Research topic: {topic}\n\n\
         Please provide:\n\
         1. A concise summary (2-3 sentences) of the key findings\n\
         2. A JSON array of 3-5 specific insights or best practices\n\n\
         Format your response as JSON with keys: \"summary\" and \"insights\" (array of strings)"
    );
    let schema = json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "insights": { "type": "array", "items": { "type": "string" } }
        }
    });
    let answer = brain.generate_structured(&prompt, &schema)?;
    let summary = answer
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let insights = answer.get("insights").map(string_list).unwrap_or_default();
    if summary.is_empty() || insights.is_empty() {
        return Ok(None);
    }
    Ok(Some((summary, insights)))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_markdown(record: &EvidenceRecord) -> String {
    let date = record.created_at.format("%Y-%m-%d");
    let title = if record.user_provided {
        record.topic.clone()
    } else {
        format!("Research: {}", record.topic)
    };

    let mut out = format!("# {}: {title}\n\n", record.id);
    let _ = writeln!(out, "**Harvested:** {date}");
    let _ = writeln!(out, "**Curator:** {}", record.curator);
    let _ = writeln!(out, "**Status:** Curated");
    if record.user_provided {
        let _ = writeln!(out, "**Source:** User-Provided");
    }
    if record.user_priority {
        out.push_str(
            "\n> **Note:** This evidence has been marked by the user as having elevated \
             priority in decision-making.\n",
        );
    }

    out.push_str("\n## Source Information\n\n");
    let _ = writeln!(out, "- **Source Type:** {}", record.source_type);
    let _ = writeln!(out, "- **Source URL:** {}", record.source_url);
    let _ = writeln!(out, "- **Source Date:** {date}");

    let _ = write!(out, "\n## Summary\n\n{}\n", record.summary);

    out.push_str("\n## Key Insights\n\n");
    if record.key_insights.is_empty() {
        out.push_str("1. Research findings documented for traceability.\n");
    }
    for (i, insight) in record.key_insights.iter().enumerate() {
        let _ = writeln!(out, "{}. {insight}", i + 1);
    }

    if !record.sources.is_empty() {
        out.push_str("\n### Additional Sources\n\n");
        for source in &record.sources {
            let kind = match source.kind {
                SourceKind::Url => "URL",
                SourceKind::Citation => "Citation",
            };
            let _ = writeln!(out, "- {kind}: {}", source.reference);
        }
    }
    if let Some(m) = &record.methodology {
        let _ = write!(out, "\n### Research Methodology\n\n{m}\n");
    }
    if let Some(c) = &record.conclusions {
        let _ = write!(out, "\n### Conclusions\n\n{c}\n");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
