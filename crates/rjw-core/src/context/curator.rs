//! ContextCurator: owns the code graph and every context index of a session.
//!
//! Lookups here are forgiving. Unknown index or item ids and out-of-range
//! scores yield `false`/`None`, never an error.

use super::graph::{CodeDiscovery, CodeElement, DependencyGraph, ElementKind, ResolverKind};
use super::index::{ChangeRecord, ChangeType, ContextIndex, ItemType};
use super::scan::{analyze_source, Language};
use crate::error::{Result, RjwError};
use crate::ids::{next_artifact_id, ArtifactKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Items scoring below this are evicted by [`ContextCurator::evaluate_context_on_turn`].
pub const RETENTION_THRESHOLD: f64 = 0.2;

pub const SCORE_EXACT: f64 = 1.0;
pub const SCORE_SUBSTRING: f64 = 0.8;
pub const SCORE_DEPENDENCY: f64 = 0.6;
pub const SCORE_RELATED: f64 = 0.4;

/// Initial relevance of `element` for `focus`: exact name (case-insensitive),
/// then name substring, then declared dependency, then plain relation.
pub fn initial_relevance(focus: &str, element: &CodeElement) -> f64 {
    let name = element.name.to_lowercase();
    let needle = focus.to_lowercase();
    if name == needle {
        SCORE_EXACT
    } else if name.contains(&needle) {
        SCORE_SUBSTRING
    } else if element.dependencies.contains(focus) {
        SCORE_DEPENDENCY
    } else {
        SCORE_RELATED
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub task_id: String,
    pub focus_areas: Vec<String>,
    pub objectives: Vec<String>,
    pub decision_refs: Vec<String>,
    pub spec_refs: Vec<String>,
}

impl BuildRequest {
    pub fn new(task_id: impl Into<String>, focus_areas: Vec<String>) -> Self {
        Self {
            task_id: task_id.into(),
            focus_areas,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub evaluated: usize,
    pub removed: usize,
    pub kept: usize,
    pub removal_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStructure {
    pub files_analyzed: usize,
    pub classes: usize,
    pub functions: usize,
    pub total_elements: usize,
}

fn default_max_depth() -> usize {
    2
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

// ---------------------------------------------------------------------------
// ContextCurator
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ContextCurator {
    #[serde(default)]
    graph: DependencyGraph,
    #[serde(default)]
    indexes: BTreeMap<String, ContextIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    living_docs: Option<Value>,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
    #[serde(default)]
    resolver: ResolverKind,
}

impl Default for ContextCurator {
    fn default() -> Self {
        Self::new(default_max_depth())
    }
}

impl ContextCurator {
    pub fn new(max_depth: usize) -> Self {
        Self {
            graph: DependencyGraph::new(),
            indexes: BTreeMap::new(),
            living_docs: None,
            max_depth,
            resolver: ResolverKind::default(),
        }
    }

    /// Swap the edge heuristic used by later [`ingest`](Self::ingest) calls.
    /// The choice is kept in the session snapshot.
    pub fn with_resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    // -----------------------------------------------------------------------
    // Code graph
    // -----------------------------------------------------------------------

    /// Add scanned elements to the graph and link their dependencies against
    /// every node present afterwards. Returns the number of elements added.
    pub fn ingest(&mut self, elements: Vec<CodeElement>) -> usize {
        let ids: Vec<String> = elements.into_iter().map(|e| self.graph.add_node(e)).collect();
        let edges: usize = ids
            .iter()
            .map(|id| self.graph.link_dependencies(id, &self.resolver))
            .sum();
        tracing::debug!(elements = ids.len(), edges, "code graph updated");
        ids.len()
    }

    pub fn find_related_code(&self, target: &str, depth: usize) -> Vec<CodeElement> {
        CodeDiscovery::find_related(&self.graph, target, depth)
    }

    /// Signature plus the first docstring line; never the body.
    pub fn extract_signature(&self, element: &CodeElement) -> String {
        let Some(doc) = element
            .docstring
            .as_deref()
            .and_then(|d| d.lines().next())
            .map(str::trim)
            .filter(|d| !d.is_empty())
        else {
            return element.signature.clone();
        };
        if element.location.ends_with(".py") {
            format!("{}\n    \"\"\"{doc}\"\"\"", element.signature)
        } else {
            format!("/// {doc}\n{}", element.signature)
        }
    }

    /// Signatures of the named elements defined in `path`, keyed by name.
    /// Names not defined in the file are left out.
    pub fn slice_code(&self, path: &Path, names: &[String]) -> Result<BTreeMap<String, String>> {
        let lang = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension)
            .ok_or_else(|| {
                RjwError::InvalidInput(format!("cannot slice {}: unsupported file type", path.display()))
            })?;
        let source = std::fs::read_to_string(path)?;
        let location = path.to_string_lossy();
        Ok(analyze_source(&source, &location, lang)
            .iter()
            .filter(|e| names.contains(&e.name))
            .map(|e| (e.name.clone(), self.extract_signature(e)))
            .collect())
    }

    pub fn project_structure(&self) -> ProjectStructure {
        let files: BTreeSet<&str> = self.graph.elements().map(|e| e.location.as_str()).collect();
        ProjectStructure {
            files_analyzed: files.len(),
            classes: self.graph.elements().filter(|e| e.kind == ElementKind::Class).count(),
            functions: self.graph.elements().filter(|e| e.kind == ElementKind::Function).count(),
            total_elements: self.graph.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Index construction
    // -----------------------------------------------------------------------

    /// Build a new index for `request.task_id` and return its `CTX-NNNN` id.
    ///
    /// Each element related to a focus area becomes a code item scored by
    /// [`initial_relevance`]; an element reached from several focus areas
    /// keeps its best score.
    pub fn build_context_index(&mut self, request: BuildRequest) -> String {
        let ctx_id = next_artifact_id(ArtifactKind::Context, self.indexes.keys().map(String::as_str));

        let mut scored: BTreeMap<String, (f64, CodeElement)> = BTreeMap::new();
        for focus in &request.focus_areas {
            for element in CodeDiscovery::find_related(&self.graph, focus, self.max_depth) {
                let score = initial_relevance(focus, &element);
                scored
                    .entry(element.node_id())
                    .and_modify(|(best, _)| *best = best.max(score))
                    .or_insert((score, element));
            }
        }

        let mut ranked: Vec<(String, f64, CodeElement)> =
            scored.into_iter().map(|(id, (s, e))| (id, s, e)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut index = ContextIndex::new(ctx_id.clone(), request.task_id);
        let mut files = BTreeSet::new();
        let mut modules = BTreeSet::new();
        for (node_id, score, element) in ranked {
            files.insert(element.location.clone());
            let module = element
                .location
                .rsplit_once('/')
                .map_or(".", |(dir, _)| dir)
                .to_string();
            modules.insert(module);
            index.push_item(ItemType::Code, self.extract_signature(&element), score, node_id);
        }
        index.affected.files = files.into_iter().collect();
        index.affected.modules = modules.into_iter().collect();
        index.scope.objectives = request.objectives;
        for r in &request.decision_refs {
            push_unique(&mut index.technical.decision_refs, r);
        }
        for r in &request.spec_refs {
            push_unique(&mut index.technical.spec_refs, r);
        }
        index.focus_areas = request.focus_areas;

        tracing::info!(ctx = %ctx_id, items = index.items.len(), "context index built");
        self.indexes.insert(ctx_id.clone(), index);
        ctx_id
    }

    pub fn get_context(&self, ctx_id: &str) -> Option<&ContextIndex> {
        self.indexes.get(ctx_id)
    }

    pub fn context_ids(&self) -> Vec<&str> {
        self.indexes.keys().map(String::as_str).collect()
    }

    // -----------------------------------------------------------------------
    // Evaluation cycle
    // -----------------------------------------------------------------------

    /// Evaluate and prune: every item below [`RETENTION_THRESHOLD`] is removed
    /// for good. Loading replacements is up to the caller
    /// ([`add_context_item`](Self::add_context_item)).
    pub fn evaluate_context_on_turn(&mut self, ctx_id: &str) -> Option<EvaluationReport> {
        let index = self.indexes.get_mut(ctx_id)?;
        let now = Utc::now();
        let evaluated = index.items.len();
        let mut removal_reasons = Vec::new();

        index.items.retain_mut(|item| {
            if item.relevance_score < RETENTION_THRESHOLD {
                tracing::debug!(ctx = ctx_id, item = %item.item_id, score = item.relevance_score, "context item evicted");
                removal_reasons.push(format!(
                    "{} ({}) removed: relevance {:.2} below threshold {RETENTION_THRESHOLD:.2}",
                    item.item_id, item.source, item.relevance_score
                ));
                false
            } else {
                item.last_evaluated = now;
                true
            }
        });
        index.last_evaluated = Some(now);

        let kept = index.items.len();
        Some(EvaluationReport {
            evaluated,
            removed: evaluated - kept,
            kept,
            removal_reasons,
        })
    }

    pub fn score_context_item(&mut self, ctx_id: &str, item_id: &str, score: f64) -> bool {
        if !(0.0..=1.0).contains(&score) {
            return false;
        }
        let Some(item) = self
            .indexes
            .get_mut(ctx_id)
            .and_then(|idx| idx.item_mut(item_id))
        else {
            return false;
        };
        item.relevance_score = score;
        item.last_evaluated = Utc::now();
        true
    }

    /// Load a new item into an index. `None` when the index is unknown or the
    /// score is outside `[0.0, 1.0]`.
    pub fn add_context_item(
        &mut self,
        ctx_id: &str,
        item_type: ItemType,
        content: &str,
        score: f64,
        source: &str,
    ) -> Option<String> {
        if !(0.0..=1.0).contains(&score) {
            return None;
        }
        let index = self.indexes.get_mut(ctx_id)?;
        Some(index.push_item(item_type, content.to_string(), score, source.to_string()))
    }

    // -----------------------------------------------------------------------
    // Change tracking
    // -----------------------------------------------------------------------

    /// Record a change against `ctx_id`. Decision, spec and file changes also
    /// add the affected ids to the matching reference list, skipping ids
    /// already present.
    pub fn update_context_on_change(
        &mut self,
        ctx_id: &str,
        change_type: ChangeType,
        description: &str,
        affected_items: &[String],
    ) -> bool {
        let Some(index) = self.indexes.get_mut(ctx_id) else {
            return false;
        };
        let now = Utc::now();
        let prefix = format!("CHG-{}-", now.format("%Y%m%d"));
        let seq = index
            .change_history
            .iter()
            .filter(|c| c.change_id.starts_with(&prefix))
            .count()
            + 1;

        if let Some(refs) = index.refs_for_mut(change_type) {
            for id in affected_items {
                push_unique(refs, id);
            }
        }
        index.change_history.push(ChangeRecord {
            change_id: format!("{prefix}{seq:03}"),
            change_type,
            description: description.to_string(),
            affected_items: affected_items.to_vec(),
            timestamp: now,
        });
        true
    }

    /// Record `changed_id` in every index that already references it and
    /// return those index ids. Api and dependency changes reference nothing.
    pub fn propagate_update(&mut self, change_type: ChangeType, changed_id: &str) -> Vec<String> {
        let targets: Vec<String> = self
            .indexes
            .values()
            .filter(|idx| {
                idx.refs_for(change_type)
                    .is_some_and(|refs| refs.iter().any(|r| r == changed_id))
            })
            .map(|idx| idx.ctx_id.clone())
            .collect();

        let description = format!("Propagated {change_type} change: {changed_id}");
        let affected = [changed_id.to_string()];
        for ctx_id in &targets {
            self.update_context_on_change(ctx_id, change_type, &description, &affected);
        }
        tracing::info!(change = %change_type, id = changed_id, reached = targets.len(), "update propagated");
        targets
    }

    pub fn add_assumption(&mut self, ctx_id: &str, assumption: &str, bucket: &str) -> bool {
        let Some(list) = self
            .indexes
            .get_mut(ctx_id)
            .and_then(|idx| idx.assumptions.bucket_mut(bucket))
        else {
            return false;
        };
        list.push(assumption.to_string());
        true
    }

    pub fn add_dependency(&mut self, ctx_id: &str, task_id: &str, bucket: &str) -> bool {
        let Some(list) = self
            .indexes
            .get_mut(ctx_id)
            .and_then(|idx| idx.dependencies.bucket_mut(bucket))
        else {
            return false;
        };
        list.push(task_id.to_string());
        true
    }

    // -----------------------------------------------------------------------
    // Living documentation
    // -----------------------------------------------------------------------

    /// Replace the living documentation wholesale.
    pub fn load_living_documentation(&mut self, data: Value) {
        self.living_docs = Some(data);
    }

    pub fn living_docs_context(&self, category: &str) -> Option<&Value> {
        self.living_docs.as_ref()?.get(category)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::graph::fixtures::element;
    use serde_json::json;

    fn curator() -> ContextCurator {
        let mut c = ContextCurator::new(2);
        c.ingest(vec![
            element("auth/session.py", "SessionStore", ElementKind::Class, &[]),
            element("auth/login.py", "login", ElementKind::Function, &["SessionStore"]),
            element("auth/login.py", "validate_login", ElementKind::Function, &[]),
            element("billing/invoice.py", "Invoice", ElementKind::Class, &[]),
        ]);
        c
    }

    fn empty_index(c: &mut ContextCurator, task: &str) -> String {
        c.build_context_index(BuildRequest::new(task, Vec::new()))
    }

    #[test]
    fn slice_returns_signatures_without_bodies() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.py");
        std::fs::write(
            &path,
            "def refresh(token, ttl):\n    \"\"\"Extend a session.\"\"\"\n    return store.touch(token, ttl)\n\n\ndef revoke(token):\n    store.drop(token)\n",
        )
        .unwrap();

        let sliced = ContextCurator::default()
            .slice_code(&path, &["refresh".to_string(), "missing".to_string()])
            .unwrap();
        assert_eq!(sliced.len(), 1);
        assert_eq!(
            sliced["refresh"],
            "def refresh(token, ttl)\n    \"\"\"Extend a session.\"\"\""
        );
        assert!(!sliced["refresh"].contains("store.touch"));
    }

    #[test]
    fn slice_rejects_unknown_file_types() {
        let err = ContextCurator::default()
            .slice_code(Path::new("notes.txt"), &["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, RjwError::InvalidInput(_)));
    }

    #[test]
    fn relevance_tiers() {
        let e = element("a.py", "LoginForm", ElementKind::Class, &["login"]);
        assert_eq!(initial_relevance("loginform", &e), SCORE_EXACT);
        assert_eq!(initial_relevance("Form", &e), SCORE_SUBSTRING);
        assert_eq!(initial_relevance("login", &e), SCORE_SUBSTRING);
        let dep = element("b.py", "handler", ElementKind::Function, &["login"]);
        assert_eq!(initial_relevance("login", &dep), SCORE_DEPENDENCY);
        assert_eq!(initial_relevance("billing", &dep), SCORE_RELATED);
    }

    #[test]
    fn build_scores_and_collects_areas() {
        let mut c = curator();
        let ctx = c.build_context_index(BuildRequest {
            task_id: "task-1".to_string(),
            focus_areas: vec!["login".to_string()],
            objectives: vec!["harden login".to_string()],
            decision_refs: vec!["DEC-0001".to_string(), "DEC-0001".to_string()],
            spec_refs: vec!["SPEC-0001".to_string()],
        });
        assert_eq!(ctx, "CTX-0001");
        let idx = c.get_context(&ctx).unwrap();

        let score_of = |source: &str| {
            idx.items
                .iter()
                .find(|i| i.source == source)
                .map(|i| i.relevance_score)
        };
        assert_eq!(score_of("auth/login.py::login"), Some(SCORE_EXACT));
        assert_eq!(score_of("auth/login.py::validate_login"), Some(SCORE_SUBSTRING));
        // reached through login's dependency edge
        assert_eq!(score_of("auth/session.py::SessionStore"), Some(SCORE_RELATED));
        assert_eq!(score_of("billing/invoice.py::Invoice"), None);

        assert_eq!(idx.items[0].relevance_score, SCORE_EXACT);
        assert_eq!(idx.affected.files, vec!["auth/login.py", "auth/session.py"]);
        assert_eq!(idx.affected.modules, vec!["auth"]);
        assert_eq!(idx.technical.decision_refs, vec!["DEC-0001"]);
        assert_eq!(idx.scope.objectives, vec!["harden login"]);
    }

    #[test]
    fn overlapping_focus_areas_keep_best_score() {
        let mut c = curator();
        let ctx = c.build_context_index(BuildRequest::new(
            "t",
            vec!["validate".to_string(), "validate_login".to_string()],
        ));
        let idx = c.get_context(&ctx).unwrap();
        let hits: Vec<_> = idx
            .items
            .iter()
            .filter(|i| i.source == "auth/login.py::validate_login")
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].relevance_score, SCORE_EXACT);
    }

    #[test]
    fn context_ids_increment() {
        let mut c = ContextCurator::default();
        assert_eq!(empty_index(&mut c, "a"), "CTX-0001");
        assert_eq!(empty_index(&mut c, "b"), "CTX-0002");
        assert_eq!(c.context_ids(), vec!["CTX-0001", "CTX-0002"]);
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let mut c = ContextCurator::default();
        let ctx = empty_index(&mut c, "t");
        let item = c
            .add_context_item(&ctx, ItemType::Decision, "DEC-0001", 0.5, "DEC-0001")
            .unwrap();

        assert!(!c.score_context_item(&ctx, &item, -0.01));
        assert!(!c.score_context_item(&ctx, &item, 1.01));
        assert!(!c.score_context_item(&ctx, &item, f64::NAN));
        assert_eq!(c.get_context(&ctx).unwrap().items[0].relevance_score, 0.5);

        assert!(c.score_context_item(&ctx, &item, 0.0));
        assert!(c.score_context_item(&ctx, &item, 1.0));
        assert_eq!(c.get_context(&ctx).unwrap().items[0].relevance_score, 1.0);

        assert!(!c.score_context_item("CTX-0099", &item, 0.5));
        assert!(!c.score_context_item(&ctx, "ITEM-0099", 0.5));
    }

    #[test]
    fn evaluation_evicts_low_relevance() {
        let mut c = ContextCurator::default();
        let ctx = empty_index(&mut c, "t");
        c.add_context_item(&ctx, ItemType::Assumption, "stale", 0.1, "note")
            .unwrap();
        let keep = c
            .add_context_item(&ctx, ItemType::Spec, "SPEC-0001", 0.5, "SPEC-0001")
            .unwrap();

        let report = c.evaluate_context_on_turn(&ctx).unwrap();
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(report.kept, 1);
        assert_eq!(report.removal_reasons.len(), 1);

        let idx = c.get_context(&ctx).unwrap();
        assert_eq!(idx.items.len(), 1);
        assert_eq!(idx.items[0].item_id, keep);
        assert!(idx.last_evaluated.is_some());
        assert!(c.evaluate_context_on_turn("CTX-0042").is_none());
    }

    #[test]
    fn threshold_itself_is_kept() {
        let mut c = ContextCurator::default();
        let ctx = empty_index(&mut c, "t");
        c.add_context_item(&ctx, ItemType::Code, "x", RETENTION_THRESHOLD, "x")
            .unwrap();
        assert_eq!(c.evaluate_context_on_turn(&ctx).unwrap().kept, 1);
        assert!(c.add_context_item(&ctx, ItemType::Code, "y", 1.5, "y").is_none());
    }

    #[test]
    fn change_updates_refs_idempotently() {
        let mut c = ContextCurator::default();
        let ctx = empty_index(&mut c, "t");
        let dec = vec!["DEC-0002".to_string()];
        assert!(c.update_context_on_change(&ctx, ChangeType::Decision, "new decision", &dec));
        assert!(c.update_context_on_change(&ctx, ChangeType::Decision, "again", &dec));
        assert!(c.update_context_on_change(&ctx, ChangeType::Api, "route renamed", &["/v1/login".to_string()]));

        let idx = c.get_context(&ctx).unwrap();
        assert_eq!(idx.technical.decision_refs, vec!["DEC-0002"]);
        assert!(idx.affected.endpoints.is_empty());
        assert_eq!(idx.change_history.len(), 3);
        let ids: Vec<&str> = idx.change_history.iter().map(|h| h.change_id.as_str()).collect();
        assert!(ids[0].starts_with("CHG-") && ids[0].ends_with("-001"));
        assert!(ids[2].ends_with("-003"));
        assert!(!c.update_context_on_change("CTX-0404", ChangeType::File, "x", &[]));
    }

    #[test]
    fn propagation_reaches_only_referencing_indexes() {
        let mut c = ContextCurator::default();
        let referencing = c.build_context_index(BuildRequest {
            task_id: "a".to_string(),
            decision_refs: vec!["DEC-0001".to_string()],
            ..Default::default()
        });
        let other = empty_index(&mut c, "b");

        let reached = c.propagate_update(ChangeType::Decision, "DEC-0001");
        assert_eq!(reached, vec![referencing.clone()]);

        let idx = c.get_context(&referencing).unwrap();
        assert_eq!(idx.change_history.len(), 1);
        assert_eq!(idx.change_history[0].description, "Propagated decision change: DEC-0001");
        assert_eq!(idx.technical.decision_refs, vec!["DEC-0001"]);
        assert!(c.get_context(&other).unwrap().change_history.is_empty());

        assert!(c.propagate_update(ChangeType::Api, "DEC-0001").is_empty());
    }

    #[test]
    fn assumptions_and_dependencies_validate_buckets() {
        let mut c = ContextCurator::default();
        let ctx = empty_index(&mut c, "t");
        assert!(c.add_assumption(&ctx, "tokens expire hourly", "provisional"));
        assert!(!c.add_assumption(&ctx, "x", "maybe"));
        assert!(c.add_dependency(&ctx, "task-9", "upstream"));
        assert!(!c.add_dependency(&ctx, "task-9", "sideways"));
        assert!(!c.add_dependency("CTX-0404", "task-9", "upstream"));

        let idx = c.get_context(&ctx).unwrap();
        assert_eq!(idx.assumptions.provisional, vec!["tokens expire hourly"]);
        assert_eq!(idx.dependencies.upstream, vec!["task-9"]);
    }

    #[test]
    fn living_docs_are_replaced_not_merged() {
        let mut c = ContextCurator::default();
        assert!(c.living_docs_context("patterns").is_none());
        c.load_living_documentation(json!({ "patterns": ["repository"], "glossary": {} }));
        c.load_living_documentation(json!({ "patterns": ["service"] }));
        assert_eq!(c.living_docs_context("patterns"), Some(&json!(["service"])));
        assert!(c.living_docs_context("glossary").is_none());
    }

    #[test]
    fn signature_includes_first_doc_line() {
        let c = ContextCurator::default();
        let mut e = element("a.py", "f", ElementKind::Function, &[]);
        e.docstring = Some("Does things.\nMore detail.".to_string());
        assert_eq!(c.extract_signature(&e), "def f()\n    \"\"\"Does things.\"\"\"");

        let mut r = element("src/a.rs", "g", ElementKind::Function, &[]);
        r.signature = "pub fn g()".to_string();
        r.docstring = Some("Runs g.".to_string());
        assert_eq!(c.extract_signature(&r), "/// Runs g.\npub fn g()");
    }

    #[test]
    fn project_structure_counts() {
        let c = curator();
        let s = c.project_structure();
        assert_eq!(s.files_analyzed, 3);
        assert_eq!(s.classes, 2);
        assert_eq!(s.functions, 2);
        assert_eq!(s.total_elements, 4);
    }

    #[test]
    fn curator_survives_json_roundtrip() {
        let mut c = curator();
        let ctx = c.build_context_index(BuildRequest::new("t", vec!["login".to_string()]));
        let json = serde_json::to_string(&c).unwrap();
        let back: ContextCurator = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.get_context(&ctx).unwrap().items.len(),
            c.get_context(&ctx).unwrap().items.len()
        );
        assert_eq!(back.graph().len(), 4);
    }

    #[test]
    fn resolver_choice_survives_reload() {
        let c = ContextCurator::new(2).with_resolver(ResolverKind::ExactName);
        let json = serde_json::to_string(&c).unwrap();
        let mut back: ContextCurator = serde_json::from_str(&json).unwrap();
        back.ingest(vec![
            element("auth/token.py", "Token", ElementKind::Class, &[]),
            element("auth/token.py", "TokenStore", ElementKind::Class, &[]),
            element("api/handler.py", "handler", ElementKind::Function, &["Token"]),
        ]);
        let deps = back.graph().get_dependencies("api/handler.py::handler", 1);
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["auth/token.py::Token"]);
    }
}
