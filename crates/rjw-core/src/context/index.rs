use crate::error::RjwError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ContextItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Code,
    Decision,
    Spec,
    Assumption,
    Dependency,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemType::Code => "code",
            ItemType::Decision => "decision",
            ItemType::Spec => "spec",
            ItemType::Assumption => "assumption",
            ItemType::Dependency => "dependency",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemType {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(ItemType::Code),
            "decision" => Ok(ItemType::Decision),
            "spec" => Ok(ItemType::Spec),
            "assumption" => Ok(ItemType::Assumption),
            "dependency" => Ok(ItemType::Dependency),
            _ => Err(RjwError::InvalidInput(format!("unknown context item type '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub item_id: String,
    pub item_type: ItemType,
    pub content: String,
    /// Always within `[0.0, 1.0]`.
    pub relevance_score: f64,
    pub last_evaluated: DateTime<Utc>,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Change history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    File,
    Decision,
    Spec,
    Api,
    Dependency,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::File => "file",
            ChangeType::Decision => "decision",
            ChangeType::Spec => "spec",
            ChangeType::Api => "api",
            ChangeType::Dependency => "dependency",
        };
        f.write_str(s)
    }
}

impl FromStr for ChangeType {
    type Err = RjwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ChangeType::File),
            "decision" => Ok(ChangeType::Decision),
            "spec" => Ok(ChangeType::Spec),
            "api" => Ok(ChangeType::Api),
            "dependency" => Ok(ChangeType::Dependency),
            _ => Err(RjwError::InvalidInput(format!(
                "unknown change type '{s}': must be file, decision, spec, api, or dependency"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub change_id: String,
    pub change_type: ChangeType,
    pub description: String,
    #[serde(default)]
    pub affected_items: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Index sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskScope {
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub out_of_scope: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectedAreas {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalContext {
    #[serde(default)]
    pub decision_refs: Vec<String>,
    #[serde(default)]
    pub spec_refs: Vec<String>,
    #[serde(default)]
    pub conventions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assumptions {
    #[serde(default)]
    pub confirmed: Vec<String>,
    #[serde(default)]
    pub provisional: Vec<String>,
}

impl Assumptions {
    /// The list for a bucket name, if it is one of `confirmed`/`provisional`.
    pub fn bucket_mut(&mut self, bucket: &str) -> Option<&mut Vec<String>> {
        match bucket {
            "confirmed" => Some(&mut self.confirmed),
            "provisional" => Some(&mut self.provisional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDependencies {
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub downstream: Vec<String>,
    #[serde(default)]
    pub parallel: Vec<String>,
}

impl TaskDependencies {
    pub fn bucket_mut(&mut self, bucket: &str) -> Option<&mut Vec<String>> {
        match bucket {
            "upstream" => Some(&mut self.upstream),
            "downstream" => Some(&mut self.downstream),
            "parallel" => Some(&mut self.parallel),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ContextIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextIndex {
    pub ctx_id: String,
    pub task_id: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub scope: TaskScope,
    #[serde(default)]
    pub affected: AffectedAreas,
    #[serde(default)]
    pub technical: TechnicalContext,
    #[serde(default)]
    pub assumptions: Assumptions,
    #[serde(default)]
    pub dependencies: TaskDependencies,
    #[serde(default)]
    pub change_history: Vec<ChangeRecord>,
    #[serde(default)]
    pub items: Vec<ContextItem>,
    #[serde(default)]
    next_item_seq: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl ContextIndex {
    pub fn new(ctx_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            ctx_id: ctx_id.into(),
            task_id: task_id.into(),
            focus_areas: Vec::new(),
            scope: TaskScope::default(),
            affected: AffectedAreas::default(),
            technical: TechnicalContext::default(),
            assumptions: Assumptions::default(),
            dependencies: TaskDependencies::default(),
            change_history: Vec::new(),
            items: Vec::new(),
            next_item_seq: 0,
            created_at: Utc::now(),
            last_evaluated: None,
        }
    }

    /// Append an item and return its new id (`ITEM-0001`, ...). Ids are
    /// never reused, even after the item is evicted.
    pub fn push_item(&mut self, item_type: ItemType, content: String, score: f64, source: String) -> String {
        self.next_item_seq += 1;
        let item_id = format!("ITEM-{:04}", self.next_item_seq);
        self.items.push(ContextItem {
            item_id: item_id.clone(),
            item_type,
            content,
            relevance_score: score,
            last_evaluated: Utc::now(),
            source,
        });
        item_id
    }

    pub fn item(&self, item_id: &str) -> Option<&ContextItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut ContextItem> {
        self.items.iter_mut().find(|i| i.item_id == item_id)
    }

    /// The reference list a change of `change_type` propagates into.
    pub fn refs_for(&self, change_type: ChangeType) -> Option<&[String]> {
        match change_type {
            ChangeType::Decision => Some(&self.technical.decision_refs),
            ChangeType::Spec => Some(&self.technical.spec_refs),
            ChangeType::File => Some(&self.affected.files),
            ChangeType::Api | ChangeType::Dependency => None,
        }
    }

    pub fn refs_for_mut(&mut self, change_type: ChangeType) -> Option<&mut Vec<String>> {
        match change_type {
            ChangeType::Decision => Some(&mut self.technical.decision_refs),
            ChangeType::Spec => Some(&mut self.technical.spec_refs),
            ChangeType::File => Some(&mut self.affected.files),
            ChangeType::Api | ChangeType::Dependency => None,
        }
    }
}
