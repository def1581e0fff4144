use super::{parse_toggle, Project};
use crate::output::{print_json, print_table};
use clap::Subcommand;
use rjw_core::governance::{ChangeFacts, RiskClassifier};
use rjw_core::types::{Phase, TrustLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum GovernanceSubcommand {
    /// Trust level, YOLO mode and checklist results
    Status,

    /// Approval and setting-change log
    History {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Set the trust level
    Trust { level: String },

    /// Turn YOLO mode on or off
    Yolo { state: String },

    /// Show a phase checklist and its last result
    Checklist { phase: String },

    /// Suggest an approval pathway for a change
    Classify {
        #[arg(long)]
        prototype: bool,
    },
}

pub fn run(root: &Path, session: &str, subcmd: GovernanceSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    let gov = &mut project.session.governance;
    match subcmd {
        GovernanceSubcommand::Status => {
            let status = gov.status();
            if json {
                return print_json(&status);
            }
            println!("Trust level: {}", status.trust_level);
            println!("YOLO mode:   {}", if status.yolo_mode { "on" } else { "off" });
            println!("Log entries: {}", status.approval_count);
            for phase in Phase::all() {
                println!("  {:<16} {}", phase.as_str(), gov.checklist().status(*phase));
            }
            Ok(())
        }
        GovernanceSubcommand::History { limit } => {
            let entries = gov.approval_history(limit);
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No governance activity yet.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| vec![e.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(), e.summary()])
                .collect();
            print_table(&["TIME", "ENTRY"], &rows);
            Ok(())
        }
        GovernanceSubcommand::Trust { level } => {
            let level: TrustLevel = level.parse()?;
            gov.set_trust_level(level);
            project.save()?;
            println!("Trust level set to {level}.");
            Ok(())
        }
        GovernanceSubcommand::Yolo { state } => {
            let enabled = parse_toggle(&state)?;
            gov.set_yolo_mode(enabled);
            project.save()?;
            println!("YOLO mode {}.", if enabled { "on" } else { "off" });
            Ok(())
        }
        GovernanceSubcommand::Checklist { phase } => {
            let items = gov.checklist().checklist(&phase)?;
            let parsed: Phase = phase.parse()?;
            let status = gov.checklist().status(parsed);
            if json {
                return print_json(&serde_json::json!({
                    "phase": parsed,
                    "status": status,
                    "items": items,
                }));
            }
            println!("{} checklist ({status}):", parsed.as_str());
            for item in items {
                let marker = if item.required { "required" } else { "optional" };
                println!("  - {} [{marker}]", item.item);
            }
            Ok(())
        }
        GovernanceSubcommand::Classify { prototype } => {
            let pathway = RiskClassifier::classify(ChangeFacts {
                is_prototype: prototype,
                yolo_mode: gov.yolo_mode(),
            });
            let needs = pathway.minimum_trust();
            if json {
                return print_json(&serde_json::json!({ "pathway": pathway, "minimum_trust": needs }));
            }
            println!("{} (needs {needs})", pathway.as_str());
            Ok(())
        }
    }
}
