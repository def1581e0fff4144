use super::Project;
use crate::output::{join_or_dash, print_json, print_table};
use clap::Subcommand;
use rjw_core::workflow::{DecisionRecord, NewDecision};
use std::path::Path;

#[derive(Subcommand)]
pub enum DecisionSubcommand {
    /// Record a decision citing evidence
    Create {
        #[arg(long)]
        title: String,
        /// Evidence ids (repeat or comma-separate)
        #[arg(long = "evidence", value_delimiter = ',')]
        evidence: Vec<String>,
        /// Options that were considered
        #[arg(long = "option")]
        options: Vec<String>,
        /// The option taken
        #[arg(long)]
        chosen: Option<String>,
        #[arg(long, default_value = "")]
        rationale: String,
    },

    /// List recorded decisions
    List,
}

pub fn run(root: &Path, session: &str, subcmd: DecisionSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    match subcmd {
        DecisionSubcommand::Create {
            title,
            evidence,
            options,
            chosen,
            rationale,
        } => {
            let s = &mut project.session;
            let record = s.ledger.create_decision(
                &s.registry,
                &mut project.store,
                NewDecision {
                    title,
                    evidence_refs: evidence,
                    options,
                    chosen,
                    rationale,
                },
            )?;
            project.save()?;
            if json {
                print_json(&record)
            } else {
                println!("Created {}: {}", record.id, record.title);
                Ok(())
            }
        }
        DecisionSubcommand::List => {
            let decisions: Vec<&DecisionRecord> = project.session.ledger.decisions().collect();
            if json {
                return print_json(&decisions);
            }
            let rows: Vec<Vec<String>> = decisions
                .iter()
                .map(|d| {
                    vec![
                        d.id.clone(),
                        d.title.clone(),
                        join_or_dash(&d.evidence_refs),
                        d.chosen.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            print_table(&["ID", "TITLE", "EVIDENCE", "CHOSEN"], &rows);
            Ok(())
        }
    }
}
