use super::Project;
use crate::output::{join_or_dash, print_json, print_table};
use clap::Subcommand;
use rjw_core::workflow::{NewSpec, SpecRecord};
use std::path::Path;

#[derive(Subcommand)]
pub enum SpecSubcommand {
    /// Create a spec citing evidence and decisions
    Create {
        #[arg(long)]
        title: String,
        #[arg(long = "evidence", value_delimiter = ',')]
        evidence: Vec<String>,
        #[arg(long = "decision", value_delimiter = ',')]
        decisions: Vec<String>,
        #[arg(long = "requirement")]
        requirements: Vec<String>,
        /// Stated directly by the user; no evidence needed
        #[arg(long)]
        user_requirement: bool,
    },

    /// List specs
    List,
}

pub fn run(root: &Path, session: &str, subcmd: SpecSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    match subcmd {
        SpecSubcommand::Create {
            title,
            evidence,
            decisions,
            requirements,
            user_requirement,
        } => {
            let s = &mut project.session;
            let result = s.ledger.create_spec(
                &s.registry,
                &mut s.guard,
                &mut project.store,
                NewSpec {
                    title,
                    evidence_refs: evidence,
                    decision_refs: decisions,
                    requirements,
                    user_requirement,
                },
            );
            // a rejected registration is still recorded in the operation log
            project.save()?;
            let record = result?;
            if json {
                print_json(&record)
            } else {
                println!("Created {}: {}", record.id, record.title);
                Ok(())
            }
        }
        SpecSubcommand::List => {
            let specs: Vec<&SpecRecord> = project.session.ledger.specs().collect();
            if json {
                return print_json(&specs);
            }
            let rows: Vec<Vec<String>> = specs
                .iter()
                .map(|s| {
                    vec![
                        s.id.clone(),
                        s.title.clone(),
                        join_or_dash(&s.evidence_refs),
                        join_or_dash(&s.decision_refs),
                    ]
                })
                .collect();
            print_table(&["ID", "TITLE", "EVIDENCE", "DECISIONS"], &rows);
            Ok(())
        }
    }
}
