use super::Project;
use crate::output::print_json;
use clap::Args;
use rjw_core::checklist::PhaseFacts;
use rjw_core::types::RiskLevel;
use std::path::Path;

/// What can be shown for the phase being approved.
#[derive(Args)]
pub struct FactArgs {
    /// Evidence harvested for this phase
    #[arg(long = "evidence-id", value_delimiter = ',')]
    evidence_ids: Vec<String>,
    /// Evidence cited by the artifact under approval
    #[arg(long = "evidence-ref", value_delimiter = ',')]
    evidence_refs: Vec<String>,
    #[arg(long = "option")]
    options: Vec<String>,
    #[arg(long = "requirement")]
    requirements: Vec<String>,
    #[arg(long = "test-file")]
    test_files: Vec<String>,
    #[arg(long)]
    tests_passing: bool,
}

impl From<FactArgs> for PhaseFacts {
    fn from(a: FactArgs) -> Self {
        PhaseFacts {
            evidence_ids: a.evidence_ids,
            evidence_refs: a.evidence_refs,
            options: a.options,
            requirements: a.requirements,
            test_files: a.test_files,
            tests_passing: a.tests_passing,
        }
    }
}

pub fn run(
    root: &Path,
    session: &str,
    action: &str,
    phase: &str,
    risk: &str,
    facts: FactArgs,
    json: bool,
) -> anyhow::Result<()> {
    let risk: RiskLevel = risk.parse()?;
    let mut project = Project::open(root, session)?;
    let record = project
        .session
        .governance
        .request_approval(action, phase, &facts.into(), risk)?;
    project.save()?;

    if json {
        return print_json(&record);
    }
    let verdict = if record.approved { "APPROVED" } else { "NOT APPROVED" };
    println!("{verdict}: {action}");
    println!("  mode:      {}", record.mode);
    println!("  checklist: {}", if record.checklist_passed { "passed" } else { "failed" });
    println!("  reason:    {}", record.reason);
    Ok(())
}
