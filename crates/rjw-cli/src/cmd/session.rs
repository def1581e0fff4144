use super::Project;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use rjw_core::session::Session;
use std::path::Path;

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// List saved sessions
    List,

    /// Summarize the current session
    Show,

    /// Print a fresh session id
    New,
}

pub fn run(root: &Path, session: &str, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SessionSubcommand::List => list(root, json),
        SessionSubcommand::Show => show(root, session, json),
        SessionSubcommand::New => {
            let id = Session::generate_id();
            if json {
                print_json(&serde_json::json!({ "id": id }))
            } else {
                println!("{id}");
                Ok(())
            }
        }
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ids = Session::list(root).context("failed to list sessions")?;
    if json {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = ids
        .iter()
        .map(|id| {
            let updated = Session::load(root, id)
                .map(|s| s.updated_at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "unreadable".to_string());
            vec![id.clone(), updated]
        })
        .collect();
    print_table(&["SESSION", "UPDATED"], &rows);
    Ok(())
}

fn show(root: &Path, session: &str, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    let s = &project.session;
    let summary = s.ledger.summary(&s.registry, &s.guard);
    let governance = s.governance.status();

    if json {
        return print_json(&serde_json::json!({
            "id": s.id,
            "created_at": s.created_at,
            "updated_at": s.updated_at,
            "summary": summary,
            "governance": governance,
            "strict_mode": s.guard.strict_mode(),
            "contexts": s.curator.context_ids(),
        }));
    }

    println!("Session:     {}", s.id);
    println!("Created:     {}", s.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Artifacts:   {} evidence, {} decisions, {} specs, {} tests",
        summary.evidence, summary.decisions, summary.specs, summary.tests
    );
    println!(
        "Governance:  trust {}, yolo {}, {} log entries",
        governance.trust_level,
        if governance.yolo_mode { "on" } else { "off" },
        governance.approval_count
    );
    println!(
        "Guard:       strict mode {}",
        if s.guard.strict_mode() { "on" } else { "off" }
    );
    let contexts = s.curator.context_ids();
    if !contexts.is_empty() {
        println!("Contexts:    {}", contexts.join(", "));
    }
    Ok(())
}
