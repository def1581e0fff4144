use super::{text_or_file, Project};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use rjw_core::brain::extract_research_topics;
use rjw_core::evidence::{EvidenceRecord, HarvestRequest};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum EvidenceSubcommand {
    /// Record research on a topic
    Harvest {
        topic: String,
        /// Where the research came from
        #[arg(long)]
        source_url: Option<String>,
        /// Findings to record instead of placeholder findings
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long, default_value = "Research")]
        source_type: String,
        #[arg(long, default_value = "ResearchAgent")]
        curator: String,
    },

    /// Register research written by the user (markdown)
    AddUser {
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Weight this research above harvested evidence
        #[arg(long)]
        priority: bool,
        #[arg(long, default_value = "User")]
        curator: String,
    },

    /// List evidence, optionally filtered by topic
    List {
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show one evidence record, by id or document path
    Show { id: String },

    /// Suggest research topics for a request
    Topics { request: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, session: &str, subcmd: EvidenceSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        EvidenceSubcommand::Harvest {
            topic,
            source_url,
            content_file,
            source_type,
            curator,
        } => {
            let raw_content = content_file
                .map(|p| {
                    std::fs::read_to_string(&p)
                        .with_context(|| format!("failed to read {}", p.display()))
                })
                .transpose()?;
            let request = HarvestRequest {
                topic,
                source_type,
                source_url,
                raw_content,
                curator,
            };
            let mut project = Project::open(root, session)?;
            let record = project
                .session
                .harvest_evidence(&mut project.store, request, None)
                .context("failed to harvest evidence")?;
            project.save()?;
            report_created(&record, json)
        }
        EvidenceSubcommand::AddUser {
            text,
            file,
            priority,
            curator,
        } => {
            let raw = text_or_file(text, file, "text")?;
            let mut project = Project::open(root, session)?;
            let record = project
                .session
                .add_user_research(&mut project.store, &raw, priority, &curator)
                .context("failed to add user research")?;
            project.save()?;
            report_created(&record, json)
        }
        EvidenceSubcommand::List { topic } => list(root, session, topic.as_deref(), json),
        EvidenceSubcommand::Show { id } => show(root, session, &id, json),
        EvidenceSubcommand::Topics { request } => {
            let topics = extract_research_topics(&request, None)?;
            if json {
                print_json(&topics)
            } else {
                for t in &topics {
                    println!("{t}");
                }
                Ok(())
            }
        }
    }
}

fn report_created(record: &EvidenceRecord, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(record);
    }
    println!("Created {}: {}", record.id, record.topic);
    println!("  document: {}", record.path);
    Ok(())
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(root: &Path, session: &str, topic: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    let registry = &project.session.registry;
    let records: Vec<&EvidenceRecord> = registry
        .list(topic)
        .into_iter()
        .filter_map(|id| registry.get(id))
        .collect();

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No evidence yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.topic.clone(),
                r.source_type.clone(),
                if r.user_priority { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "TOPIC", "SOURCE", "PRIORITY"], &rows);
    Ok(())
}

fn show(root: &Path, session: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    let Some(record) = project.session.registry.find(id) else {
        anyhow::bail!("evidence '{id}' not found");
    };
    if json {
        return print_json(record);
    }
    println!("{}: {}", record.id, record.topic);
    println!("Source:  {} ({})", record.source_url, record.source_type);
    println!("Curator: {}", record.curator);
    println!("\n{}", record.summary);
    if !record.key_insights.is_empty() {
        println!("\nKey insights:");
        for insight in &record.key_insights {
            println!("  - {insight}");
        }
    }
    Ok(())
}
