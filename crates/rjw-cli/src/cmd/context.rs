use super::Project;
use crate::output::{join_or_dash, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use rjw_core::context::scan::scan_project;
use rjw_core::context::{BuildRequest, ChangeType, ContextIndex, ItemType};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ContextSubcommand {
    /// Scan source files into the code graph
    Scan {
        /// Directory to scan (default: project root)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Build a context index for a task
    Build {
        #[arg(long)]
        task: String,
        #[arg(long = "focus", value_delimiter = ',')]
        focus: Vec<String>,
        #[arg(long = "objective")]
        objectives: Vec<String>,
        #[arg(long = "decision", value_delimiter = ',')]
        decisions: Vec<String>,
        #[arg(long = "spec", value_delimiter = ',')]
        specs: Vec<String>,
    },

    /// List context indexes
    List,

    /// Show a context index
    Show { ctx: String },

    /// Run an evaluation cycle, evicting low-relevance items
    Evaluate { ctx: String },

    /// Set the relevance score of an item (0.0 to 1.0)
    Score { ctx: String, item: String, score: f64 },

    /// Load a new item into an index
    Add {
        ctx: String,
        /// code, decision, spec, assumption, or dependency
        #[arg(long = "type")]
        item_type: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        source: String,
    },

    /// Record a change against an index
    Change {
        ctx: String,
        /// file, decision, spec, api, or dependency
        #[arg(long = "type")]
        change_type: String,
        #[arg(long)]
        description: String,
        #[arg(long = "affected", value_delimiter = ',')]
        affected: Vec<String>,
    },

    /// Push a change into every index that references it
    Propagate {
        #[arg(long = "type")]
        change_type: String,
        id: String,
    },

    /// Add an assumption (confirmed or provisional)
    Assume {
        ctx: String,
        text: String,
        #[arg(long, default_value = "provisional")]
        bucket: String,
    },

    /// Add a task dependency (upstream, downstream, or parallel)
    Depend {
        ctx: String,
        task: String,
        #[arg(long, default_value = "upstream")]
        bucket: String,
    },

    /// Find code related to a name or topic
    Related {
        target: String,
        #[arg(long, default_value = "2")]
        depth: usize,
    },

    /// Show signatures (no bodies) of named elements in one file
    Slice {
        file: PathBuf,
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },

    /// Load living documentation from a JSON file
    LoadDocs { file: PathBuf },

    /// Show one category of the living documentation
    Docs { category: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, session: &str, subcmd: ContextSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    match subcmd {
        ContextSubcommand::Scan { path } => scan(&mut project, path, json),
        ContextSubcommand::Build {
            task,
            focus,
            objectives,
            decisions,
            specs,
        } => {
            let ctx_id = project.session.curator.build_context_index(BuildRequest {
                task_id: task,
                focus_areas: focus,
                objectives,
                decision_refs: decisions,
                spec_refs: specs,
            });
            project.save()?;
            let index = project
                .session
                .curator
                .get_context(&ctx_id)
                .context("built index missing")?;
            if json {
                return print_json(index);
            }
            println!("Built {ctx_id} with {} items.", index.items.len());
            Ok(())
        }
        ContextSubcommand::List => {
            let curator = &project.session.curator;
            let indexes: Vec<&ContextIndex> = curator
                .context_ids()
                .into_iter()
                .filter_map(|id| curator.get_context(id))
                .collect();
            if json {
                return print_json(&indexes);
            }
            let rows: Vec<Vec<String>> = indexes
                .iter()
                .map(|i| {
                    vec![
                        i.ctx_id.clone(),
                        i.task_id.clone(),
                        i.items.len().to_string(),
                        join_or_dash(&i.focus_areas),
                    ]
                })
                .collect();
            print_table(&["CTX", "TASK", "ITEMS", "FOCUS"], &rows);
            Ok(())
        }
        ContextSubcommand::Show { ctx } => {
            let Some(index) = project.session.curator.get_context(&ctx) else {
                anyhow::bail!("context '{ctx}' not found");
            };
            if json {
                return print_json(index);
            }
            show(index);
            Ok(())
        }
        ContextSubcommand::Evaluate { ctx } => {
            let Some(report) = project.session.curator.evaluate_context_on_turn(&ctx) else {
                anyhow::bail!("context '{ctx}' not found");
            };
            project.save()?;
            if json {
                return print_json(&report);
            }
            println!(
                "Evaluated {}: kept {}, removed {}.",
                report.evaluated, report.kept, report.removed
            );
            for reason in &report.removal_reasons {
                println!("  {reason}");
            }
            Ok(())
        }
        ContextSubcommand::Score { ctx, item, score } => {
            if !project.session.curator.score_context_item(&ctx, &item, score) {
                anyhow::bail!("cannot score {item} in {ctx}: unknown id or score outside 0.0-1.0");
            }
            project.save()?;
            println!("{item} scored {score:.2}.");
            Ok(())
        }
        ContextSubcommand::Add {
            ctx,
            item_type,
            content,
            score,
            source,
        } => {
            let item_type: ItemType = item_type.parse()?;
            let Some(item_id) =
                project
                    .session
                    .curator
                    .add_context_item(&ctx, item_type, &content, score, &source)
            else {
                anyhow::bail!("cannot add item to {ctx}: unknown context or score outside 0.0-1.0");
            };
            project.save()?;
            println!("Added {item_id} to {ctx}.");
            Ok(())
        }
        ContextSubcommand::Change {
            ctx,
            change_type,
            description,
            affected,
        } => {
            let change_type: ChangeType = change_type.parse()?;
            if !project
                .session
                .curator
                .update_context_on_change(&ctx, change_type, &description, &affected)
            {
                anyhow::bail!("context '{ctx}' not found");
            }
            project.save()?;
            println!("Recorded {change_type} change on {ctx}.");
            Ok(())
        }
        ContextSubcommand::Propagate { change_type, id } => {
            let change_type: ChangeType = change_type.parse()?;
            let reached = project.session.curator.propagate_update(change_type, &id);
            project.save()?;
            if json {
                return print_json(&reached);
            }
            if reached.is_empty() {
                println!("No context references {id}.");
            } else {
                println!("Updated {}.", reached.join(", "));
            }
            Ok(())
        }
        ContextSubcommand::Assume { ctx, text, bucket } => {
            if !project.session.curator.add_assumption(&ctx, &text, &bucket) {
                anyhow::bail!("cannot add assumption: unknown context '{ctx}' or bucket '{bucket}'");
            }
            project.save()?;
            println!("Added {bucket} assumption to {ctx}.");
            Ok(())
        }
        ContextSubcommand::Depend { ctx, task, bucket } => {
            if !project.session.curator.add_dependency(&ctx, &task, &bucket) {
                anyhow::bail!("cannot add dependency: unknown context '{ctx}' or bucket '{bucket}'");
            }
            project.save()?;
            println!("Added {bucket} dependency {task} to {ctx}.");
            Ok(())
        }
        ContextSubcommand::Related { target, depth } => {
            let curator = &project.session.curator;
            let related = curator.find_related_code(&target, depth);
            if json {
                return print_json(&related);
            }
            if related.is_empty() {
                println!("Nothing related to '{target}'. Run 'rjw context scan' first?");
                return Ok(());
            }
            for element in &related {
                println!("{}:{}", element.location, element.line_start);
                for line in curator.extract_signature(element).lines() {
                    println!("    {line}");
                }
            }
            Ok(())
        }
        ContextSubcommand::Slice { file, names } => {
            let path = project.root.join(&file);
            let sliced = project
                .session
                .curator
                .slice_code(&path, &names)
                .with_context(|| format!("failed to slice {}", file.display()))?;
            if json {
                return print_json(&sliced);
            }
            if sliced.is_empty() {
                println!("None of {} found in {}.", names.join(", "), file.display());
            }
            for signature in sliced.values() {
                println!("{signature}\n");
            }
            Ok(())
        }
        ContextSubcommand::LoadDocs { file } => {
            let data = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&data).context("living documentation must be JSON")?;
            project.session.curator.load_living_documentation(value);
            project.save()?;
            println!("Living documentation loaded.");
            Ok(())
        }
        ContextSubcommand::Docs { category } => {
            let Some(value) = project.session.curator.living_docs_context(&category) else {
                anyhow::bail!("no living documentation for '{category}'");
            };
            print_json(value)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scan(project: &mut Project, path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let dir = path.unwrap_or_else(|| project.root.clone());
    let elements = scan_project(&dir, &project.config.context)
        .with_context(|| format!("failed to scan {}", dir.display()))?;
    let curator = &mut project.session.curator;
    curator.set_max_depth(project.config.context.max_depth);
    let added = curator.ingest(elements);
    let structure = curator.project_structure();
    project.save()?;

    if json {
        return print_json(&structure);
    }
    println!(
        "Scanned {added} elements: {} files, {} classes, {} functions in graph.",
        structure.files_analyzed, structure.classes, structure.functions
    );
    Ok(())
}

fn show(index: &ContextIndex) {
    println!("{} (task {})", index.ctx_id, index.task_id);
    println!("Focus:       {}", join_or_dash(&index.focus_areas));
    println!("Files:       {}", join_or_dash(&index.affected.files));
    println!("Decisions:   {}", join_or_dash(&index.technical.decision_refs));
    println!("Specs:       {}", join_or_dash(&index.technical.spec_refs));
    if !index.items.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = index
            .items
            .iter()
            .map(|i| {
                vec![
                    i.item_id.clone(),
                    i.item_type.to_string(),
                    format!("{:.2}", i.relevance_score),
                    i.source.clone(),
                ]
            })
            .collect();
        print_table(&["ITEM", "TYPE", "SCORE", "SOURCE"], &rows);
    }
    if !index.change_history.is_empty() {
        println!("\nChanges:");
        for change in &index.change_history {
            println!("  {} [{}] {}", change.change_id, change.change_type, change.description);
        }
    }
}
