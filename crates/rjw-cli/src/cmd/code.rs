use super::{parse_toggle, text_or_file, Project};
use crate::output::print_json;
use clap::Subcommand;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum CodeSubcommand {
    /// Write a code unit through the guard
    Write {
        /// Project-relative path of the code unit
        unit: String,
        #[arg(long = "test", value_delimiter = ',')]
        tests: Vec<String>,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the content from this file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Read a file through the guard (logged)
    Read { unit: String },

    /// Check the traceability chain of a code unit
    Validate { unit: String },

    /// Show tests, specs and evidence behind a code unit
    Trace { unit: String },

    /// Turn strict traceability on or off for this session
    Strict { state: String },
}

pub fn run(root: &Path, session: &str, subcmd: CodeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CodeSubcommand::Write {
            unit,
            tests,
            content,
            file,
        } => write(root, session, &unit, &tests, text_or_file(content, file, "content")?, json),
        CodeSubcommand::Read { unit } => {
            let mut project = Project::open(root, session)?;
            let result = project.session.guard.read_file(&project.store, &unit);
            project.save()?;
            print!("{}", result?);
            Ok(())
        }
        CodeSubcommand::Validate { unit } => validate(root, session, &unit, json),
        CodeSubcommand::Trace { unit } => trace(root, session, &unit, json),
        CodeSubcommand::Strict { state } => {
            let enabled = parse_toggle(&state)?;
            let mut project = Project::open(root, session)?;
            project.session.guard.set_strict_mode(enabled);
            project.save()?;
            println!("Strict mode {}.", if enabled { "on" } else { "off" });
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// write
// ---------------------------------------------------------------------------

fn write(
    root: &Path,
    session: &str,
    unit: &str,
    tests: &[String],
    content: String,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    let result = project
        .session
        .guard
        .write_code(&mut project.store, unit, &content, tests);
    // rejections land in the operation log, so persist either way
    project.save()?;

    match result {
        Ok(()) => {
            if json {
                print_json(&serde_json::json!({ "unit": unit, "written": true, "tests": tests }))
            } else {
                println!("Wrote {unit}.");
                Ok(())
            }
        }
        Err(e) if e.is_guard_violation() => {
            if json {
                print_json(&serde_json::json!({ "unit": unit, "written": false, "reason": e.to_string() }))?;
            }
            anyhow::bail!("write rejected: {e}")
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// validate / trace
// ---------------------------------------------------------------------------

fn validate(root: &Path, session: &str, unit: &str, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    match project.session.guard.validate_chain(unit) {
        Ok(_) => {
            if json {
                print_json(&serde_json::json!({ "unit": unit, "valid": true }))
            } else {
                println!("{unit}: chain complete");
                Ok(())
            }
        }
        Err(e) => {
            if json {
                print_json(&serde_json::json!({ "unit": unit, "valid": false, "reason": e.to_string() }))?;
            }
            anyhow::bail!("{unit}: {e}")
        }
    }
}

fn trace(root: &Path, session: &str, unit: &str, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    let Some(info) = project.session.guard.traceability_info(unit) else {
        anyhow::bail!("no traceability recorded for '{unit}'");
    };
    if json {
        return print_json(&info);
    }
    println!("{}", info.code_unit);
    for test in &info.tests {
        println!("  {} ({})", test.test_id, test.status);
        for spec in &test.specs {
            println!("    {} <- [{}]", spec.spec_id, spec.evidence.join(", "));
        }
    }
    Ok(())
}
