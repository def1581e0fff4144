use super::Project;
use crate::output::print_json;
use clap::Subcommand;
use rjw_core::types::TestStatus;
use std::path::Path;

#[derive(Subcommand)]
pub enum TestSubcommand {
    /// Register a new test against specs
    Register {
        #[arg(long = "spec", value_delimiter = ',', required = true)]
        specs: Vec<String>,
        /// failing or passing
        #[arg(long, default_value = "failing")]
        status: String,
        /// Where the test lives
        #[arg(long, default_value = "tests")]
        location: String,
    },

    /// Record a new status for an existing test
    Update {
        id: String,
        #[arg(long)]
        status: String,
        #[arg(long, default_value = "tests")]
        location: String,
    },
}

pub fn run(root: &Path, session: &str, subcmd: TestSubcommand, json: bool) -> anyhow::Result<()> {
    let mut project = Project::open(root, session)?;
    let s = &mut project.session;
    match subcmd {
        TestSubcommand::Register {
            specs,
            status,
            location,
        } => {
            let status: TestStatus = status.parse()?;
            let result = s.ledger.register_test(&mut s.guard, &specs, status, &location);
            project.save()?;
            let id = result?;
            if json {
                print_json(&serde_json::json!({ "id": id, "specs": specs, "status": status }))
            } else {
                println!("Registered {id} ({status}) for {}", specs.join(", "));
                Ok(())
            }
        }
        TestSubcommand::Update {
            id,
            status,
            location,
        } => {
            let status: TestStatus = status.parse()?;
            let result = s.ledger.update_test(&mut s.guard, &id, status, &location);
            project.save()?;
            result?;
            if json {
                print_json(&serde_json::json!({ "id": id, "status": status }))
            } else {
                println!("{id} is now {status}");
                Ok(())
            }
        }
    }
}
