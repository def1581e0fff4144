use super::Project;
use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(root: &Path, session: &str, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root, session)?;
    let entries = project.session.guard.operation_log(limit);

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No guarded operations yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%H:%M:%S").to_string(),
                e.operation.to_string(),
                e.target.clone(),
                if e.success { "ok" } else { "REJECTED" }.to_string(),
                e.message.clone(),
            ]
        })
        .collect();
    print_table(&["TIME", "OP", "TARGET", "RESULT", "MESSAGE"], &rows);
    Ok(())
}
