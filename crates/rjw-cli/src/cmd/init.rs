use anyhow::Context;
use rjw_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing rjw in: {}", root.display());

    let dirs = [
        paths::RJW_DIR,
        paths::SESSIONS_DIR,
        paths::EVIDENCE_DIR,
        paths::DECISIONS_DIR,
        paths::SPECS_DIR,
    ];
    for dir in dirs {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    println!("\nStart with research: rjw evidence harvest \"<topic>\"");
    Ok(())
}
