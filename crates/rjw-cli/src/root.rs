use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `RJW_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of the working directory holding `.rjw/`
/// 3. Nearest ancestor holding `.git/`
/// 4. The working directory itself
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    [".rjw", ".git"]
        .iter()
        .find_map(|marker| nearest_with(start, marker))
        .unwrap_or_else(|| start.to_path_buf())
}

fn nearest_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
