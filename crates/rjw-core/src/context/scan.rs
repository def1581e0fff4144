//! Regex-based source scanner feeding the dependency graph.
//!
//! Recognises Rust `fn`/`struct`/`enum`/`trait` items and Python
//! `def`/`class` statements. Body extents are found by brace balance for
//! Rust and by indentation for Python; references inside the body become the
//! element's dependency set.

use super::graph::{CodeElement, ElementKind};
use crate::config::ContextConfig;
use crate::error::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "rs" => Some(Language::Rust),
            "py" => Some(Language::Python),
            _ => None,
        }
    }
}

fn rust_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)"#,
        )
        .unwrap()
    })
}

fn rust_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?(?:struct|enum|trait)\s+([A-Za-z_][A-Za-z0-9_]*)")
            .unwrap()
    })
}

fn py_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

fn py_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

fn call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

fn type_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\b").unwrap())
}

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "match", "return", "fn", "def", "class", "print", "len", "self", "Self",
    "Some", "None", "Ok", "Err", "True", "False", "Vec", "String", "Option", "Result", "Box",
    "super", "isinstance", "range", "loop", "in", "not", "and", "or", "elif", "with", "assert",
];

// ---------------------------------------------------------------------------
// Per-file analysis
// ---------------------------------------------------------------------------

/// Elements defined in `source`, attributed to `location`.
pub fn analyze_source(source: &str, location: &str, lang: Language) -> Vec<CodeElement> {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let found = match lang {
            Language::Rust => rust_header(line),
            Language::Python => python_header(line),
        };
        let Some((name, kind)) = found else { continue };

        let end = match lang {
            Language::Rust => rust_body_end(&lines, idx),
            Language::Python => python_body_end(&lines, idx),
        };
        let body = lines[idx + 1..=end].join("\n");
        let docstring = match lang {
            Language::Rust => rust_doc(&lines, idx),
            Language::Python => python_doc(&lines, idx, end),
        };
        out.push(CodeElement {
            dependencies: references(&body, &name),
            signature: signature(line, lang),
            name,
            kind,
            location: location.to_string(),
            line_start: idx + 1,
            line_end: end + 1,
            docstring,
        });
    }
    out
}

fn rust_header(line: &str) -> Option<(String, ElementKind)> {
    if let Some(c) = rust_fn_re().captures(line) {
        return Some((c[1].to_string(), ElementKind::Function));
    }
    rust_type_re()
        .captures(line)
        .map(|c| (c[1].to_string(), ElementKind::Class))
}

fn python_header(line: &str) -> Option<(String, ElementKind)> {
    if let Some(c) = py_def_re().captures(line) {
        return Some((c[2].to_string(), ElementKind::Function));
    }
    py_class_re()
        .captures(line)
        .map(|c| (c[2].to_string(), ElementKind::Class))
}

/// Last line of the item starting at `start`: the line closing its first
/// brace, or the header line itself for `;`-terminated items.
fn rust_body_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    let mut opened = false;
    for (i, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                ';' if !opened => return i,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return i;
        }
    }
    lines.len().saturating_sub(1).max(start)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn python_body_end(lines: &[&str], start: usize) -> usize {
    let base = indent_of(lines[start]);
    let mut end = start;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= base {
            break;
        }
        end = i;
    }
    end
}

fn rust_doc(lines: &[&str], start: usize) -> Option<String> {
    let mut first = None;
    for line in lines[..start].iter().rev() {
        let t = line.trim_start();
        if let Some(doc) = t.strip_prefix("///") {
            first = Some(doc.trim().to_string());
        } else if t.starts_with("#[") {
            continue;
        } else {
            break;
        }
    }
    first.filter(|d| !d.is_empty())
}

fn python_doc(lines: &[&str], start: usize, end: usize) -> Option<String> {
    let next = lines[start + 1..=end].iter().find(|l| !l.trim().is_empty())?;
    let t = next.trim();
    let quote = ["\"\"\"", "'''"].into_iter().find(|q| t.starts_with(q))?;
    let text = t.trim_start_matches(quote).trim_end_matches(quote).trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn signature(header: &str, lang: Language) -> String {
    let t = header.trim();
    match lang {
        Language::Rust => t.trim_end_matches('{').trim_end_matches(';').trim_end().to_string(),
        Language::Python => t.trim_end_matches(':').trim_end().to_string(),
    }
}

fn references(body: &str, own_name: &str) -> BTreeSet<String> {
    call_re()
        .captures_iter(body)
        .chain(type_ref_re().captures_iter(body))
        .map(|c| c[1].to_string())
        .filter(|n| n != own_name && !KEYWORDS.contains(&n.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Project walk
// ---------------------------------------------------------------------------

/// Scan every file under `root` whose extension is configured, skipping the
/// configured directories. Paths in the result are relative to `root`.
pub fn scan_project(root: &Path, config: &ContextConfig) -> Result<Vec<CodeElement>> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !config
                    .skip_dirs
                    .iter()
                    .any(|d| e.file_name().to_string_lossy() == d.as_str())
        });

    let mut elements = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !config.extensions.iter().any(|x| x == ext) {
            continue;
        }
        let Some(lang) = Language::from_extension(ext) else {
            continue;
        };
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        elements.extend(analyze_source(&source, &rel, lang));
    }
    tracing::debug!(root = %root.display(), elements = elements.len(), "project scanned");
    Ok(elements)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RUST_SRC: &str = r#"use std::fmt;

/// Holds session tokens.
#[derive(Debug)]
pub struct SessionStore {
    tokens: Vec<String>,
}

pub(crate) fn login(user: &str) -> Result<SessionStore, String> {
    let hashed = hash_password(user);
    Ok(SessionStore { tokens: vec![hashed] })
}

fn hash_password(p: &str) -> String;
"#;

    const PY_SRC: &str = r#"class Session(Base):
    """Server-side session."""

    def refresh(self, ttl):
        return compute_expiry(ttl)


def compute_expiry(ttl):
    return ttl * 2
"#;

    #[test]
    fn rust_items_are_found() {
        let elements = analyze_source(RUST_SRC, "src/auth.rs", Language::Rust);
        let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["SessionStore", "login", "hash_password"]);

        let store = &elements[0];
        assert_eq!(store.kind, ElementKind::Class);
        assert_eq!(store.docstring.as_deref(), Some("Holds session tokens."));
        assert_eq!(store.line_start, 5);
        assert_eq!(store.line_end, 7);

        let login = &elements[1];
        assert_eq!(
            login.signature,
            "pub(crate) fn login(user: &str) -> Result<SessionStore, String>"
        );
        assert!(login.dependencies.contains("hash_password"));
        assert!(login.dependencies.contains("SessionStore"));
        assert!(!login.dependencies.contains("Ok"));

        assert_eq!(elements[2].line_start, elements[2].line_end);
    }

    #[test]
    fn python_items_are_found() {
        let elements = analyze_source(PY_SRC, "app/session.py", Language::Python);
        let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Session", "refresh", "compute_expiry"]);

        let class = &elements[0];
        assert_eq!(class.signature, "class Session(Base)");
        assert_eq!(class.docstring.as_deref(), Some("Server-side session."));
        assert_eq!(class.line_end, 5);

        assert!(elements[1].dependencies.contains("compute_expiry"));
        assert_eq!(elements[1].signature, "def refresh(self, ttl)");
    }

    #[test]
    fn scan_skips_configured_dirs_and_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        std::fs::write(dir.path().join("src/auth.rs"), RUST_SRC).unwrap();
        std::fs::write(dir.path().join("target/debug/gen.rs"), "fn generated() {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "def nope():").unwrap();
        std::fs::write(dir.path().join("tool.py"), PY_SRC).unwrap();

        let elements = scan_project(dir.path(), &ContextConfig::default()).unwrap();
        assert!(elements.iter().all(|e| !e.location.starts_with("target")));
        assert!(elements.iter().any(|e| e.location == "src/auth.rs"));
        assert!(elements.iter().any(|e| e.location == "tool.py"));
        assert_eq!(elements.len(), 6);
    }
}
