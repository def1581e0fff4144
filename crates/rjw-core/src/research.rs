use crate::error::{Result, RjwError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const MAX_INSIGHTS: usize = 10;
pub const MAX_URLS: usize = 5;
pub const MAX_CITATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Url,
    Citation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedResearch {
    pub title: String,
    pub summary: String,
    pub key_insights: Vec<String>,
    pub sources: Vec<SourceRef>,
    pub methodology: Option<String>,
    pub conclusions: Option<String>,
    pub raw_content: String,
}

pub fn parse_user_research(raw: &str) -> Result<ParsedResearch> {
    if raw.trim().is_empty() {
        return Err(RjwError::InvalidInput(
            "user research input cannot be empty".to_string(),
        ));
    }
    Ok(ParsedResearch {
        title: extract_title(raw),
        summary: extract_summary(raw),
        key_insights: extract_key_insights(raw),
        sources: extract_sources(raw),
        methodology: section(raw, &["Methodology", "Method", "Approach"]),
        conclusions: section(
            raw,
            &[
                "Conclusions",
                "Conclusion",
                "Recommendations",
                "Recommendation",
                "Takeaways",
                "Takeaway",
            ],
        ),
        raw_content: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Regexes
// ---------------------------------------------------------------------------

macro_rules! static_regex {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).unwrap())
        }
    };
}

static_regex!(h1_re, r"(?m)^#\s+(.+)$");
static_regex!(bullet_re, r"(?m)^\s*[-*•]\s+(.+)$");
static_regex!(numbered_re, r"(?m)^\s*\d+\.\s+(.+)$");
static_regex!(url_re, r#"https?://[^\s<>"{}|\\^`\[\]]+"#);
static_regex!(md_link_re, r"\[([^\]]+)\]\(([^)]+)\)");
static_regex!(source_line_re, r"(?m)Source:\s*(.+)");
static_regex!(reference_line_re, r"(?m)Reference:\s*(.+)");
static_regex!(findings_heading_re, r"(?im)^##?\s*(?:Key\s+)?(?:Findings?|Insights?|Conclusions?)\s*:?[ \t]*(.*)$");

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Body of the first `#`/`##` section whose heading is one of `names`, up to
/// the next heading.
fn section(text: &str, names: &[&str]) -> Option<String> {
    let pattern = format!(r"(?im)^##?\s*(?:{})\s*:?[ \t]*(.*)$", names.join("|"));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let whole = caps.get(0)?;
    let mut body = String::new();
    let inline = caps.get(1).map_or("", |m| m.as_str().trim());
    if !inline.is_empty() {
        body.push_str(inline);
        body.push('\n');
    }
    for line in text[whole.end()..].lines() {
        if line.trim_start().starts_with('#') {
            break;
        }
        body.push_str(line);
        body.push('\n');
    }
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

fn extract_title(text: &str) -> String {
    if let Some(c) = h1_re().captures(text) {
        return c[1].trim().to_string();
    }
    if let Some(first) = text.trim().lines().next() {
        let first = first.trim();
        if first.chars().count() < 100 && !first.ends_with(['.', '!', '?']) {
            return first.to_string();
        }
    }
    let words: Vec<&str> = text.split_whitespace().take(10).collect();
    if words.len() >= 10 {
        format!("{}...", words.join(" "))
    } else {
        words.join(" ")
    }
}

fn extract_summary(text: &str) -> String {
    if let Some(s) = section(text, &["Summary", "Overview", "Abstract"]) {
        return s;
    }
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if let Some(first) = paragraphs.first() {
        if first.chars().count() > 100 || first.ends_with('.') {
            return first.to_string();
        }
        if let Some(second) = paragraphs.get(1) {
            return second.to_string();
        }
    }
    let trimmed = text.trim();
    if trimmed.chars().count() > 200 {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

fn extract_key_insights(text: &str) -> Vec<String> {
    let mut insights: Vec<String> = Vec::new();

    for re in [bullet_re(), numbered_re()] {
        insights.extend(
            re.captures_iter(text)
                .map(|c| c[1].trim().to_string())
                .filter(|s| s.chars().count() > 10),
        );
    }

    if let Some(caps) = findings_heading_re().captures(text) {
        if let Some(whole) = caps.get(0) {
            let lines = text[whole.end()..]
                .lines()
                .take_while(|l| !l.trim_start().starts_with('#'))
                .map(str::trim)
                .filter(|l| l.chars().count() > 20)
                .take(5)
                .map(str::to_string);
            insights.extend(lines);
        }
    }

    if insights.is_empty() {
        insights = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| (51..200).contains(&s.chars().count()))
            .take(3)
            .map(str::to_string)
            .collect();
    }

    let mut seen = HashSet::new();
    insights
        .into_iter()
        .filter(|i| seen.insert(i.clone()))
        .take(MAX_INSIGHTS)
        .collect()
}

fn extract_sources(text: &str) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = url_re()
        .find_iter(text)
        .take(MAX_URLS)
        .map(|m| SourceRef {
            kind: SourceKind::Url,
            reference: m.as_str().to_string(),
        })
        .collect();

    sources.extend(md_link_re().captures_iter(text).take(MAX_CITATIONS).map(|c| SourceRef {
        kind: SourceKind::Citation,
        reference: format!("{} - {}", &c[1], &c[2]),
    }));
    for re in [source_line_re(), reference_line_re()] {
        sources.extend(re.captures_iter(text).take(MAX_CITATIONS).map(|c| SourceRef {
            kind: SourceKind::Citation,
            reference: c[1].trim().to_string(),
        }));
    }
    sources
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = "# Session storage options\n\n\
## Summary\n\
Redis outperforms Postgres for short-lived session tokens.\n\n\
## Findings\n\
- Redis p99 latency stayed under two milliseconds\n\
- Postgres needed connection pooling to keep up\n\n\
## Methodology\n\
Load test with 10k concurrent sessions.\n\n\
## Conclusions\n\
Use Redis with a 30 minute TTL.\n\n\
Source: internal benchmark 2024\n\
See https://redis.io/docs/latest/ and [pgbench](https://www.postgresql.org/docs/current/pgbench.html)\n";

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            parse_user_research("  \n "),
            Err(RjwError::InvalidInput(_))
        ));
    }

    #[test]
    fn structured_notes_are_parsed() {
        let parsed = parse_user_research(NOTES).unwrap();
        assert_eq!(parsed.title, "Session storage options");
        assert_eq!(
            parsed.summary,
            "Redis outperforms Postgres for short-lived session tokens."
        );
        assert!(parsed
            .key_insights
            .contains(&"Redis p99 latency stayed under two milliseconds".to_string()));
        assert_eq!(
            parsed.methodology.as_deref(),
            Some("Load test with 10k concurrent sessions.")
        );
        assert_eq!(parsed.conclusions.as_deref(), Some("Use Redis with a 30 minute TTL."));
        assert_eq!(parsed.raw_content, NOTES);
    }

    #[test]
    fn sources_include_urls_and_citations() {
        let parsed = parse_user_research(NOTES).unwrap();
        assert!(parsed
            .sources
            .iter()
            .any(|s| s.kind == SourceKind::Url && s.reference == "https://redis.io/docs/latest/"));
        assert!(parsed
            .sources
            .iter()
            .any(|s| s.kind == SourceKind::Citation && s.reference.starts_with("pgbench - ")));
        assert!(parsed
            .sources
            .iter()
            .any(|s| s.reference == "internal benchmark 2024"));
    }

    #[test]
    fn insights_are_deduplicated() {
        let text = "Notes\n\n- the cache must be invalidated on write\n- the cache must be invalidated on write\n";
        let parsed = parse_user_research(text).unwrap();
        assert_eq!(parsed.key_insights.len(), 1);
    }

    #[test]
    fn plain_prose_uses_first_words_as_title() {
        let text = "Users abandon checkout when the page takes longer than three seconds to load on mobile devices.";
        let parsed = parse_user_research(text).unwrap();
        assert_eq!(
            parsed.title,
            "Users abandon checkout when the page takes longer than three..."
        );
        assert_eq!(parsed.summary, text);
        assert_eq!(parsed.key_insights.len(), 1);
    }
}
