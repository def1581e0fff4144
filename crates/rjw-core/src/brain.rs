use crate::error::{Result, RjwError};
use serde_json::{json, Value};

pub trait Brain {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;

    fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value>;
}

/// Keywords recognised by the offline topic extractor, in match order.
pub const TOPIC_KEYWORDS: &[&str] = &[
    "authentication",
    "authorization",
    "security",
    "database",
    "API",
    "testing",
    "deployment",
    "architecture",
    "design",
    "performance",
    "scalability",
    "monitoring",
    "logging",
];

const MAX_TOPICS: usize = 3;
const FALLBACK_TOPIC_CHARS: usize = 50;

/// Research topics for a user request.
///
/// Asks `brain` for up to three topics when available; otherwise (or when the
/// model answer is unusable) matches [`TOPIC_KEYWORDS`], and as a last resort
/// uses the first 50 characters of the request itself.
pub fn extract_research_topics(input: &str, brain: Option<&dyn Brain>) -> Result<Vec<String>> {
    if input.trim().is_empty() {
        return Err(RjwError::InvalidInput("user input cannot be empty".to_string()));
    }

    if let Some(brain) = brain {
        match topics_from_brain(brain, input) {
            Ok(topics) if !topics.is_empty() => return Ok(topics),
            Ok(_) => tracing::warn!("model returned no topics, falling back to keywords"),
            Err(e) => tracing::warn!(error = %e, "topic extraction failed, falling back to keywords"),
        }
    }

    let lower = input.to_lowercase();
    let mut topics: Vec<String> = TOPIC_KEYWORDS
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .map(|k| k.to_string())
        .collect();

    if topics.is_empty() {
        topics.push(input.chars().take(FALLBACK_TOPIC_CHARS).collect());
    }
    Ok(topics)
}

fn topics_from_brain(brain: &dyn Brain, input: &str) -> Result<Vec<String>> {
    let prompt = format!(
        "Analyze this user request and extract 1-3 key technical topics that would need research:\n\n\
         User request: \"{input}\"\n\n\
         Return a JSON array of topics (strings). Each topic should be specific and researchable.\n\
         Example: [\"authentication patterns\", \"database design\", \"API security\"]"
    );
    let schema = json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Array of research topics"
    });
    let answer = brain.generate_structured(&prompt, &schema)?;
    Ok(string_list(&answer)
        .into_iter()
        .take(MAX_TOPICS)
        .collect())
}

/// Strings from a JSON array, or from the `topics` key / first array-valued
/// key of an object.
pub(crate) fn string_list(value: &Value) -> Vec<String> {
    let array = match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("topics")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(|v| v.as_array().filter(|a| !a.is_empty()))),
        _ => None,
    };
    array
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Replies with a fixed structured value; text replies echo the prompt.
    pub struct CannedBrain(pub Value);

    impl Brain for CannedBrain {
        fn generate(&self, prompt: &str, _system_prompt: Option<&str>) -> Result<String> {
            Ok(prompt.to_string())
        }

        fn generate_structured(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    pub struct FailingBrain;

    impl Brain for FailingBrain {
        fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> Result<String> {
            Err(RjwError::Generation("offline".to_string()))
        }

        fn generate_structured(&self, _prompt: &str, _schema: &Value) -> Result<Value> {
            Err(RjwError::Generation("offline".to_string()))
        }
    }
}
