use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::model::task::{Category, Task};

const CATEGORY_KEYS: [(&str, Category); 3] = [
    ("todo", Category::ToDo),
    ("progress", Category::InProgress),
    ("done", Category::Done),
];

/// Expands `key` to the single candidate it equals or prefixes.
pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    // 1. Exact match
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    // 2. Prefix match
    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(BoardError::Unknown(format!("Unknown key: '{}'", key))),
        _ => Err(BoardError::Ambiguous(format!(
            "Ambiguous key: '{}' matches {:?}",
            key, matches
        ))),
    }
}

/// Accepts `todo`, `progress`, `done`, their prefixes, or the display labels.
pub fn parse_category(input: &str) -> Result<Category> {
    let normalized: String = input
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect();
    let normalized = match normalized.as_str() {
        "inprogress" => "progress",
        other => other,
    };

    let keys: Vec<&str> = CATEGORY_KEYS.iter().map(|(k, _)| *k).collect();
    let key = expand_key(normalized, &keys)?;
    CATEGORY_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, c)| *c)
        .ok_or_else(|| BoardError::Unknown(format!("Unknown category: '{}'", input)))
}

/// Finds the task whose id starts with `prefix`.
pub fn resolve_id(prefix: &str, tasks: &[Task]) -> Result<Uuid> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(BoardError::Unknown("Empty task id".to_string()));
    }
    let ids: Vec<String> = tasks.iter().map(|t| t.id.to_string()).collect();
    let candidates: Vec<&str> = ids.iter().map(String::as_str).collect();
    let full = expand_key(&prefix, &candidates).map_err(|e| match e {
        BoardError::Unknown(_) => BoardError::Unknown(format!("No task matches id '{}'", prefix)),
        other => other,
    })?;
    Uuid::parse_str(&full).map_err(|e| BoardError::Unknown(e.to_string()))
}
