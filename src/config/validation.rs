//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

/// Returns the complete set of valid dotted key paths for PortalConfig.
///
/// Any new field added to PortalConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        "server.cors_origins",
        // [storage]
        "storage",
        "storage.backend",
        "storage.path",
        "storage.namespace",
        // [feedback]
        "feedback",
        "feedback.default_rating",
        "feedback.confirmation_secs",
        // [logging]
        "logging",
        "logging.format",
    ];
    keys.iter().copied().collect()
}

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties break alphabetically so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        // Only report the top of an unknown subtree.
        .filter(|key| {
            key.rsplit_once('.')
                .map_or(true, |(parent, _)| known.contains(parent))
        })
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}' (ignored)"),
            field: key,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_walk_nested_keys() {
        let value: toml::Value = "[a]\nb = 1\n[a.c]\nd = 2\n".parse().unwrap();
        let mut keys = walk_toml_keys(&value, "");
        keys.sort();
        assert_eq!(keys, vec!["a", "a.b", "a.c", "a.c.d"]);
    }

    #[test]
    fn test_unknown_subtree_reported_once() {
        let warnings = validate_unknown_keys("[metrics]\nenabled = true\nport = 9090\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "metrics");
    }

    #[test]
    fn test_display_includes_suggestion() {
        let warnings = validate_unknown_keys("[storage]\nnamespce = \"x\"\n");
        assert_eq!(warnings.len(), 1);
        let text = warnings[0].to_string();
        assert!(text.contains("storage.namespce"));
        assert!(text.contains("did you mean 'storage.namespace'"));
    }
}
