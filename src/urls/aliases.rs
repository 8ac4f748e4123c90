//! Semantic aliases for variable names used in template placeholders.
//!
//! Minified bundles bind meaningful values to one-letter names; the
//! surrounding code often reveals the intended name through object keys
//! (`{contentId: t}`), destructuring, `URLSearchParams`/`FormData`
//! key-value calls, or a plain `x = y` alias. Rendering `{contentId}`
//! instead of `{t}` keeps templates useful.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug)]
struct AliasEntry {
    alias: String,
    confidence: Confidence,
}

#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, Vec<AliasEntry>>,
}

const GENERIC_SUBSTRINGS: &[&str] = &["temp", "tmp", "val", "test", "dummy", "placeholder"];
const VERY_GENERIC: &[&str] = &[
    "id", "key", "name", "title", "value", "data", "item", "type",
];

impl AliasTable {
    pub fn add(&mut self, var_name: &str, alias: &str, confidence: Confidence) {
        if alias.is_empty() || alias == var_name {
            return;
        }
        let entries = self.entries.entry(var_name.to_string()).or_default();
        if let Some(existing) = entries.iter_mut().find(|entry| entry.alias == alias) {
            if confidence > existing.confidence {
                existing.confidence = confidence;
            }
            return;
        }
        entries.push(AliasEntry {
            alias: alias.to_string(),
            confidence,
        });
    }

    /// The most informative alias recorded for a variable, or the
    /// variable's own name when nothing better is known.
    pub fn best<'a>(&'a self, var_name: &'a str) -> &'a str {
        let Some(entries) = self.entries.get(var_name) else {
            return var_name;
        };
        let mut best: Option<(&AliasEntry, u8)> = None;
        for entry in entries {
            let rank = category_rank(&entry.alias);
            let replace = match best {
                None => true,
                Some((current, current_rank)) => {
                    (rank, entry.confidence) > (current_rank, current.confidence)
                }
            };
            if replace {
                best = Some((entry, rank));
            }
        }
        best.map(|(entry, _)| entry.alias.as_str()).unwrap_or(var_name)
    }
}

/// Higher is better: compound specific names beat acceptable names beat
/// very generic names beat throwaway names.
fn category_rank(alias: &str) -> u8 {
    let lower = alias.to_ascii_lowercase();
    if lower.len() == 1 || GENERIC_SUBSTRINGS.iter().any(|sub| lower.contains(sub)) {
        return 0;
    }
    if VERY_GENERIC.contains(&lower.as_str()) {
        return 1;
    }
    let has_generic_part = VERY_GENERIC.iter().any(|generic| lower.contains(generic));
    if has_generic_part && alias.len() > 4 {
        3
    } else {
        2
    }
}
