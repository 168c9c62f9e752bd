// src/filter.rs
//! Keyword filter engine: user-authored rules, rule-list parsing from the
//! query string, the free-text filter DSL, and the matching itself.
//!
//! Matching is case-insensitive substring containment over
//! `title + " " + extra.hover`. Exclude wins over everything, require is
//! conjunctive, include is disjunctive (or pass-through when no include
//! rule exists).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ContentItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Include,
    Exclude,
    Require,
}

impl RuleKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "include" => Some(Self::Include),
            "exclude" => Some(Self::Exclude),
            "require" => Some(Self::Require),
            _ => None,
        }
    }
}

/// A single filter rule as produced by the UI. A rule with an unknown or
/// missing kind still counts as an enabled rule but matches no partition,
/// so it has no effect on item selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pattern: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RuleKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

fn default_enabled() -> bool {
    true
}

impl FilterRule {
    pub fn new(pattern: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: None,
            pattern: pattern.into(),
            kind: Some(kind),
            scope: None,
            enabled: true,
            created_at: None,
        }
    }
}

/// Parse filter rules from the `filter` query parameter.
///
/// Accepts a JSON-encoded array; keeps entries with a non-empty string
/// `pattern` and `enabled != false`. Malformed JSON, a non-array value, or
/// an absent parameter all yield the empty rule set — never an error.
pub fn parse_filter_rules(filter_param: Option<&str>) -> Vec<FilterRule> {
    let Some(raw) = filter_param else {
        return Vec::new();
    };
    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };
    let Value::Array(entries) = parsed else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let pattern = obj.get("pattern")?.as_str()?;
            if pattern.is_empty() {
                return None;
            }
            if obj.get("enabled") == Some(&Value::Bool(false)) {
                return None;
            }
            Some(FilterRule {
                id: obj.get("id").and_then(Value::as_str).map(str::to_string),
                pattern: pattern.to_string(),
                kind: obj
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(RuleKind::parse),
                scope: obj.get("scope").and_then(Value::as_str).map(str::to_string),
                enabled: true,
                created_at: obj.get("createdAt").and_then(Value::as_i64),
            })
        })
        .collect()
}

/// Structured form of a filter, either compiled from rules or parsed from
/// the free-text DSL. All patterns are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFilter {
    pub includes: Vec<String>,
    pub requires: Vec<String>,
    pub excludes: Vec<String>,
    pub limit: Option<usize>,
}

/// Parse a DSL filter expression.
///
/// Syntax: `word` includes (OR), `+word` requires (AND), `!word` excludes,
/// `@N` caps the result count. Example: `bitcoin +crypto !sponsored @10`.
pub fn parse_filter_expression(expression: &str) -> ParsedFilter {
    let mut result = ParsedFilter::default();

    for token in expression.split_whitespace() {
        if let Some(rest) = token.strip_prefix('+') {
            let value = rest.trim();
            if !value.is_empty() {
                result.requires.push(value.to_lowercase());
            }
        } else if let Some(rest) = token.strip_prefix('!') {
            let value = rest.trim();
            if !value.is_empty() {
                result.excludes.push(value.to_lowercase());
            }
        } else if let Some(rest) = token.strip_prefix('@') {
            if let Ok(limit) = rest.parse::<usize>() {
                if limit > 0 {
                    result.limit = Some(limit);
                }
            }
        } else {
            result.includes.push(token.to_lowercase());
        }
    }

    result
}

/// Compile a rule list into a `ParsedFilter`, dropping disabled rules and
/// rules without a recognized kind.
pub fn rules_to_parsed(rules: &[FilterRule]) -> ParsedFilter {
    let mut result = ParsedFilter::default();
    for rule in rules {
        if !rule.enabled {
            continue;
        }
        let pattern = rule.pattern.to_lowercase();
        match rule.kind {
            Some(RuleKind::Include) => result.includes.push(pattern),
            Some(RuleKind::Exclude) => result.excludes.push(pattern),
            Some(RuleKind::Require) => result.requires.push(pattern),
            None => {}
        }
    }
    result
}

/// The text a filter matches against: title plus hover, lowercased.
fn match_text(item: &ContentItem) -> String {
    let hover = item
        .extra
        .as_ref()
        .and_then(|e| e.hover.as_deref())
        .unwrap_or("");
    format!("{} {}", item.title, hover).to_lowercase()
}

/// Check one item against a parsed filter.
pub fn matches_filter(item: &ContentItem, filter: &ParsedFilter) -> bool {
    let text = match_text(item);

    // Exclusions first (fail fast)
    for exc in &filter.excludes {
        if text.contains(exc.as_str()) {
            return false;
        }
    }

    // Required terms: all must match
    for req in &filter.requires {
        if !text.contains(req.as_str()) {
            return false;
        }
    }

    // Includes: any must match, or pass if none defined
    if !filter.includes.is_empty() {
        return filter.includes.iter().any(|inc| text.contains(inc.as_str()));
    }

    true
}

/// Apply filter rules to a list of items, preserving relative order.
///
/// With no enabled rule this is the identity.
pub fn apply_filters(items: &[ContentItem], rules: &[FilterRule]) -> Vec<ContentItem> {
    if !rules.iter().any(|r| r.enabled) {
        return items.to_vec();
    }
    let parsed = rules_to_parsed(rules);
    items
        .iter()
        .filter(|item| matches_filter(item, &parsed))
        .cloned()
        .collect()
}

/// Apply a parsed filter expression, honoring its optional `@N` cap. The cap
/// applies after matching.
pub fn apply_parsed_filter(items: &[ContentItem], filter: &ParsedFilter) -> Vec<ContentItem> {
    let mut filtered: Vec<ContentItem> = items
        .iter()
        .filter(|item| matches_filter(item, filter))
        .cloned()
        .collect();
    if let Some(limit) = filter.limit {
        filtered.truncate(limit);
    }
    filtered
}
