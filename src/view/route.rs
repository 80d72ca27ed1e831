//! Schema routing: which of the five view kinds does a payload describe?
//!
//! Resolution order:
//! 1. exact match of the five fixed schema ids;
//! 2. structural sniff for untagged payloads (`matrix` or `columns`+`rows`
//!    means table, `nodes`+`edges` means structure);
//! 3. the user override table (`schema_id = view_kind` lines);
//! 4. otherwise unroutable: stored, never rendered.

use crate::view::ViewKind;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// User override table parsed from newline-delimited `schema = target` lines.
///
/// `#`-prefixed lines are comments; lines with an unknown target or no `=`
/// are skipped with a warning. Later lines win over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    map: BTreeMap<String, ViewKind>,
}

impl OverrideTable {
    pub fn parse(text: &str) -> anyhow::Result<OverrideTable> {
        const LINE_RE: &str = r"^\s*([^#\s=]+)\s*=\s*(\S+)\s*$";
        let re = Regex::new(LINE_RE)?;

        let mut map = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let lno = lineno + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some(caps) = re.captures(trimmed) else {
                warn!(line = lno, text = trimmed, "skipping unparseable override line");
                continue;
            };

            let schema = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let target = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            match ViewKind::from_override_target(target) {
                Some(kind) => {
                    map.insert(schema.to_string(), kind);
                }
                None => {
                    warn!(line = lno, view_kind = target, "skipping override with unknown view kind");
                }
            }
        }

        Ok(OverrideTable { map })
    }

    pub fn get(&self, schema: &str) -> Option<ViewKind> {
        self.map.get(schema).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Closed resolver over the five view kinds, with the override table as an
/// injected dependency.
#[derive(Debug, Default)]
pub struct Router {
    overrides: OverrideTable,
}

impl Router {
    pub fn new(overrides: OverrideTable) -> Router {
        Router { overrides }
    }

    pub fn resolve(&self, schema_tag: &str, raw: &str) -> Option<ViewKind> {
        if let Some(kind) = ViewKind::from_schema_id(schema_tag) {
            return Some(kind);
        }
        if schema_tag.is_empty() {
            if let Some(kind) = sniff(raw) {
                return Some(kind);
            }
        }
        self.overrides.get(schema_tag)
    }
}

/// Structural sniff for untagged payloads.
fn sniff(raw: &str) -> Option<ViewKind> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;

    if obj.contains_key("matrix") || (obj.contains_key("columns") && obj.contains_key("rows")) {
        return Some(ViewKind::Table);
    }
    if obj.contains_key("nodes") && obj.contains_key("edges") {
        return Some(ViewKind::Structure);
    }
    None
}

/// What routing plus validation did for one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Raw identical to the cache slot; nothing to do.
    Unchanged(ViewKind),
    /// Validation succeeded and the view slot was refreshed.
    Refreshed(ViewKind),
    /// Validation failed; the last good view stays displayed.
    Rejected(ViewKind),
    /// No view kind resolved; stored but never rendered.
    Unroutable,
}

impl RouteOutcome {
    pub fn kind(&self) -> Option<ViewKind> {
        match self {
            Self::Unchanged(k) | Self::Refreshed(k) | Self::Rejected(k) => Some(*k),
            Self::Unroutable => None,
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }
}
