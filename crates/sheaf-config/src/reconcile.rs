//! Reconciliation of two drifting manifests into one canonical manifest.
//!
//! Both manifests are compared as raw values, before defaults are applied, so
//! an option written in only one file is visible as such. Tables merge key by
//! key. Arrays whose elements carry an identity (`kind` plus `filename` for
//! plugins, `test` for rules) merge element by element; any other array is
//! compared as a whole. Every difference is recorded as a [`Conflict`] with
//! the resolution that was applied, so nothing is lost silently.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SheafConfig;
use crate::error::{ConfigError, Result};

/// Which manifest wins when both set an option differently
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcilePolicy {
    pub prefer: Preference,

    /// Option paths removed from the result, e.g. `dev_server` or
    /// `plugins[html:pages/index.html].minify`
    pub drop: Vec<String>,
}

impl ReconcilePolicy {
    pub fn prefer(prefer: Preference) -> Self {
        Self {
            prefer,
            drop: Vec::new(),
        }
    }

    pub fn dropping(mut self, path: impl Into<String>) -> Self {
        self.drop.push(path.into());
        self
    }

    fn drops(&self, path: &str) -> bool {
        self.drop.iter().any(|p| p == path)
    }

    fn drops_below(&self, path: &str) -> bool {
        self.drop.iter().any(|p| {
            p.len() > path.len() && p.starts_with(path) && p[path.len()..].starts_with('.')
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Both set it; the primary value was kept
    KeptPrimary,
    /// Both set it; the secondary value was adopted
    AdoptedSecondary,
    /// Only the primary sets it; kept
    KeptOnlyInPrimary,
    /// Only the secondary sets it; adopted
    AdoptedOnlyInSecondary,
    /// Removed from the result by policy
    Dropped,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Resolution::KeptPrimary => "kept primary",
            Resolution::AdoptedSecondary => "adopted secondary",
            Resolution::KeptOnlyInPrimary => "kept (primary only)",
            Resolution::AdoptedOnlyInSecondary => "adopted (secondary only)",
            Resolution::Dropped => "dropped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub path: String,
    pub primary: Option<Value>,
    pub secondary: Option<Value>,
    pub resolution: Resolution,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub merged: Value,
    pub conflicts: Vec<Conflict>,
}

impl Reconciliation {
    /// True when the two manifests were identical
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Parse the canonical manifest
    pub fn config(&self) -> Result<SheafConfig> {
        SheafConfig::from_value(self.merged.clone())
    }

    /// Render the canonical manifest as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.merged).map_err(|e| ConfigError::InvalidValue {
            field: "toml".to_string(),
            hint: Some(e.to_string()),
        })
    }
}

/// Merge `secondary` into `primary` under `policy`
pub fn reconcile(primary: &Value, secondary: &Value, policy: &ReconcilePolicy) -> Reconciliation {
    let mut walker = Walker {
        policy,
        conflicts: Vec::new(),
    };
    let merged = walker
        .merge("", Some(primary), Some(secondary))
        .unwrap_or_else(|| Value::Object(Map::new()));

    tracing::debug!(conflicts = walker.conflicts.len(), "reconciled manifests");
    Reconciliation {
        merged,
        conflicts: walker.conflicts,
    }
}

struct Walker<'p> {
    policy: &'p ReconcilePolicy,
    conflicts: Vec<Conflict>,
}

impl Walker<'_> {
    fn record(
        &mut self,
        path: &str,
        primary: Option<&Value>,
        secondary: Option<&Value>,
        resolution: Resolution,
    ) {
        self.conflicts.push(Conflict {
            path: path.to_string(),
            primary: primary.cloned(),
            secondary: secondary.cloned(),
            resolution,
        });
    }

    fn merge(
        &mut self,
        path: &str,
        primary: Option<&Value>,
        secondary: Option<&Value>,
    ) -> Option<Value> {
        if primary.is_none() && secondary.is_none() {
            return None;
        }

        if !path.is_empty() && self.policy.drops(path) {
            self.record(path, primary, secondary, Resolution::Dropped);
            return None;
        }

        // A one-sided table is split per key when something inside it is dropped.
        let one_sided_table = matches!(
            (primary, secondary),
            (Some(Value::Object(_)), None) | (None, Some(Value::Object(_)))
        );
        if one_sided_table && self.policy.drops_below(path) {
            let side = primary.or(secondary).and_then(Value::as_object);
            let mut out = Map::new();
            for (key, value) in side.into_iter().flatten() {
                let child = join_key(path, key);
                let (p, s) = match primary {
                    Some(_) => (Some(value), None),
                    None => (None, Some(value)),
                };
                if let Some(value) = self.merge(&child, p, s) {
                    out.insert(key.clone(), value);
                }
            }
            return Some(Value::Object(out));
        }

        match (primary, secondary) {
            (Some(p), None) => {
                self.record(path, Some(p), None, Resolution::KeptOnlyInPrimary);
                Some(p.clone())
            }
            (None, Some(s)) => {
                self.record(path, None, Some(s), Resolution::AdoptedOnlyInSecondary);
                Some(s.clone())
            }
            (Some(Value::Object(p)), Some(Value::Object(s))) => {
                let mut out = Map::new();
                let keys = p.keys().chain(s.keys().filter(|k| !p.contains_key(*k)));
                for key in keys {
                    let child = join_key(path, key);
                    if let Some(value) = self.merge(&child, p.get(key), s.get(key)) {
                        out.insert(key.clone(), value);
                    }
                }
                Some(Value::Object(out))
            }
            (Some(Value::Array(p)), Some(Value::Array(s))) => match (keyed(p), keyed(s)) {
                (Some(p), Some(s)) => {
                    let mut out = Vec::with_capacity(p.len().max(s.len()));
                    let ids = p
                        .iter()
                        .map(|(id, _)| id)
                        .chain(s.iter().map(|(id, _)| id).filter(|id| !contains(&p, id)));
                    for id in ids {
                        let child = format!("{path}[{id}]");
                        if let Some(value) = self.merge(&child, find(&p, id), find(&s, id)) {
                            out.push(value);
                        }
                    }
                    Some(Value::Array(out))
                }
                _ => Some(self.leaf(path, primary, secondary)),
            },
            (Some(_), Some(_)) => Some(self.leaf(path, primary, secondary)),
            (None, None) => None,
        }
    }

    fn leaf(&mut self, path: &str, primary: Option<&Value>, secondary: Option<&Value>) -> Value {
        let (Some(p), Some(s)) = (primary, secondary) else {
            return primary.or(secondary).cloned().unwrap_or(Value::Null);
        };
        if p == s {
            return p.clone();
        }
        match self.policy.prefer {
            Preference::Primary => {
                self.record(path, primary, secondary, Resolution::KeptPrimary);
                p.clone()
            }
            Preference::Secondary => {
                self.record(path, primary, secondary, Resolution::AdoptedSecondary);
                s.clone()
            }
        }
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Identity of an array element: plugins by kind and filename, rules by test
fn identity(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if let Some(kind) = object.get("kind").and_then(Value::as_str) {
        return Some(match object.get("filename").and_then(Value::as_str) {
            Some(filename) => format!("{kind}:{filename}"),
            None => kind.to_string(),
        });
    }
    object
        .get("test")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Elements keyed by identity, if every element has a unique one
fn keyed(items: &[Value]) -> Option<Vec<(String, &Value)>> {
    let mut out: Vec<(String, &Value)> = Vec::with_capacity(items.len());
    for item in items {
        let id = identity(item)?;
        if contains(&out, &id) {
            return None;
        }
        out.push((id, item));
    }
    Some(out)
}

fn contains(items: &[(String, &Value)], id: &str) -> bool {
    items.iter().any(|(key, _)| key == id)
}

fn find<'v>(items: &[(String, &'v Value)], id: &str) -> Option<&'v Value> {
    items.iter().find(|(key, _)| key == id).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_manifests_have_no_conflicts() {
        let manifest = json!({ "entry": { "index": "./index.js" }, "mode": "development" });
        let result = reconcile(&manifest, &manifest, &ReconcilePolicy::default());
        assert!(result.is_clean());
        assert_eq!(result.merged, manifest);
    }

    #[test]
    fn differing_leaf_follows_preference() {
        let primary = json!({ "output": { "path": "dist" } });
        let secondary = json!({ "output": { "path": "build/dist" } });

        let kept = reconcile(&primary, &secondary, &ReconcilePolicy::default());
        assert_eq!(kept.merged["output"]["path"], "dist");
        assert_eq!(kept.conflicts[0].path, "output.path");
        assert_eq!(kept.conflicts[0].resolution, Resolution::KeptPrimary);

        let adopted = reconcile(
            &primary,
            &secondary,
            &ReconcilePolicy::prefer(Preference::Secondary),
        );
        assert_eq!(adopted.merged["output"]["path"], "build/dist");
        assert_eq!(adopted.conflicts[0].resolution, Resolution::AdoptedSecondary);
    }

    #[test]
    fn plugins_are_matched_by_kind_and_filename() {
        let primary = json!({ "plugins": [
            { "kind": "html", "filename": "a.html", "template": "a.html", "minify": false },
            { "kind": "clean" }
        ]});
        let secondary = json!({ "plugins": [
            { "kind": "clean" },
            { "kind": "html", "filename": "a.html", "template": "a.html" }
        ]});

        let result = reconcile(&primary, &secondary, &ReconcilePolicy::default());
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].path, "plugins[html:a.html].minify");
        assert_eq!(result.conflicts[0].resolution, Resolution::KeptOnlyInPrimary);
        assert_eq!(result.merged["plugins"][0]["minify"], false);
    }

    #[test]
    fn dropped_paths_are_removed_and_reported() {
        let primary = json!({ "dev_server": { "hot": true } });
        let secondary = json!({});
        let policy = ReconcilePolicy::default().dropping("dev_server");

        let result = reconcile(&primary, &secondary, &policy);
        assert!(result.merged.get("dev_server").is_none());
        assert_eq!(result.conflicts[0].resolution, Resolution::Dropped);
    }

    #[test]
    fn drop_inside_one_sided_table_keeps_siblings() {
        let primary = json!({ "output": { "path": "dist", "public_path": "../" } });
        let secondary = json!({});
        let policy = ReconcilePolicy::default().dropping("output.public_path");

        let result = reconcile(&primary, &secondary, &policy);
        assert_eq!(result.merged, json!({ "output": { "path": "dist" } }));
        let paths: Vec<_> = result.conflicts.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["output.path", "output.public_path"]);
    }
}
