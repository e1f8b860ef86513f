//! Validation rules and attribute labels
//!
//! Rules are pipe-delimited keyword strings keyed by a dotted or bracketed
//! field path (`user.name`, `items[0][id]`, `items.*.id`). Only a handful of
//! keywords matter for documentation; they are detected by substring
//! containment, so `required|integer|min:1` reads as required + integer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::{Mapping, RuntimeValue};

const KEYWORD_REQUIRED: &str = "required";
const KEYWORD_INTEGER: &str = "integer";
const KEYWORD_DECIMAL: &str = "decimal";
const KEYWORD_ARRAY: &str = "array";
const KEYWORD_BOOLEAN: &str = "boolean";

/// Placeholder value type implied by a rule string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Integer,
    Decimal,
    Array,
    Boolean,
    String,
}

impl RuleKind {
    /// Detect the value type of a rule. Earlier keywords win.
    pub fn from_rule(rule: &str) -> Self {
        if rule.contains(KEYWORD_INTEGER) {
            RuleKind::Integer
        } else if rule.contains(KEYWORD_DECIMAL) {
            RuleKind::Decimal
        } else if rule.contains(KEYWORD_ARRAY) {
            RuleKind::Array
        } else if rule.contains(KEYWORD_BOOLEAN) {
            RuleKind::Boolean
        } else {
            RuleKind::String
        }
    }

    /// Default value synthesized for a field that is validated but absent
    pub fn placeholder(self) -> RuntimeValue {
        match self {
            RuleKind::Integer => RuntimeValue::from(0),
            RuleKind::Decimal => RuntimeValue::from(0.01),
            RuleKind::Array => RuntimeValue::Sequence(Vec::new()),
            RuleKind::Boolean => RuntimeValue::Bool(true),
            RuleKind::String => RuntimeValue::String(String::new()),
        }
    }
}

/// Whether a rule string marks its field as required
pub fn is_required(rule: &str) -> bool {
    rule.contains(KEYWORD_REQUIRED)
}

/// Ordered mapping from field path to rule string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct RuleSet {
    rules: Vec<(String, String)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing any previous rule for the same path
    pub fn with_rule<K: Into<String>, R: Into<String>>(mut self, path: K, rule: R) -> Self {
        self.insert(path, rule);
        self
    }

    pub fn insert<K: Into<String>, R: Into<String>>(&mut self, path: K, rule: R) {
        let path = path.into();
        let rule = rule.into();
        match self.rules.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = rule,
            None => self.rules.push((path, rule)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.rules.iter().find(|(p, _)| p == path).map(|(_, r)| r.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(p, r)| (p.as_str(), r.as_str()))
    }

    /// Rule paths marked `required`, in declaration order
    pub fn required_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, rule)| is_required(rule))
            .map(|(path, _)| path.to_string())
            .collect()
    }
}

impl<K: Into<String>, R: Into<String>> FromIterator<(K, R)> for RuleSet {
    fn from_iter<T: IntoIterator<Item = (K, R)>>(iter: T) -> Self {
        let mut set = RuleSet::new();
        for (path, rule) in iter {
            set.insert(path, rule);
        }
        set
    }
}

impl TryFrom<Map<String, Value>> for RuleSet {
    type Error = String;

    /// Accepts `"required|integer"` strings or `["required", "integer"]` lists.
    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut set = RuleSet::new();
        for (path, rule) in map {
            let rule = match rule {
                Value::String(s) => s,
                Value::Array(parts) => parts
                    .iter()
                    .map(|part| {
                        part.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| format!("rule for '{}' must contain only strings", path))
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .join("|"),
                other => return Err(format!("rule for '{}' must be a string, got {}", path, other)),
            };
            set.insert(path, rule);
        }
        Ok(set)
    }
}

impl From<RuleSet> for Map<String, Value> {
    fn from(set: RuleSet) -> Self {
        set.rules.into_iter().map(|(p, r)| (p, Value::String(r))).collect()
    }
}

/// Human-readable titles for fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeLabels {
    labels: Map<String, Value>,
}

impl AttributeLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label<K: Into<String>, L: Into<String>>(mut self, path: K, label: L) -> Self {
        self.labels.insert(path.into(), Value::String(label.into()));
        self
    }

    /// Title for a field, or an empty string when none is declared.
    ///
    /// An exact key wins; otherwise `a.b` and `a[b]` walk nested label
    /// objects. Only string labels count.
    pub fn title(&self, path: &str) -> String {
        let label = self.labels.get(path).or_else(|| {
            let mut segments = parse_path(path).into_iter();
            let first = self.labels.get(&segments.next()?)?;
            segments.try_fold(first, |node, segment| node.as_object()?.get(&segment))
        });
        match label {
            Some(Value::String(label)) => label.clone(),
            _ => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>, L: Into<String>> FromIterator<(K, L)> for AttributeLabels {
    fn from_iter<T: IntoIterator<Item = (K, L)>>(iter: T) -> Self {
        iter.into_iter().fold(AttributeLabels::new(), |labels, (k, l)| labels.with_label(k, l))
    }
}

/// Split a field path into its segments.
///
/// `a.b`, `a[b]` and `a[b].c` all address nested keys; empty segments
/// (`tags[]`) are kept so form decoding can treat them as appends.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for dotted in path.split('.') {
        let mut rest = dotted;
        match rest.find('[') {
            Some(open) if open > 0 => {
                segments.push(rest[..open].to_string());
                rest = &rest[open..];
            }
            Some(_) => {}
            None => {
                segments.push(rest.to_string());
                continue;
            }
        }
        while let Some(stripped) = rest.strip_prefix('[') {
            match stripped.find(']') {
                Some(close) => {
                    segments.push(stripped[..close].to_string());
                    rest = &stripped[close + 1..];
                }
                None => {
                    segments.push(stripped.to_string());
                    rest = "";
                }
            }
        }
    }
    segments
}

/// Insert `value` at a nested path unless something is already there.
///
/// Intermediate segments that hold a non-mapping value are replaced by a
/// mapping. The `*` wildcard addresses index 0, so `items.*.id` produces a
/// one-element list whose element carries `id`.
pub fn insert_if_absent(target: &mut Mapping, path: &str, value: RuntimeValue) {
    let segments: Vec<String> = parse_path(path)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| if s == "*" { "0".to_string() } else { s })
        .collect();
    if segments.is_empty() {
        return;
    }
    insert_segments(target, &segments, value);
}

fn insert_segments(target: &mut Mapping, segments: &[String], value: RuntimeValue) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        if !target.contains_key(head) {
            target.insert(head.clone(), value);
        }
        return;
    }

    let needs_mapping = !matches!(target.get(head), Some(RuntimeValue::Mapping(_)));
    if needs_mapping {
        let existing = target.get(head).cloned();
        target.insert(head.clone(), RuntimeValue::Mapping(into_mapping(existing)));
    }
    if let Some(RuntimeValue::Mapping(child)) = target.get_mut(head) {
        insert_segments(child, rest, value);
    }
}

/// Keep sequence elements addressable by index when a path descends into them
fn into_mapping(existing: Option<RuntimeValue>) -> Mapping {
    match existing {
        Some(RuntimeValue::Sequence(items)) => {
            items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect()
        }
        _ => Mapping::new(),
    }
}

/// Turn mappings keyed purely by decimal indices back into lists, recursively
pub fn normalize_indexed(value: RuntimeValue) -> RuntimeValue {
    match value {
        RuntimeValue::Mapping(map) => {
            let all_indices = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
            if all_indices {
                let entries: Vec<(usize, RuntimeValue)> = map
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, normalize_indexed(v))))
                    .collect();
                RuntimeValue::from_indexed(entries)
            } else {
                let entries = map.into_iter().map(|(k, v)| (k, normalize_indexed(v)));
                RuntimeValue::Mapping(entries.collect())
            }
        }
        RuntimeValue::Sequence(items) => {
            RuntimeValue::Sequence(items.into_iter().map(normalize_indexed).collect())
        }
        other => other,
    }
}
