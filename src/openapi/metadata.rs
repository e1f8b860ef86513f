//! Per-endpoint documentation metadata
//!
//! A test declares what it documents by attaching an [`EndpointDoc`] to the
//! request it sends. The same metadata can be written in the annotation
//! style (`@apifox.name Create user`) and parsed with
//! [`EndpointDoc::from_annotations`].

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::schema::{AttributeLabels, RuleSet};

/// `@key value` or bare `@key`
static ANNOTATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w.]+)\s*(.+)?").expect("annotation regex is valid"));

const KEY_NAME: &str = "apifox.name";
const KEY_TAGS: &str = "apifox.tags";
const KEY_DESCRIPTION: &str = "apifox.description";
const KEY_DEPRECATED: &str = "apifox.deprecated";
const KEY_WITH_HEADERS: &str = "apifox.withHeaders";
const KEY_TEST: &str = "test";

/// Value of one parsed annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Text(String),
    /// Annotation present without a value
    Flag,
}

impl Annotation {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Annotation::Text(text) => Some(text),
            Annotation::Flag => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Annotation::Flag => true,
            Annotation::Text(text) => {
                let text = text.trim().to_ascii_lowercase();
                !matches!(text.as_str(), "" | "0" | "false" | "no" | "off")
            }
        }
    }
}

/// Parse annotation lines. The first occurrence of a key wins.
pub fn parse_annotations(text: &str) -> BTreeMap<String, Annotation> {
    let mut annotations = BTreeMap::new();
    for line in text.lines().filter(|line| line.contains('@')) {
        let Some(captures) = ANNOTATION_REGEX.captures(line.trim_end()) else {
            continue;
        };
        let key = captures[1].to_string();
        let value = captures
            .get(2)
            .map(|m| m.as_str().trim().trim_end_matches("*/").trim_end())
            .filter(|v| !v.is_empty())
            .map_or(Annotation::Flag, |v| Annotation::Text(v.to_string()));
        annotations.entry(key).or_insert(value);
    }
    annotations
}

/// Documentation metadata for one endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointDoc {
    /// Operation summary; endpoints without a name are not pushed
    pub name: Option<String>,
    /// Fallback summary, normally the test's name
    pub test_name: Option<String>,
    /// Folder path, `/` separated (e.g. `Users/Admin`)
    pub folder: String,
    pub description: String,
    pub deprecated: bool,
    /// Document the request headers as header parameters
    pub with_headers: bool,
    /// Validation rules for the request body
    pub rules: RuleSet,
    /// Field titles for the request body
    pub attributes: AttributeLabels,
}

impl EndpointDoc {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    /// Build metadata from annotation text such as a test's doc comment
    pub fn from_annotations(text: &str) -> Self {
        let annotations = parse_annotations(text);
        let text_of =
            |key: &str| annotations.get(key).and_then(Annotation::as_text).map(str::to_string);
        let flag_of = |key: &str| annotations.get(key).is_some_and(Annotation::as_bool);

        Self {
            name: text_of(KEY_NAME),
            test_name: text_of(KEY_TEST),
            folder: text_of(KEY_TAGS).unwrap_or_default(),
            description: text_of(KEY_DESCRIPTION).unwrap_or_default(),
            deprecated: flag_of(KEY_DEPRECATED),
            with_headers: flag_of(KEY_WITH_HEADERS),
            ..Default::default()
        }
    }

    pub fn folder<S: Into<String>>(mut self, folder: S) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn test_name<S: Into<String>>(mut self, test_name: S) -> Self {
        self.test_name = Some(test_name.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_headers(mut self, with_headers: bool) -> Self {
        self.with_headers = with_headers;
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn attributes(mut self, attributes: AttributeLabels) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether this endpoint should be pushed at all
    pub fn is_documented(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }

    /// Summary: the name, else the test name, else the route
    pub fn summary(&self, uri: &str) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.test_name.clone())
            .unwrap_or_else(|| uri.to_string())
    }

    /// Every prefix of the folder path: `a/b` gives `a`, `a/b`
    pub fn folder_tags(&self) -> Vec<String> {
        if self.folder.is_empty() {
            return Vec::new();
        }
        let parts: Vec<&str> = self.folder.split('/').collect();
        (1..=parts.len()).map(|i| parts[..i].join("/")).collect()
    }
}
