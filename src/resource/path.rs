//! Resource Paths
//!
//! Hierarchical Chronicle resource names such as
//! `projects/P/locations/L/instances/I/logTypes/T/parsers/ID`.
//!
//! A path is an ordered list of `(name, value)` segments, root first. The last
//! segment is the resource the path points at. When its value is empty the path
//! names a collection (`.../logTypes`) rather than a single resource
//! (`.../logTypes/WINEVTLOG`).

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const PROJECTS: &str = "projects";
pub const LOCATIONS: &str = "locations";
pub const INSTANCES: &str = "instances";
pub const LOG_TYPES: &str = "logTypes";
pub const PARSERS: &str = "parsers";
pub const LOGS: &str = "logs";

/// Tokens in `projects/{p}/locations/{l}/instances/{i}`
const PREFIX_TOKENS: usize = 6;

/// One `name/value` pair of a resource path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSegment {
    pub name: String,
    pub value: String,
}

impl PathSegment {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

/// A Chronicle resource name
///
/// An empty path (no segments) marks an invalid name: it is what the
/// constructors return when project, location or instance is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    /// Build the instance-level path `projects/{p}/locations/{l}/instances/{i}`
    pub fn new(project: &str, location: &str, instance: &str) -> Self {
        if project.is_empty() || location.is_empty() || instance.is_empty() {
            return Self::default();
        }

        Self {
            segments: vec![
                PathSegment::new(PROJECTS, project),
                PathSegment::new(LOCATIONS, location),
                PathSegment::new(INSTANCES, instance),
            ],
        }
    }

    /// Build an instance-level path followed by explicit `(name, value)` pairs
    pub fn with_segments<I, N, V>(project: &str, location: &str, instance: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(project, location, instance), |path, (name, value)| {
                path.with(name, value)
            })
    }

    /// Build a path from a flat token list after the instance prefix
    ///
    /// Tokens alternate name, value, name, value. An odd number of tokens
    /// leaves the last name without a value.
    pub fn from_tokens<S: AsRef<str>>(project: &str, location: &str, instance: &str, tokens: &[S]) -> Self {
        let mut path = Self::new(project, location, instance);
        if path.is_empty() {
            return path;
        }

        for (i, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            if i % 2 == 0 {
                path.segments.push(PathSegment::new(token, ""));
            } else if let Some(last) = path.segments.last_mut() {
                last.value = token.to_string();
            }
        }

        path
    }

    /// Append a segment. An empty value makes the path a collection path.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if !self.is_empty() {
            self.segments.push(PathSegment::new(name, value));
        }
        self
    }

    /// Parse a slash-separated resource name
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split('/').collect();
        if tokens.len() < PREFIX_TOKENS {
            return Err(Error::MalformedPath(text.to_string()));
        }

        let path = Self::from_tokens(tokens[1], tokens[3], tokens[5], &tokens[PREFIX_TOKENS..]);
        if path.is_empty() {
            return Err(Error::InvalidPath(text.to_string()));
        }

        Ok(path)
    }

    /// The last (most specific) segment
    pub fn resource(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the invalid marker
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the path names a single resource rather than a collection
    pub fn has_value(&self) -> bool {
        self.resource().is_some_and(PathSegment::has_value)
    }

    /// The enclosing collection path, as text
    ///
    /// `.../logTypes/WINEVTLOG` becomes `.../logTypes`. A collection path is
    /// returned unchanged.
    pub fn strip_last_value(&self) -> String {
        if !self.has_value() {
            return self.to_string();
        }

        let mut stripped = self.clone();
        if let Some(last) = stripped.segments.last_mut() {
            last.value.clear();
        }
        stripped.to_string()
    }

    /// Segment names mapped to their values
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.segments
            .iter()
            .rev()
            .map(|s| (s.name.clone(), s.value.clone()))
            .collect()
    }

    /// Value of the first segment called `name`
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.as_str())
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let tokens = self
            .segments
            .iter()
            .flat_map(|s| [s.name.as_str(), s.value.as_str()])
            .filter(|t| !t.is_empty());

        for token in tokens {
            if !first {
                f.write_str("/")?;
            }
            f.write_str(token)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ResourcePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ResourcePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourcePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
