use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One level of a structural path: a tag name and the 1-based position of
/// the element among preceding siblings with the same tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    pub index: usize,
}

impl PathStep {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            index,
        }
    }
}

/// Location of an element relative to a root scope, outermost step first
///
/// Serializes as `/tag[n]/tag[n]`; the empty path is `/` and addresses the
/// scope itself. A stored path that does not parse is kept verbatim and
/// never resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StructuralPath {
    pub steps: Vec<PathStep>,
    malformed: Option<String>,
}

impl StructuralPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps, malformed: None }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.malformed.is_none()
    }

    /// False for a stored path that failed to parse
    pub fn is_well_formed(&self) -> bool {
        self.malformed.is_none()
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.malformed {
            return f.write_str(raw);
        }
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("structural path must start with '/': {0:?}")]
    NotAbsolute(String),

    #[error("malformed path step {0:?}")]
    BadStep(String),
}

impl FromStr for StructuralPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| PathParseError::NotAbsolute(s.to_string()))?;

        let mut steps = Vec::new();
        for raw in rest.split('/').filter(|part| !part.is_empty()) {
            let bad = || PathParseError::BadStep(raw.to_string());
            let (tag, index) = raw.split_once('[').ok_or_else(bad)?;
            let index: usize = index
                .strip_suffix(']')
                .and_then(|n| n.parse().ok())
                .ok_or_else(bad)?;
            if tag.is_empty() || index == 0 {
                return Err(bad());
            }
            steps.push(PathStep::new(tag, index));
        }
        Ok(Self::new(steps))
    }
}

impl From<String> for StructuralPath {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self {
            steps: Vec::new(),
            malformed: Some(value),
        })
    }
}

impl From<StructuralPath> for String {
    fn from(path: StructuralPath) -> Self {
        path.to_string()
    }
}

/// Position-independent descriptor of one decorated run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Path to the element that contained the decoration
    #[serde(rename = "xpath")]
    pub structural_path: StructuralPath,
    /// Decorated text; the key used to relocate the run
    #[serde(rename = "text")]
    pub text_snippet: String,
    /// Length of the text preceding the decoration in its parent.
    /// Diagnostic only.
    #[serde(rename = "offset", default)]
    pub offset_within_snippet: usize,
}
