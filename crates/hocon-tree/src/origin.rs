//! Source origins attached to tokens and values.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

/// Where a token or value came from.
///
/// Origins are cheap to clone (shared internally) because every value in
/// a config tree carries one. Merging two values produces a merged origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    data: Arc<OriginData>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct OriginData {
    description: String,
    path: Option<PathBuf>,
    line: Option<u32>,
    comments: Vec<String>,
}

impl Origin {
    /// Create an origin with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            data: Arc::new(OriginData {
                description: description.into(),
                path: None,
                line: None,
                comments: Vec::new(),
            }),
        }
    }

    /// Create an origin for a file.
    pub fn new_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            data: Arc::new(OriginData {
                description: format!("file: {}", path.display()),
                path: Some(path),
                line: None,
                comments: Vec::new(),
            }),
        }
    }

    /// Return a copy of this origin with a line number.
    pub fn with_line(&self, line: u32) -> Self {
        Self {
            data: Arc::new(OriginData {
                description: self.data.description.clone(),
                path: self.data.path.clone(),
                line: Some(line),
                comments: self.data.comments.clone(),
            }),
        }
    }

    /// Return a copy of this origin with a suffix appended to the
    /// description, e.g. `" (not found)"`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            data: Arc::new(OriginData {
                description: format!("{}{}", self.data.description, suffix),
                path: self.data.path.clone(),
                line: self.data.line,
                comments: self.data.comments.clone(),
            }),
        }
    }

    /// Return a copy of this origin carrying the comment lines that
    /// preceded the value in the source.
    pub fn with_comments(&self, comments: Vec<String>) -> Self {
        Self {
            data: Arc::new(OriginData {
                description: self.data.description.clone(),
                path: self.data.path.clone(),
                line: self.data.line,
                comments,
            }),
        }
    }

    /// Comment lines attached to this origin (marker stripped).
    pub fn comments(&self) -> &[String] {
        &self.data.comments
    }

    /// Combine the origins of two merged values.
    pub fn merged(a: &Origin, b: &Origin) -> Self {
        if a == b {
            return a.clone();
        }
        Self {
            data: Arc::new(OriginData {
                description: format!("merge of {},{}", a.data.description, b.data.description),
                path: None,
                line: None,
                comments: Vec::new(),
            }),
        }
    }

    /// The plain description, without line number.
    pub fn description(&self) -> &str {
        &self.data.description
    }

    /// The file this origin points into, if any.
    pub fn file_path(&self) -> Option<&FsPath> {
        self.data.path.as_deref()
    }

    /// The 1-based line number, if known.
    pub fn line(&self) -> Option<u32> {
        self.data.line
    }

    /// Human-readable form: `description: line`.
    pub fn describe(&self) -> String {
        match self.data.line {
            Some(line) => format!("{}: {}", self.data.description, line),
            None => self.data.description.clone(),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
