//! Gemfile reading and line classification.

pub mod classify;
pub mod reader;

pub use classify::{DeclarationLine, classify_line};
pub use reader::{DEFAULT_MANIFEST, read_manifest};

use serde::Serialize;
use std::path::PathBuf;

/// A manifest read into memory, immutable for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Where the manifest was read from, if anywhere
    pub path: Option<PathBuf>,
    content: String,
}

/// One classified manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedLine {
    /// 1-based line number
    pub line: usize,
    /// Classification of the line
    #[serde(flatten)]
    pub declaration: DeclarationLine,
}

impl Manifest {
    /// Wrap manifest text that did not come from a file.
    pub fn from_string(content: impl Into<String>) -> Self {
        Self {
            path: None,
            content: content.into(),
        }
    }

    /// The raw manifest text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Raw lines with terminators (`\n`, `\r\n` or a final lone `\r`) removed.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Classify lines lazily, in file order.
    pub fn classify(&self) -> impl Iterator<Item = ClassifiedLine> + '_ {
        self.lines().enumerate().map(|(idx, line)| ClassifiedLine {
            line: idx + 1,
            declaration: classify_line(line),
        })
    }

    /// Declared gems, in file order, duplicates included.
    pub fn declared_packages(&self) -> Vec<crate::types::PackageName> {
        self.classify()
            .filter_map(|c| c.declaration.package_name().cloned())
            .collect()
    }
}
