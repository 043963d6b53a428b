//! Line classifier for the Gemfile subset understood by gemkit.
//!
//! Grammar, checked in this order:
//! ```text
//! <blank>
//! # anything            comment
//! source anything       source directive
//! gem <identifier>      package declaration
//! anything else         malformed
//! ```
//!
//! A declaration must be exactly `gem`, whitespace, and one identifier that
//! runs to the end of the line. Version pins, quoting and options are not
//! understood: `gem "rails", "~> 7.0"` is malformed, never partially parsed.

use crate::types::{PackageName, is_identifier, is_separator};
use serde::Serialize;

const COMMENT_MARKER: char = '#';
const SOURCE_KEYWORD: &str = "source";
const GEM_KEYWORD: &str = "gem";

/// Classification of a single manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationLine {
    /// Line begins with `#`
    Comment,
    /// Empty or whitespace-only line
    Blank,
    /// Line begins with `source`
    SourceDirective,
    /// `gem <identifier>`
    PackageDeclaration {
        /// The declared gem
        name: PackageName,
    },
    /// Anything else, kept verbatim for diagnostics
    Malformed {
        /// The line as it appeared in the manifest
        raw: String,
    },
}

impl DeclarationLine {
    /// Short label for display and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DeclarationLine::Comment => "comment",
            DeclarationLine::Blank => "blank",
            DeclarationLine::SourceDirective => "source",
            DeclarationLine::PackageDeclaration { .. } => "gem",
            DeclarationLine::Malformed { .. } => "malformed",
        }
    }

    /// The declared gem, if this is a package declaration.
    pub fn package_name(&self) -> Option<&PackageName> {
        match self {
            DeclarationLine::PackageDeclaration { name } => Some(name),
            _ => None,
        }
    }

    /// Whether the reconciler ignores this line entirely.
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            DeclarationLine::Comment | DeclarationLine::Blank | DeclarationLine::SourceDirective
        )
    }
}

/// Classify one line. The line terminator must already be removed.
pub fn classify_line(line: &str) -> DeclarationLine {
    if line.trim_matches(is_separator).is_empty() {
        return DeclarationLine::Blank;
    }

    if line.starts_with(COMMENT_MARKER) {
        return DeclarationLine::Comment;
    }

    if line.starts_with(SOURCE_KEYWORD) {
        return DeclarationLine::SourceDirective;
    }

    match parse_declaration(line) {
        Some(name) => DeclarationLine::PackageDeclaration {
            name: PackageName::new_unchecked(name),
        },
        None => DeclarationLine::Malformed {
            raw: line.to_string(),
        },
    }
}

/// Match `gem`, at least one ASCII whitespace character, then an identifier that
/// consumes the rest of the line.
fn parse_declaration(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(GEM_KEYWORD)?;
    let name = rest.trim_start_matches(is_separator);

    // "gem" must be followed by whitespace, not glued to the name
    if name.len() == rest.len() {
        return None;
    }

    is_identifier(name).then_some(name)
}
