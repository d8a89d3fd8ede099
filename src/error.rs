use std::io;

use thiserror::Error;

/// Errors raised while reading bracketed trees.
#[derive(Debug, Error)]
pub enum TreeError {
  /// The underlying stream failed. Fatal for the reader or corpus iterator that hit it.
  #[error("i/o error reading {source_name}: {error}")]
  Io {
    source_name: String,
    #[source]
    error: io::Error,
  },

  /// The stream ended while a tree was still open.
  #[error("ragged tree in {source_name} starting at line {line}: stream ended at depth {depth}")]
  Ragged {
    source_name: String,
    line: usize,
    depth: usize,
  },
}

/// Errors raised by a head finder. These indicate a rule-table or category coverage
/// problem and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadError {
  #[error("cannot determine the head of leaf {0:?}")]
  Leaf(String),

  #[error("no head rule for category {0:?} and the table has no default rule")]
  MissingRule(String),

  #[error("every child of {0:?} is in the avoided categories")]
  AllChildrenAvoided(String),
}

/// Errors raised while loading a head rule table.
#[derive(Debug, Error)]
pub enum RuleError {
  #[error("rule table parse error at line {line}: {message}")]
  Parse { line: usize, message: String },

  #[error("unknown direction {keyword:?} in rule for {category}")]
  UnknownDirection { category: String, keyword: String },

  #[error("duplicate rule for category {0}")]
  Duplicate(String),

  #[error("i/o error reading rule table: {0}")]
  Io(#[from] io::Error),
}
