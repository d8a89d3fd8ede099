/// Simple recursive-descent parsing of head rule files
///
/// ```text
/// // comment
/// NP -> rightdis NN NNP NNPS NNS NX POS JJR | left NP | right CD;
/// *  -> left;
/// ```
use std::str::FromStr;

use super::{Direction, HeadClause, HeadRuleTable, DEFAULT_CATEGORY};
use crate::error::RuleError;

/// A parse failure and the input remaining where it happened, so the caller can
/// recover a line number.
struct Failure<'a> {
  error: Fault,
  at: &'a str,
}

enum Fault {
  Syntax(String),
  UnknownDirection { category: String, keyword: String },
}

type ParseResult<'a, T> = Result<(T, &'a str), Failure<'a>>;

fn syntax<'a>(message: String, at: &'a str) -> Failure<'a> {
  Failure {
    error: Fault::Syntax(message),
    at,
  }
}

/// Try to consume a regex, returning None if it doesn't match at the start of s
fn optional_re<'a>(re: &'static regex::Regex, s: &'a str) -> (Option<&'a str>, &'a str) {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> (Option<char>, &str) {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Tries to skip whitespace and // comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(\s|//[^\n]*)+");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// A category name: anything up to whitespace, `|` or `;`. Covers `$`, `-LRB-`, `''`.
fn parse_category(s: &str) -> ParseResult<'_, &str> {
  regex_static!(CATEGORY, r"[^\s|;]+");
  match optional_re(&CATEGORY, s) {
    (Some(name), rest) if name != "->" => Ok((name, rest)),
    _ => Err(syntax("expected a category".to_string(), s)),
  }
}

/// direction keyword, then zero or more candidate categories
fn parse_clause<'a>(category: &str, s: &'a str) -> ParseResult<'a, HeadClause> {
  let (keyword, rest) =
    parse_category(s).map_err(|f| syntax("expected a direction".to_string(), f.at))?;
  let direction = Direction::from_str(keyword).map_err(|_| Failure {
    error: Fault::UnknownDirection {
      category: category.to_string(),
      keyword: keyword.to_string(),
    },
    at: s,
  })?;

  let mut categories = Vec::new();
  let mut rem = skip_whitespace(rest);
  while !rem.starts_with('|') && !rem.starts_with(';') {
    if rem.is_empty() {
      return Err(syntax(format!("rule for {} is missing its closing ;", category), rem));
    }
    let (cat, s) = parse_category(rem)?;
    categories.push(cat.to_string());
    rem = skip_whitespace(s);
  }

  Ok((HeadClause::new(direction, categories), rem))
}

/// Category, arrow, clauses separated by `|`, terminated by `;`
fn parse_rule(s: &str) -> ParseResult<'_, (String, Vec<HeadClause>)> {
  let (category, s) = parse_category(s)?;
  let s = skip_whitespace(s);
  let s = s
    .strip_prefix("->")
    .ok_or_else(|| syntax(format!("expected -> after {}", category), s))?;

  let mut clauses = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    let (clause, s) = parse_clause(category, rem)?;
    clauses.push(clause);
    if let (Some(_), s) = optional_char(';', s) {
      rem = s;
      break;
    }
    rem = optional_char('|', s).1;
  }

  Ok(((category.to_string(), clauses), rem))
}

fn line_of(src: &str, at: &str) -> usize {
  let offset = src.len() - at.len();
  1 + src[..offset].matches('\n').count()
}

impl FromStr for HeadRuleTable {
  type Err = RuleError;

  /// Parses a head rule table. The category `*` defines the default rule applied to
  /// categories without an entry of their own.
  fn from_str(src: &str) -> Result<Self, Self::Err> {
    let mut table = HeadRuleTable::new();
    let mut rem = src;
    loop {
      rem = skip_whitespace(rem);
      if rem.is_empty() {
        return Ok(table);
      }

      let ((category, clauses), s) = parse_rule(rem).map_err(|f| match f.error {
        Fault::Syntax(message) => RuleError::Parse {
          line: line_of(src, f.at),
          message,
        },
        Fault::UnknownDirection { category, keyword } => {
          RuleError::UnknownDirection { category, keyword }
        }
      })?;

      if category == DEFAULT_CATEGORY {
        if table.default_rule().is_some() {
          return Err(RuleError::Duplicate(category));
        }
        table.set_default(clauses);
      } else {
        table.insert(category, clauses)?;
      }
      rem = s;
    }
  }
}
