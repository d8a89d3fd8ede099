//! Head rule tables.
//!
//! A table maps a phrasal category to an ordered list of clauses. Each clause names a
//! search direction and a list of candidate child categories; the first clause that
//! matches a child picks the head.

mod parse_rules;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::RuleError;

/// Category under which a rule file declares its default rule.
pub const DEFAULT_CATEGORY: &str = "*";

const COLLINS_RULES: &str = include_str!("collins.hr");
const MODIFIED_COLLINS_RULES: &str = include_str!("modcollins.hr");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  /// For each candidate in order, the leftmost child with that category.
  Left,
  /// For each candidate in order, the rightmost child with that category.
  Right,
  /// The leftmost child whose category is any of the candidates.
  LeftDis,
  /// The rightmost child whose category is any of the candidates.
  RightDis,
}

impl Direction {
  pub fn is_leftward(self) -> bool {
    matches!(self, Self::Left | Self::LeftDis)
  }
}

impl FromStr for Direction {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "left" => Ok(Self::Left),
      "right" => Ok(Self::Right),
      "leftdis" => Ok(Self::LeftDis),
      "rightdis" => Ok(Self::RightDis),
      other => Err(format!("unknown direction {}", other)),
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Left => "left",
      Self::Right => "right",
      Self::LeftDis => "leftdis",
      Self::RightDis => "rightdis",
    };
    write!(f, "{}", s)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadClause {
  pub direction: Direction,
  pub categories: Vec<String>,
}

impl HeadClause {
  pub fn new(direction: Direction, categories: Vec<String>) -> Self {
    Self {
      direction,
      categories,
    }
  }

  pub fn contains(&self, category: &str) -> bool {
    self.categories.iter().any(|c| c == category)
  }
}

impl fmt::Display for HeadClause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.direction)?;
    for c in self.categories.iter() {
      write!(f, " {}", c)?;
    }
    Ok(())
  }
}

/// An immutable-once-built head rule table. Share it between head finders and threads
/// with an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadRuleTable {
  rules: HashMap<String, Vec<HeadClause>>,
  default_rule: Option<Vec<HeadClause>>,
}

impl HeadRuleTable {
  pub fn new() -> Self {
    Default::default()
  }

  /// Collins (1999) head rules for the Penn Treebank.
  pub fn collins() -> Self {
    COLLINS_RULES
      .parse()
      .expect("built-in collins head rules are valid")
  }

  /// The revised Penn Treebank rules: better coverage of NML, JJP and auxiliaries,
  /// and disjunctive NP/ADJP/ADVP clauses.
  pub fn modified_collins() -> Self {
    MODIFIED_COLLINS_RULES
      .parse()
      .expect("built-in modified collins head rules are valid")
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
    fs::read_to_string(path)?.parse()
  }

  pub fn insert(
    &mut self,
    category: impl Into<String>,
    clauses: Vec<HeadClause>,
  ) -> Result<(), RuleError> {
    let category = category.into();
    if self.rules.contains_key(&category) {
      return Err(RuleError::Duplicate(category));
    }
    self.rules.insert(category, clauses);
    Ok(())
  }

  pub fn set_default(&mut self, clauses: Vec<HeadClause>) {
    self.default_rule = Some(clauses);
  }

  pub fn get(&self, category: &str) -> Option<&[HeadClause]> {
    self.rules.get(category).map(Vec::as_slice)
  }

  pub fn default_rule(&self) -> Option<&[HeadClause]> {
    self.default_rule.as_deref()
  }

  /// The rule for `category`, falling back to the default rule.
  pub fn rule_for(&self, category: &str) -> Option<&[HeadClause]> {
    self.get(category).or_else(|| self.default_rule())
  }

  /// Categories with a rule of their own, sorted.
  pub fn categories(&self) -> Vec<&str> {
    let mut cats: Vec<_> = self.rules.keys().map(String::as_str).collect();
    cats.sort_unstable();
    cats
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn write_rule(f: &mut fmt::Formatter<'_>, category: &str, clauses: &[HeadClause]) -> fmt::Result {
  write!(f, "{} ->", category)?;
  for (idx, clause) in clauses.iter().enumerate() {
    if idx > 0 {
      write!(f, " |")?;
    }
    write!(f, " {}", clause)?;
  }
  writeln!(f, ";")
}

/// Writes the table back in rule file syntax, categories sorted.
impl fmt::Display for HeadRuleTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for cat in self.categories() {
      write_rule(f, cat, &self.rules[cat])?;
    }
    if let Some(default) = &self.default_rule {
      write_rule(f, DEFAULT_CATEGORY, default)?;
    }
    Ok(())
  }
}

/// Names for the built-in tables, for picking one from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
  Collins,
  ModifiedCollins,
}

impl RuleSet {
  pub fn table(self) -> HeadRuleTable {
    match self {
      Self::Collins => HeadRuleTable::collins(),
      Self::ModifiedCollins => HeadRuleTable::modified_collins(),
    }
  }
}

impl FromStr for RuleSet {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "collins" => Ok(Self::Collins),
      "modcollins" | "modified-collins" => Ok(Self::ModifiedCollins),
      other => Err(format!("unknown head rule set {}", other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_tables_load() {
    let collins = HeadRuleTable::collins();
    assert!(collins.get("NP").is_some());
    assert!(collins.get("VP").is_some());
    assert_eq!(collins.get("NP").unwrap().len(), 5);
    assert_eq!(collins.get("PP").unwrap()[0].direction, Direction::Right);

    let modified = HeadRuleTable::modified_collins();
    assert!(modified.get("NML").is_some());
    assert!(modified.get("ROOT").is_some());
    assert!(modified.len() > collins.len());
  }

  #[test]
  fn test_builtin_rule_files_parse() {
    // the table constructors rely on these parsing cleanly
    for src in [COLLINS_RULES, MODIFIED_COLLINS_RULES] {
      if let Err(e) = src.parse::<HeadRuleTable>() {
        panic!("built-in rules failed to parse: {}", e);
      }
    }
  }

  #[test]
  fn test_display_round_trip() {
    let table = HeadRuleTable::modified_collins();
    let reparsed: HeadRuleTable = table.to_string().parse().unwrap();
    assert_eq!(table, reparsed);
  }

  #[test]
  fn test_rule_for_falls_back_to_default() {
    let mut table: HeadRuleTable = "NP -> right NN;".parse().unwrap();
    assert!(table.rule_for("XYZ").is_none());
    table.set_default(vec![HeadClause::new(Direction::Left, vec![])]);
    assert_eq!(table.rule_for("XYZ").unwrap()[0].direction, Direction::Left);
    assert_eq!(table.rule_for("NP").unwrap()[0].direction, Direction::Right);
  }

  #[test]
  fn test_rule_set_names() {
    assert_eq!("collins".parse::<RuleSet>(), Ok(RuleSet::Collins));
    assert_eq!("ModCollins".parse::<RuleSet>(), Ok(RuleSet::ModifiedCollins));
    assert!("stanford".parse::<RuleSet>().is_err());
    assert_eq!(RuleSet::Collins.table(), HeadRuleTable::collins());
  }
}
