use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::error::HeadError;
use crate::headrules::{Direction, HeadClause, HeadRuleTable};
use crate::language::{PennLanguage, TreebankLanguage};
use crate::syntree::SynTree;

/// Picks the head child of a phrase.
pub trait HeadFinder {
  /// Index into `node.children()` of the head child. `parent` is the node's parent, if
  /// the caller knows it.
  fn head_index(&self, node: &SynTree, parent: Option<&SynTree>) -> Result<usize, HeadError>;

  fn determine_head<'t>(
    &self,
    node: &'t SynTree,
    parent: Option<&SynTree>,
  ) -> Result<&'t SynTree, HeadError> {
    let idx = self.head_index(node, parent)?;
    Ok(&node.children()[idx])
  }

  /// Follows head children down to a leaf. A leaf is its own head terminal.
  fn head_terminal<'t>(&self, node: &'t SynTree) -> Result<&'t SynTree, HeadError> {
    let mut parent = None;
    let mut current = node;
    while current.is_branch() {
      let head = self.determine_head(current, parent)?;
      parent = Some(current);
      current = head;
    }
    Ok(current)
  }

  /// Follows head children down to a pre-terminal. Leaves are returned as is.
  fn head_preterminal<'t>(&self, node: &'t SynTree) -> Result<&'t SynTree, HeadError> {
    let mut parent = None;
    let mut current = node;
    while current.is_branch() && !current.is_preterminal() {
      let head = self.determine_head(current, parent)?;
      parent = Some(current);
      current = head;
    }
    Ok(current)
  }
}

/// Rewrites a head choice after the rule table has made it. Receives the chosen index,
/// the children and the treebank language.
pub type PostOperation = fn(usize, &[SynTree], &dyn TreebankLanguage) -> usize;

/// In `X CC X` coordination, moves the head from the right conjunct to the left one,
/// skipping punctuation between the coordinator and the left conjunct.
pub fn coordination_fix(
  head: usize,
  children: &[SynTree],
  language: &dyn TreebankLanguage,
) -> usize {
  if head < 2 {
    return head;
  }
  let prev = language.basic_category(children[head - 1].value());
  if prev != "CC" && prev != "CONJP" {
    return head;
  }

  (0..head - 1)
    .rev()
    .find(|&idx| {
      let child = &children[idx];
      let category = language.basic_category(child.value());
      !(child.is_preterminal() && language.is_punctuation_tag(category))
    })
    .unwrap_or(head)
}

/// Table-driven head finder.
///
/// Clauses of a category's rule are tried in order. Within a clause, children whose
/// category is avoided (punctuation by default) are only considered once the clause
/// matches no other child. If no clause matches, the leftmost or rightmost non-avoided
/// child is the head, depending on the direction of the rule's last clause.
#[derive(Clone)]
pub struct RuleHeadFinder {
  table: Arc<HeadRuleTable>,
  language: Arc<dyn TreebankLanguage>,
  avoid: HashSet<String>,
  post_operation: Option<PostOperation>,
}

impl RuleHeadFinder {
  pub fn new(table: Arc<HeadRuleTable>) -> Self {
    let language = PennLanguage;
    Self {
      table,
      avoid: language.punctuation_tags().iter().map(|t| t.to_string()).collect(),
      language: Arc::new(language),
      post_operation: None,
    }
  }

  /// Collins rules with the coordination fix.
  pub fn collins() -> Self {
    Self::new(Arc::new(HeadRuleTable::collins()))
      .with_post_operation(Some(coordination_fix as PostOperation))
  }

  pub fn modified_collins() -> Self {
    Self::new(Arc::new(HeadRuleTable::modified_collins()))
      .with_post_operation(Some(coordination_fix as PostOperation))
  }

  /// Sets the treebank language, and resets the avoided categories to its punctuation tags.
  pub fn with_language(mut self, language: Arc<dyn TreebankLanguage>) -> Self {
    self.avoid = language.punctuation_tags().iter().map(|t| t.to_string()).collect();
    self.language = language;
    self
  }

  pub fn with_avoid<I, S>(mut self, categories: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.avoid = categories.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_post_operation(mut self, post_operation: Option<PostOperation>) -> Self {
    self.post_operation = post_operation;
    self
  }

  pub fn table(&self) -> &HeadRuleTable {
    &self.table
  }

  pub fn language(&self) -> &dyn TreebankLanguage {
    self.language.as_ref()
  }

  fn locate(&self, clause: &HeadClause, categories: &[&str], allow_avoided: bool) -> Option<usize> {
    let usable = |idx: &usize| allow_avoided || !self.avoid.contains(categories[*idx]);
    let n = categories.len();

    match clause.direction {
      Direction::Left => clause
        .categories
        .iter()
        .find_map(|cand| (0..n).filter(&usable).find(|&i| categories[i] == cand)),
      Direction::Right => clause
        .categories
        .iter()
        .find_map(|cand| (0..n).rev().filter(&usable).find(|&i| categories[i] == cand)),
      Direction::LeftDis => (0..n).filter(&usable).find(|&i| clause.contains(categories[i])),
      Direction::RightDis => (0..n).rev().filter(&usable).find(|&i| clause.contains(categories[i])),
    }
  }

  fn traverse(
    &self,
    parent: &str,
    clauses: &[HeadClause],
    categories: &[&str],
  ) -> Result<usize, HeadError> {
    for clause in clauses {
      let found = self
        .locate(clause, categories, false)
        .or_else(|| self.locate(clause, categories, true));
      if let Some(idx) = found {
        return Ok(idx);
      }
    }

    let leftward = clauses.last().is_none_or(|c| c.direction.is_leftward());
    let mut usable = (0..categories.len()).filter(|&i| !self.avoid.contains(categories[i]));
    let fallback = if leftward { usable.next() } else { usable.next_back() };
    trace!(parent, ?fallback, "no clause matched, using default end child");
    fallback.ok_or_else(|| HeadError::AllChildrenAvoided(parent.to_string()))
  }
}

impl HeadFinder for RuleHeadFinder {
  fn head_index(&self, node: &SynTree, _parent: Option<&SynTree>) -> Result<usize, HeadError> {
    let (label, children) = match node.get_branch() {
      Some((label, children)) if !children.is_empty() => (label, children),
      _ => return Err(HeadError::Leaf(node.value().to_string())),
    };
    if children.len() == 1 {
      return Ok(0);
    }

    let category = self.language.basic_category(label.value_or_empty());
    let clauses = self
      .table
      .rule_for(category)
      .ok_or_else(|| HeadError::MissingRule(category.to_string()))?;

    let categories: Vec<&str> = children
      .iter()
      .map(|c| self.language.basic_category(c.value()))
      .collect();
    let head = self.traverse(category, clauses, &categories)?;

    Ok(match self.post_operation {
      Some(post) => post(head, children, self.language.as_ref()),
      None => head,
    })
  }
}
