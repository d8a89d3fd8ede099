use std::sync::Arc;

use tracing::trace;

use crate::label::Label;
use crate::language::{PennLanguage, TreebankLanguage};
use crate::syntree::SynTree;

/// Cleanup hooks the reader applies while building trees. Terminal and nonterminal
/// hooks run as tokens are read; the whole-tree hook runs once the tree is complete and
/// may rewrite it or reject it by returning `None`.
pub trait TreeNormalizer: Send + Sync {
  fn normalize_terminal(&self, word: &str) -> String {
    word.to_string()
  }

  fn normalize_nonterminal(&self, category: &str) -> String {
    category.to_string()
  }

  fn normalize_whole_tree(&self, tree: SynTree) -> Option<SynTree> {
    Some(tree)
  }
}

/// Leaves everything as read.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNormalizer;

impl TreeNormalizer for NoopNormalizer {}

/// Penn Treebank cleanup: functional tags are stripped, empty elements and the
/// constituents they leave behind are removed, `X -> X` unary chains are spliced and an
/// unlabeled root wrapper is named after the start symbol.
#[derive(Clone)]
pub struct PennNormalizer {
  language: Arc<dyn TreebankLanguage>,
  strip_annotations: bool,
  delete_empty: bool,
  splice_unary: bool,
  root_label: Option<String>,
}

impl Default for PennNormalizer {
  fn default() -> Self {
    Self::new(Arc::new(PennLanguage))
  }
}

impl PennNormalizer {
  pub fn new(language: Arc<dyn TreebankLanguage>) -> Self {
    let root_label = Some(language.start_symbol().to_string());
    Self {
      language,
      strip_annotations: true,
      delete_empty: true,
      splice_unary: true,
      root_label,
    }
  }

  pub fn with_strip_annotations(mut self, strip: bool) -> Self {
    self.strip_annotations = strip;
    self
  }

  pub fn with_delete_empty(mut self, delete: bool) -> Self {
    self.delete_empty = delete;
    self
  }

  pub fn with_splice_unary(mut self, splice: bool) -> Self {
    self.splice_unary = splice;
    self
  }

  /// Label given to an unlabeled root. `None` leaves it unset.
  pub fn with_root_label(mut self, root: Option<String>) -> Self {
    self.root_label = root;
    self
  }

  /// Drops empty-element pre-terminals and any branch left without children.
  fn prune_empty(&self, tree: SynTree) -> Option<SynTree> {
    match tree {
      SynTree::Leaf(_) => Some(tree),
      SynTree::Branch(label, children) => {
        let empty_element = children.len() == 1
          && children[0].is_leaf()
          && self.language.is_empty_node(label.value_or_empty());
        if empty_element {
          trace!(word = children[0].value(), "dropping empty element");
          return None;
        }
        let had_children = !children.is_empty();
        let children: Vec<_> = children
          .into_iter()
          .filter_map(|c| self.prune_empty(c))
          .collect();
        if had_children && children.is_empty() {
          None
        } else {
          Some(SynTree::Branch(label, children))
        }
      }
    }
  }

  /// Collapses `(X (X ...))` into `(X ...)`.
  fn splice(&self, tree: SynTree) -> SynTree {
    match tree {
      SynTree::Leaf(_) => tree,
      SynTree::Branch(label, children) => {
        let mut children: Vec<_> = children.into_iter().map(|c| self.splice(c)).collect();
        while children.len() == 1
          && children[0].is_branch()
          && !children[0].is_preterminal()
          && label.value.is_some()
          && children[0].label().value == label.value
        {
          let only = children.pop().and_then(SynTree::into_branch);
          match only {
            Some((_, grandchildren)) => children = grandchildren,
            None => break,
          }
        }
        SynTree::Branch(label, children)
      }
    }
  }
}

impl TreeNormalizer for PennNormalizer {
  fn normalize_nonterminal(&self, category: &str) -> String {
    if self.strip_annotations {
      self.language.basic_category(category).to_string()
    } else {
      category.to_string()
    }
  }

  fn normalize_whole_tree(&self, tree: SynTree) -> Option<SynTree> {
    let tree = if self.delete_empty { self.prune_empty(tree)? } else { tree };
    let mut tree = if self.splice_unary { self.splice(tree) } else { tree };
    if let (SynTree::Branch(label, _), Some(root)) = (&mut tree, &self.root_label) {
      if label.value.is_none() {
        *label = Label::new(root.as_str());
      }
    }
    Some(tree)
  }
}

/// Runs several normalizers in order. Terminal and nonterminal hooks are composed;
/// the whole-tree hook stops at the first normalizer that rejects the tree.
#[derive(Default)]
pub struct NormalizerChain {
  normalizers: Vec<Box<dyn TreeNormalizer>>,
}

impl NormalizerChain {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn then(mut self, normalizer: impl TreeNormalizer + 'static) -> Self {
    self.normalizers.push(Box::new(normalizer));
    self
  }

  pub fn len(&self) -> usize {
    self.normalizers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl TreeNormalizer for NormalizerChain {
  fn normalize_terminal(&self, word: &str) -> String {
    self
      .normalizers
      .iter()
      .fold(word.to_string(), |w, n| n.normalize_terminal(&w))
  }

  fn normalize_nonterminal(&self, category: &str) -> String {
    self
      .normalizers
      .iter()
      .fold(category.to_string(), |c, n| n.normalize_nonterminal(&c))
  }

  fn normalize_whole_tree(&self, tree: SynTree) -> Option<SynTree> {
    self
      .normalizers
      .iter()
      .try_fold(tree, |t, n| n.normalize_whole_tree(t))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reader::TreeReader;

  fn read_raw(s: &str) -> SynTree {
    TreeReader::from_str(s).read_tree().unwrap().unwrap()
  }

  #[test]
  fn test_strip_annotations_idempotent() {
    let n = PennNormalizer::default();
    let once = n.normalize_nonterminal("NP-SBJ-2");
    assert_eq!(once, "NP");
    assert_eq!(n.normalize_nonterminal(&once), once);
    assert_eq!(n.normalize_nonterminal("-NONE-"), "-NONE-");
  }

  #[test]
  fn test_prune_empty_elements() {
    let tree = read_raw("(S (NP-SBJ (-NONE- *-1)) (VP (VBD ran)) (. .))");
    let tree = PennNormalizer::default().normalize_whole_tree(tree).unwrap();
    assert_eq!(tree.to_string(), "(S (VP (VBD ran)) (. .))");
  }

  #[test]
  fn test_splice_unary_and_name_root() {
    let tree = read_raw("( (S (NP (NP (NNP John))) (VP (VBD ran))))");
    let tree = PennNormalizer::default().normalize_whole_tree(tree).unwrap();
    assert_eq!(tree.to_string(), "(ROOT (S (NP (NNP John)) (VP (VBD ran))))");
  }

  #[test]
  fn test_reject_all_empty() {
    let tree = read_raw("(S (-NONE- *))");
    assert!(PennNormalizer::default().normalize_whole_tree(tree).is_none());
  }

  #[test]
  fn test_chain() {
    struct Lowercase;
    impl TreeNormalizer for Lowercase {
      fn normalize_terminal(&self, word: &str) -> String {
        word.to_lowercase()
      }
    }

    let chain = NormalizerChain::new().then(PennNormalizer::default()).then(Lowercase);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.normalize_terminal("The"), "the");
    assert_eq!(chain.normalize_nonterminal("NP-TMP"), "NP");

    let rejecting = NormalizerChain::new().then(PennNormalizer::default()).then(NoopNormalizer);
    assert!(rejecting.normalize_whole_tree(read_raw("(X (-NONE- *T*))")).is_none());
  }
}
