//! Bilexical dependencies read off a tree and its head choices.
//!
//! For every phrase with more than one child, the head terminal of each non-head child
//! depends on the head terminal of the head child. The head terminal of the whole tree
//! depends on a synthetic start-symbol token at index 0, so a complete extraction has
//! exactly one dependency per terminal.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::HeadError;
use crate::headfinder::HeadFinder;
use crate::label::Label;
use crate::language::{PennLanguage, TreebankLanguage};
use crate::syntree::SynTree;

/// Which side of its governor a dependent sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
  Left,
  Right,
}

impl fmt::Display for Side {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Left => write!(f, "left"),
      Self::Right => write!(f, "right"),
    }
  }
}

/// Collins-style relation: the categories of the phrase, its head child and the
/// modifier child, plus the modifier's side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollinsRelation {
  pub parent: String,
  pub head: String,
  pub modifier: String,
  pub direction: Side,
}

impl fmt::Display for CollinsRelation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} {} {}", self.parent, self.head, self.modifier, self.direction)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
  Unnamed,
  Collins(CollinsRelation),
}

impl fmt::Display for Relation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unnamed => Ok(()),
      Self::Collins(rel) => write!(f, "{}", rel),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
  pub governor: Label,
  pub dependent: Label,
  pub relation: Relation,
  pub direction: Side,
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> {}", self.governor, self.dependent)?;
    if self.relation != Relation::Unnamed {
      write!(f, " [{}]", self.relation)?;
    }
    Ok(())
  }
}

/// Relation flavour produced by an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
  #[default]
  Collins,
  Unnamed,
}

/// The dependencies of one tree, sorted by dependent index.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
  pub dependencies: Vec<Dependency>,
  /// Number of terminals in the tree the dependencies were extracted from.
  pub yield_len: usize,
}

impl Extraction {
  /// One dependency per terminal, the start-symbol dependency included.
  pub fn is_complete(&self) -> bool {
    self.dependencies.len() == self.yield_len
  }

  pub fn len(&self) -> usize {
    self.dependencies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dependencies.is_empty()
  }

  /// The governor of the terminal at `index`.
  pub fn governor_of(&self, index: usize) -> Option<&Label> {
    self
      .dependencies
      .iter()
      .find(|d| d.dependent.index == Some(index))
      .map(|d| &d.governor)
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
    self.dependencies.iter()
  }
}

impl<'a> IntoIterator for &'a Extraction {
  type Item = &'a Dependency;
  type IntoIter = std::slice::Iter<'a, Dependency>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[derive(Clone)]
pub struct DependencyExtractor {
  start_symbol: String,
  norm_pos: Option<String>,
  scheme: Scheme,
  language: Arc<dyn TreebankLanguage>,
}

impl Default for DependencyExtractor {
  fn default() -> Self {
    Self::new(PennLanguage.start_symbol())
  }
}

impl DependencyExtractor {
  pub fn new(start_symbol: impl Into<String>) -> Self {
    Self {
      start_symbol: start_symbol.into(),
      norm_pos: None,
      scheme: Scheme::Collins,
      language: Arc::new(PennLanguage),
    }
  }

  /// Replaces every pre-terminal category with `tag` in relations. Head selection still
  /// sees the real categories.
  pub fn with_norm_pos(mut self, tag: Option<String>) -> Self {
    self.norm_pos = tag;
    self
  }

  pub fn with_scheme(mut self, scheme: Scheme) -> Self {
    self.scheme = scheme;
    self
  }

  pub fn with_language(mut self, language: Arc<dyn TreebankLanguage>) -> Self {
    self.language = language;
    self
  }

  pub fn start_symbol(&self) -> &str {
    &self.start_symbol
  }

  /// The root to extract from: a unary start-symbol or unlabeled wrapper is stripped.
  fn strip_start<'t>(&self, tree: &'t SynTree) -> &'t SynTree {
    match tree {
      SynTree::Branch(label, children) if children.len() == 1 && children[0].is_branch() => {
        let is_start = match label.value() {
          None => true,
          Some(value) => self.language.basic_category(value) == self.start_symbol,
        };
        if is_start { &children[0] } else { tree }
      }
      _ => tree,
    }
  }

  fn category(&self, node: &SynTree) -> String {
    match &self.norm_pos {
      Some(tag) if node.is_preterminal() => tag.clone(),
      _ => self.language.basic_category(node.value()).to_string(),
    }
  }

  fn relation(
    &self,
    parent: &SynTree,
    head: &SynTree,
    modifier: &SynTree,
    direction: Side,
  ) -> Relation {
    match self.scheme {
      Scheme::Unnamed => Relation::Unnamed,
      Scheme::Collins => Relation::Collins(CollinsRelation {
        parent: self.category(parent),
        head: self.category(head),
        modifier: self.category(modifier),
        direction,
      }),
    }
  }

  /// Extracts the dependencies of `tree`. Head-finder failures abort the extraction.
  /// A count mismatch is logged and reported through `Extraction::is_complete`.
  pub fn extract<H>(&self, tree: &SynTree, head_finder: &H) -> Result<Extraction, HeadError>
  where
    H: HeadFinder + ?Sized,
  {
    let root = self.strip_start(tree);
    let yield_len = root.leaves().len();

    let mut dependencies = Vec::with_capacity(yield_len);
    let root_head = self.visit(root, None, head_finder, &mut dependencies)?;

    let start = Label::new(self.start_symbol.as_str()).with_index(0);
    let boundary = match self.scheme {
      Scheme::Unnamed => Relation::Unnamed,
      Scheme::Collins => Relation::Collins(CollinsRelation {
        parent: self.start_symbol.clone(),
        head: self.start_symbol.clone(),
        modifier: self.category(root),
        direction: Side::Right,
      }),
    };
    dependencies.push(Dependency {
      governor: start,
      dependent: root_head.clone(),
      relation: boundary,
      direction: Side::Right,
    });
    dependencies.sort_by_key(|d| d.dependent.index);

    let extraction = Extraction {
      dependencies,
      yield_len,
    };
    if !extraction.is_complete() {
      warn!(
        dependencies = extraction.len(),
        terminals = yield_len,
        tree = %tree,
        "dependency count does not match yield length"
      );
    }
    Ok(extraction)
  }

  /// Emits the dependencies inside `node` and returns its head terminal.
  fn visit<'t, H>(
    &self,
    node: &'t SynTree,
    parent: Option<&SynTree>,
    head_finder: &H,
    out: &mut Vec<Dependency>,
  ) -> Result<&'t Label, HeadError>
  where
    H: HeadFinder + ?Sized,
  {
    let children = match node {
      SynTree::Leaf(label) => return Ok(label),
      SynTree::Branch(_, children) => children,
    };

    let heads = children
      .iter()
      .map(|child| self.visit(child, Some(node), head_finder, out))
      .collect::<Result<Vec<_>, _>>()?;
    if children.len() == 1 {
      return Ok(heads[0]);
    }

    let head_idx = head_finder.head_index(node, parent)?;
    let head_child = &children[head_idx];
    for (idx, (child, terminal)) in children.iter().zip(heads.iter()).enumerate() {
      if idx == head_idx {
        continue;
      }
      let direction = if idx < head_idx { Side::Left } else { Side::Right };
      out.push(Dependency {
        governor: heads[head_idx].clone(),
        dependent: (*terminal).clone(),
        relation: self.relation(node, head_child, child, direction),
        direction,
      });
    }
    Ok(heads[head_idx])
  }
}

/// Extracts Collins dependencies with a fresh extractor.
pub fn extract_dependencies<H>(
  tree: &SynTree,
  start_symbol: &str,
  head_finder: &H,
  norm_pos: Option<&str>,
) -> Result<Extraction, HeadError>
where
  H: HeadFinder + ?Sized,
{
  DependencyExtractor::new(start_symbol)
    .with_norm_pos(norm_pos.map(str::to_string))
    .extract(tree, head_finder)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::headfinder::RuleHeadFinder;
  use crate::normalize::PennNormalizer;
  use crate::reader::TreeReader;

  fn trees(s: &str) -> Vec<SynTree> {
    TreeReader::from_str(s)
      .with_normalizer(Arc::new(PennNormalizer::default()))
      .map(Result::unwrap)
      .collect()
  }

  fn collins(parent: &str, head: &str, modifier: &str, direction: Side) -> Relation {
    Relation::Collins(CollinsRelation {
      parent: parent.into(),
      head: head.into(),
      modifier: modifier.into(),
      direction,
    })
  }

  const SENTENCES: &str = r#"
    ( (S (NP-SBJ (DT The) (NN dog)) (VP (VBZ barks)) (. .)) )
    ( (S (NP-SBJ (NNP Mary)) (VP (VBD said) (SBAR (-NONE- 0) (S (NP-SBJ (PRP she)) (VP (VBD left))))) (. .)) )
    ( (S (NP-SBJ (NP (DT The) (NN price)) (PP (IN of) (NP (NN salt) (CC and) (NN pepper))))
         (VP (VBD rose) (NP-EXT (CD 3) (NN %)) (PP-TMP (IN in) (NP (NNP March))))
         (, ,) (NP-SBJ (NNS analysts)) (VP (VBD said)) (. .)) )
    ( (FRAG (INTJ (UH Yes)) (. !)) )
    ( (NP (NN Hello)) )
  "#;

  #[test]
  fn test_the_dog_barks() {
    let tree = &trees(SENTENCES)[0];
    let hf = RuleHeadFinder::collins();
    let deps = DependencyExtractor::new("ROOT").extract(tree, &hf).unwrap();

    assert!(deps.is_complete());
    let rendered: Vec<_> = deps
      .iter()
      .map(|d| {
        (
          d.governor.value_or_empty(),
          d.dependent.value_or_empty(),
          d.relation.clone(),
        )
      })
      .collect();
    assert_eq!(
      rendered,
      vec![
        ("dog", "The", collins("NP", "NN", "DT", Side::Left)),
        ("barks", "dog", collins("S", "VP", "NP", Side::Left)),
        ("ROOT", "barks", collins("ROOT", "ROOT", "S", Side::Right)),
        ("barks", ".", collins("S", "VP", ".", Side::Right)),
      ]
    );
    assert_eq!(deps.governor_of(3).unwrap().index, Some(0));
    assert_eq!(deps.governor_of(1).unwrap().value(), Some("dog"));
  }

  #[test]
  fn test_every_terminal_has_one_governor() {
    for hf in [RuleHeadFinder::collins(), RuleHeadFinder::modified_collins()] {
      for tree in trees(SENTENCES) {
        let deps = DependencyExtractor::default().extract(&tree, &hf).unwrap();
        assert!(deps.is_complete(), "{}", tree);
        assert_eq!(deps.len(), tree.leaves().len());

        let mut seen: Vec<_> = deps.iter().map(|d| d.dependent.index.unwrap()).collect();
        seen.dedup();
        assert_eq!(seen, (1..=tree.leaves().len()).collect::<Vec<_>>());
        assert_eq!(deps.iter().filter(|d| d.governor.index == Some(0)).count(), 1);
      }
    }
  }

  #[test]
  fn test_coordination_heads() {
    let tree = &trees(SENTENCES)[2];
    let deps = DependencyExtractor::default()
      .extract(tree, &RuleHeadFinder::collins())
      .unwrap();
    let governor = |word: &str| {
      deps
        .iter()
        .find(|d| d.dependent.value() == Some(word))
        .map(|d| d.governor.value_or_empty().to_string())
        .unwrap()
    };
    assert_eq!(governor("pepper"), "salt");
    assert_eq!(governor("and"), "salt");
    assert_eq!(governor("salt"), "of");
    assert_eq!(governor("price"), "rose");
  }

  #[test]
  fn test_norm_pos_only_affects_relations() {
    let tree = &trees(SENTENCES)[0];
    let hf = RuleHeadFinder::collins();
    let plain = DependencyExtractor::default().extract(tree, &hf).unwrap();
    let normed = extract_dependencies(tree, "ROOT", &hf, Some("TAG")).unwrap();

    assert_eq!(plain.len(), normed.len());
    for (a, b) in plain.iter().zip(normed.iter()) {
      assert_eq!(a.governor, b.governor);
      assert_eq!(a.dependent, b.dependent);
    }
    assert_eq!(normed.dependencies[0].relation, collins("NP", "TAG", "TAG", Side::Left));
    assert_eq!(normed.dependencies[1].relation, collins("S", "VP", "NP", Side::Left));
  }

  #[test]
  fn test_unnamed_scheme() {
    let tree = &trees(SENTENCES)[1];
    let deps = DependencyExtractor::default()
      .with_scheme(Scheme::Unnamed)
      .extract(tree, &RuleHeadFinder::collins())
      .unwrap();
    assert!(deps.is_complete());
    assert!(deps.iter().all(|d| d.relation == Relation::Unnamed));
    assert_eq!(deps.governor_of(3).unwrap().value(), Some("left"));
    assert_eq!(deps.dependencies[2].to_string(), "left/VBD-4 -> she/PRP-3");
  }

  #[test]
  fn test_single_word() {
    let tree = &trees(SENTENCES)[4];
    let deps = DependencyExtractor::default()
      .extract(tree, &RuleHeadFinder::collins())
      .unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps.dependencies[0].governor.value(), Some("ROOT"));
    assert_eq!(deps.dependencies[0].dependent.value(), Some("Hello"));
  }

  #[test]
  fn test_head_errors_propagate() {
    let tree = &trees(SENTENCES)[0];
    let hf = RuleHeadFinder::new(Arc::new("NP -> rightdis NN;".parse().unwrap()));
    assert_eq!(
      DependencyExtractor::default().extract(tree, &hf),
      Err(HeadError::MissingRule("S".to_string()))
    );
  }

  #[test]
  fn test_extract_through_trait_object() {
    let tree = &trees(SENTENCES)[3];
    let hf: Box<dyn HeadFinder> = Box::new(RuleHeadFinder::modified_collins());
    let deps = DependencyExtractor::default().extract(tree, hf.as_ref()).unwrap();
    assert!(deps.is_complete());
    assert_eq!(deps.governor_of(2).unwrap().value(), Some("Yes"));
  }
}
