use std::fmt;

use crate::label::Label;

/// A phrase-structure tree. A `Branch` owns its children in order; a `Leaf` holds a
/// terminal. A pre-terminal is a branch with exactly one leaf child.
#[derive(Debug, PartialEq, Clone)]
pub enum SynTree {
  Branch(Label, Vec<SynTree>),
  Leaf(Label),
}

impl SynTree {
  pub fn leaf(label: impl Into<Label>) -> Self {
    Self::Leaf(label.into())
  }

  pub fn branch(label: impl Into<Label>, children: Vec<SynTree>) -> Self {
    Self::Branch(label.into(), children)
  }

  /// Shorthand for a (POS word) pre-terminal.
  pub fn preterminal(tag: &str, word: &str) -> Self {
    Self::Branch(Label::new(tag), vec![Self::Leaf(Label::new(word))])
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _))
  }

  pub fn is_preterminal(&self) -> bool {
    match self {
      Self::Branch(_, children) => children.len() == 1 && children[0].is_leaf(),
      _ => false,
    }
  }

  pub fn get_leaf(&self) -> Option<&Label> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Label, &Vec<SynTree>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  pub fn into_branch(self) -> Option<(Label, Vec<SynTree>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  pub fn label(&self) -> &Label {
    match self {
      Self::Branch(l, _) | Self::Leaf(l) => l,
    }
  }

  pub fn label_mut(&mut self) -> &mut Label {
    match self {
      Self::Branch(l, _) | Self::Leaf(l) => l,
    }
  }

  /// The label value, or `""` for an unset root wrapper.
  pub fn value(&self) -> &str {
    self.label().value_or_empty()
  }

  pub fn children(&self) -> &[SynTree] {
    match self {
      Self::Branch(_, cs) => cs,
      Self::Leaf(_) => &[],
    }
  }

  pub fn children_mut(&mut self) -> Option<&mut Vec<SynTree>> {
    match self {
      Self::Branch(_, cs) => Some(cs),
      Self::Leaf(_) => None,
    }
  }

  pub fn first_child(&self) -> Option<&SynTree> {
    self.children().first()
  }

  /// Leaves in yield order.
  pub fn leaves(&self) -> Vec<&SynTree> {
    let mut out = Vec::new();
    self.collect_leaves(&mut out);
    out
  }

  fn collect_leaves<'t>(&'t self, out: &mut Vec<&'t SynTree>) {
    match self {
      Self::Leaf(_) => out.push(self),
      Self::Branch(_, cs) => cs.iter().for_each(|c| c.collect_leaves(out)),
    }
  }

  /// The ordered terminal labels under this tree.
  pub fn yield_labels(&self) -> Vec<&Label> {
    self.leaves().into_iter().map(SynTree::label).collect()
  }

  /// (tag, word) pairs for every pre-terminal, in order.
  pub fn preterminal_yield(&self) -> Vec<(&Label, &Label)> {
    let mut out = Vec::new();
    self.collect_preterminals(&mut out);
    out
  }

  fn collect_preterminals<'t>(&'t self, out: &mut Vec<(&'t Label, &'t Label)>) {
    if let Self::Branch(l, cs) = self {
      if self.is_preterminal() {
        out.push((l, cs[0].label()));
      } else {
        cs.iter().for_each(|c| c.collect_preterminals(out));
      }
    }
  }

  /// Number of nodes, leaves included.
  pub fn size(&self) -> usize {
    1 + self.children().iter().map(SynTree::size).sum::<usize>()
  }

  /// Length of the longest root-to-leaf path, counted in edges.
  pub fn depth(&self) -> usize {
    self
      .children()
      .iter()
      .map(|c| c.depth() + 1)
      .max()
      .unwrap_or(0)
  }

  /// Renumbers leaves 1..=n in yield order. Returns n.
  pub fn index_leaves(&mut self) -> usize {
    let mut next = 1;
    self.index_leaves_from(&mut next);
    next - 1
  }

  fn index_leaves_from(&mut self, next: &mut usize) {
    match self {
      Self::Leaf(l) => {
        l.index = Some(*next);
        *next += 1;
      }
      Self::Branch(_, cs) => cs.iter_mut().for_each(|c| c.index_leaves_from(next)),
    }
  }

  /// Copies every pre-terminal's category onto its leaf's `tag`.
  pub fn percolate_tags(&mut self) {
    if let Self::Branch(l, cs) = self {
      if cs.len() == 1 && cs[0].is_leaf() {
        let tag = l.value.clone();
        cs[0].label_mut().tag = tag;
      } else {
        cs.iter_mut().for_each(SynTree::percolate_tags);
      }
    }
  }

  /// Stamps document and sentence provenance onto every leaf label.
  pub fn set_provenance(&mut self, doc_id: &str, sent_index: usize) {
    match self {
      Self::Leaf(l) => {
        l.doc_id = Some(doc_id.to_string());
        l.sent_index = Some(sent_index);
      }
      Self::Branch(_, cs) => cs
        .iter_mut()
        .for_each(|c| c.set_provenance(doc_id, sent_index)),
    }
  }

  pub fn map_labels(
    &self,
    map_branch: fn(&Label) -> Label,
    map_leaf: fn(&Label) -> Label,
  ) -> SynTree {
    match self {
      Self::Branch(l, children) => SynTree::Branch(
        map_branch(l),
        children
          .iter()
          .map(|c| c.map_labels(map_branch, map_leaf))
          .collect(),
      ),
      Self::Leaf(l) => SynTree::Leaf(map_leaf(l)),
    }
  }

  /// Multi-line indented rendering, one constituent per line.
  pub fn pretty(&self) -> Pretty<'_> {
    Pretty(self)
  }
}

/// Single-line bracket notation, readable back by `TreeReader`.
impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(l) => write!(f, "{}", l.value_or_empty()),
      Self::Branch(l, ts) => {
        write!(f, "({}", l.value_or_empty())?;
        for t in ts.iter() {
          write!(f, " {}", t)?;
        }
        write!(f, ")")
      }
    }
  }
}

pub struct Pretty<'t>(&'t SynTree);

impl fmt::Display for Pretty<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let tree = self.0;
    match tree {
      SynTree::Leaf(l) => write!(f, "{}", l.value_or_empty()),
      SynTree::Branch(l, ts) => {
        if tree.is_preterminal() {
          return write!(f, "{}", tree);
        }
        write!(f, "({}", l.value_or_empty())?;
        for t in ts.iter() {
          // TODO: is there a nice way to do this that doesn't allocate a String?
          let fmt = format!("{}", t.pretty());
          for line in fmt.lines() {
            write!(f, "\n  {}", line)?;
          }
        }
        write!(f, ")")
      }
    }
  }
}
