//! Push-down reader for Penn-style bracketed trees.
//!
//! ```text
//! tree := '(' ( tree | leaf )* ')'
//! leaf := token
//! ```
//!
//! Any number of trees may follow each other in one stream. Text outside of a bracket
//! is ignored, an outer pair of unlabeled parens is kept as an unset root wrapper, and
//! an empty `()` disappears. A labeled empty bracket `(X)` is a leaf inside a tree and
//! is skipped at the top level.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::TreeError;
use crate::label::Label;
use crate::normalize::{NoopNormalizer, TreeNormalizer};
use crate::syntree::SynTree;
use crate::tokenizer::{Token, Tokenizer};
use crate::utils::unescape_terminal;

/// A constituent whose closing paren hasn't been seen yet.
#[derive(Debug)]
struct Frame {
  label: Option<String>,
  children: Vec<SynTree>,
}

impl Frame {
  /// Closes the frame. `None` means the bracket was empty and unlabeled.
  fn close(self) -> Option<SynTree> {
    match (self.label, self.children.is_empty()) {
      (None, true) => None,
      // (X) has no children to head, so it reads as the leaf X
      (Some(label), true) => Some(SynTree::Leaf(Label::new(label))),
      (label, false) => Some(SynTree::Branch(
        Label {
          value: label,
          ..Default::default()
        },
        self.children,
      )),
    }
  }
}

pub struct TreeReader<R> {
  tokens: Tokenizer<R>,
  normalizer: Arc<dyn TreeNormalizer>,
  source_name: String,
  stack: Vec<Frame>,
  current: Option<Frame>,
  /// line of the `(` that opened the tree under construction
  tree_start: usize,
  next_leaf: usize,
  exhausted: bool,
}

impl TreeReader<BufReader<File>> {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TreeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|error| TreeError::Io {
      source_name: path.display().to_string(),
      error,
    })?;
    Ok(Self::new(BufReader::new(file)).with_source_name(path.display().to_string()))
  }
}

impl TreeReader<Cursor<String>> {
  #[allow(clippy::should_implement_trait)]
  pub fn from_str(text: &str) -> Self {
    Self::new(Cursor::new(text.to_string()))
  }
}

impl<R: BufRead> TreeReader<R> {
  pub fn new(reader: R) -> Self {
    Self {
      tokens: Tokenizer::new(reader),
      normalizer: Arc::new(NoopNormalizer),
      source_name: "<input>".to_string(),
      stack: Vec::new(),
      current: None,
      tree_start: 0,
      next_leaf: 1,
      exhausted: false,
    }
  }

  pub fn with_normalizer(mut self, normalizer: Arc<dyn TreeNormalizer>) -> Self {
    self.normalizer = normalizer;
    self
  }

  /// Name used in diagnostics, typically the file path.
  pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
    self.source_name = name.into();
    self
  }

  pub fn source_name(&self) -> &str {
    &self.source_name
  }

  /// Number of constituents currently open.
  fn depth(&self) -> usize {
    self.stack.len() + usize::from(self.current.is_some())
  }

  fn reset(&mut self) {
    self.stack.clear();
    self.current = None;
    self.next_leaf = 1;
  }

  fn io_error(&mut self, error: std::io::Error) -> TreeError {
    self.exhausted = true;
    self.reset();
    TreeError::Io {
      source_name: self.source_name.clone(),
      error,
    }
  }

  fn next_token(&mut self) -> Result<Option<Token>, TreeError> {
    self.tokens.next_token().map_err(|e| self.io_error(e))
  }

  /// Reads the next complete tree.
  ///
  /// Returns `Ok(None)` once the stream is exhausted. Trees the whole-tree normalizer
  /// rejects are skipped. If the stream ends inside an unfinished tree the partial tree
  /// is discarded and `TreeError::Ragged` is returned; the reader is exhausted afterwards.
  pub fn read_tree(&mut self) -> Result<Option<SynTree>, TreeError> {
    if self.exhausted {
      return Ok(None);
    }

    loop {
      let token = match self.next_token()? {
        Some(token) => token,
        None => return self.finish(),
      };

      match token {
        Token::Open => self.open()?,
        Token::Close => {
          if let Some(tree) = self.close() {
            match self.complete(tree) {
              Some(tree) => return Ok(Some(tree)),
              None => continue,
            }
          }
        }
        Token::Word(word) => self.word(&word),
      }
    }
  }

  fn open(&mut self) -> Result<(), TreeError> {
    if self.current.is_none() {
      self.tree_start = self.tokens.line();
      self.next_leaf = 1;
    }

    // `( (` opens an unlabeled wrapper, `( )` an empty pair
    let labeled = match self.tokens.peek().map(|t| matches!(t, Some(Token::Word(_)))) {
      Ok(labeled) => labeled,
      Err(e) => return Err(self.io_error(e)),
    };
    let label = if labeled {
      match self.next_token()? {
        Some(Token::Word(category)) => Some(self.normalizer.normalize_nonterminal(&category)),
        _ => None,
      }
    } else {
      None
    };

    if let Some(parent) = self.current.take() {
      self.stack.push(parent);
    }
    self.current = Some(Frame {
      label,
      children: Vec::new(),
    });
    Ok(())
  }

  /// Closes the current constituent, returning it if it was the outermost one.
  fn close(&mut self) -> Option<SynTree> {
    let frame = match self.current.take() {
      Some(frame) => frame,
      None => {
        warn!(
          source = %self.source_name,
          line = self.tokens.line(),
          "unmatched close paren, skipping"
        );
        return None;
      }
    };

    let node = frame.close();
    match self.stack.pop() {
      Some(mut parent) => {
        parent.children.extend(node);
        self.current = Some(parent);
        None
      }
      None => match node {
        Some(SynTree::Branch(..)) => node,
        // a bare `(X)` prints as `X`, which would not read back as a tree
        Some(SynTree::Leaf(_)) | None => {
          debug!(source = %self.source_name, line = self.tree_start, "skipping empty tree");
          None
        }
      },
    }
  }

  fn word(&mut self, word: &str) {
    match self.current.as_mut() {
      Some(frame) => {
        let value = unescape_terminal(&self.normalizer.normalize_terminal(word));
        frame
          .children
          .push(SynTree::Leaf(Label::new(value).with_index(self.next_leaf)));
        self.next_leaf += 1;
      }
      None => {
        debug!(
          source = %self.source_name,
          line = self.tokens.line(),
          word,
          "ignoring text outside of a tree"
        );
      }
    }
  }

  /// Runs the whole-tree normalizer and fixes up leaf indices and tags.
  fn complete(&mut self, tree: SynTree) -> Option<SynTree> {
    self.next_leaf = 1;
    match self.normalizer.normalize_whole_tree(tree) {
      Some(mut tree) => {
        tree.index_leaves();
        tree.percolate_tags();
        Some(tree)
      }
      None => {
        debug!(
          source = %self.source_name,
          line = self.tree_start,
          "normalizer rejected tree, skipping"
        );
        None
      }
    }
  }

  fn finish(&mut self) -> Result<Option<SynTree>, TreeError> {
    self.exhausted = true;
    if self.current.is_none() {
      return Ok(None);
    }

    let depth = self.depth();
    warn!(
      source = %self.source_name,
      line = self.tree_start,
      depth,
      "stream ended inside a tree, discarding it"
    );
    self.reset();
    Err(TreeError::Ragged {
      source_name: self.source_name.clone(),
      line: self.tree_start,
      depth,
    })
  }
}

impl<R: BufRead> Iterator for TreeReader<R> {
  type Item = Result<SynTree, TreeError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.read_tree().transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::PennNormalizer;

  fn read_all(s: &str) -> Vec<SynTree> {
    TreeReader::from_str(s).map(Result::unwrap).collect()
  }

  #[test]
  fn test_read_simple() {
    let trees = read_all("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))");
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].to_string(), "(S (NP (DT the) (NN dog)) (VP (VBZ barks)))");

    let leaves = trees[0].yield_labels();
    assert_eq!(leaves[0].index, Some(1));
    assert_eq!(leaves[2].index, Some(3));
    assert_eq!(leaves[1].tag(), Some("NN"));
  }

  #[test]
  fn test_read_many_with_stray_text() {
    let trees = read_all(
      "*x* Copyright notice *x*\n( (S (NP (PRP I)) (VP (VBD ran))) )\n\n(S (NP (PRP you)) (VP (VBD sat)))\ntrailing",
    );
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].label().value(), None);
    assert_eq!(trees[0].to_string(), "( (S (NP (PRP I)) (VP (VBD ran))))");
    assert_eq!(trees[1].yield_labels()[0].index, Some(1));
  }

  #[test]
  fn test_round_trip() {
    let src = "(ROOT (S (NP (NNP Mary)) (VP (VBD said) (SBAR (IN that) (S (NP (PRP she)) (VP (VBD left))))) (. .)))";
    let once = read_all(src).remove(0);
    let twice = read_all(&once.to_string()).remove(0);
    assert_eq!(once, twice);
    assert_eq!(twice.to_string(), src);
  }

  #[test]
  fn test_unescape() {
    let tree = read_all("(NP (CD 1\\/2) (-NONE- \\*T\\*-1))").remove(0);
    let words: Vec<_> = tree.yield_labels().iter().map(|l| l.value_or_empty()).collect();
    assert_eq!(words, ["1/2", "*T*-1"]);
  }

  #[test]
  fn test_empty_brackets() {
    let trees = read_all("() (S () (NP (NN x)) (Y)) (X)");
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].to_string(), "(S (NP (NN x)) Y)");
    assert_eq!(trees[0].children()[1], SynTree::Leaf(Label::new("Y").with_index(2)));
  }

  #[test]
  fn test_bare_labeled_bracket_is_not_a_tree() {
    assert!(read_all("(X)").is_empty());
    let trees = read_all("(X) (S (NP (NN x)))");
    assert_eq!(trees.len(), 1);

    let printed = trees[0].to_string();
    assert_eq!(read_all(&printed), trees);
  }

  #[test]
  fn test_ragged_input() {
    let mut reader = TreeReader::from_str("(S (NP foo) (VP bar)");
    match reader.read_tree() {
      Err(TreeError::Ragged { depth, line, .. }) => {
        assert_eq!(depth, 1);
        assert_eq!(line, 1);
      }
      other => panic!("expected ragged tree, got {:?}", other),
    }
    assert!(reader.read_tree().unwrap().is_none());
    assert!(reader.read_tree().unwrap().is_none());
  }

  #[test]
  fn test_ragged_after_good_tree() {
    let mut reader = TreeReader::from_str("(S (NP foo))\n(S (NP foo) (VP bar)\n");
    assert_eq!(reader.read_tree().unwrap().unwrap().to_string(), "(S (NP foo))");
    assert!(matches!(reader.read_tree(), Err(TreeError::Ragged { line: 2, .. })));
  }

  #[test]
  fn test_unmatched_close_is_skipped() {
    let trees = read_all("(S (NP foo)))\n) (S (VP bar))");
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[1].to_string(), "(S (VP bar))");
  }

  #[test]
  fn test_normalizer_hooks() {
    let trees: Vec<_> = TreeReader::from_str(
      "( (S (NP-SBJ (-NONE- *)) (VP (VBD left))))\n( (X (-NONE- *U*)))\n( (NP-TMP (NN today)))",
    )
    .with_normalizer(Arc::new(PennNormalizer::default()))
    .map(Result::unwrap)
    .collect();

    // the second tree is all empty elements and is skipped
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].to_string(), "(ROOT (S (VP (VBD left))))");
    assert_eq!(trees[0].yield_labels()[0].index, Some(1));
    assert_eq!(trees[1].to_string(), "(ROOT (NP (NN today)))");
  }
}
