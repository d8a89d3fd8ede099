//! Streaming over whole treebanks.
//!
//! A `Treebank` names where the trees live: an in-memory string, a single file, or a
//! directory tree. Iterating it opens one `TreeReader` per file, walking directories
//! breadth-first in sorted order, and tags every tree with its file and 1-based
//! ordinal within that file.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::TreeError;
use crate::normalize::{NoopNormalizer, TreeNormalizer};
use crate::reader::TreeReader;
use crate::syntree::SynTree;

/// Decides which files found while walking a directory are read.
pub trait FileFilter: Send + Sync {
  fn accept(&self, path: &Path) -> bool;
}

impl<F> FileFilter for F
where
  F: Fn(&Path) -> bool + Send + Sync,
{
  fn accept(&self, path: &Path) -> bool {
    self(path)
  }
}

/// Accepts files whose name ends with a suffix, e.g. `.mrg`.
#[derive(Debug, Clone)]
pub struct SuffixFilter(String);

impl SuffixFilter {
  pub fn new(suffix: impl Into<String>) -> Self {
    Self(suffix.into())
  }
}

impl FileFilter for SuffixFilter {
  fn accept(&self, path: &Path) -> bool {
    path
      .file_name()
      .and_then(|name| name.to_str())
      .is_some_and(|name| name.ends_with(&self.0))
  }
}

/// Accepts files whose name matches a regex anywhere.
#[derive(Debug, Clone)]
pub struct RegexFilter(Regex);

impl RegexFilter {
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Ok(Self(Regex::new(pattern)?))
  }
}

impl FileFilter for RegexFilter {
  fn accept(&self, path: &Path) -> bool {
    path
      .file_name()
      .and_then(|name| name.to_str())
      .is_some_and(|name| self.0.is_match(name))
  }
}

#[derive(Debug, Clone)]
enum TreeSource {
  /// In-memory bracketed text
  String(String),
  /// A file or a directory to walk
  Path(PathBuf),
}

/// A tree and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusTree {
  pub tree: SynTree,
  pub source: String,
  /// 1-based position of the tree within its source
  pub ordinal: usize,
}

/// Where to find trees and how to read them.
#[derive(Clone)]
pub struct Treebank {
  source: TreeSource,
  filter: Option<Arc<dyn FileFilter>>,
  normalizer: Arc<dyn TreeNormalizer>,
}

impl Treebank {
  /// A single file, or a directory to walk. Files named directly are always read;
  /// the filter only applies to files found inside directories.
  pub fn from_path(path: impl AsRef<Path>) -> Self {
    Self {
      source: TreeSource::Path(path.as_ref().to_path_buf()),
      filter: None,
      normalizer: Arc::new(NoopNormalizer),
    }
  }

  pub fn from_string(text: &str) -> Self {
    Self {
      source: TreeSource::String(text.to_string()),
      filter: None,
      normalizer: Arc::new(NoopNormalizer),
    }
  }

  pub fn with_filter(mut self, filter: impl FileFilter + 'static) -> Self {
    self.filter = Some(Arc::new(filter));
    self
  }

  pub fn with_normalizer(mut self, normalizer: Arc<dyn TreeNormalizer>) -> Self {
    self.normalizer = normalizer;
    self
  }

  /// A fresh pass over the treebank.
  pub fn iter(&self) -> TreebankIter {
    let mut iter = TreebankIter {
      normalizer: self.normalizer.clone(),
      filter: self.filter.clone(),
      dirs: VecDeque::new(),
      files: VecDeque::new(),
      reader: None,
      current_source: None,
      ordinal: 0,
      done: false,
    };
    match &self.source {
      TreeSource::String(text) => {
        iter.start(Box::new(Cursor::new(text.clone())), "<string>".to_string());
      }
      TreeSource::Path(path) if path.is_dir() => iter.dirs.push_back(path.clone()),
      TreeSource::Path(path) => iter.files.push_back(path.clone()),
    }
    iter
  }
}

impl IntoIterator for Treebank {
  type Item = Result<CorpusTree, TreeError>;
  type IntoIter = TreebankIter;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl IntoIterator for &Treebank {
  type Item = Result<CorpusTree, TreeError>;
  type IntoIter = TreebankIter;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

type SourceReader = TreeReader<Box<dyn BufRead + Send>>;

/// Forward-only iterator over the trees of a `Treebank`.
///
/// A ragged tree ends its file: the error is logged with the file and line and the
/// iterator moves on to the next file. An I/O error is yielded once and ends the
/// iteration.
pub struct TreebankIter {
  normalizer: Arc<dyn TreeNormalizer>,
  filter: Option<Arc<dyn FileFilter>>,
  dirs: VecDeque<PathBuf>,
  files: VecDeque<PathBuf>,
  reader: Option<SourceReader>,
  current_source: Option<String>,
  ordinal: usize,
  done: bool,
}

impl TreebankIter {
  /// Name of the file (or `<string>`) trees are currently read from.
  pub fn current_source(&self) -> Option<&str> {
    self.current_source.as_deref()
  }

  fn start(&mut self, input: Box<dyn BufRead + Send>, name: String) {
    debug!(source = %name, "reading trees");
    self.reader = Some(
      TreeReader::new(input)
        .with_normalizer(self.normalizer.clone())
        .with_source_name(name.clone()),
    );
    self.current_source = Some(name);
    self.ordinal = 0;
  }

  fn accepts(&self, path: &Path) -> bool {
    self.filter.as_ref().is_none_or(|f| f.accept(path))
  }

  /// Lists a directory, queueing accepted files and all subdirectories in sorted order.
  fn expand(&mut self, dir: &Path) -> Result<(), TreeError> {
    let io_error = |error| TreeError::Io {
      source_name: dir.display().to_string(),
      error,
    };

    let mut entries = fs::read_dir(dir)
      .map_err(io_error)?
      .map(|entry| entry.map(|e| e.path()))
      .collect::<Result<Vec<_>, _>>()
      .map_err(io_error)?;
    entries.sort();

    for path in entries {
      if path.is_dir() {
        self.dirs.push_back(path);
      } else if self.accepts(&path) {
        self.files.push_back(path);
      } else {
        debug!(path = %path.display(), "file filtered out");
      }
    }
    Ok(())
  }

  /// Files at one level all come before anything in their subdirectories.
  fn next_file(&mut self) -> Result<Option<PathBuf>, TreeError> {
    loop {
      if let Some(file) = self.files.pop_front() {
        return Ok(Some(file));
      }
      match self.dirs.pop_front() {
        Some(dir) => self.expand(&dir)?,
        None => return Ok(None),
      }
    }
  }

  fn open_next(&mut self) -> Result<bool, TreeError> {
    let path = match self.next_file()? {
      Some(path) => path,
      None => return Ok(false),
    };
    let name = path.display().to_string();
    let file = File::open(&path).map_err(|error| TreeError::Io {
      source_name: name.clone(),
      error,
    })?;
    self.start(Box::new(BufReader::new(file)), name);
    Ok(true)
  }

  fn fail(&mut self, error: TreeError) -> Option<Result<CorpusTree, TreeError>> {
    self.done = true;
    self.reader = None;
    Some(Err(error))
  }
}

impl Iterator for TreebankIter {
  type Item = Result<CorpusTree, TreeError>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if self.done {
        return None;
      }

      if let Some(reader) = self.reader.as_mut() {
        match reader.read_tree() {
          Ok(Some(mut tree)) => {
            self.ordinal += 1;
            let source = self.current_source.clone().unwrap_or_default();
            tree.set_provenance(&source, self.ordinal);
            return Some(Ok(CorpusTree {
              tree,
              source,
              ordinal: self.ordinal,
            }));
          }
          Ok(None) => {
            debug!(source = ?self.current_source, trees = self.ordinal, "finished source");
            self.reader = None;
          }
          Err(TreeError::Ragged { source_name, line, .. }) => {
            warn!(source = %source_name, line, "skipping rest of source after ragged tree");
            self.reader = None;
          }
          Err(error) => return self.fail(error),
        }
      }

      match self.open_next() {
        Ok(true) => {}
        Ok(false) => {
          self.done = true;
          self.current_source = None;
        }
        Err(error) => return self.fail(error),
      }
    }
  }
}

/// A `TreebankIter` several threads can pull from. Each call takes the lock for the
/// duration of one tree.
#[derive(Clone)]
pub struct SharedTreebankIter(Arc<Mutex<TreebankIter>>);

impl SharedTreebankIter {
  pub fn new(iter: TreebankIter) -> Self {
    Self(Arc::new(Mutex::new(iter)))
  }

  pub fn next_tree(&self) -> Option<Result<CorpusTree, TreeError>> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner).next()
  }

  pub fn current_source(&self) -> Option<String> {
    self
      .0
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .current_source()
      .map(str::to_string)
  }
}

impl Iterator for SharedTreebankIter {
  type Item = Result<CorpusTree, TreeError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.next_tree()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::PennNormalizer;
  use std::thread;
  use tempfile::{TempDir, tempdir};

  fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
  }

  fn corpus() -> TempDir {
    let dir = tempdir().unwrap();
    write(&dir, "a.mrg", "(S (NP (NN a1)))\n(S (NP (NN a2)))\n");
    write(&dir, "alpha/deep/c.mrg", "(S (NP (NN c1)))\n");
    write(&dir, "beta/b.mrg", "(S (NP (NN b1)))\n");
    write(&dir, "notes.txt", "(S (NP (NN txt)))\n");
    dir
  }

  fn words(trees: &[CorpusTree]) -> Vec<String> {
    trees
      .iter()
      .map(|t| t.tree.yield_labels()[0].value_or_empty().to_string())
      .collect()
  }

  #[test]
  fn test_breadth_first_order() {
    let dir = corpus();
    let trees: Vec<_> = Treebank::from_path(dir.path())
      .with_filter(SuffixFilter::new(".mrg"))
      .iter()
      .map(Result::unwrap)
      .collect();

    // beta/b.mrg is one level down, alpha/deep/c.mrg two
    assert_eq!(words(&trees), ["a1", "a2", "b1", "c1"]);
    assert!(trees[0].source.ends_with("a.mrg"));
    assert_eq!(trees[1].ordinal, 2);
    assert!(trees[2].source.ends_with("b.mrg"));
    assert_eq!(trees[2].ordinal, 1);
    assert!(trees[3].source.ends_with("c.mrg"));
  }

  #[test]
  fn test_provenance_on_leaves() {
    let dir = corpus();
    let path = dir.path().join("a.mrg");
    let trees: Vec<_> = Treebank::from_path(&path).iter().map(Result::unwrap).collect();
    let leaf = trees[1].tree.yield_labels()[0].clone();
    assert_eq!(leaf.doc_id.as_deref(), Some(path.display().to_string().as_str()));
    assert_eq!(leaf.sent_index, Some(2));
  }

  #[test]
  fn test_filters() {
    let dir = corpus();
    let all: Vec<_> = Treebank::from_path(dir.path()).iter().map(Result::unwrap).collect();
    assert_eq!(all.len(), 5);

    let by_regex: Vec<_> = Treebank::from_path(dir.path())
      .with_filter(RegexFilter::new(r"^[ab]\.mrg$").unwrap())
      .iter()
      .map(Result::unwrap)
      .collect();
    assert_eq!(words(&by_regex), ["a1", "a2", "b1"]);

    let by_closure: Vec<_> = Treebank::from_path(dir.path())
      .with_filter(|p: &Path| p.extension().is_some_and(|e| e == "txt"))
      .iter()
      .map(Result::unwrap)
      .collect();
    assert_eq!(words(&by_closure), ["txt"]);
  }

  #[test]
  fn test_ragged_file_is_skipped() {
    let dir = tempdir().unwrap();
    write(&dir, "1.mrg", "(S (NP (NN one)))\n(S (NP (NN broken))\n");
    write(&dir, "2.mrg", "(S (NP (NN two)))\n");

    let mut iter = Treebank::from_path(dir.path()).iter();
    let trees: Vec<_> = iter.by_ref().map(Result::unwrap).collect();
    assert_eq!(words(&trees), ["one", "two"]);
    assert!(iter.current_source().is_none());
    assert!(iter.next().is_none());
  }

  #[test]
  fn test_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let mut iter = Treebank::from_path(dir.path().join("nope.mrg")).iter();
    assert!(matches!(iter.next(), Some(Err(TreeError::Io { .. }))));
    assert!(iter.next().is_none());
  }

  #[test]
  fn test_read_error_mid_file_ends_iteration() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1.mrg"), b"(S (NN one))\n(S (NN \xff\xfe))\n").unwrap();
    write(&dir, "2.mrg", "(S (NN two))\n");

    let mut iter = Treebank::from_path(dir.path()).iter();
    let first = iter.next().unwrap().unwrap();
    assert_eq!(first.tree.to_string(), "(S (NN one))");
    match iter.next() {
      Some(Err(TreeError::Io { source_name, .. })) => assert!(source_name.ends_with("1.mrg")),
      other => panic!("expected an i/o error, got {:?}", other),
    }
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
  }

  #[test]
  fn test_from_string_with_normalizer() {
    let src = "( (S (NP-SBJ (PRP I)) (VP (VBD ran))) )\n( (S (VP (VBD sat))) )";
    let bank = Treebank::from_string(src)
      .with_normalizer(Arc::new(PennNormalizer::default()));

    let mut iter = bank.iter();
    let first = iter.next().unwrap().unwrap();
    assert_eq!(iter.current_source(), Some("<string>"));
    assert_eq!(first.tree.to_string(), "(ROOT (S (NP (PRP I)) (VP (VBD ran))))");
    assert_eq!(first.ordinal, 1);

    // each pass starts over
    assert_eq!(bank.iter().count(), 2);
    assert_eq!((&bank).into_iter().count(), 2);
  }

  #[test]
  fn test_shared_iterator() {
    let dir = corpus();
    let shared = SharedTreebankIter::new(Treebank::from_path(dir.path()).iter());

    let handles: Vec<_> = (0..3)
      .map(|_| {
        let shared = shared.clone();
        thread::spawn(move || {
          let mut seen = Vec::new();
          while let Some(tree) = shared.next_tree() {
            seen.push(tree.unwrap().tree.yield_labels()[0].value_or_empty().to_string());
          }
          seen
        })
      })
      .collect();

    let mut seen: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    seen.sort();
    assert_eq!(seen, ["a1", "a2", "b1", "c1", "txt"]);
  }
}
