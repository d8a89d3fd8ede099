#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod utils;

pub mod corpus;
pub mod dependency;
pub mod error;
pub mod headfinder;
pub mod headrules;
pub mod label;
pub mod language;
pub mod normalize;
pub mod reader;
pub mod syntree;
pub mod tokenizer;

pub use crate::corpus::{
  CorpusTree, FileFilter, RegexFilter, SharedTreebankIter, SuffixFilter, Treebank, TreebankIter,
};
pub use crate::dependency::{
  CollinsRelation, Dependency, DependencyExtractor, Extraction, Relation, Scheme, Side,
  extract_dependencies,
};
pub use crate::error::{HeadError, RuleError, TreeError};
pub use crate::headfinder::{HeadFinder, PostOperation, RuleHeadFinder, coordination_fix};
pub use crate::headrules::{Direction, HeadClause, HeadRuleTable, RuleSet};
pub use crate::label::Label;
pub use crate::language::{PennLanguage, TreebankLanguage};
pub use crate::normalize::{NoopNormalizer, NormalizerChain, PennNormalizer, TreeNormalizer};
pub use crate::reader::TreeReader;
pub use crate::syntree::SynTree;

#[test]
fn test_corpus_to_dependencies() {
  use std::sync::Arc;

  let bank = Treebank::from_string(
    r#"
    ( (S (NP-SBJ (NNP Ms.) (NNP Haag)) (VP (VBZ plays) (NP (NNP Elianti))) (. .)) )
    ( (S (NP-SBJ (DT The) (NN bill)) (VP (VBD passed) (PP (IN in) (NP (DT the) (NNP Senate)))) (. .)) )
    ( (S (NP-SBJ-1 (PRP He)) (VP (VBD tried) (S (NP-SBJ (-NONE- *-1)) (VP (TO to) (VP (VB go))))) (. .)) )
    "#,
  )
  .with_normalizer(Arc::new(PennNormalizer::default()));

  let finder = RuleHeadFinder::modified_collins();
  let extractor = DependencyExtractor::default();

  let mut roots = Vec::new();
  for item in bank.iter() {
    let item = item.unwrap();
    let deps = extractor.extract(&item.tree, &finder).unwrap();
    assert!(deps.is_complete(), "{}", item.tree);
    roots.push(deps.iter().find(|d| d.governor.index == Some(0)).unwrap().dependent.clone());
  }

  let roots: Vec<_> = roots.iter().map(|l| l.value_or_empty()).collect();
  assert_eq!(roots, ["plays", "passed", "tried"]);
}
