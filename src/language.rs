/// The bits of a treebank's conventions the reader, normalizers and head finders
/// depend on.
pub trait TreebankLanguage: Send + Sync {
  /// Strips functional annotations from a category: `NP-SBJ-1` -> `NP`.
  fn basic_category<'a>(&self, category: &'a str) -> &'a str;

  fn is_punctuation_tag(&self, tag: &str) -> bool;

  /// Every punctuation tag, used as the default set of categories a head finder avoids.
  fn punctuation_tags(&self) -> &[&'static str];

  fn start_symbol(&self) -> &str;

  /// Whether a pre-terminal category marks an empty element (trace, null complementizer).
  fn is_empty_node(&self, category: &str) -> bool;
}

const PENN_PUNCTUATION_TAGS: &[&str] = &["''", "``", "-LRB-", "-RRB-", ".", ":", ","];

const PENN_ANNOTATION_CHARS: &[char] = &['-', '=', '|', '#', '^', '~', '_'];

/// Penn Treebank conventions for English.
#[derive(Debug, Clone, Copy, Default)]
pub struct PennLanguage;

impl TreebankLanguage for PennLanguage {
  fn basic_category<'a>(&self, category: &'a str) -> &'a str {
    // a category that starts with an annotation char (-NONE-, -LRB-) keeps everything
    // up to the matching closing char
    let mut opened_with = None;
    for (idx, c) in category.char_indices() {
      if !PENN_ANNOTATION_CHARS.contains(&c) {
        continue;
      }
      if idx == 0 {
        opened_with = Some(c);
      } else if opened_with == Some(c) {
        opened_with = None;
      } else {
        return &category[..idx];
      }
    }
    category
  }

  fn is_punctuation_tag(&self, tag: &str) -> bool {
    PENN_PUNCTUATION_TAGS.contains(&tag)
  }

  fn punctuation_tags(&self) -> &[&'static str] {
    PENN_PUNCTUATION_TAGS
  }

  fn start_symbol(&self) -> &str {
    "ROOT"
  }

  fn is_empty_node(&self, category: &str) -> bool {
    category == "-NONE-"
  }
}
