use std::fmt;

/// The label carried by every tree node.
///
/// For a branch `value` is the category (`NP`, `VP-SBJ`, ...), for a leaf it is the
/// word. `value` is `None` only for the anonymous wrapper produced by `( (S ...))`.
/// `tag`, `index`, `doc_id` and `sent_index` are filled in by the reader and the
/// corpus iterator for leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Label {
  pub value: Option<String>,
  pub tag: Option<String>,
  /// 1-based position in the tree's yield. `Some(0)` is reserved for the start symbol.
  pub index: Option<usize>,
  pub doc_id: Option<String>,
  pub sent_index: Option<usize>,
}

impl Label {
  pub fn new(value: impl Into<String>) -> Self {
    Self {
      value: Some(value.into()),
      ..Default::default()
    }
  }

  /// A label without a value, as used for unnamed root wrappers.
  pub fn unset() -> Self {
    Self::default()
  }

  pub fn with_index(mut self, index: usize) -> Self {
    self.index = Some(index);
    self
  }

  pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
    self.tag = Some(tag.into());
    self
  }

  pub fn value(&self) -> Option<&str> {
    self.value.as_deref()
  }

  /// The value, or the empty string for an unset label.
  pub fn value_or_empty(&self) -> &str {
    self.value().unwrap_or("")
  }

  pub fn tag(&self) -> Option<&str> {
    self.tag.as_deref()
  }
}

impl From<&str> for Label {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

/// Prints `value` for plain labels and `value/TAG-index` when tag and index are known,
/// which is the form used in dependency listings.
impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.value_or_empty())?;
    if let Some(tag) = &self.tag {
      write!(f, "/{}", tag)?;
    }
    if let Some(index) = self.index {
      write!(f, "-{}", index)?;
    }
    Ok(())
  }
}

#[test]
fn test_label_display() {
  assert_eq!(Label::new("dog").to_string(), "dog");
  assert_eq!(Label::new("dog").with_tag("NN").with_index(2).to_string(), "dog/NN-2");
  assert_eq!(Label::unset().to_string(), "");
}
