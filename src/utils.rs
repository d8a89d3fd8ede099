/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: regex::Regex = regex::Regex::new($pattern).unwrap();
    }
  };
}

/// Undoes the two read-side escapes treebanks use inside terminals: `\*` and `\/`.
pub fn unescape_terminal(word: &str) -> String {
  if !word.contains('\\') {
    return word.to_string();
  }
  word.replace("\\*", "*").replace("\\/", "/")
}

#[test]
fn test_unescape_terminal() {
  assert_eq!(unescape_terminal("1\\/2"), "1/2");
  assert_eq!(unescape_terminal("\\*T\\*-1"), "*T*-1");
  assert_eq!(unescape_terminal("plain"), "plain");
  assert_eq!(unescape_terminal("back\\slash"), "back\\slash");
}
