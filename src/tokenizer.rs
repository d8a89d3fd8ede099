use std::collections::VecDeque;
use std::io::{self, BufRead};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  Open,
  Close,
  Word(String),
}

/// Splits a bracketed treebank stream into `(`, `)` and whitespace-delimited words.
/// Parentheses are always tokens on their own, so `(NP(DT the))` tokenizes the same
/// as `(NP (DT the))`. Input is pulled a line at a time.
pub struct Tokenizer<R> {
  reader: R,
  pending: VecDeque<(Token, usize)>,
  buf: String,
  lines_read: usize,
  last_line: usize,
  eof: bool,
}

impl<R: BufRead> Tokenizer<R> {
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      pending: VecDeque::new(),
      buf: String::new(),
      lines_read: 0,
      last_line: 0,
      eof: false,
    }
  }

  /// Line number (1-based) of the most recently consumed token.
  pub fn line(&self) -> usize {
    self.last_line
  }

  /// Refills the queue until it has a token or the stream ends.
  fn fill(&mut self) -> io::Result<()> {
    regex_static!(TOKEN, r"[()]|[^\s()]+");

    while self.pending.is_empty() && !self.eof {
      self.buf.clear();
      if self.reader.read_line(&mut self.buf)? == 0 {
        self.eof = true;
        break;
      }
      self.lines_read += 1;
      for m in TOKEN.find_iter(&self.buf) {
        let token = match m.as_str() {
          "(" => Token::Open,
          ")" => Token::Close,
          word => Token::Word(word.to_string()),
        };
        self.pending.push_back((token, self.lines_read));
      }
    }
    Ok(())
  }

  pub fn peek(&mut self) -> io::Result<Option<&Token>> {
    self.fill()?;
    Ok(self.pending.front().map(|(t, _)| t))
  }

  pub fn next_token(&mut self) -> io::Result<Option<Token>> {
    self.fill()?;
    Ok(self.pending.pop_front().map(|(token, line)| {
      self.last_line = line;
      token
    }))
  }
}
