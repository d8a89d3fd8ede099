use std::env;
use std::io;
use std::io::Write;
use std::process;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use treeheads::{
  DependencyExtractor, HeadFinder, HeadRuleTable, PennNormalizer, RuleHeadFinder, RuleSet, Scheme,
  SuffixFilter, Treebank,
};

type Err = Box<dyn std::error::Error + 'static>;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} PATH [options]

Reads every bracketed tree in PATH (a file, or a directory walked breadth-first).

Options:
  -h, --help            Print this message
  -r, --rules RULES     collins, modcollins, or a head rule file (defaults to modcollins)
  -s, --suffix SUFFIX   Only read files ending in SUFFIX inside directories
  -H, --heads           Print the head word of each tree
  -d, --deps            Print dependencies
  -u, --unnamed         Print dependencies without relations
  -p, --pretty          Pretty-print trees
  -q, --quiet           Don't print trees

Set RUST_LOG (e.g. RUST_LOG=treeheads=debug) for diagnostics.",
    prog_name
  )
}

struct Args {
  path: String,
  rules: String,
  suffix: Option<String>,
  print_heads: bool,
  print_deps: bool,
  unnamed: bool,
  pretty: bool,
  quiet: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = match iter.next() {
      Some(name) => name,
      None => return Err(Self::make_error_message("bad argument vector", "treeheads")),
    };

    let mut path: Option<String> = None;
    let mut rules = "modcollins".to_string();
    let mut suffix = None;
    let mut print_heads = false;
    let mut print_deps = false;
    let mut unnamed = false;
    let mut pretty = false;
    let mut quiet = false;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-r" || o == "--rules" {
        match iter.next() {
          Some(r) => rules = r,
          None => return Err(Self::make_error_message("--rules needs a value", prog_name)),
        }
      } else if o == "-s" || o == "--suffix" {
        match iter.next() {
          Some(s) => suffix = Some(s),
          None => return Err(Self::make_error_message("--suffix needs a value", prog_name)),
        }
      } else if o == "-H" || o == "--heads" {
        print_heads = true;
      } else if o == "-d" || o == "--deps" {
        print_deps = true;
      } else if o == "-u" || o == "--unnamed" {
        print_deps = true;
        unnamed = true;
      } else if o == "-p" || o == "--pretty" {
        pretty = true;
      } else if o == "-q" || o == "--quiet" {
        quiet = true;
      } else if path.is_none() && !o.starts_with('-') {
        path = Some(o);
      } else {
        return Err(Self::make_error_message(&format!("invalid argument {}", o), prog_name));
      }
    }

    match path {
      Some(path) => Ok(Self {
        path,
        rules,
        suffix,
        print_heads,
        print_deps,
        unnamed,
        pretty,
        quiet,
      }),
      None => Err(Self::make_error_message("missing path", prog_name)),
    }
  }
}

/// A built-in rule set by name, with the coordination fix, or a rule file as is.
fn load_finder(rules: &str) -> Result<RuleHeadFinder, Err> {
  match rules.parse::<RuleSet>() {
    Ok(RuleSet::Collins) => Ok(RuleHeadFinder::collins()),
    Ok(RuleSet::ModifiedCollins) => Ok(RuleHeadFinder::modified_collins()),
    Err(_) => Ok(RuleHeadFinder::new(Arc::new(HeadRuleTable::read_from_file(rules)?))),
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let finder = load_finder(&opts.rules)?;
  let scheme = if opts.unnamed { Scheme::Unnamed } else { Scheme::Collins };
  let extractor = DependencyExtractor::default().with_scheme(scheme);

  let mut bank =
    Treebank::from_path(&opts.path).with_normalizer(Arc::new(PennNormalizer::default()));
  if let Some(suffix) = &opts.suffix {
    bank = bank.with_filter(SuffixFilter::new(suffix.as_str()));
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  let (mut trees, mut failed, mut incomplete) = (0usize, 0usize, 0usize);

  for item in bank.iter() {
    let item = item?;
    trees += 1;

    if !opts.quiet {
      writeln!(out, "# {}:{}", item.source, item.ordinal)?;
      if opts.pretty {
        writeln!(out, "{}", item.tree.pretty())?;
      } else {
        writeln!(out, "{}", item.tree)?;
      }
    }

    if opts.print_heads {
      match finder.head_terminal(&item.tree) {
        Ok(head) => writeln!(out, "head: {}", head.label())?,
        Err(e) => {
          failed += 1;
          warn!(source = %item.source, ordinal = item.ordinal, "{}", e);
        }
      }
    }

    if opts.print_deps {
      match extractor.extract(&item.tree, &finder) {
        Ok(deps) => {
          if !deps.is_complete() {
            incomplete += 1;
          }
          for dep in &deps {
            writeln!(out, "  {}", dep)?;
          }
        }
        Err(e) => {
          failed += 1;
          warn!(source = %item.source, ordinal = item.ordinal, "{}", e);
        }
      }
    }

    if opts.print_heads || opts.print_deps || !opts.quiet {
      writeln!(out)?;
    }
  }

  info!(trees, failed, incomplete, "done");
  if incomplete > 0 {
    warn!(incomplete, "some trees produced an incomplete dependency set");
  }
  Ok(())
}
