use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;
use patmatch::{DuplicateVars, Error, Greed, Options, Pat, Pattern, Registry, Value};
use tracing_subscriber::EnvFilter;

/// Match a value against a pattern and print the bindings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Pattern in text form, for example `[head, tail, ..]`
  pub pattern: String,
  /// Value in text form, for example `[1, 2, 3]`
  pub value: String,
  /// Quantifiers without `?` try the fewest repetitions first
  #[arg(long)]
  pub lazy: bool,
  /// Treat a variable name used twice as an error
  #[arg(long)]
  pub reject_duplicates: bool,
  /// Record tags that can be destructured positionally, like `Point(x, y)`
  #[arg(short, long)]
  pub record: Vec<String>,
}
impl Args {
  pub fn options(&self) -> Options {
    let greed = if self.lazy { Greed::Lazy } else { Greed::Greedy };
    let dups = if self.reject_duplicates { DuplicateVars::Reject } else { DuplicateVars::RequireEqual };
    Options::default().default_greed(greed).duplicates(dups)
  }
}

fn run(args: &Args) -> Result<Option<String>, Error> {
  let mut registry = Registry::new();
  for tag in &args.record {
    registry.register_record(tag);
  }
  let pattern = Pattern::compile(&Pat::parse(&args.pattern)?, &registry, &args.options())?;
  let value = Value::parse(&args.value)?;
  tracing::info!("Matching {value} against {pattern}");
  let found = pattern.matches(&value);
  Ok(found.map(|b| b.iter().map(|(k, v)| format!("{} = {v}", k.as_str())).join("\n")))
}

fn main() -> ExitCode {
  tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
  let args = Args::parse();
  match run(&args) {
    Ok(Some(bindings)) => {
      if !bindings.is_empty() {
        println!("{bindings}");
      }
      ExitCode::SUCCESS
    },
    Ok(None) => {
      eprintln!("No match");
      ExitCode::from(1)
    },
    Err(e) => {
      eprintln!("{e}");
      ExitCode::from(2)
    },
  }
}
