use std::env;
use std::io;
use std::io::Write;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cykparse::{CkyParser, Err, Grammar, Scoring};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads one sentence per line from stdin, tokens separated by whitespace.

Options:
  -h, --help       Print this message
  -c, --chart      Print the Viterbi chart (defaults to not printing)
  -j, --joint      Rank derivations by their whole probability instead of
                   by the probability of their top rule
  -n, --no-verify  Don't check that the grammar is a normalized PCFG in CNF",
    prog_name
  )
}

fn parse(parser: &CkyParser, sentence: &str, print_chart: bool) -> Result<(), Err> {
  let sentence = sentence.split_whitespace().collect::<Vec<_>>();

  let Some(chart) = parser.chart(&sentence) else {
    println!("Not in the language");
    return Ok(());
  };

  if print_chart {
    println!("chart:\n{}", chart);
  }

  let table = chart.backpointers();
  let tree = cykparse::get_tree(&table, 0, sentence.len(), parser.grammar().start())?;
  println!("{}", tree.bracketed());
  if let Some(log_prob) = chart.best_log_prob() {
    println!("log prob: {}", log_prob);
  }
  println!();

  Ok(())
}

struct Args {
  filename: String,
  print_chart: bool,
  scoring: Scoring,
  verify: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "cli"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_default();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut print_chart = false;
    let mut scoring = Scoring::LocalRule;
    let mut verify = true;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-j" || o == "--joint" {
        scoring = Scoring::Joint;
      } else if o == "-n" || o == "--no-verify" {
        verify = false;
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        print_chart,
        scoring,
        verify,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::read_from_file(&opts.filename)?;
  if opts.verify {
    g.verify()
      .map_err(|e| -> Err { format!("{}: {}", opts.filename, e).into() })?;
  }
  info!(
    file = %opts.filename,
    rules = g.rules().len(),
    nonterminals = g.nonterminal_count(),
    start = g.start(),
    "loaded grammar"
  );

  let parser = CkyParser::new(&g).with_scoring(opts.scoring);

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&parser, input.trim(), opts.print_chart)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
