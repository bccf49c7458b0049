use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use musiclists::collection::Collection;
use musiclists::config::MatchConfig;
use musiclists::dedup::find_duplicates;
use musiclists::ledger::Ledger;
use musiclists::progress::set_quiet;
use musiclists::resolve::ConsolePrompt;
use musiclists::scan::scan;
use musiclists::store::{DataStore, Location};

#[derive(Parser)]
#[command(name = "musiclists")]
#[command(about = "Merge and dedup top-album lists from different sources")]
struct Args {
    /// Data root holding the download/merge/diff/dedup directories
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Hide progress bars
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Comparison columns (repeatable)
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Minimum similarity a candidate must reach
    #[arg(long, default_value_t = 0.6)]
    min_rate: f64,

    /// Maximum candidates presented per record
    #[arg(long, default_value_t = 15)]
    max_results: usize,

    /// Scale factor for numeric column differences
    #[arg(long, default_value_t = 0.25)]
    numeric_tolerance: f64,

    /// Truncation length for id fragments
    #[arg(long, default_value_t = 22)]
    id_length: usize,

    /// Present every candidate as an indexed choice instead of
    /// confirming only the best one
    #[arg(long)]
    all_matches: bool,
}

impl MatchArgs {
    fn config(&self) -> MatchConfig {
        MatchConfig {
            min_rate: self.min_rate,
            max_results: self.max_results,
            numeric_tolerance: self.numeric_tolerance,
            id_length: self.id_length,
            highest_match_only: !self.all_matches,
        }
    }

    fn columns(&self) -> Vec<String> {
        MatchConfig::columns(Some(&self.columns))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Interactively resolve duplicates between two downloaded lists
    Dedup {
        name_a: String,
        name_b: String,
        #[command(flatten)]
        opts: MatchArgs,
    },
    /// List similar cross-list pairs without prompting
    Scan {
        name_a: String,
        name_b: String,
        #[command(flatten)]
        opts: MatchArgs,
    },
    /// Union of two lists, excluding resolved duplicates
    Merge {
        name_a: String,
        name_b: String,
        #[arg(long, default_value_t = 22)]
        id_length: usize,
    },
    /// Records of the first list absent from the second
    Diff {
        name_a: String,
        name_b: String,
        #[arg(long, default_value_t = 22)]
        id_length: usize,
    },
    /// Report colliding canonical ids within one list
    Duplicates {
        name: String,
        #[arg(long, default_value_t = 22)]
        id_length: usize,
    },
    /// Fuzzy text search within one list
    Search {
        name: String,
        text: String,
        #[arg(long = "column")]
        columns: Vec<String>,
        #[arg(long, default_value_t = 15)]
        max_results: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_quiet(args.quiet);
    let store = DataStore::new(&args.data_dir);

    match args.command {
        Command::Dedup {
            name_a,
            name_b,
            opts,
        } => {
            let cfg = opts.config();
            let mut prompt = ConsolePrompt;
            let accepted =
                find_duplicates(&store, &name_a, &name_b, &opts.columns(), &cfg, &mut prompt)?;
            if !args.quiet {
                println!("{accepted} new matches recorded for {name_a}-{name_b}.");
            }
        }
        Command::Scan {
            name_a,
            name_b,
            opts,
        } => {
            let cfg = opts.config();
            let a = Collection::load(&store, &name_a, Location::Download, cfg.id_length)?;
            let b = Collection::load(&store, &name_b, Location::Download, cfg.id_length)?;
            for hit in scan(&a, &b, &opts.columns(), &cfg)? {
                println!(
                    "{:5.1}%  «{}»  ~  «{}»",
                    hit.similarity * 100.0,
                    a.records[hit.left],
                    b.records[hit.right],
                );
            }
        }
        Command::Merge {
            name_a,
            name_b,
            id_length,
        } => {
            let a = Collection::load(&store, &name_a, Location::Download, id_length)?;
            let b = Collection::load(&store, &name_b, Location::Download, id_length)?;
            let ledger = Ledger::open(&store, &name_a, &name_b)?;
            let merged = a.merge_with(&b, &ledger)?;
            merged.report_duplicate_ids(id_length);
            merged.save(&store)?;
            if !args.quiet {
                println!(
                    "Wrote {} records to merge/{}.",
                    merged.records.len(),
                    merged.name
                );
            }
        }
        Command::Diff {
            name_a,
            name_b,
            id_length,
        } => {
            let a = Collection::load(&store, &name_a, Location::Download, id_length)?;
            let b = Collection::load(&store, &name_b, Location::Download, id_length)?;
            let ledger = Ledger::open(&store, &name_a, &name_b)?;
            let diff = a.diff_with(&b, &ledger)?;
            diff.save(&store)?;
            if !args.quiet {
                println!("Wrote {} records to diff/{}.", diff.records.len(), diff.name);
            }
        }
        Command::Duplicates { name, id_length } => {
            let c = Collection::load(&store, &name, Location::Download, id_length)?;
            if c.duplicate_ids().is_empty() {
                println!("No duplicated ids in '{name}'.");
            } else {
                c.report_duplicate_ids(id_length);
            }
        }
        Command::Search {
            name,
            text,
            columns,
            max_results,
        } => {
            let c = Collection::load(&store, &name, Location::Download, 22)?;
            let columns = MatchConfig::columns(Some(&columns));
            for (score, record) in c.search(&text, &columns, max_results) {
                println!("{score:6.3}  «{record}»");
            }
        }
    }
    Ok(())
}
