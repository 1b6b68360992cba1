use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use offsearch_core::persist::{load_snapshot, save_snapshot, IndexPaths};
use offsearch_core::searchbox::parse_max_results;
use offsearch_core::{
    parse_documents, Analyzer, BuildReport, Document, FieldWeights, Popover, SearchBox, SearchBoxConfig, SearchEngine,
    SkippedDocument,
};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, check and query offline search indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index in memory and report skipped documents
    Check {
        /// Index data file, or a directory of them
        #[arg(long)]
        input: String,
        /// Reduce terms to their English stem
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
    /// Build the index and write a snapshot directory
    Build {
        /// Index data file, or a directory of them
        #[arg(long)]
        input: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
        /// Reduce terms to their English stem
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
    /// Run a query and print the ranked results
    Search {
        /// Index data file or directory
        #[arg(long, conflicts_with = "snapshot", required_unless_present = "snapshot")]
        input: Option<String>,
        /// Snapshot directory written by `build`
        #[arg(long)]
        snapshot: Option<String>,
        /// Stem terms when building from --input; a snapshot keeps the analyzer it was built with
        #[arg(long, default_value_t = false, conflicts_with = "snapshot")]
        stem: bool,
        /// Query string
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = 10, value_parser = |s: &str| parse_max_results(s).map_err(|e| e.to_string()))]
        max_results: usize,
        #[arg(long, default_value = "/")]
        base_href: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { input, stem } => {
            print_report(&build_engine(&input, stem)?);
            Ok(())
        }
        Commands::Build { input, output, stem } => {
            let outcome = build_engine(&input, stem)?;
            print_report(&outcome);
            let meta = save_snapshot(&IndexPaths::new(&output), &outcome.engine)?;
            tracing::info!(output = %output, num_docs = meta.num_docs, "snapshot written");
            Ok(())
        }
        Commands::Search { input, snapshot, stem, q, max_results, base_href } => {
            print_popover(&run_search(input, snapshot, stem, &q, max_results, base_href)?);
            Ok(())
        }
    }
}

/// Load the index into a fresh search box and type `q` into it.
fn run_search(
    input: Option<String>,
    snapshot: Option<String>,
    stem: bool,
    q: &str,
    max_results: usize,
    base_href: String,
) -> Result<Popover> {
    let (index_source_url, from_snapshot) = match (input, snapshot) {
        (_, Some(dir)) => (dir, true),
        (Some(input), None) => (input, false),
        (None, None) => bail!("either --input or --snapshot is required"),
    };
    let loaded = if from_snapshot {
        load_snapshot(&IndexPaths::new(&index_source_url)).map(|(engine, _)| engine)
    } else {
        build_engine(&index_source_url, stem).map(|outcome| outcome.engine)
    };
    // the CLI drives the same search box state an embedding page would
    let mut search_box = SearchBox::new(SearchBoxConfig { index_source_url, max_results, base_href });
    let engine = match loaded {
        Ok(engine) => engine,
        Err(err) => {
            search_box.load_failed(&err);
            return Err(err);
        }
    };
    search_box.attach(Arc::new(engine));
    Ok(search_box.input_changed(q))
}

fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

/// A built engine plus what was left out of it.
struct Outcome {
    engine: SearchEngine,
    report: BuildReport,
    /// Entries rejected while parsing, with their file.
    malformed: Vec<(PathBuf, SkippedDocument)>,
}

fn build_engine(input: &str, stem: bool) -> Result<Outcome> {
    let files = input_files(Path::new(input));
    if files.is_empty() {
        bail!("no index data files found at {input}");
    }

    let mut documents: Vec<Document> = Vec::new();
    let mut malformed = Vec::new();
    for file in files {
        let bytes = fs::read(&file)?;
        let parsed = parse_documents(&bytes)?;
        tracing::info!(file = %file.display(), documents = parsed.documents.len(), "read index data file");
        malformed.extend(parsed.skipped.into_iter().map(|s| (file.clone(), s)));
        documents.extend(parsed.documents);
    }

    let analyzer = if stem { Analyzer::stemming() } else { Analyzer::default() };
    let (engine, report) = SearchEngine::with_options(&documents, FieldWeights::default(), analyzer)?;
    Ok(Outcome { engine, report, malformed })
}

fn print_report(outcome: &Outcome) {
    let skipped = outcome.report.skipped.len() + outcome.malformed.len();
    println!("indexed {} documents, skipped {skipped}", outcome.report.indexed);
    for (file, s) in &outcome.malformed {
        println!("  {} #{}: {}", file.display(), s.position, s.reason);
    }
    // positions count across all input files, in read order
    for s in &outcome.report.skipped {
        println!("  document #{}: {}", s.position, s.reason);
    }
}

fn print_popover(popover: &Popover) {
    match popover {
        Popover::Hidden => {}
        Popover::NoResults { message, .. } => println!("{message}"),
        Popover::Results { results, .. } => {
            for (rank, r) in results.iter().enumerate() {
                println!("{:>3}. {:>10.3}  {}  {}", rank + 1, r.score, r.title, r.href);
                if !r.last_mod_date.is_empty() {
                    println!("     modified {}", r.last_mod_date);
                }
                if let Some(description) = &r.description {
                    println!("     {description}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const INDEX_JSON: &str = r#"[
        {"ref": "/running", "title": "Running the server"},
        {"ref": "/config", "title": "Config"}
    ]"#;

    fn write_index() -> (tempfile::TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offline-search-index.json");
        fs::write(&path, INDEX_JSON).unwrap();
        let input = path.to_string_lossy().into_owned();
        (dir, input)
    }

    fn first_ref(popover: &Popover) -> Option<&str> {
        match popover {
            Popover::Results { results, .. } => results.first().map(|r| r.reference.as_str()),
            _ => None,
        }
    }

    #[test]
    fn search_accepts_stem_flag() {
        let cli = Cli::try_parse_from(["indexer", "search", "--input", "i.json", "--stem", "--q", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { stem: true, .. }));
        assert!(Cli::try_parse_from(["indexer", "search", "--snapshot", "snap", "--stem", "--q", "run"]).is_err());
        assert!(Cli::try_parse_from(["indexer", "search", "--input", "i.json", "--q", "run", "--max-results", "0"]).is_err());
    }

    #[test]
    fn stemmed_search_matches_inflections() {
        let (_dir, input) = write_index();
        // "runs" stems to "run", as does "running" in the stemmed index
        let stemmed = run_search(Some(input.clone()), None, true, "runs", 10, "/".into()).unwrap();
        assert_eq!(first_ref(&stemmed), Some("/running"));
        let literal = run_search(Some(input), None, false, "runs", 10, "/".into()).unwrap();
        assert!(matches!(literal, Popover::NoResults { .. }));
    }

    #[test]
    fn search_runs_through_search_box() {
        let (_dir, input) = write_index();
        let popover = run_search(Some(input.clone()), None, false, "config", 10, "/docs/".into()).unwrap();
        match &popover {
            Popover::Results { query, results } => {
                assert_eq!(query, "config");
                assert_eq!(results[0].href, "/docs/config");
            }
            other => panic!("unexpected popover {other:?}"),
        }
        assert!(run_search(Some(input), None, false, "  ", 10, "/".into()).unwrap().is_hidden());
    }

    #[test]
    fn search_from_snapshot_keeps_its_analyzer() {
        let (dir, input) = write_index();
        let snap = dir.path().join("snap");
        let outcome = build_engine(&input, true).unwrap();
        save_snapshot(&IndexPaths::new(&snap), &outcome.engine).unwrap();
        let snap = snap.to_string_lossy().into_owned();
        let popover = run_search(None, Some(snap), false, "runs", 10, "/".into()).unwrap();
        assert_eq!(first_ref(&popover), Some("/running"));
    }

    #[test]
    fn missing_input_fails_the_search() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("none.json").to_string_lossy().into_owned();
        assert!(run_search(Some(missing), None, false, "config", 10, "/".into()).is_err());
    }
}
