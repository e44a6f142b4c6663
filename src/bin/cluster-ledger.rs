//! Cluster Ledger CLI
//!
//! Usage:
//!   cluster-ledger convert <logs>... [--out-dir dir] [--commit hash]
//!   cluster-ledger merge <inputs>... [--out file]
//!   cluster-ledger compare <inputs>... --out-dir dir
//!   cluster-ledger pending-quality <inputs>...
//!   cluster-ledger repair-links <files>...

use chrono::Utc;
use clap::{Parser, Subcommand};
use cluster_ledger::compare::AutoPartitionReader;
use cluster_ledger::fragment::{discover, write_report};
use cluster_ledger::view::missing_quality;
use cluster_ledger::{
    repair_file, ComparisonPipeline, ContingencyMeasure, FragmentSink, LedgerConfig, LogConverter,
    SimilarityWorker,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "cluster-ledger",
    version,
    about = "Aggregate clustering experiment records and compare clusterings"
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert run logs into JSON fragments
    Convert {
        /// Log files to convert, one fragment each
        #[arg(required = true)]
        logs: Vec<PathBuf>,
        /// Directory for the report files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Commit hash stamped onto program runs
        #[arg(long, default_value = "unknown")]
        commit: String,
    },
    /// Merge fragments into one aggregate
    Merge {
        /// Fragment files, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Output file; stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score every clustering pair not compared yet
    Compare {
        /// Fragment files, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Directory for comparison fragments
        #[arg(long)]
        out_dir: PathBuf,
        /// Worker count, overriding the config
        #[arg(long)]
        concurrency: Option<usize>,
        /// Root for relative artifact paths, overriding the config
        #[arg(long)]
        artifact_root: Option<PathBuf>,
    },
    /// List clusterings missing quality measures
    PendingQuality {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Link orphaned algorithm runs to their program run, in place
    RepairLinks {
        #[arg(required = true)]
        files: Vec<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn inputs_to_paths(inputs: &[String]) -> Result<Vec<PathBuf>, String> {
    let paths = discover(inputs).map_err(|e| e.to_string())?;
    if paths.is_empty() {
        return Err("no fragment files found".to_string());
    }
    Ok(paths)
}

fn cmd_convert(logs: &[PathBuf], out_dir: &Path, commit: &str) -> i32 {
    let converter = LogConverter::new().with_commit(commit);
    let mut code = 0;
    for log in logs {
        let text = match std::fs::read_to_string(log) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: cannot read '{}': {}", log.display(), e);
                code = 1;
                continue;
            }
        };
        let now = Utc::now();
        let fragment = match converter.clone().with_timestamp(now).convert(&text) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: {}: {}", log.display(), e);
                code = 1;
                continue;
            }
        };
        if fragment.is_empty() {
            eprintln!("No records in '{}', nothing written", log.display());
            continue;
        }
        match write_report(out_dir, &fragment, now, commit) {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                code = 1;
            }
        }
    }
    code
}

fn cmd_merge(config: &LedgerConfig, inputs: &[String], out: Option<&Path>) -> i32 {
    let paths = match inputs_to_paths(inputs) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut store = match cluster_ledger::RecordStore::load(&paths, config.merge_policy) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(display) = &config.display {
        display.apply(&mut store);
    }
    let json = match store.to_fragment().to_json() {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match out {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => {
                println!("Merged {} fragments into {}", paths.len(), path.display());
                0
            }
            Err(e) => {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                1
            }
        },
        None => {
            println!("{}", json);
            0
        }
    }
}

fn cmd_compare(config: LedgerConfig, inputs: &[String], out_dir: &Path) -> i32 {
    let paths = match inputs_to_paths(inputs) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        eprintln!("Error: cannot create '{}': {}", out_dir.display(), e);
        return 1;
    }

    let worker = SimilarityWorker::new(Arc::new(AutoPartitionReader), Arc::new(ContingencyMeasure));
    let sink = Arc::new(FragmentSink::new(out_dir));
    let pipeline = ComparisonPipeline::new(config, worker, sink);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {}", e);
            return 1;
        }
    };
    match runtime.block_on(pipeline.run(&paths)) {
        Ok(report) => {
            println!(
                "{} fragments, {} candidate pairs, {} already scored",
                report.fragments, report.candidates, report.already_scored
            );
            println!(
                "scored {}, not computed {}, failed {}",
                report.batch.scored.len(),
                report.batch.not_computed.len(),
                report.batch.failed.len()
            );
            for failure in &report.batch.failed {
                match &failure.pair {
                    Some(pair) => eprintln!("  {}: {}", pair, failure.error),
                    None => eprintln!("  {}", failure.error),
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_pending_quality(config: &LedgerConfig, inputs: &[String]) -> i32 {
    let store = match inputs_to_paths(inputs)
        .and_then(|paths| cluster_ledger::RecordStore::load(&paths, config.merge_policy).map_err(|e| e.to_string()))
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for id in missing_quality(&store) {
        println!("{}", id);
    }
    0
}

fn cmd_repair_links(config: &LedgerConfig, files: &[String]) -> i32 {
    let paths = match inputs_to_paths(files) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for path in &paths {
        match repair_file(path, &config.binaries) {
            Ok(true) => println!("Repaired {}", path.display()),
            Ok(false) => {}
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return 1;
            }
        }
    }
    0
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = match LedgerConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let code = match cli.command {
        Commands::Convert { logs, out_dir, commit } => cmd_convert(&logs, &out_dir, &commit),
        Commands::Merge { inputs, out } => cmd_merge(&config, &inputs, out.as_deref()),
        Commands::Compare {
            inputs,
            out_dir,
            concurrency,
            artifact_root,
        } => {
            let mut config = config;
            if concurrency.is_some() {
                config.concurrency = concurrency;
            }
            if artifact_root.is_some() {
                config.artifact_root = artifact_root;
            }
            cmd_compare(config, &inputs, &out_dir)
        }
        Commands::PendingQuality { inputs } => cmd_pending_quality(&config, &inputs),
        Commands::RepairLinks { files } => cmd_repair_links(&config, &files),
    };
    std::process::exit(code);
}
