//! Benchmark CLI for the ordtree engines.
//!
//! Usage:
//!   ordtree_bench run <data_file> [--order N] [--engine E] [--delimiter C] [--json]
//!   ordtree_bench generate <data_file> <count>
//!   ordtree_bench dump <data_file> <btree|bplus> [--order N] [--delimiter C]
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `ordtree=info`).

use ordtree::{BPlusTree, BTree, BenchConfig, Engine, TreeError, Workload};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::exit;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: ordtree_bench <command> [args...]");
    eprintln!("Commands:");
    eprintln!("  run <file> [--order N] [--engine E] [--delimiter C] [--json]");
    eprintln!("                              - Time insert/search/delete per engine");
    eprintln!("  generate <file> <count>     - Write count key,value records");
    eprintln!("  dump <file> <engine> [--order N] [--delimiter C]");
    eprintln!("                              - Print the loaded tree as JSON");
    exit(1);
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("ERROR: {}", err);
    exit(1);
}

/// Value following `--name`, if present
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .map(|i| match args.get(i + 1) {
            Some(value) => value.as_str(),
            None => fail(TreeError::invalid_argument(format!("{name} needs a value"))),
        })
}

fn parse_order(args: &[String], default: usize) -> usize {
    match flag(args, "--order") {
        Some(raw) => raw
            .parse()
            .unwrap_or_else(|_| fail(TreeError::invalid_argument(format!("bad order '{raw}'")))),
        None => default,
    }
}

/// Field separator given with `--delimiter`, defaulting to ','
fn parse_delimiter(args: &[String]) -> Result<char, TreeError> {
    let Some(raw) = flag(args, "--delimiter") else {
        return Ok(BenchConfig::default().delimiter);
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(TreeError::invalid_argument("delimiter must be one character")),
    }
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ordtree=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }
    init_logging();

    let command = &args[1];
    let path = &args[2];
    let rest = &args[3..];

    match command.as_str() {
        "run" => {
            let mut config = BenchConfig::new().order(parse_order(rest, ordtree::bench::DEFAULT_BENCH_ORDER));
            if let Some(raw) = flag(rest, "--engine") {
                let engine: Engine = raw.parse().unwrap_or_else(|e| fail(e));
                config = config.engines([engine]);
            }
            config = config.delimiter(parse_delimiter(rest).unwrap_or_else(|e| fail(e)));

            let workload = Workload::load(path, config.delimiter).unwrap_or_else(|e| fail(e));
            let reports = ordtree::bench::run(&config, &workload).unwrap_or_else(|e| fail(e));

            if rest.iter().any(|a| a == "--json") {
                match serde_json::to_string_pretty(&reports) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(e),
                }
                return;
            }

            println!("RECORDS: {}", workload.len());
            println!("SKIPPED: {}", workload.skipped);
            for report in reports {
                println!();
                println!("ENGINE: {}", report.engine);
                println!("STORED: {}", report.stored);
                println!("INSERT_MS: {:.3}", report.insert_ms);
                println!("SEARCH_MS: {:.3} (misses: {})", report.search_ms, report.search_misses);
                println!("DELETE_MS: {:.3} (misses: {})", report.delete_ms, report.delete_misses);
            }
        }

        "generate" => {
            let count: usize = match rest.first().map(|raw| raw.parse()) {
                Some(Ok(n)) => n,
                _ => fail(TreeError::invalid_argument("generate needs a record count")),
            };

            let start = Instant::now();
            let file = File::create(path).unwrap_or_else(|e| fail(e));
            let mut out = BufWriter::new(file);
            for i in 0..count {
                if let Err(e) = writeln!(out, "key_{:08},value_{}", i, i) {
                    fail(e);
                }
            }
            if let Err(e) = out.flush() {
                fail(e);
            }

            println!("GENERATED: {}", count);
            println!("TIME_MS: {}", start.elapsed().as_millis());
        }

        "dump" => {
            let engine: Engine = match rest.first() {
                Some(raw) => raw.parse().unwrap_or_else(|e| fail(e)),
                None => usage(),
            };
            let order = parse_order(rest, ordtree::DEFAULT_ORDER);
            let delimiter = parse_delimiter(rest).unwrap_or_else(|e| fail(e));
            let workload = Workload::load(path, delimiter).unwrap_or_else(|e| fail(e));

            let export = match engine {
                Engine::BTree => {
                    let mut tree = BTree::new(order).unwrap_or_else(|e| fail(e));
                    for (key, value) in workload.records {
                        tree.insert(key, value);
                    }
                    tree.export_tree()
                }
                Engine::BPlus => {
                    let mut tree = BPlusTree::new(order).unwrap_or_else(|e| fail(e));
                    for (key, value) in workload.records {
                        tree.insert(key, value);
                    }
                    tree.export_tree()
                }
                Engine::Hash => fail(TreeError::invalid_argument("the hash table has no tree to dump")),
            };

            match serde_json::to_string_pretty(&export) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(e),
            }
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            exit(1);
        }
    }
}
