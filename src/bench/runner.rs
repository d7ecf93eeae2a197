//! Timed insert, search and delete phases.

use super::{BenchConfig, Engine, Workload};
use crate::bplus::BPlusTree;
use crate::btree::BTree;
use crate::error::Result;
use crate::hash::LinearProbingMap;
use crate::store::KvStore;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

/// Timings and miss counts of one engine over one workload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchReport {
    pub engine: Engine,
    /// Records in the workload
    pub records: usize,
    /// Distinct keys stored after the insert phase
    pub stored: usize,
    pub insert_ms: f64,
    pub search_ms: f64,
    pub delete_ms: f64,
    pub search_misses: usize,
    pub delete_misses: usize,
}

/// Build an empty store for `engine` from the harness configuration
pub fn build_store(
    engine: Engine,
    config: &BenchConfig,
) -> Result<Box<dyn KvStore<String, String>>> {
    Ok(match engine {
        Engine::Hash => Box::new(LinearProbingMap::with_capacity(config.hash_capacity)),
        Engine::BTree => Box::new(BTree::new(config.order)?),
        Engine::BPlus => Box::new(BPlusTree::new(config.order)?),
    })
}

/// Run every configured engine over the workload, in configuration order
pub fn run(config: &BenchConfig, workload: &Workload) -> Result<Vec<BenchReport>> {
    if workload.skipped > 0 {
        warn!(skipped = workload.skipped, "workload contained malformed records");
    }

    let mut reports = Vec::with_capacity(config.engines.len());
    for &engine in &config.engines {
        let mut store = build_store(engine, config)?;
        let span = info_span!("bench", engine = %engine, order = config.order);
        let _guard = span.enter();
        reports.push(measure(engine, store.as_mut(), workload));
    }
    Ok(reports)
}

fn measure(engine: Engine, store: &mut dyn KvStore<String, String>, workload: &Workload) -> BenchReport {
    let records = workload.len();

    let start = Instant::now();
    for (key, value) in &workload.records {
        store.insert(key.clone(), value.clone());
    }
    let insert = start.elapsed();
    let stored = store.len();
    info!(records, stored, elapsed_ms = millis(insert), "insert phase complete");

    let start = Instant::now();
    let search_misses = workload
        .keys()
        .filter(|key| store.search(key).is_err())
        .count();
    let search = start.elapsed();
    info!(misses = search_misses, elapsed_ms = millis(search), "search phase complete");

    let start = Instant::now();
    let delete_misses = workload
        .keys()
        .filter(|key| store.delete(key).is_err())
        .count();
    let delete = start.elapsed();
    info!(misses = delete_misses, elapsed_ms = millis(delete), "delete phase complete");

    BenchReport {
        engine,
        records,
        stored,
        insert_ms: millis(insert),
        search_ms: millis(search),
        delete_ms: millis(delete),
        search_misses,
        delete_misses,
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn workload(lines: &str) -> Workload {
        Workload::from_reader(Cursor::new(lines), ',').unwrap()
    }

    #[test]
    fn test_run_all_engines() -> Result<()> {
        let data: String = (0..500).map(|i| format!("key{i:05},value{i}\n")).collect();
        let workload = workload(&data);
        let reports = run(&BenchConfig::new().order(4), &workload)?;

        assert_eq!(reports.len(), 3);
        for (report, engine) in reports.iter().zip(Engine::ALL) {
            assert_eq!(report.engine, engine);
            assert_eq!(report.records, 500);
            assert_eq!(report.stored, 500);
            assert_eq!(report.search_misses, 0);
            assert_eq!(report.delete_misses, 0);
        }
        Ok(())
    }

    #[test]
    fn test_duplicate_keys_count_as_delete_misses() -> Result<()> {
        let workload = workload("a,1\nb,2\na,3\n");
        let config = BenchConfig::new().order(3).engines([Engine::BTree]);
        let reports = run(&config, &workload)?;

        assert_eq!(reports[0].stored, 2);
        assert_eq!(reports[0].search_misses, 0);
        assert_eq!(reports[0].delete_misses, 1);
        Ok(())
    }

    #[test]
    fn test_invalid_order_rejected() {
        let config = BenchConfig::new().order(1).engines([Engine::BPlus]);
        let err = run(&config, &Workload::default()).unwrap_err();
        assert!(matches!(err, crate::TreeError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = BenchReport {
            engine: Engine::BPlus,
            records: 1,
            stored: 1,
            insert_ms: 0.5,
            search_ms: 0.25,
            delete_ms: 0.125,
            search_misses: 0,
            delete_misses: 0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["engine"], "bplus");
        assert_eq!(json["insertMs"], 0.5);
        assert_eq!(json["deleteMisses"], 0);
    }
}
