//! Tests for top-level Workbench API

use cwbench::config::SearchConfig;
use cwbench::store::MemoryStore;
use cwbench::{Error, Workbench};

#[test]
fn test_workbench_builder_defaults() {
    let bench = Workbench::builder(MemoryStore::new()).build().unwrap();
    assert_eq!(bench.config(), &SearchConfig::default());
}

#[test]
fn test_workbench_builder_chain() {
    let bench = Workbench::builder(MemoryStore::new())
        .parallelism(3)
        .k(10)
        .build()
        .unwrap();
    assert_eq!(bench.config().parallelism, 3);
    assert_eq!(bench.config().k, 10);
}

#[test]
fn test_workbench_builder_with_config() {
    let config = SearchConfig::from_json(r#"{ "parallelism": 2, "metric": "value" }"#).unwrap();
    let bench = Workbench::builder(MemoryStore::new())
        .config(config)
        .build()
        .unwrap();
    assert_eq!(bench.config().parallelism, 2);
}

#[test]
fn test_workbench_build_rejects_zero_parallelism() {
    let result = Workbench::builder(MemoryStore::new()).parallelism(0).build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
