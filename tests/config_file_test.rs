use geodex::prelude::*;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_toml_config_file() {
    init_logging();
    let file = write_config(
        ".toml",
        r#"
            table_name = "restaurants"
            point_attribute = "location"
            partition_key_length = 5
            worker_threads = 2

            [covering]
            max_cells = 12
        "#,
    );

    let config = GeoConfig::from_file(file.path()).unwrap();
    assert_eq!(config.table_name, "restaurants");
    assert_eq!(config.point_attribute, "location");
    assert_eq!(config.worker_threads(), 2);
    assert_eq!(config.covering.max_cells, 12);

    let index = GeoIndexBuilder::new(Arc::new(MemoryStore::new()))
        .config(config)
        .build()
        .unwrap();
    let point = GeoPoint::new(41.9, 12.5);
    index
        .put_point(PutPointRequest::new(point, "trattoria"))
        .unwrap();

    let outcome = index.query_radius(point, 10.0).unwrap();
    assert_eq!(outcome.items.len(), 1);
    assert!(outcome.items[0].contains_key("location"));
}

#[test]
fn test_load_json_config_file() {
    init_logging();
    let file = write_config(".json", r#"{"table_name": "json-table", "index_name": "cells"}"#);

    let config = GeoConfig::from_file(file.path()).unwrap();
    assert_eq!(config.table_name, "json-table");
    assert_eq!(config.index_name, "cells");
    assert_eq!(config.partition_key_length, 6);
}

#[test]
fn test_invalid_config_file_rejected() {
    init_logging();
    let bad_length = write_config(".toml", "partition_key_length = 40\n");
    assert!(matches!(
        GeoConfig::from_file(bad_length.path()),
        Err(GeoError::InvalidConfig(_))
    ));

    let unknown_field = write_config(".toml", "hash_key_length = 6\n");
    assert!(GeoConfig::from_file(unknown_field.path()).is_err());

    assert!(matches!(
        GeoConfig::from_file("/nonexistent/geodex.toml"),
        Err(GeoError::InvalidConfig(_))
    ));
}
