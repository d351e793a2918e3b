//! Key-value store abstraction used by the geo index.
//!
//! The index only needs a hash-partitioned, range-sorted store: equality on a
//! numeric partition key, a `BETWEEN` condition on a numeric sort attribute,
//! paginated results, and single-item CRUD. [`GeoStore`] captures exactly
//! that; [`MemoryStore`] is an in-process implementation.

use crate::config::GeoConfig;
use crate::error::StoreError;
use crate::types::{AttributeUpdate, IndexRange, Item};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Table and attribute names a store request refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub table_name: String,
    pub partition_key_attribute: String,
    pub range_key_attribute: String,
    pub index_attribute: String,
    pub index_name: String,
}

impl KeySchema {
    pub fn from_config(config: &GeoConfig) -> Self {
        Self {
            table_name: config.table_name.clone(),
            partition_key_attribute: config.partition_key_attribute.clone(),
            range_key_attribute: config.range_key_attribute.clone(),
            index_attribute: config.index_attribute.clone(),
            index_name: config.index_name.clone(),
        }
    }

    /// Partition and range key of an item, if both are present and typed correctly.
    pub fn key_of(&self, item: &Item) -> StoreResult<(u64, String)> {
        let partition_key = item
            .get(&self.partition_key_attribute)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                StoreError::InvalidRequest(format!(
                    "item is missing numeric attribute '{}'",
                    self.partition_key_attribute
                ))
            })?;
        let range_key = item
            .get(&self.range_key_attribute)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::InvalidRequest(format!(
                    "item is missing string attribute '{}'",
                    self.range_key_attribute
                ))
            })?;
        Ok((partition_key, range_key.to_string()))
    }
}

/// Opaque cursor returned by a store when more pages remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationToken(pub Value);

/// One page request of a partition-scoped range scan.
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    pub schema: &'a KeySchema,
    pub partition_key: u64,
    pub range: IndexRange,
    pub continuation: Option<ContinuationToken>,
    /// Strongly consistent reads are never required by the geo index
    pub consistent_read: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    pub continuation: Option<ContinuationToken>,
}

/// Primary key of a single item.
#[derive(Debug, Clone, Copy)]
pub struct ItemKey<'a> {
    pub schema: &'a KeySchema,
    pub partition_key: u64,
    pub range_key: &'a str,
}

/// Write operation for batch processing
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put(Item),
    Delete { partition_key: u64, range_key: String },
}

/// Store collaborator of the geo index.
///
/// Implementations must be safe to call from several worker threads at once.
/// No method retries; retry policy belongs to the implementation.
pub trait GeoStore: Send + Sync {
    /// One page of items in `request.partition_key` whose index attribute lies
    /// in `request.range`, ordered by index value.
    fn scan(&self, request: &ScanRequest<'_>) -> StoreResult<ScanPage>;

    fn get_item(&self, key: &ItemKey<'_>) -> StoreResult<Option<Item>>;

    /// Insert or replace an item, returning the previous version.
    fn put_item(&self, schema: &KeySchema, item: Item) -> StoreResult<Option<Item>>;

    /// Apply attribute updates, creating the item if needed. Returns the new version.
    fn update_item(
        &self,
        key: &ItemKey<'_>,
        updates: &BTreeMap<String, AttributeUpdate>,
    ) -> StoreResult<Item>;

    /// Delete an item, returning it if it existed.
    fn delete_item(&self, key: &ItemKey<'_>) -> StoreResult<Option<Item>>;

    /// Apply writes independently. Returns the operations left unprocessed.
    fn batch_write(&self, schema: &KeySchema, ops: Vec<WriteOp>) -> StoreResult<Vec<WriteOp>>;
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub item_count: usize,
    pub scan_requests: u64,
    pub write_requests: u64,
}

type Table = BTreeMap<(u64, String), Item>;

/// In-memory store with DynamoDB-like semantics: tables keyed by
/// `(partition key, range key)`, scans sorted by the index attribute.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    page_size: usize,
    max_batch_size: usize,
    scan_requests: AtomicU64,
    write_requests: AtomicU64,
}

impl MemoryStore {
    pub const DEFAULT_PAGE_SIZE: usize = 100;
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            scan_requests: AtomicU64::new(0),
            write_requests: AtomicU64::new(0),
        }
    }

    /// Maximum items per scan page. Clamped to at least one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Maximum writes accepted per batch; the rest come back unprocessed.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    pub fn stats(&self, table: &str) -> StoreStats {
        StoreStats {
            item_count: self.len(table),
            scan_requests: self.scan_requests.load(Ordering::Relaxed),
            write_requests: self.write_requests.load(Ordering::Relaxed),
        }
    }

    fn apply_put(&self, schema: &KeySchema, item: Item) -> StoreResult<Option<Item>> {
        let key = schema.key_of(&item)?;
        let mut tables = self.tables.write();
        let table = tables.entry(schema.table_name.clone()).or_default();
        Ok(table.insert(key, item))
    }

    fn apply_delete(
        &self,
        schema: &KeySchema,
        partition_key: u64,
        range_key: &str,
    ) -> Option<Item> {
        let mut tables = self.tables.write();
        tables
            .get_mut(&schema.table_name)
            .and_then(|table| table.remove(&(partition_key, range_key.to_string())))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort position of an item inside the index: index value, then range key.
fn index_position(schema: &KeySchema, item: &Item) -> Option<(u64, String)> {
    let index = item.get(&schema.index_attribute).and_then(Value::as_u64)?;
    let range_key = item.get(&schema.range_key_attribute).and_then(Value::as_str)?;
    Some((index, range_key.to_string()))
}

fn decode_token(token: &ContinuationToken) -> StoreResult<(u64, String)> {
    serde_json::from_value(token.0.clone())
        .map_err(|e| StoreError::InvalidRequest(format!("malformed continuation token: {}", e)))
}

fn encode_token(position: &(u64, String)) -> StoreResult<ContinuationToken> {
    serde_json::to_value(position)
        .map(ContinuationToken)
        .map_err(StoreError::backend)
}

impl GeoStore for MemoryStore {
    fn scan(&self, request: &ScanRequest<'_>) -> StoreResult<ScanPage> {
        self.scan_requests.fetch_add(1, Ordering::Relaxed);

        let schema = request.schema;
        let after = request.continuation.as_ref().map(decode_token).transpose()?;

        let tables = self.tables.read();
        let Some(table) = tables.get(&schema.table_name) else {
            return Ok(ScanPage::default());
        };

        let partition_start = (request.partition_key, String::new());
        let mut matching: Vec<((u64, String), &Item)> = table
            .range(partition_start..)
            .take_while(|((partition_key, _), _)| *partition_key == request.partition_key)
            .filter_map(|(_, item)| index_position(schema, item).map(|pos| (pos, item)))
            .filter(|((index, _), _)| request.range.contains(*index))
            .filter(|(pos, _)| after.as_ref().is_none_or(|last| pos > last))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));

        let has_more = matching.len() > self.page_size;
        matching.truncate(self.page_size);

        let continuation = match matching.last() {
            Some((position, _)) if has_more => Some(encode_token(position)?),
            _ => None,
        };
        let items = matching.into_iter().map(|(_, item)| item.clone()).collect();

        Ok(ScanPage {
            items,
            continuation,
        })
    }

    fn get_item(&self, key: &ItemKey<'_>) -> StoreResult<Option<Item>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&key.schema.table_name)
            .and_then(|table| table.get(&(key.partition_key, key.range_key.to_string())))
            .cloned())
    }

    fn put_item(&self, schema: &KeySchema, item: Item) -> StoreResult<Option<Item>> {
        self.write_requests.fetch_add(1, Ordering::Relaxed);
        self.apply_put(schema, item)
    }

    fn update_item(
        &self,
        key: &ItemKey<'_>,
        updates: &BTreeMap<String, AttributeUpdate>,
    ) -> StoreResult<Item> {
        self.write_requests.fetch_add(1, Ordering::Relaxed);

        let schema = key.schema;
        let mut tables = self.tables.write();
        let table = tables.entry(schema.table_name.clone()).or_default();
        let item = table
            .entry((key.partition_key, key.range_key.to_string()))
            .or_insert_with(|| {
                let mut item = Item::new();
                item.insert(
                    schema.partition_key_attribute.clone(),
                    key.partition_key.into(),
                );
                item.insert(schema.range_key_attribute.clone(), key.range_key.into());
                item
            });

        for (name, update) in updates {
            match update {
                AttributeUpdate::Put(value) => {
                    item.insert(name.clone(), value.clone());
                }
                AttributeUpdate::Delete => {
                    item.remove(name);
                }
            }
        }

        Ok(item.clone())
    }

    fn delete_item(&self, key: &ItemKey<'_>) -> StoreResult<Option<Item>> {
        self.write_requests.fetch_add(1, Ordering::Relaxed);
        Ok(self.apply_delete(key.schema, key.partition_key, key.range_key))
    }

    fn batch_write(&self, schema: &KeySchema, mut ops: Vec<WriteOp>) -> StoreResult<Vec<WriteOp>> {
        self.write_requests.fetch_add(1, Ordering::Relaxed);

        let unprocessed = ops.split_off(ops.len().min(self.max_batch_size));
        for op in ops {
            match op {
                WriteOp::Put(item) => {
                    self.apply_put(schema, item)?;
                }
                WriteOp::Delete {
                    partition_key,
                    range_key,
                } => {
                    self.apply_delete(schema, partition_key, &range_key);
                }
            }
        }

        Ok(unprocessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> KeySchema {
        KeySchema {
            table_name: "points".into(),
            partition_key_attribute: "hashKey".into(),
            range_key_attribute: "rangeKey".into(),
            index_attribute: "geohash".into(),
            index_name: "geohash-index".into(),
        }
    }

    fn item(partition_key: u64, range_key: &str, index: u64) -> Item {
        let value = json!({ "hashKey": partition_key, "rangeKey": range_key, "geohash": index });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn scan_all(store: &MemoryStore, schema: &KeySchema, pk: u64, range: IndexRange) -> Vec<Vec<Item>> {
        let mut pages = Vec::new();
        let mut continuation = None;
        loop {
            let request = ScanRequest {
                schema,
                partition_key: pk,
                range,
                continuation,
                consistent_read: false,
            };
            let page = store.scan(&request).unwrap();
            pages.push(page.items);
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => return pages,
            }
        }
    }

    #[test]
    fn test_memory_store_basic_ops() {
        let store = MemoryStore::new();
        let schema = schema();

        assert!(store.put_item(&schema, item(1, "a", 10)).unwrap().is_none());
        assert!(store.put_item(&schema, item(1, "a", 11)).unwrap().is_some());

        let key = ItemKey {
            schema: &schema,
            partition_key: 1,
            range_key: "a",
        };
        let fetched = store.get_item(&key).unwrap().unwrap();
        assert_eq!(fetched["geohash"], 11);

        let deleted = store.delete_item(&key).unwrap();
        assert!(deleted.is_some());
        assert!(store.get_item(&key).unwrap().is_none());
        assert!(store.is_empty("points"));
    }

    #[test]
    fn test_put_requires_key_attributes() {
        let store = MemoryStore::new();
        let mut missing = item(1, "a", 10);
        missing.remove("rangeKey");
        let err = store.put_item(&schema(), missing).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }

    #[test]
    fn test_scan_filters_partition_and_range() {
        let store = MemoryStore::new();
        let schema = schema();
        store.put_item(&schema, item(1, "a", 10)).unwrap();
        store.put_item(&schema, item(1, "b", 20)).unwrap();
        store.put_item(&schema, item(1, "c", 30)).unwrap();
        store.put_item(&schema, item(2, "d", 20)).unwrap();

        let pages = scan_all(&store, &schema, 1, IndexRange::new(15, 30));
        let keys: Vec<&str> = pages
            .iter()
            .flatten()
            .filter_map(|i| i["rangeKey"].as_str())
            .collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_scan_paginates_in_index_order() {
        let store = MemoryStore::new().with_page_size(2);
        let schema = schema();
        for (i, index) in [50u64, 10, 40, 20, 30].iter().enumerate() {
            store
                .put_item(&schema, item(7, &format!("k{}", i), *index))
                .unwrap();
        }

        let pages = scan_all(&store, &schema, 7, IndexRange::new(0, 100));
        assert_eq!(pages.len(), 3);
        let order: Vec<u64> = pages
            .iter()
            .flatten()
            .filter_map(|i| i["geohash"].as_u64())
            .collect();
        assert_eq!(order, vec![10, 20, 30, 40, 50]);
        assert_eq!(store.stats("points").scan_requests, 3);
    }

    #[test]
    fn test_update_item_upserts() {
        let store = MemoryStore::new();
        let schema = schema();
        let key = ItemKey {
            schema: &schema,
            partition_key: 3,
            range_key: "z",
        };

        let mut updates = BTreeMap::new();
        updates.insert("title".to_string(), AttributeUpdate::Put(json!("first")));
        let created = store.update_item(&key, &updates).unwrap();
        assert_eq!(created["hashKey"], 3);
        assert_eq!(created["title"], "first");

        updates.insert("title".to_string(), AttributeUpdate::Delete);
        let updated = store.update_item(&key, &updates).unwrap();
        assert!(!updated.contains_key("title"));
    }

    #[test]
    fn test_batch_write_returns_unprocessed() {
        let store = MemoryStore::new().with_max_batch_size(2);
        let schema = schema();
        let ops = vec![
            WriteOp::Put(item(1, "a", 1)),
            WriteOp::Put(item(1, "b", 2)),
            WriteOp::Put(item(1, "c", 3)),
        ];

        let unprocessed = store.batch_write(&schema, ops).unwrap();
        assert_eq!(unprocessed, vec![WriteOp::Put(item(1, "c", 3))]);
        assert_eq!(store.len("points"), 2);
    }

    #[test]
    fn test_malformed_token_rejected() {
        let store = MemoryStore::new();
        let schema = schema();
        store.put_item(&schema, item(1, "a", 1)).unwrap();
        let request = ScanRequest {
            schema: &schema,
            partition_key: 1,
            range: IndexRange::new(0, 10),
            continuation: Some(ContinuationToken(json!("garbage"))),
            consistent_read: false,
        };
        assert!(matches!(
            store.scan(&request),
            Err(StoreError::InvalidRequest(_))
        ));
    }
}
