use super::GeoIndex;
use crate::compute::validation::validate_geographic_point;
use crate::error::{GeoError, Result};
use crate::index::index_value;
use crate::storage::{ItemKey, WriteOp};
use crate::types::{
    BatchWriteOutcome, GeoPoint, Item, PointKey, PutPointRequest, UpdatePointRequest,
};

impl GeoIndex {
    /// Partition key of the item stored for `point`.
    pub fn partition_key_of(&self, point: &GeoPoint) -> u64 {
        self.scheme.partition_key(index_value(point))
    }

    /// Build the stored item for a put request.
    ///
    /// Caller attributes come first; the key, index and point attributes are
    /// then written over them.
    pub fn point_item(&self, request: PutPointRequest) -> Result<Item> {
        validate_geographic_point(&request.point)?;

        let index = index_value(&request.point);
        let mut item = request.attributes;
        item.insert(
            self.config.partition_key_attribute.clone(),
            self.scheme.partition_key(index).into(),
        );
        item.insert(
            self.config.range_key_attribute.clone(),
            request.range_key.into(),
        );
        item.insert(self.config.index_attribute.clone(), index.into());
        self.codec.encode_into(&mut item, &request.point);
        Ok(item)
    }

    /// Insert or replace a point, returning the previous item if any.
    pub fn put_point(&self, request: PutPointRequest) -> Result<Option<Item>> {
        let item = self.point_item(request)?;
        Ok(self.store.put_item(&self.schema, item)?)
    }

    pub fn get_point(&self, key: &PointKey) -> Result<Option<Item>> {
        validate_geographic_point(&key.point)?;
        let partition_key = self.partition_key_of(&key.point);
        Ok(self.store.get_item(&ItemKey {
            schema: &self.schema,
            partition_key,
            range_key: &key.range_key,
        })?)
    }

    /// Update caller attributes of a stored point.
    ///
    /// Key, index and point attributes are write-once: updates naming them
    /// are dropped. A request left with no updates is rejected.
    pub fn update_point(&self, request: UpdatePointRequest) -> Result<Item> {
        validate_geographic_point(&request.key.point)?;

        let reserved = self.config.reserved_attributes();
        let mut updates = request.updates;
        updates.retain(|name, _| {
            let keep = !reserved.contains(&name.as_str());
            if !keep {
                log::debug!("Ignoring update of write-once attribute '{}'", name);
            }
            keep
        });
        if updates.is_empty() {
            return Err(GeoError::InvalidInput(
                "update names no updatable attributes".into(),
            ));
        }

        let partition_key = self.partition_key_of(&request.key.point);
        Ok(self.store.update_item(
            &ItemKey {
                schema: &self.schema,
                partition_key,
                range_key: &request.key.range_key,
            },
            &updates,
        )?)
    }

    /// Delete a point, returning the removed item if it existed.
    pub fn delete_point(&self, key: &PointKey) -> Result<Option<Item>> {
        validate_geographic_point(&key.point)?;
        let partition_key = self.partition_key_of(&key.point);
        Ok(self.store.delete_item(&ItemKey {
            schema: &self.schema,
            partition_key,
            range_key: &key.range_key,
        })?)
    }

    /// Write several points in one store batch.
    ///
    /// The batch is not atomic: the items the store did not write are
    /// returned and may be resubmitted.
    pub fn batch_write_points(&self, requests: Vec<PutPointRequest>) -> Result<BatchWriteOutcome> {
        let ops = requests
            .into_iter()
            .map(|request| self.point_item(request).map(WriteOp::Put))
            .collect::<Result<Vec<_>>>()?;
        if ops.is_empty() {
            return Ok(BatchWriteOutcome::default());
        }

        let unprocessed = self.store.batch_write(&self.schema, ops)?;
        if !unprocessed.is_empty() {
            log::debug!(
                "Batch write left {} items unprocessed",
                unprocessed.len()
            );
        }

        Ok(BatchWriteOutcome {
            unprocessed: unprocessed
                .into_iter()
                .filter_map(|op| match op {
                    WriteOp::Put(item) => Some(item),
                    WriteOp::Delete { .. } => None,
                })
                .collect(),
        })
    }
}
