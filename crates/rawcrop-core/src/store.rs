//! Upload session store.
//!
//! Sole owner of [`FileRecord`]s. Insertion order is preserved and the active
//! reference is kept as an index that always points at a member of the
//! collection, or is `None` exactly when the collection is empty.

use crate::record::{CropResult, DimensionSource, FileRecord, SourceDimensions};

/// Ordered collection of uploaded files plus the active preview reference.
#[derive(Debug, Clone, Default)]
pub struct UploadStore {
    records: Vec<FileRecord>,
    active: Option<usize>,
}

impl UploadStore {
    /// An empty store with no active record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. The first record added to an empty store becomes active.
    pub fn add(&mut self, record: FileRecord) {
        self.records.push(record);
        if self.active.is_none() {
            self.active = Some(self.records.len() - 1);
        }
    }

    /// Remove the record at `index`.
    ///
    /// If the removed record was active, the first remaining record becomes
    /// active (or none if the store is now empty). Records after the active
    /// one shift down without changing which record is active.
    pub fn remove(&mut self, index: usize) -> Option<FileRecord> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);

        self.active = match self.active {
            _ if self.records.is_empty() => None,
            Some(active) if active == index => Some(0),
            Some(active) if active > index => Some(active - 1),
            other => other,
        };

        Some(removed)
    }

    /// Replace preview and download locations of the record with `remote_id`.
    ///
    /// Returns `false` without touching anything if no such record exists,
    /// which happens when the target was removed while a crop was in flight.
    pub fn replace_preview(&mut self, remote_id: &str, result: CropResult) -> bool {
        match self.records.iter_mut().find(|r| r.remote_id == remote_id) {
            Some(record) => {
                record.preview_uri = result.preview_uri;
                record.raw_download_uri = Some(result.raw_download_uri);
                true
            }
            None => false,
        }
    }

    /// Set the source dimensions of the record with `remote_id`.
    ///
    /// Unknown dimensions are always filled. Metadata dimensions may be
    /// replaced by view dimensions; view dimensions are final. Returns
    /// whether the record changed.
    pub fn record_dimensions(
        &mut self,
        remote_id: &str,
        dimensions: SourceDimensions,
        source: DimensionSource,
    ) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.remote_id == remote_id) else {
            return false;
        };
        let replaceable = match record.dimension_source {
            None => true,
            Some(DimensionSource::Metadata) => source == DimensionSource::View,
            Some(DimensionSource::View) => false,
        };
        if !replaceable || record.dimensions == Some(dimensions) {
            return false;
        }
        if let Some(old) = record.dimensions {
            log::info!(
                "Source of {} is {}x{}, not {}x{} as its metadata said",
                remote_id,
                dimensions.width,
                dimensions.height,
                old.width,
                old.height
            );
        }
        record.dimensions = Some(dimensions);
        record.dimension_source = Some(source);
        true
    }

    /// Make the record at `index` active.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.records.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// Drop every record. Only call after the backend confirmed its own clear.
    pub fn clear(&mut self) {
        self.records.clear();
        self.active = None;
    }

    /// The record shown in the preview; `None` exactly when the store is empty.
    pub fn active(&self) -> Option<&FileRecord> {
        self.active.and_then(|i| self.records.get(i))
    }

    /// Position of the active record.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The record at `index`, in insertion order.
    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    /// The record with backend identifier `remote_id`.
    pub fn find(&self, remote_id: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.remote_id == remote_id)
    }

    /// Position of the record with backend identifier `remote_id`.
    pub fn position(&self, remote_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.remote_id == remote_id)
    }

    pub fn contains(&self, remote_id: &str) -> bool {
        self.position(remote_id).is_some()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::record::UploadReceipt;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Select(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Add),
            (0usize..8).prop_map(Op::Remove),
            (0usize..8).prop_map(Op::Select),
        ]
    }

    proptest! {
        /// Property: active is None iff the store is empty, else a member.
        #[test]
        fn prop_active_always_member(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut store = UploadStore::new();
            let mut next = 0u32;

            for op in ops {
                match op {
                    Op::Add => {
                        let id = format!("f{next}");
                        next += 1;
                        store.add(FileRecord::from_receipt(
                            format!("{id}.dng"),
                            UploadReceipt {
                                remote_id: id,
                                preview_uri: "p".into(),
                                raw_download_uri: None,
                            },
                        ));
                    }
                    Op::Remove(i) => {
                        store.remove(i);
                    }
                    Op::Select(i) => {
                        store.select(i);
                    }
                }

                prop_assert_eq!(store.active().is_none(), store.is_empty());
                if let Some(active) = store.active() {
                    prop_assert!(store.contains(&active.remote_id));
                    prop_assert!(store.active_index().unwrap() < store.len());
                }
            }
        }

        /// Property: removing a non-active record never changes which record is active.
        #[test]
        fn prop_remove_other_keeps_active(count in 2usize..10, active in 0usize..10, victim in 0usize..10) {
            let active = active % count;
            let victim = victim % count;
            prop_assume!(active != victim);

            let mut store = UploadStore::new();
            for i in 0..count {
                store.add(FileRecord::from_receipt(
                    format!("{i}.arw"),
                    UploadReceipt {
                        remote_id: i.to_string(),
                        preview_uri: "p".into(),
                        raw_download_uri: None,
                    },
                ));
            }
            store.select(active);
            let before = store.active().unwrap().remote_id.clone();

            store.remove(victim);

            prop_assert_eq!(&store.active().unwrap().remote_id, &before);
        }
    }
}
