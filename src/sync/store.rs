use crate::sync::record::{PropertyPatch, Record};
use anyhow::Result;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub records: Vec<Record>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationPage {
    pub ids: Vec<String>,
    pub next_cursor: Option<String>,
}

/// The remote document store. Every call is one blocking round-trip and any
/// non-success is returned as `SyncError::RemoteRequest`.
pub trait DocumentStore {
    fn query_collection(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage>;

    fn patch_record(&self, record_id: &str, patch: &PropertyPatch) -> Result<()>;

    fn create_record(&self, collection_id: &str, properties: &PropertyPatch) -> Result<String>;

    fn list_relation(
        &self,
        record_id: &str,
        property_id: &str,
        cursor: Option<&str>,
    ) -> Result<RelationPage>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedWrite {
    Patch {
        record_id: String,
        patch: PropertyPatch,
    },
    Create {
        collection_id: String,
        record_id: String,
        properties: PropertyPatch,
    },
}

/// Forwards reads and records writes instead of sending them. Recorded
/// patches are overlaid on later reads so a refresh sees the planned state.
pub struct DryRunStore<'a, S: DocumentStore + ?Sized> {
    inner: &'a S,
    overlay: RefCell<BTreeMap<String, PropertyPatch>>,
    planned: RefCell<Vec<PlannedWrite>>,
    created: Cell<usize>,
}

impl<'a, S: DocumentStore + ?Sized> DryRunStore<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            overlay: RefCell::new(BTreeMap::new()),
            planned: RefCell::new(Vec::new()),
            created: Cell::new(0),
        }
    }

    pub fn planned(&self) -> Vec<PlannedWrite> {
        self.planned.borrow().clone()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for DryRunStore<'_, S> {
    fn query_collection(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage> {
        let mut page = self.inner.query_collection(collection_id, cursor)?;
        let overlay = self.overlay.borrow();
        for record in &mut page.records {
            if let Some(patch) = overlay.get(&record.id) {
                record.apply_patch(patch);
            }
        }
        Ok(page)
    }

    fn patch_record(&self, record_id: &str, patch: &PropertyPatch) -> Result<()> {
        info!(record_id, "dry-run: patch skipped");
        let mut overlay = self.overlay.borrow_mut();
        let merged = overlay.entry(record_id.to_string()).or_default();
        for (name, container) in patch.iter() {
            merged.insert(name, container.clone());
        }
        self.planned.borrow_mut().push(PlannedWrite::Patch {
            record_id: record_id.to_string(),
            patch: patch.clone(),
        });
        Ok(())
    }

    fn create_record(&self, collection_id: &str, properties: &PropertyPatch) -> Result<String> {
        let n = self.created.get() + 1;
        self.created.set(n);
        let record_id = format!("dry-run-{n}");
        info!(collection_id, record_id = %record_id, "dry-run: create skipped");
        self.planned.borrow_mut().push(PlannedWrite::Create {
            collection_id: collection_id.to_string(),
            record_id: record_id.clone(),
            properties: properties.clone(),
        });
        Ok(record_id)
    }

    fn list_relation(
        &self,
        record_id: &str,
        property_id: &str,
        cursor: Option<&str>,
    ) -> Result<RelationPage> {
        self.inner.list_relation(record_id, property_id, cursor)
    }
}
