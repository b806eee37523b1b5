use crate::sync::normalize;
use crate::sync::record::Record;
use crate::sync::store::DocumentStore;
use anyhow::Result;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Read every record of a collection, following continuation cursors until
/// the store stops returning one. Any failed page aborts the whole read.
pub fn read_collection(store: &dyn DocumentStore, collection_id: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = store.query_collection(collection_id, cursor.as_deref())?;
        pages += 1;
        records.extend(page.records);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    debug!(collection_id, pages, records = records.len(), "collection read");
    Ok(records)
}

/// Complete related ids of `record.property`. Embedded relation lists are
/// truncated by the store, so a truncated list is re-read page by page.
pub fn read_relation(
    store: &dyn DocumentStore,
    record: &Record,
    property: &str,
) -> Result<Vec<String>> {
    let embedded = normalize::relation_ids(record, property);
    if !normalize::relation_has_more(record, property) {
        return Ok(embedded);
    }
    let Some(property_id) = normalize::property_id(record, property) else {
        warn!(
            record_id = %record.id,
            property,
            "relation is truncated but carries no property id; using embedded ids"
        );
        return Ok(embedded);
    };

    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = store.list_relation(&record.id, &property_id, cursor.as_deref())?;
        for id in page.ids {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    debug!(record_id = %record.id, property, ids = ids.len(), "relation read in full");
    Ok(ids)
}
