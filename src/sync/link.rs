use crate::sync::config::{PropertyNames, StatusLabels};
use crate::sync::eligibility::{FinishedBook, eligible_books, finished_books};
use crate::sync::normalize;
use crate::sync::reader::{read_collection, read_relation};
use crate::sync::record::{self, BookRef, PropertyPatch, Record};
use crate::sync::store::DocumentStore;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct LoggedBook {
    pub book: BookRef,
    pub log_record_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Not an error: the run ends without linking anything.
    YearRecordMissing { year: String },
    NothingToAdd {
        year_record_id: String,
        existing: usize,
    },
    Linked {
        year_record_id: String,
        added: Vec<BookRef>,
        total: usize,
    },
    Logged {
        collection_id: String,
        created: Vec<LoggedBook>,
    },
}

/// First record whose title is exactly `year`.
pub fn find_year_record<'a>(years: &'a [Record], year: &str, title_property: &str) -> Option<&'a Record> {
    years
        .iter()
        .find(|record| normalize::title(record, title_property).as_deref() == Some(year))
}

/// Union of `existing` and `added`: existing order kept, new ids appended,
/// duplicates dropped. Nothing in `existing` is ever removed.
pub fn merge_relation(existing: &[String], added: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    existing
        .iter()
        .chain(added)
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Replace the full value of a relation property with `ids`.
pub fn write_relation(
    store: &dyn DocumentStore,
    record_id: &str,
    property: &str,
    ids: &[String],
) -> Result<()> {
    let patch = PropertyPatch::new().set(property, record::relation(ids));
    store.patch_record(record_id, &patch)
}

/// Link books finished in `year` to that year's record in `years_collection`.
pub fn link_to_year(
    store: &dyn DocumentStore,
    books: &[Record],
    years_collection: &str,
    year: i32,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Result<LinkOutcome> {
    let year_key = year.to_string();
    let years = read_collection(store, years_collection)?;
    let Some(year_record) = find_year_record(&years, &year_key, &properties.title) else {
        info!(year = %year_key, "year record not found; nothing to link");
        return Ok(LinkOutcome::YearRecordMissing { year: year_key });
    };

    let existing = read_relation(store, year_record, &properties.books_read)?;
    let linked: BTreeSet<String> = existing.iter().cloned().collect();
    let added = eligible_books(books, year, &linked, properties, labels);
    if added.is_empty() {
        info!(year = %year_key, existing = existing.len(), "no new books to add");
        return Ok(LinkOutcome::NothingToAdd {
            year_record_id: year_record.id.clone(),
            existing: existing.len(),
        });
    }

    let added_ids: Vec<String> = added.iter().map(|book| book.id.clone()).collect();
    let merged = merge_relation(&existing, &added_ids);
    write_relation(store, &year_record.id, &properties.books_read, &merged)?;
    for book in &added {
        info!(title = %book.title, property = %properties.books_read, "linked book");
    }

    Ok(LinkOutcome::Linked {
        year_record_id: year_record.id.clone(),
        added,
        total: merged.len(),
    })
}

/// Append one log record per newly finished book. Books already referenced
/// by any log record are skipped. A rerun before the store reflects a fresh
/// record can append a duplicate; no deduplication beyond the re-read.
pub fn append_log_records(
    store: &dyn DocumentStore,
    books: &[Record],
    log_collection: &str,
    year: i32,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Result<LinkOutcome> {
    let log_records = read_collection(store, log_collection)?;
    let mut linked = BTreeSet::new();
    for log_record in &log_records {
        linked.extend(read_relation(store, log_record, &properties.log_book)?);
    }

    let mut created = Vec::new();
    for FinishedBook { book, finished } in finished_books(books, year, &linked, properties, labels) {
        let log_properties = PropertyPatch::new()
            .set(&properties.title, record::title(&book.title))
            .set(&properties.log_book, record::relation([book.id.as_str()]))
            .set(&properties.log_date, record::date(finished));
        let log_record_id = store.create_record(log_collection, &log_properties)?;
        info!(title = %book.title, log_record_id = %log_record_id, "appended log record");
        created.push(LoggedBook {
            book,
            log_record_id,
        });
    }
    if created.is_empty() {
        info!(log_collection, "no new books to log");
    }

    Ok(LinkOutcome::Logged {
        collection_id: log_collection.to_string(),
        created,
    })
}
