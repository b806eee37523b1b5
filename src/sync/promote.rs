use crate::sync::config::{PropertyNames, StatusLabels};
use crate::sync::normalize;
use crate::sync::record::{BookRef, PropertyPatch, Record, status};
use crate::sync::store::DocumentStore;
use anyhow::Result;
use tracing::info;

/// Mark books with a completion date as finished. The status is written in
/// the representation the book already uses. Callers must re-read the
/// collection afterwards when anything was promoted.
pub fn promote_finished(
    store: &dyn DocumentStore,
    books: &[Record],
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Result<Vec<BookRef>> {
    let mut promoted = Vec::new();
    for book in books {
        if normalize::date_start(book, &properties.finished_date).is_none() {
            continue;
        }
        if normalize::status_label(book, &properties.status) == labels.finished {
            continue;
        }

        let kind = normalize::status_kind(book, &properties.status);
        let title = normalize::display_title(book, &properties.title);
        info!(title = %title, status = %labels.finished, "promoting status");
        let patch = PropertyPatch::new().set(&properties.status, status(kind, &labels.finished));
        store.patch_record(&book.id, &patch)?;
        promoted.push(BookRef {
            id: book.id.clone(),
            title,
        });
    }
    Ok(promoted)
}
