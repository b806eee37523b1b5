use crate::sync::config::{PropertyNames, StatusLabels};
use crate::sync::normalize;
use crate::sync::record::{BookRef, PropertyPatch, Record, checkbox};
use crate::sync::store::DocumentStore;
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    MostRecent,
    LeastRecent,
}

#[derive(Debug, Clone)]
pub struct RankingPass {
    pub direction: RankDirection,
    pub count: usize,
    pub property: String,
}

impl RankingPass {
    pub fn most_recent(count: usize, properties: &PropertyNames) -> Self {
        Self {
            direction: RankDirection::MostRecent,
            count,
            property: properties.most_recent.clone(),
        }
    }

    pub fn least_recent(count: usize, properties: &PropertyNames) -> Self {
        Self {
            direction: RankDirection::LeastRecent,
            count,
            property: properties.least_recent.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagUpdate {
    pub book: BookRef,
    pub value: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagOutcome {
    pub direction: RankDirection,
    pub property: String,
    pub candidates: usize,
    pub flagged: Vec<BookRef>,
    pub updated: Vec<FlagUpdate>,
    pub unchanged: usize,
}

/// Ids of the first `count` not-started books by creation time. The sort is
/// stable, so equal timestamps keep store order.
pub fn ranked_ids(
    books: &[Record],
    pass: &RankingPass,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> (usize, Vec<String>) {
    let mut candidates: Vec<&Record> = books
        .iter()
        .filter(|book| normalize::status_label(book, &properties.status) == labels.not_started)
        .collect();
    match pass.direction {
        RankDirection::MostRecent => {
            candidates.sort_by(|a, b| b.created_time.cmp(&a.created_time))
        }
        RankDirection::LeastRecent => {
            candidates.sort_by(|a, b| a.created_time.cmp(&b.created_time))
        }
    }
    let total = candidates.len();
    let ids = candidates
        .into_iter()
        .take(pass.count)
        .map(|book| book.id.clone())
        .collect();
    (total, ids)
}

/// Recompute the flag for every book and patch only the ones that differ.
pub fn reconcile_flag(
    store: &dyn DocumentStore,
    books: &[Record],
    pass: &RankingPass,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Result<TagOutcome> {
    let (candidates, ranked) = ranked_ids(books, pass, properties, labels);
    info!(
        property = %pass.property,
        candidates,
        flagging = ranked.len(),
        "ranking not-started books"
    );
    let targets: BTreeSet<&str> = ranked.iter().map(String::as_str).collect();
    let mut flagged: BTreeMap<String, BookRef> = BTreeMap::new();

    let mut outcome = TagOutcome {
        direction: pass.direction,
        property: pass.property.clone(),
        candidates,
        flagged: Vec::new(),
        updated: Vec::new(),
        unchanged: 0,
    };

    for book in books {
        let book_ref = BookRef {
            id: book.id.clone(),
            title: normalize::display_title(book, &properties.title),
        };
        let current = normalize::checkbox(book, &pass.property);
        let should_flag = targets.contains(book.id.as_str());
        if should_flag {
            flagged.insert(book.id.clone(), book_ref.clone());
        }

        if current == should_flag {
            debug!(title = %book_ref.title, value = current, "flag already consistent");
            outcome.unchanged += 1;
            continue;
        }

        info!(title = %book_ref.title, property = %pass.property, value = should_flag, "updating flag");
        let patch = PropertyPatch::new().set(&pass.property, checkbox(should_flag));
        store.patch_record(&book.id, &patch)?;
        outcome.updated.push(FlagUpdate {
            book: book_ref,
            value: should_flag,
        });
    }

    outcome.flagged = ranked.iter().filter_map(|id| flagged.remove(id)).collect();
    Ok(outcome)
}
