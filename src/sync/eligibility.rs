use crate::sync::config::{PropertyNames, StatusLabels};
use crate::sync::normalize;
use crate::sync::record::{BookRef, Record};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// `[Jan 1, Dec 31]` of `year`, or `None` outside chrono's calendar.
pub fn year_window(year: i32) -> Option<RangeInclusive<NaiveDate>> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some(start..=end)
}

/// An eligible book with the completion day that qualified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedBook {
    pub book: BookRef,
    pub finished: NaiveDate,
}

/// Books finished within `year` that are not yet linked, in input order.
/// A finished book whose date does not parse is skipped, not reported.
pub fn finished_books(
    books: &[Record],
    year: i32,
    linked: &BTreeSet<String>,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Vec<FinishedBook> {
    let Some(window) = year_window(year) else {
        return Vec::new();
    };
    books
        .iter()
        .filter(|book| normalize::status_label(book, &properties.status) == labels.finished)
        .filter(|book| !linked.contains(&book.id))
        .filter_map(|book| {
            let finished = normalize::date(book, &properties.finished_date)?;
            window.contains(&finished).then(|| FinishedBook {
                book: BookRef {
                    id: book.id.clone(),
                    title: normalize::display_title(book, &properties.title),
                },
                finished,
            })
        })
        .collect()
}

pub fn eligible_books(
    books: &[Record],
    year: i32,
    linked: &BTreeSet<String>,
    properties: &PropertyNames,
    labels: &StatusLabels,
) -> Vec<BookRef> {
    finished_books(books, year, linked, properties, labels)
        .into_iter()
        .map(|entry| entry.book)
        .collect()
}
