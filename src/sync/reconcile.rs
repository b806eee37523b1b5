use crate::sync::config::{LinkMode, SyncConfig};
use crate::sync::link::{self, LinkOutcome};
use crate::sync::promote::promote_finished;
use crate::sync::ranking::{RankingPass, TagOutcome, reconcile_flag};
use crate::sync::reader::read_collection;
use crate::sync::record::BookRef;
use crate::sync::store::DocumentStore;
use anyhow::Result;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub target_year: i32,
    pub books_read: usize,
    pub promoted: Vec<BookRef>,
    pub refreshed: bool,
    pub tags: Vec<TagOutcome>,
    pub link: LinkOutcome,
}

impl ReconcileOutcome {
    pub fn write_count(&self) -> usize {
        let flag_writes: usize = self.tags.iter().map(|tag| tag.updated.len()).sum();
        let link_writes = match &self.link {
            LinkOutcome::Linked { .. } => 1,
            LinkOutcome::Logged { created, .. } => created.len(),
            LinkOutcome::YearRecordMissing { .. } | LinkOutcome::NothingToAdd { .. } => 0,
        };
        self.promoted.len() + flag_writes + link_writes
    }
}

fn ranking_passes(cfg: &SyncConfig) -> Vec<RankingPass> {
    let mut passes = Vec::new();
    if cfg.ranking.most_recent_enabled {
        passes.push(RankingPass::most_recent(cfg.ranking.most_recent, &cfg.properties));
    }
    if cfg.ranking.least_recent_enabled {
        passes.push(RankingPass::least_recent(cfg.ranking.least_recent, &cfg.properties));
    }
    passes
}

/// One full reconciliation: promote, re-read if anything changed, tag, link.
/// Each step only writes what differs, so a failed run can simply be rerun.
pub fn run(store: &dyn DocumentStore, cfg: &SyncConfig, opts: &RunOptions) -> Result<ReconcileOutcome> {
    let props = &cfg.properties;
    let labels = &cfg.labels;
    info!(year = opts.year, "target year");

    let mut books = read_collection(store, &cfg.collections.books)?;
    info!(count = books.len(), "books read");

    let mut promoted = Vec::new();
    let mut refreshed = false;
    if cfg.promote.enabled {
        promoted = promote_finished(store, &books, props, labels)?;
        if !promoted.is_empty() {
            info!(count = promoted.len(), "statuses promoted; re-reading books");
            books = read_collection(store, &cfg.collections.books)?;
            refreshed = true;
        }
    }

    let mut tags = Vec::new();
    for pass in ranking_passes(cfg) {
        tags.push(reconcile_flag(store, &books, &pass, props, labels)?);
    }

    let link = match cfg.link.mode {
        LinkMode::Relation => link::link_to_year(
            store,
            &books,
            &cfg.collections.years,
            opts.year,
            props,
            labels,
        )?,
        LinkMode::Log => link::append_log_records(
            store,
            &books,
            cfg.collections.log_collection(),
            opts.year,
            props,
            labels,
        )?,
    };

    Ok(ReconcileOutcome {
        target_year: opts.year,
        books_read: books.len(),
        promoted,
        refreshed,
        tags,
        link,
    })
}
