use anyhow::Result;

use crate::commands::CommandReport;
use crate::sync::config::load_config;
use crate::sync::link::LinkOutcome;
use crate::sync::notion::NotionClient;
use crate::sync::reconcile::{self, ReconcileOutcome, RunOptions};
use crate::sync::store::DryRunStore;
use crate::sync::util::current_year;

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub year: Option<i32>,
    pub dry_run: bool,
}

pub fn run(opts: &ReconcileOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let token = cfg.token()?;
    cfg.require_collections()?;
    let client = NotionClient::new(&cfg.notion, token)?;
    let run_opts = RunOptions {
        year: opts.year.unwrap_or_else(current_year),
    };

    let mut report = CommandReport::new("run");
    report.detail(format!("target_year={}", run_opts.year));
    report.detail(format!("link.mode={}", cfg.link.mode.as_str()));
    report.detail(format!("dry_run={}", opts.dry_run));

    let outcome = if opts.dry_run {
        let dry = DryRunStore::new(&client);
        let outcome = reconcile::run(&dry, &cfg, &run_opts)?;
        for write in dry.planned() {
            report.detail(format!("planned={}", serde_json::to_string(&write)?));
        }
        outcome
    } else {
        reconcile::run(&client, &cfg, &run_opts)?
    };

    describe(&mut report, &outcome);
    Ok(report)
}

fn describe(report: &mut CommandReport, outcome: &ReconcileOutcome) {
    report.detail(format!("books.read={}", outcome.books_read));
    report.detail(format!("promote.count={}", outcome.promoted.len()));
    for book in &outcome.promoted {
        report.detail(format!("promote.book={}", book.title));
    }
    if outcome.refreshed {
        report.detail("books.refreshed=true");
    }

    for tag in &outcome.tags {
        let flagged: Vec<&str> = tag.flagged.iter().map(|b| b.title.as_str()).collect();
        report.detail(format!(
            "tag.{}.candidates={} flagged={} updated={} unchanged={}",
            tag.property,
            tag.candidates,
            flagged.len(),
            tag.updated.len(),
            tag.unchanged
        ));
        for update in &tag.updated {
            report.detail(format!(
                "tag.{}.update={} -> {}",
                tag.property, update.book.title, update.value
            ));
        }
    }

    match &outcome.link {
        LinkOutcome::YearRecordMissing { year } => {
            report.detail(format!("link.status=year_record_missing year={year}"));
        }
        LinkOutcome::NothingToAdd {
            year_record_id,
            existing,
        } => {
            report.detail(format!(
                "link.status=nothing_to_add year_record={year_record_id} existing={existing}"
            ));
        }
        LinkOutcome::Linked {
            year_record_id,
            added,
            total,
        } => {
            report.detail(format!(
                "link.status=linked year_record={year_record_id} added={} total={total}",
                added.len()
            ));
            for book in added {
                report.detail(format!("link.book={}", book.title));
            }
        }
        LinkOutcome::Logged {
            collection_id,
            created,
        } => {
            report.detail(format!(
                "link.status=logged collection={collection_id} created={}",
                created.len()
            ));
            for entry in created {
                report.detail(format!(
                    "link.log={} record={}",
                    entry.book.title, entry.log_record_id
                ));
            }
        }
    }
    report.detail(format!("writes={}", outcome.write_count()));
}
