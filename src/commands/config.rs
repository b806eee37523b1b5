use anyhow::Result;

use crate::commands::CommandReport;
use crate::sync::config::{load_config, resolve_config_path};

pub fn run() -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("config");

    match resolve_config_path() {
        Some(path) => report.detail(format!(
            "config_path={} ({})",
            path.display(),
            if path.exists() { "found" } else { "not found, using defaults" }
        )),
        None => report.detail("config_path=unresolved (no home directory)"),
    }

    report.detail(format!("notion.api_base={}", cfg.notion.api_base));
    report.detail(format!("notion.api_version={}", cfg.notion.api_version));
    report.detail(format!(
        "notion.request_timeout_secs={}",
        cfg.notion.request_timeout_secs
    ));
    match cfg.token() {
        Ok(_) => report.detail("notion.token=set"),
        Err(err) => report.issue(err.to_string()),
    }

    report.detail(format!("collections.books={}", cfg.collections.books));
    report.detail(format!("collections.years={}", cfg.collections.years));
    report.detail(format!("collections.log={}", cfg.collections.log_collection()));
    if let Err(err) = cfg.require_collections() {
        report.issue(err.to_string());
    }

    let props = &cfg.properties;
    for (key, value) in [
        ("title", &props.title),
        ("status", &props.status),
        ("finished_date", &props.finished_date),
        ("books_read", &props.books_read),
        ("most_recent", &props.most_recent),
        ("least_recent", &props.least_recent),
        ("log_book", &props.log_book),
        ("log_date", &props.log_date),
    ] {
        report.detail(format!("properties.{key}={value}"));
    }
    report.detail(format!("labels.finished={}", cfg.labels.finished));
    report.detail(format!("labels.not_started={}", cfg.labels.not_started));
    let ranking = &cfg.ranking;
    report.detail(format!(
        "ranking.most_recent={} enabled={}",
        ranking.most_recent, ranking.most_recent_enabled
    ));
    report.detail(format!(
        "ranking.least_recent={} enabled={}",
        ranking.least_recent, ranking.least_recent_enabled
    ));
    report.detail(format!("link.mode={}", cfg.link.mode.as_str()));
    report.detail(format!("promote.enabled={}", cfg.promote.enabled));

    Ok(report)
}
