use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A store operation did not report success. Fatal for the run.
    #[error("{operation} failed{}: {detail}", status_suffix(*status))]
    RemoteRequest {
        operation: String,
        status: Option<u16>,
        detail: String,
    },
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),
}

fn status_suffix(status: Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}

impl SyncError {
    pub fn remote(operation: impl Into<String>, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::RemoteRequest {
            operation: operation.into(),
            status,
            detail: detail.into(),
        }
    }
}
