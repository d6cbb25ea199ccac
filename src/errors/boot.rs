use super::{init::InitErrorKind, resolve::ResolveErrorKind};

/// The single error surfaced by application bring-up.
#[derive(thiserror::Error, Debug)]
pub enum BootErrorKind {
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
    #[error(transparent)]
    Init(#[from] InitErrorKind),
    #[error("Application run failed")]
    Run(#[source] anyhow::Error),
    #[error("Application bring-up panicked: {message}")]
    Panic { message: String },
}
