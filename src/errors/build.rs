use super::resolve::ResolveErrorKind;

/// Failure returned by a component builder.
///
/// `?` works on both nested resolutions and `anyhow` errors, so the chain of causes survives.
#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    #[error(transparent)]
    Resolve(Box<ResolveErrorKind>),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl From<ResolveErrorKind> for BuildErrorKind {
    #[inline]
    fn from(err: ResolveErrorKind) -> Self {
        Self::Resolve(Box::new(err))
    }
}
