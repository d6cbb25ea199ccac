use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
#[error("Failed to initialize component {name}")]
pub struct InitErrorKind {
    pub name: Cow<'static, str>,
    #[source]
    pub source: anyhow::Error,
}
