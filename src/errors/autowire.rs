use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum AutowireErrorKind {
    #[error("Field {field} is unset")]
    Unset { field: &'static str },
    #[error("Factory for field {field} failed")]
    Factory {
        field: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("Factory for field {field} produced a value of another type, expected: {expected}")]
    IncorrectType { field: &'static str, expected: TypeInfo },
}
