use std::{any::TypeId, borrow::Cow};

use super::build::BuildErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error(
        "\
        Scope isn't bound to a registry. \
        Resolve components through the scope passed to builders and hooks, or the one returned by `build`\
        "
    )]
    NoRegistry,
    #[error("Circular dependency detected while building {name}: {}", path.join(" -> "))]
    CircularDependency {
        name: Cow<'static, str>,
        path: Vec<Cow<'static, str>>,
    },
    #[error("Failed to build component {name}")]
    Construction {
        name: Cow<'static, str>,
        #[source]
        source: BuildErrorKind,
    },
    #[error("Incorrect component type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
}

impl ResolveErrorKind {
    /// Follows nested construction failures down to the error that started them.
    #[must_use]
    pub fn innermost(&self) -> &ResolveErrorKind {
        let mut current = self;
        while let ResolveErrorKind::Construction {
            source: BuildErrorKind::Resolve(inner),
            ..
        } = current
        {
            current = &**inner;
        }
        current
    }

    #[inline]
    #[must_use]
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self.innermost(), ResolveErrorKind::CircularDependency { .. })
    }
}
