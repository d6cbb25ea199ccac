use std::{borrow::Cow, sync::Arc};

use crate::{errors::ResolveErrorKind, id::ComponentId, registry::Registry};

/// Handle passed to every builder and hook.
///
/// A scope resolves to exactly one [`Registry`] and carries the chain of components currently being
/// built on this call path, which is how re-entrant construction is detected.
/// Cloning is cheap, so a scope can be moved into other threads.
#[derive(Clone, Default)]
pub struct Scope {
    registry: Option<Arc<Registry>>,
    building: Option<Arc<Frame>>,
}

struct Frame {
    id: ComponentId,
    name: Cow<'static, str>,
    parent: Option<Arc<Frame>>,
}

impl Scope {
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry: Some(registry),
            building: None,
        }
    }

    /// Scope without a registry. Resolving through it fails with [`ResolveErrorKind::NoRegistry`].
    #[inline]
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            registry: None,
            building: None,
        }
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::NoRegistry`] for a detached scope
    #[inline]
    pub fn registry(&self) -> Result<&Arc<Registry>, ResolveErrorKind> {
        self.registry.as_ref().ok_or(ResolveErrorKind::NoRegistry)
    }

    #[inline]
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.registry.is_none()
    }

    /// Names of the components being built on this call path, outermost first.
    #[must_use]
    pub fn building(&self) -> Vec<Cow<'static, str>> {
        let mut names = Vec::new();
        let mut frame = self.building.as_deref();
        while let Some(Frame { name, parent, .. }) = frame {
            names.push(name.clone());
            frame = parent.as_deref();
        }
        names.reverse();
        names
    }

    #[must_use]
    pub(crate) fn is_building(&self, id: ComponentId) -> bool {
        let mut frame = self.building.as_deref();
        while let Some(current) = frame {
            if current.id == id {
                return true;
            }
            frame = current.parent.as_deref();
        }
        false
    }

    /// Child scope for the builder of `id`.
    #[must_use]
    pub(crate) fn enter(&self, id: ComponentId, name: Cow<'static, str>) -> Self {
        Self {
            registry: self.registry.clone(),
            building: Some(Arc::new(Frame {
                id,
                name,
                parent: self.building.clone(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scope;
    use crate::{errors::ResolveErrorKind, id::LazyId, registry::Registry};

    use std::sync::Arc;

    #[test]
    fn test_detached() {
        let scope = Scope::detached();

        assert!(scope.is_detached());
        assert!(matches!(scope.registry(), Err(ResolveErrorKind::NoRegistry)));
    }

    #[test]
    fn test_enter() {
        let registry = Arc::new(Registry::new());
        let scope = Scope::new(registry.clone());
        let a = LazyId::new().get_or_assign();
        let b = LazyId::new().get_or_assign();

        let child = scope.enter(a, "A".into());
        let grandchild = child.enter(b, "B".into());

        assert!(!scope.is_building(a));
        assert!(child.is_building(a));
        assert!(!child.is_building(b));
        assert!(grandchild.is_building(a));
        assert!(grandchild.is_building(b));
        assert_eq!(grandchild.building(), ["A", "B"]);
        assert!(scope.building().is_empty());
        assert!(Arc::ptr_eq(grandchild.registry().unwrap(), &registry));
    }
}
