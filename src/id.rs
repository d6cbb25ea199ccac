use core::{
    fmt::{self, Display, Formatter},
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique component identity.
///
/// Ids are handed out by a global counter, so they grow in the order components are first resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    #[inline]
    #[must_use]
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id slot of a component, filled on its first resolution.
pub(crate) struct LazyId(AtomicU64);

impl LazyId {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self) -> Option<ComponentId> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            id => Some(ComponentId(id)),
        }
    }

    pub(crate) fn get_or_assign(&self) -> ComponentId {
        if let Some(id) = self.get() {
            return id;
        }

        let candidate = ComponentId::next();
        match self.0.compare_exchange(0, candidate.0, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => candidate,
            Err(assigned) => ComponentId(assigned),
        }
    }
}
