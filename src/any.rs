use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Type name without the module path of the outermost type.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let outer = self.name.split_once('<').map_or(self.name, |(outer, _)| outer);
        match outer.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeInfo;

    use std::sync::Arc;

    struct Events;

    #[test]
    fn test_eq_by_id() {
        assert_eq!(TypeInfo::of::<Events>(), TypeInfo::of::<Events>());
        assert_ne!(TypeInfo::of::<Events>(), TypeInfo::of::<Arc<Events>>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Events>().short_name(), "Events");
        assert_eq!(TypeInfo::of::<u8>().short_name(), "u8");
        assert!(TypeInfo::of::<Arc<Events>>().short_name().starts_with("Arc<"));
    }
}
