//! Populates fields of an environment struct from a set of zero-argument factories, matching them by type.
//!
//! Fields that take part in wiring are `Option<X>` and are listed once with the [`environment!`](crate::environment)
//! macro:
//!
//! ```
//! use lazydi::{autowire, environment};
//!
//! #[derive(Default)]
//! struct Env {
//!     greeting: Option<String>,
//!     answer: Option<u32>,
//! }
//!
//! environment!(Env { greeting, answer });
//!
//! let factories = autowire::Factories::new().add(|| String::from("hello")).add(|| 42u32);
//! let mut env = Env::default();
//!
//! autowire::resolve(&factories, &mut env).unwrap();
//! autowire::check(&env).unwrap();
//!
//! assert_eq!(env.greeting.as_deref(), Some("hello"));
//! assert_eq!(env.answer, Some(42));
//! ```

use std::{any::Any, sync::Arc};

use tracing::{debug, debug_span, error, warn};

use crate::{any::TypeInfo, component::Component, errors::AutowireErrorKind, scope::Scope};

/// Field of an environment that can receive a type-erased value.
pub trait Slot {
    /// Type of the value the slot accepts
    fn type_info(&self) -> TypeInfo;

    fn is_set(&self) -> bool;

    /// # Errors
    /// Returns the value back if it has another type
    fn fill(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
}

impl<T: 'static> Slot for Option<T> {
    #[inline]
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    #[inline]
    fn is_set(&self) -> bool {
        self.is_some()
    }

    fn fill(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        *self = Some(*value.downcast::<T>()?);
        Ok(())
    }
}

/// Struct whose fields are populated by [`resolve`].
///
/// Both methods list the same fields in declaration order. Usually derived with [`environment!`](crate::environment).
pub trait Environment {
    fn slots(&self) -> Vec<(&'static str, &dyn Slot)>;

    fn slots_mut(&mut self) -> Vec<(&'static str, &mut dyn Slot)>;
}

/// Implements [`Environment`] for a struct, listing the given `Option` fields in order.
#[macro_export]
macro_rules! environment {
    ($env:ty { $( $field:ident ),* $(,)? }) => {
        impl $crate::autowire::Environment for $env {
            fn slots(&self) -> ::std::vec::Vec<(&'static str, &dyn $crate::autowire::Slot)> {
                ::std::vec![$( (::core::stringify!($field), &self.$field as &dyn $crate::autowire::Slot) ),*]
            }

            fn slots_mut(&mut self) -> ::std::vec::Vec<(&'static str, &mut dyn $crate::autowire::Slot)> {
                ::std::vec![$( (::core::stringify!($field), &mut self.$field as &mut dyn $crate::autowire::Slot) ),*]
            }
        }
    };
}

type Factory = Box<dyn Fn() -> Result<Box<dyn Any>, anyhow::Error> + Send + Sync>;

/// Zero-argument factories, kept in the order they were added.
#[derive(Default)]
pub struct Factories {
    entries: Vec<(TypeInfo, Factory)>,
}

impl Factories {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add<T, F>(self, factory: F) -> Self
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_add(move || Ok(factory()))
    }

    #[must_use]
    pub fn try_add<T, F>(mut self, factory: F) -> Self
    where
        T: 'static,
        F: Fn() -> Result<T, anyhow::Error> + Send + Sync + 'static,
    {
        self.entries.push((
            TypeInfo::of::<T>(),
            Box::new(move || factory().map(|value| Box::new(value) as Box<dyn Any>)),
        ));
        self
    }

    /// Adds a factory of `Arc<T>` that resolves the component through the scope.
    #[must_use]
    pub fn component<T: Send + Sync + 'static>(self, component: &Component<T>, scope: &Scope) -> Self {
        let component = component.clone();
        let scope = scope.clone();
        self.try_add(move || Ok(component.get(&scope)?))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, field: &'static str, type_info: TypeInfo) -> Option<&Factory> {
        let mut matches = self.entries.iter().filter(|(produced, _)| *produced == type_info).map(|(_, factory)| factory);

        let first = matches.next()?;
        let rest = matches.count();
        if rest > 0 {
            warn!(field, %type_info, count = rest + 1, "Several factories produce the same type, the first one is used");
        }
        Some(first)
    }
}

/// Fills every slot of the environment that has a factory of its type, overwriting the previous value.
/// Slots without a factory are left as they are.
///
/// # Errors
/// - Returns [`AutowireErrorKind::Factory`] if a factory fails, slots after it aren't touched
/// - Returns [`AutowireErrorKind::IncorrectType`] if a slot rejects the produced value
pub fn resolve<E: Environment + ?Sized>(factories: &Factories, env: &mut E) -> Result<(), AutowireErrorKind> {
    let span = debug_span!("autowire");
    let _guard = span.enter();

    for (field, slot) in env.slots_mut() {
        let expected = slot.type_info();
        let Some(factory) = factories.find(field, expected) else {
            debug!(field, "No factory found");
            continue;
        };

        let value = factory().map_err(|source| {
            let err = AutowireErrorKind::Factory { field, source };
            error!("{}", err);
            err
        })?;
        slot.fill(value).map_err(|_| {
            let err = AutowireErrorKind::IncorrectType { field, expected };
            error!("{}", err);
            err
        })?;
        debug!(field, "Wired");
    }

    Ok(())
}

/// # Errors
/// Returns [`AutowireErrorKind::Unset`] naming the first slot without a value
pub fn check<E: Environment + ?Sized>(env: &E) -> Result<(), AutowireErrorKind> {
    match env.slots().into_iter().find(|(_, slot)| !slot.is_set()) {
        Some((field, _)) => Err(AutowireErrorKind::Unset { field }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{check, resolve, Factories, Slot};
    use crate::{any::TypeInfo, component::declare, errors::AutowireErrorKind, registry::Registry, scope::Scope};

    use anyhow::anyhow;
    use std::sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    };
    use tracing_test::traced_test;

    struct Events(u8);
    struct Repository(String);

    #[derive(Default)]
    struct Env {
        events: Option<Arc<Events>>,
        repository: Option<Repository>,
        port: Option<u16>,
    }

    crate::environment!(Env { events, repository, port });

    #[test]
    fn test_slot() {
        let mut slot: Option<u16> = None;

        assert_eq!(slot.type_info(), TypeInfo::of::<u16>());
        assert!(!slot.is_set());
        assert!(slot.fill(Box::new("not a port")).is_err());
        assert!(slot.fill(Box::new(8080u16)).is_ok());
        assert_eq!(slot, Some(8080));
    }

    #[test]
    #[traced_test]
    fn test_resolve() {
        let factories = Factories::new()
            .add(|| Arc::new(Events(1)))
            .add(|| Repository("users".to_owned()))
            .add(|| 8080u16);
        let mut env = Env::default();

        resolve(&factories, &mut env).unwrap();

        assert!(check(&env).is_ok());
        assert_eq!(env.events.unwrap().0, 1);
        assert_eq!(env.repository.unwrap().0, "users");
        assert_eq!(env.port, Some(8080));
    }

    #[test]
    #[traced_test]
    fn test_missing_factory() {
        let factories = Factories::new().add(|| 8080u16);
        let mut env = Env::default();

        resolve(&factories, &mut env).unwrap();

        assert!(env.events.is_none());
        assert_eq!(env.port, Some(8080));
        match check(&env) {
            Err(AutowireErrorKind::Unset { field }) => assert_eq!(field, "events"),
            result => panic!("Unexpected result: {result:?}"),
        }
        assert!(logs_contain("No factory found"));
    }

    #[test]
    #[traced_test]
    fn test_first_factory_wins() {
        let factories = Factories::new().add(|| 1u16).add(|| 2u16);
        let mut env = Env::default();

        resolve(&factories, &mut env).unwrap();

        assert_eq!(factories.len(), 2);
        assert_eq!(env.port, Some(1));
        assert!(logs_contain("Several factories produce the same type"));
    }

    #[test]
    #[traced_test]
    fn test_factory_failure() {
        let called = Arc::new(AtomicU8::new(0));
        let factories = Factories::new()
            .try_add(|| -> Result<Arc<Events>, _> { Err(anyhow!("no broker")) })
            .add({
                let called = called.clone();
                move || {
                    called.fetch_add(1, Ordering::SeqCst);
                    8080u16
                }
            });
        let mut env = Env::default();

        let err = resolve(&factories, &mut env).unwrap_err();

        assert_eq!(err.to_string(), "Factory for field events failed");
        assert!(matches!(err, AutowireErrorKind::Factory { field: "events", .. }));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[traced_test]
    fn test_component_factory() {
        let scope = Scope::new(Arc::new(Registry::new()));
        let built = Arc::new(AtomicU8::new(0));
        let events = declare("Events", {
            let built = built.clone();
            move |_: &Scope| Ok(Events(built.fetch_add(1, Ordering::SeqCst)))
        });
        let factories = Factories::new().component(&events, &scope);
        let mut first = Env::default();
        let mut second = Env::default();

        resolve(&factories, &mut first).unwrap();
        resolve(&factories, &mut second).unwrap();

        assert!(Arc::ptr_eq(first.events.as_ref().unwrap(), second.events.as_ref().unwrap()));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_component_factory_failure() {
        let events = declare("Events", |_: &Scope| Ok(Events(0)));
        let factories = Factories::new().component(&events, &Scope::detached());
        let mut env = Env::default();

        let err = resolve(&factories, &mut env).unwrap_err();

        assert!(matches!(err, AutowireErrorKind::Factory { field: "events", .. }));
    }
}
