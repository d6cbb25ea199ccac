use std::{borrow::Cow, sync::Arc};

use tracing::{debug, debug_span, error};

use crate::{
    any::TypeInfo,
    errors::{BuildErrorKind, ResolveErrorKind},
    id::{ComponentId, LazyId},
    options::Options,
    registry::{ComponentRecord, Registry},
    scope::Scope,
};

pub(crate) type BoxedBuilder<T> = Box<dyn Fn(&Scope) -> Result<T, BuildErrorKind> + Send + Sync>;

/// Lazily built singleton.
///
/// A component is declared once with [`declare`] and resolved any number of times with [`Component::get`].
/// The builder runs on the first resolution within a registry, every later call returns the same instance.
/// Cloning a component is cheap and keeps its identity.
pub struct Component<T> {
    inner: Arc<ComponentInner<T>>,
}

struct ComponentInner<T> {
    name: Cow<'static, str>,
    id: LazyId,
    builder: BoxedBuilder<T>,
    options: Options<T>,
}

impl<T> Clone for Component<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

/// Declares a component with default [`Options`].
#[inline]
#[must_use]
pub fn declare<T, F>(name: impl Into<Cow<'static, str>>, builder: F) -> Component<T>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BuildErrorKind> + Send + Sync + 'static,
{
    declare_with_options(name, builder, Options::new())
}

#[must_use]
pub fn declare_with_options<T, F>(name: impl Into<Cow<'static, str>>, builder: F, options: Options<T>) -> Component<T>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BuildErrorKind> + Send + Sync + 'static,
{
    Component {
        inner: Arc::new(ComponentInner {
            name: name.into(),
            id: LazyId::new(),
            builder: Box::new(builder),
            options,
        }),
    }
}

/// Builder that just returns a clone of the passed value.
/// It can be used when the value was created outside the container.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Fn(&Scope) -> Result<T, BuildErrorKind> + Send + Sync + 'static {
    move |_: &Scope| Ok(val.clone())
}

impl<T> Component<T> {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.inner.options.priority
    }

    /// Id of the component, `None` until it's resolved for the first time.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<ComponentId> {
        self.inner.id.get()
    }
}

impl<T: Send + Sync + 'static> Component<T> {
    /// Resolves the component, building it if the scope's registry doesn't have it yet.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoRegistry`] if the scope is detached
    /// - Returns [`ResolveErrorKind::CircularDependency`] if the component is already being built on this call path,
    ///   or if waiting for its build would deadlock with another thread
    /// - Returns [`ResolveErrorKind::Construction`] if the builder fails
    pub fn get(&self, scope: &Scope) -> Result<Arc<T>, ResolveErrorKind> {
        let span = debug_span!("get", component = self.name());
        let _guard = span.enter();

        let registry = scope.registry().map_err(|err| {
            error!("{}", err);
            err
        })?;
        let id = self.inner.id.get_or_assign();

        if scope.is_building(id) {
            let err = self.circular_dependency(scope);
            error!("{}", err);
            return Err(err);
        }

        if let Some(record) = registry.get(id) {
            debug!("Found in registry");
            return downcast(&record);
        }
        debug!("Not found in registry");

        // Refused when the lock is held by this thread through another scope, or by a thread waiting on this one
        let Some(_build_lock) = registry.build_lock(id) else {
            let err = self.circular_dependency(scope);
            error!("{}", err);
            return Err(err);
        };

        if let Some(record) = registry.get(id) {
            debug!("Built while waiting for the lock");
            return downcast(&record);
        }

        self.build(registry, scope, id)
    }

    fn build(&self, registry: &Registry, scope: &Scope, id: ComponentId) -> Result<Arc<T>, ResolveErrorKind> {
        registry.logger().log(self.name(), "building");

        let child = scope.enter(id, self.inner.name.clone());
        let instance = match (self.inner.builder)(&child) {
            Ok(instance) => Arc::new(instance),
            // A cycle is reported as is, without wrapping it into every component on the path
            Err(BuildErrorKind::Resolve(err)) if matches!(*err, ResolveErrorKind::CircularDependency { .. }) => {
                return Err(*err);
            }
            Err(source) => {
                let err = ResolveErrorKind::Construction {
                    name: self.inner.name.clone(),
                    source,
                };
                error!("{}", err);
                return Err(err);
            }
        };

        let record = registry.register(self.record(id, instance));
        debug!("Built");

        downcast(&record)
    }

    fn circular_dependency(&self, scope: &Scope) -> ResolveErrorKind {
        let mut path = scope.building();
        path.push(self.inner.name.clone());

        ResolveErrorKind::CircularDependency {
            name: self.inner.name.clone(),
            path,
        }
    }

    fn record(&self, id: ComponentId, instance: Arc<T>) -> ComponentRecord {
        let init = {
            let inner = self.inner.clone();
            let instance = instance.clone();
            Box::new(move |scope: &Scope| inner.options.run_init(scope, &instance))
        };
        let done = {
            let inner = self.inner.clone();
            let instance = instance.clone();
            Box::new(move |scope: &Scope| inner.options.run_done(scope, &instance))
        };

        ComponentRecord::new(id, self.inner.name.clone(), self.inner.options.priority, instance, init, done)
    }
}

fn downcast<T: Send + Sync + 'static>(record: &ComponentRecord) -> Result<Arc<T>, ResolveErrorKind> {
    record.instance().downcast::<T>().map_err(|instance| {
        let err = ResolveErrorKind::IncorrectType {
            expected: TypeInfo::of::<T>(),
            actual: (*instance).type_id(),
        };
        error!("{}", err);
        err
    })
}
