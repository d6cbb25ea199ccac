use std::{
    ops::Deref,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{debug, error, info, info_span};

use crate::{
    component::Component,
    errors::{BootErrorKind, ResolveErrorKind},
    logger::{Logger, NoopLogger},
    options::panic_message,
    registry::Registry,
    scope::Scope,
};

/// Root component that drives the application between init and done. Used by [`execute`].
pub trait Run {
    /// # Errors
    /// Any error is returned from [`execute`] as [`BootErrorKind::Run`] after done has run
    fn run(&self, scope: &Scope) -> Result<(), anyhow::Error>;
}

type Service = Box<dyn Fn(&Scope) -> Result<(), ResolveErrorKind> + Send + Sync>;

/// Bring-up configuration.
///
/// ## Fields
/// - services:
///   Components added with [`BuildConfig::with_service`] and functions added with [`BuildConfig::with_daemon`].
///   They run right after the root is resolved, in the order they were added, even if nothing depends on them.
/// - logger:
///   Receives component lifecycle events. Default is [`NoopLogger`].
pub struct BuildConfig {
    services: Vec<Service>,
    logger: Arc<dyn Logger>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            logger: Arc::new(NoopLogger),
        }
    }
}

impl BuildConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_service<U: Send + Sync + 'static>(mut self, component: &Component<U>) -> Self {
        let component = component.clone();
        self.services.push(Box::new(move |scope: &Scope| component.get(scope).map(|_| ())));
        self
    }

    #[must_use]
    pub fn with_daemon<F>(mut self, daemon: F) -> Self
    where
        F: Fn(&Scope) -> Result<(), ResolveErrorKind> + Send + Sync + 'static,
    {
        self.services.push(Box::new(daemon));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }
}

/// Application built by [`build`]: the root instance and the registry that owns everything it depends on.
///
/// Dropping the application runs done for every initialized component.
pub struct App<T> {
    root: Arc<T>,
    scope: Scope,
    registry: Arc<Registry>,
}

impl<T> App<T> {
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Arc<T> {
        &self.root
    }

    /// Scope bound to the application's registry, for resolving more components after bring-up.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Runs done hooks in reverse of init order.
    ///
    /// # Warning
    /// This method can be called multiple times, but every component is finalized only once
    pub fn done(&self) {
        self.registry.done(&self.scope);
    }
}

impl<T> Deref for App<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl<T> Drop for App<T> {
    fn drop(&mut self) {
        self.done();
        debug!("Application torn down on drop");
    }
}

/// Builds the application from its root component.
///
/// Creates a fresh registry, resolves the root, then services and daemons from the config, then initializes
/// every resolved component.
///
/// # Errors
/// - Returns [`BootErrorKind::Resolve`] if the root or one of the services can't be built
/// - Returns [`BootErrorKind::Init`] if an init hook fails
/// - Returns [`BootErrorKind::Panic`] if a builder, a service or an init hook panics
///
/// No done hooks run on failure.
pub fn build<T: Send + Sync + 'static>(root: &Component<T>, config: BuildConfig) -> Result<App<T>, BootErrorKind> {
    let span = info_span!("build", root = root.name());
    let _guard = span.enter();

    let BuildConfig { services, logger } = config;
    let registry = Arc::new(Registry::with_logger(logger));
    let scope = Scope::new(registry.clone());

    let bring_up = catch_unwind(AssertUnwindSafe(|| -> Result<Arc<T>, BootErrorKind> {
        let root = root.get(&scope)?;
        for service in &services {
            service(&scope)?;
        }
        debug!(components = registry.len(), "Components built");

        registry.init(&scope)?;
        Ok(root)
    }));

    let root = match bring_up {
        Ok(result) => result?,
        Err(payload) => {
            let err = BootErrorKind::Panic {
                message: panic_message(payload.as_ref()).to_owned(),
            };
            error!("{}", err);
            return Err(err);
        }
    };
    info!(components = registry.len(), "Application built");

    Ok(App { root, scope, registry })
}

/// Builds the application, runs its root and tears it down.
///
/// Done runs even if the root's [`Run::run`] fails.
///
/// # Errors
/// - Returns any error of [`build`]
/// - Returns [`BootErrorKind::Run`] if the root fails to run
pub fn execute<T: Run + Send + Sync + 'static>(root: &Component<T>, config: BuildConfig) -> Result<(), BootErrorKind> {
    let app = build(root, config)?;

    let result = app.root.run(&app.scope);
    app.done();

    result.map_err(|err| {
        error!("Application run failed: {:#}", err);
        BootErrorKind::Run(err)
    })
}
