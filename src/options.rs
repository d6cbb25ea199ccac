use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use anyhow::anyhow;

use crate::scope::Scope;

/// Component that knows how to initialize itself. Bound with [`Options::native_init`].
pub trait Initialize {
    /// # Errors
    /// Any error aborts the init pass of the registry
    fn initialize(&self) -> Result<(), anyhow::Error>;
}

/// Component that knows how to release its resources. Bound with [`Options::native_done`].
pub trait Finalize {
    fn finalize(&self);
}

pub(crate) type InitHook<T> = Arc<dyn Fn(&Scope, &T) -> Result<(), anyhow::Error> + Send + Sync>;
pub(crate) type DoneHook<T> = Arc<dyn Fn(&Scope, &T) -> Result<(), anyhow::Error> + Send + Sync>;

/// Per-component configuration, captured once when the component is declared.
///
/// ## Fields
/// - `priority`:
///   Init runs components in ascending priority, components with equal priority in the order they were first resolved.
///   Done always runs in the reverse of the resulting init order. Default is `0`.
/// - init hooks:
///   Run in the order they were added. The first failure stops the chain and the whole init pass.
/// - done hooks:
///   Run in the order they were added. Failures and panics are logged and never stop teardown.
pub struct Options<T> {
    pub(crate) priority: i32,
    pub(crate) init_hooks: Vec<InitHook<T>>,
    pub(crate) done_hooks: Vec<DoneHook<T>>,
}

impl<T> Clone for Options<T> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            init_hooks: self.init_hooks.clone(),
            done_hooks: self.done_hooks.clone(),
        }
    }
}

impl<T> Default for Options<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Options<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: 0,
            init_hooks: Vec::new(),
            done_hooks: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<T: 'static> Options<T> {
    #[inline]
    #[must_use]
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Scope, &T) -> Result<(), anyhow::Error> + Send + Sync + 'static,
    {
        self.init_hooks.push(Arc::new(hook));
        self
    }

    #[inline]
    #[must_use]
    pub fn done<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Scope, &T) + Send + Sync + 'static,
    {
        self.done_hooks.push(Arc::new(move |scope: &Scope, instance: &T| {
            hook(scope, instance);
            Ok(())
        }));
        self
    }

    /// Adds a done hook that can report a failure. The failure is logged, teardown goes on.
    #[inline]
    #[must_use]
    pub fn try_done<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Scope, &T) -> Result<(), anyhow::Error> + Send + Sync + 'static,
    {
        self.done_hooks.push(Arc::new(hook));
        self
    }
}

impl<T: Initialize + 'static> Options<T> {
    #[inline]
    #[must_use]
    pub fn native_init(self) -> Self {
        self.init(|_, instance: &T| instance.initialize())
    }
}

impl<T: Finalize + 'static> Options<T> {
    #[inline]
    #[must_use]
    pub fn native_done(self) -> Self {
        self.done(|_, instance: &T| instance.finalize())
    }
}

impl<T> Options<T> {
    pub(crate) fn run_init(&self, scope: &Scope, instance: &T) -> Result<(), anyhow::Error> {
        for hook in &self.init_hooks {
            hook(scope, instance)?;
        }
        Ok(())
    }

    /// Runs every done hook, collecting failures instead of stopping on them.
    pub(crate) fn run_done(&self, scope: &Scope, instance: &T) -> Vec<anyhow::Error> {
        self.done_hooks
            .iter()
            .filter_map(|hook| match catch_unwind(AssertUnwindSafe(|| hook(scope, instance))) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(payload) => Some(anyhow!("Done hook panicked: {}", panic_message(payload.as_ref()))),
            })
            .collect()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
