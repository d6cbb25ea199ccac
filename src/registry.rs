use std::{
    any::Any,
    borrow::Cow,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    errors::InitErrorKind,
    id::ComponentId,
    lock::{BuildLock, BuildLocks},
    logger::{Logger, NoopLogger},
    scope::Scope,
};

/// Lifecycle state of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Constructed,
    Initialized,
    Done,
}

impl State {
    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => State::Constructed,
            1 => State::Initialized,
            _ => State::Done,
        }
    }
}

/// Application-wide phase. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Construct,
    Init,
    Done,
}

pub(crate) type InitAction = Box<dyn Fn(&Scope) -> Result<(), anyhow::Error> + Send + Sync>;
pub(crate) type DoneAction = Box<dyn Fn(&Scope) -> Vec<anyhow::Error> + Send + Sync>;

/// A resolved component, owned by the [`Registry`] it was first resolved in.
pub struct ComponentRecord {
    id: ComponentId,
    name: Cow<'static, str>,
    priority: i32,
    state: AtomicU8,
    // Serializes state transitions, hooks run while it's held
    transition: Mutex<()>,
    instance: Arc<dyn Any + Send + Sync>,
    init: InitAction,
    done: DoneAction,
}

impl ComponentRecord {
    #[must_use]
    pub(crate) fn new(
        id: ComponentId,
        name: Cow<'static, str>,
        priority: i32,
        instance: Arc<dyn Any + Send + Sync>,
        init: InitAction,
        done: DoneAction,
    ) -> Self {
        Self {
            id,
            name,
            priority,
            state: AtomicU8::new(State::Constructed as u8),
            transition: Mutex::new(()),
            instance,
            init,
            done,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    #[must_use]
    pub(crate) fn instance(&self) -> Arc<dyn Any + Send + Sync> {
        self.instance.clone()
    }

    /// Returns `true` if the record moved to [`State::Initialized`].
    fn run_init(&self, scope: &Scope) -> Result<bool, InitErrorKind> {
        let _transition = self.transition.lock();
        if self.state() != State::Constructed {
            return Ok(false);
        }

        (self.init)(scope).map_err(|source| InitErrorKind {
            name: self.name.clone(),
            source,
        })?;
        self.state.store(State::Initialized as u8, Ordering::Release);

        Ok(true)
    }

    /// Returns failures of the done hooks, or `None` if the record wasn't initialized.
    fn run_done(&self, scope: &Scope) -> Option<Vec<anyhow::Error>> {
        let _transition = self.transition.lock();
        if self.state() != State::Initialized {
            return None;
        }
        self.state.store(State::Done as u8, Ordering::Release);

        Some((self.done)(scope))
    }
}

#[derive(Default)]
struct Components {
    sequence: Vec<Arc<ComponentRecord>>,
    index: BTreeMap<ComponentId, Arc<ComponentRecord>>,
}

impl Components {
    /// Stable-sorts records that weren't initialized yet by priority and returns the constructed ones in init order.
    fn sort_pending(&mut self) -> Vec<Arc<ComponentRecord>> {
        let start = self
            .sequence
            .iter()
            .position(|record| record.state() == State::Constructed)
            .unwrap_or(self.sequence.len());

        let pending = &mut self.sequence[start..];
        pending.sort_by_key(|record| record.priority);
        pending
            .iter()
            .filter(|record| record.state() == State::Constructed)
            .cloned()
            .collect()
    }
}

/// Owner of every component resolved within one build, and runner of their lifecycle.
pub struct Registry {
    components: Mutex<Components>,
    build_locks: BuildLocks,
    phase: Mutex<Phase>,
    logger: Arc<dyn Logger>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoopLogger))
    }

    #[must_use]
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            components: Mutex::new(Components::default()),
            build_locks: BuildLocks::new(),
            phase: Mutex::new(Phase::Construct),
            logger,
        }
    }

    #[inline]
    #[must_use]
    pub fn logger(&self) -> &dyn Logger {
        &*self.logger
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.lock().sequence.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<Arc<ComponentRecord>> {
        self.components.lock().index.get(&id).cloned()
    }

    /// Records in their current order: first-resolution order, reordered by priority once initialized.
    #[must_use]
    pub fn records(&self) -> Vec<Arc<ComponentRecord>> {
        self.components.lock().sequence.clone()
    }

    #[must_use]
    pub fn names(&self) -> Vec<Cow<'static, str>> {
        self.components.lock().sequence.iter().map(|record| record.name.clone()).collect()
    }

    /// Stores the record unless one with the same id is present, and returns the stored one.
    pub(crate) fn register(&self, record: ComponentRecord) -> Arc<ComponentRecord> {
        use std::collections::btree_map::Entry::{Occupied, Vacant};

        let mut guard = self.components.lock();
        let components = &mut *guard;
        match components.index.entry(record.id) {
            Occupied(entry) => {
                debug!(id = %record.id, "Already registered");
                entry.get().clone()
            }
            Vacant(entry) => {
                let record = Arc::new(record);
                entry.insert(record.clone());
                components.sequence.push(record.clone());
                debug!(id = %record.id, "Registered");
                record
            }
        }
    }

    /// Takes the construction lock of `id`, `None` if waiting for it would deadlock.
    #[inline]
    #[must_use]
    pub(crate) fn build_lock(&self, id: ComponentId) -> Option<BuildLock<'_>> {
        self.build_locks.acquire(id)
    }

    #[cfg(test)]
    pub(crate) fn build_locks(&self) -> &BuildLocks {
        &self.build_locks
    }

    fn advance(&self, phase: Phase) {
        let mut current = self.phase.lock();
        if *current < phase {
            *current = phase;
        }
    }

    /// Runs init hooks of every constructed component in ascending priority.
    ///
    /// Components resolved by init hooks are initialized in the same call.
    /// Calling it again only touches components that weren't initialized yet.
    ///
    /// # Errors
    /// Returns the first init hook failure. Components initialized before it stay initialized,
    /// the rest aren't touched.
    pub fn init(&self, scope: &Scope) -> Result<(), InitErrorKind> {
        let span = info_span!("init");
        let _guard = span.enter();

        self.advance(Phase::Init);

        loop {
            let pending = self.components.lock().sort_pending();
            if pending.is_empty() {
                debug!("All components initialized");
                return Ok(());
            }

            for record in pending {
                match record.run_init(scope) {
                    Ok(true) => {
                        self.logger.log(record.name(), "initialized");
                        debug!(component = record.name(), "Initialized");
                    }
                    Ok(false) => {}
                    Err(err) => {
                        error!("{}: {:#}", err, err.source);
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Runs done hooks of every initialized component, in reverse of the current order.
    ///
    /// Failures and panics of done hooks are reported to the logger and never stop the pass.
    pub fn done(&self, scope: &Scope) {
        let span = info_span!("done");
        let _guard = span.enter();

        self.advance(Phase::Done);

        let records = self.components.lock().sequence.clone();
        for record in records.iter().rev() {
            let Some(errors) = record.run_done(scope) else {
                continue;
            };
            for err in errors {
                error!(component = record.name(), "{err:#}");
                self.logger.log(record.name(), &format!("done failed: {err:#}"));
            }
            self.logger.log(record.name(), "done");
            debug!(component = record.name(), "Done");
        }
    }
}
