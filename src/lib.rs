pub(crate) mod any;
pub(crate) mod app;
pub mod autowire;
pub(crate) mod collection;
pub(crate) mod component;
pub(crate) mod errors;
pub(crate) mod id;
pub(crate) mod lock;
pub(crate) mod logger;
pub(crate) mod options;
pub(crate) mod registry;
pub(crate) mod scope;

pub use any::TypeInfo;
pub use app::{build, execute, App, BuildConfig, Run};
pub use collection::collection;
pub use component::{declare, declare_with_options, instance, Component};
pub use errors::{AutowireErrorKind, BootErrorKind, BuildErrorKind, InitErrorKind, ResolveErrorKind};
pub use id::ComponentId;
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use options::{Finalize, Initialize, Options};
pub use registry::{ComponentRecord, Phase, Registry, State};
pub use scope::Scope;
