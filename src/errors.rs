mod autowire;
mod boot;
mod build;
mod init;
mod resolve;

pub use autowire::AutowireErrorKind;
pub use boot::BootErrorKind;
pub use build::BuildErrorKind;
pub use init::InitErrorKind;
pub use resolve::ResolveErrorKind;
