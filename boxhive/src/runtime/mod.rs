pub mod constants;
pub mod options;

pub(crate) mod layout;
pub(crate) mod lock;

mod core;
pub use core::BoxhiveRuntime;
