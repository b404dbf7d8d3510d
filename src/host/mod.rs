//! Implements the execution-mode selector and the host adapters around the solver core

mod mode;
mod native;
mod sandboxed;
pub use crate::host::mode::*;
pub use crate::host::native::*;
pub use crate::host::sandboxed::*;
