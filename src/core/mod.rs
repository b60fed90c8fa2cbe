//! Core abstractions and interfaces for pagegate
//!
//! This module provides the foundational traits, types, and utilities
//! shared by the dispatcher, the admin surface and the HTTP front controller.

pub mod context;
pub mod error;
pub mod registry;
pub mod traits;


// Re-export commonly used types
pub use context::{PageContext, Session};
pub use error::{DispatchError, DispatchResult, ErrorContext};
pub use registry::{HandlerId, Namespace, PagePackage, PageRegistry};
pub use traits::*;
