//! Handlers shipped with the framework.

pub mod header;

use crate::core::{PagePackage, PageRegistry};

pub use header::FrameworkHeader;

pub const PACKAGE_NAME: &str = "framework";

/// Registers the framework's built-in handlers.
pub struct FrameworkPages;

impl PagePackage for FrameworkPages {
    fn name(&self) -> &str {
        PACKAGE_NAME
    }

    fn register(&self, registry: &PageRegistry) {
        registry.register_framework_header(FrameworkHeader::create);
    }
}
