//! Centralized page registry
//!
//! Page packages register a factory per handler identifier at startup; the
//! resolver then looks identifiers up here instead of probing for types at
//! runtime.

use std::{fmt, sync::Arc};

use dashmap::DashMap;
use log::{debug, info};

use super::{
    error::{DispatchError, DispatchResult},
    traits::{HeaderPage, Page},
};

/// Builds a fresh page handler for one request.
pub type PageFactory = Arc<dyn Fn() -> DispatchResult<Box<dyn Page>> + Send + Sync>;

/// Builds the shared header for the given template identifier.
pub type HeaderFactory = Arc<dyn Fn(&str) -> DispatchResult<Box<dyn HeaderPage>> + Send + Sync>;

/// Where a handler implementation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Provided by the application built on top of the framework
    Application,
    /// Shipped with the framework itself
    Framework,
}

/// Identifier of a concrete page handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId {
    pub namespace: Namespace,
    pub module: Option<String>,
    pub page: String,
}

impl HandlerId {
    /// The unqualified application handler, e.g. `Page::Cart`
    pub fn page(page: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Application,
            module: None,
            page: page.into(),
        }
    }

    /// An application handler inside a module, e.g. `Shop::Page::Cart`
    pub fn module_page(module: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Application,
            module: Some(module.into()),
            page: page.into(),
        }
    }

    /// A framework handler inside a module, e.g. `Framework::Blog::Page::Cart`
    pub fn framework_module_page(module: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Framework,
            module: Some(module.into()),
            page: page.into(),
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace == Namespace::Framework {
            write!(f, "Framework::")?;
        }
        if let Some(module) = &self.module {
            write!(f, "{module}::")?;
        }
        write!(f, "Page::{}", self.page)
    }
}

/// A bundle of page handlers that registers itself at startup.
pub trait PagePackage {
    /// Return the name of this package
    fn name(&self) -> &str;

    /// Register every handler of this package
    fn register(&self, registry: &PageRegistry);
}

/// Registry of page and header factories
pub struct PageRegistry {
    pages: DashMap<HandlerId, PageFactory>,
    headers: DashMap<Namespace, HeaderFactory>,
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            pages: DashMap::new(),
            headers: DashMap::new(),
        }
    }

    /// Create a registry with the framework's built-in handlers installed
    pub fn with_framework_defaults() -> Self {
        let registry = Self::new();
        registry.install(&crate::pages::FrameworkPages);
        registry
    }

    /// Install every handler of a package
    pub fn install(&self, package: &dyn PagePackage) {
        info!("Installing page package: {}", package.name());
        package.register(self);
    }

    /// Insert or replace the factory for a handler identifier
    pub fn register<F>(&self, id: HandlerId, factory: F)
    where
        F: Fn() -> DispatchResult<Box<dyn Page>> + Send + Sync + 'static,
    {
        debug!("Registering page handler {}", id);
        self.pages.insert(id, Arc::new(factory));
    }

    /// Register an unqualified application page
    pub fn register_page<F>(&self, page: &str, factory: F)
    where
        F: Fn() -> DispatchResult<Box<dyn Page>> + Send + Sync + 'static,
    {
        self.register(HandlerId::page(page), factory);
    }

    /// Register an application page inside a module
    pub fn register_module_page<F>(&self, module: &str, page: &str, factory: F)
    where
        F: Fn() -> DispatchResult<Box<dyn Page>> + Send + Sync + 'static,
    {
        self.register(HandlerId::module_page(module, page), factory);
    }

    /// Register a framework page inside a module
    pub fn register_framework_page<F>(&self, module: &str, page: &str, factory: F)
    where
        F: Fn() -> DispatchResult<Box<dyn Page>> + Send + Sync + 'static,
    {
        self.register(HandlerId::framework_module_page(module, page), factory);
    }

    /// Register the application header, which takes precedence over the framework one
    pub fn register_header<F>(&self, factory: F)
    where
        F: Fn(&str) -> DispatchResult<Box<dyn HeaderPage>> + Send + Sync + 'static,
    {
        debug!("Registering application header");
        self.headers.insert(Namespace::Application, Arc::new(factory));
    }

    /// Register the framework header
    pub fn register_framework_header<F>(&self, factory: F)
    where
        F: Fn(&str) -> DispatchResult<Box<dyn HeaderPage>> + Send + Sync + 'static,
    {
        debug!("Registering framework header");
        self.headers.insert(Namespace::Framework, Arc::new(factory));
    }

    /// Check whether a handler is registered
    pub fn contains(&self, id: &HandlerId) -> bool {
        self.pages.contains_key(id)
    }

    /// Check whether a header is registered in the namespace
    pub fn contains_header(&self, namespace: Namespace) -> bool {
        self.headers.contains_key(&namespace)
    }

    /// Get the factory for a handler
    pub fn get_factory(&self, id: &HandlerId) -> Option<PageFactory> {
        self.pages.get(id).map(|entry| entry.value().clone())
    }

    /// Get the header factory for a namespace
    pub fn get_header_factory(&self, namespace: Namespace) -> Option<HeaderFactory> {
        self.headers.get(&namespace).map(|entry| entry.value().clone())
    }

    /// Instantiate the handler bound to `id`
    pub fn create_page(&self, id: &HandlerId) -> DispatchResult<Box<dyn Page>> {
        // The map guard must not be held while user code runs.
        let factory = self
            .get_factory(id)
            .ok_or_else(|| DispatchError::Resolution {
                page: id.page.clone(),
                searched: vec![id.clone()],
            })?;
        factory()
    }

    /// Instantiate the header of a namespace for the given template
    pub fn create_header(
        &self,
        namespace: Namespace,
        template: &str,
    ) -> DispatchResult<Box<dyn HeaderPage>> {
        let factory =
            self.get_header_factory(namespace)
                .ok_or_else(|| DispatchError::HeaderResolution {
                    template: template.to_string(),
                })?;
        factory(template)
    }

    /// Remove a handler
    pub fn remove(&self, id: &HandlerId) -> Option<PageFactory> {
        debug!("Removing page handler {}", id);
        self.pages.remove(id).map(|(_, factory)| factory)
    }

    /// Get all registered handler identifiers, sorted
    pub fn list_ids(&self) -> Vec<HandlerId> {
        let mut ids: Vec<HandlerId> = self.pages.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Get registry counts for monitoring
    pub fn get_stats(&self) -> RegistryStats {
        RegistryStats {
            page_count: self.pages.len(),
            header_count: self.headers.len(),
        }
    }
}

/// Statistics about registry contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub page_count: usize,
    pub header_count: usize,
}
