//! Hook chains consulted before access control.
//!
//! Hooks are registered per chain key and run in registration order. The
//! first hook returning a non-empty page name wins; the rest of the chain is
//! skipped. A failing hook aborts the chain and the dispatch.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};

use crate::core::{CheckPageHook, DispatchResult};

/// Chain consulted by the dispatcher for every requested page.
pub const CHECK_PAGE: &str = "checkPage";

/// Adapts a closure into a [`CheckPageHook`].
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&str) -> DispatchResult<Option<String>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> CheckPageHook for FnHook<F>
where
    F: Fn(&str) -> DispatchResult<Option<String>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check_page(&self, page_name: &str) -> DispatchResult<Option<String>> {
        (self.f)(page_name)
    }
}

/// Registry of named hook chains
#[derive(Default)]
pub struct HookRegistry {
    chains: DashMap<String, Vec<Arc<dyn CheckPageHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the chain `key`
    pub fn register(&self, key: &str, hook: Arc<dyn CheckPageHook>) {
        debug!("Registering hook '{}' on chain '{}'", hook.name(), key);
        self.chains.entry(key.to_string()).or_default().push(hook);
    }

    /// Append a closure to the chain `key`
    pub fn register_fn<F>(&self, key: &str, name: &str, f: F)
    where
        F: Fn(&str) -> DispatchResult<Option<String>> + Send + Sync + 'static,
    {
        self.register(key, Arc::new(FnHook::new(name, f)));
    }

    /// The hooks of chain `key` in registration order; empty if none
    pub fn get(&self, key: &str) -> Vec<Arc<dyn CheckPageHook>> {
        self.chains
            .get(key)
            .map(|chain| chain.value().clone())
            .unwrap_or_default()
    }

    /// Drop every hook of chain `key`
    pub fn clear(&self, key: &str) {
        self.chains.remove(key);
    }

    /// Run chain `key` against `page_name`.
    ///
    /// Returns the overriding name of the first hook with a non-empty
    /// result, or `page_name` unchanged.
    pub fn run(&self, key: &str, page_name: &str) -> DispatchResult<String> {
        // Snapshot the chain so no map guard is held while hooks run.
        for hook in self.get(key) {
            match hook.check_page(page_name)? {
                Some(result) if !result.is_empty() => {
                    info!(
                        "Hook '{}' on '{}' rewrote page '{}' to '{}'",
                        hook.name(),
                        key,
                        page_name,
                        result
                    );
                    return Ok(result);
                }
                _ => {}
            }
        }
        Ok(page_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::core::DispatchError;

    #[test]
    fn test_empty_chain_keeps_name() {
        let hooks = HookRegistry::new();
        assert_eq!(hooks.run(CHECK_PAGE, "A").unwrap(), "A");
        assert!(hooks.get(CHECK_PAGE).is_empty());
    }

    #[test]
    fn test_first_non_empty_result_wins() {
        let third_calls = Arc::new(AtomicUsize::new(0));
        let counter = third_calls.clone();

        let hooks = HookRegistry::new();
        hooks.register_fn(CHECK_PAGE, "h1", |_| Ok(Some(String::new())));
        hooks.register_fn(CHECK_PAGE, "h2", |_| Ok(Some("B".to_string())));
        hooks.register_fn(CHECK_PAGE, "h3", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some("C".to_string()))
        });

        assert_eq!(hooks.run(CHECK_PAGE, "A").unwrap(), "B");
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_none_results_fall_through() {
        let hooks = HookRegistry::new();
        hooks.register_fn(CHECK_PAGE, "noop", |_| Ok(None));
        hooks.register_fn(CHECK_PAGE, "rename", |page| {
            Ok((page == "Old").then(|| "New".to_string()))
        });

        assert_eq!(hooks.run(CHECK_PAGE, "Old").unwrap(), "New");
        assert_eq!(hooks.run(CHECK_PAGE, "Other").unwrap(), "Other");
    }

    #[test]
    fn test_failing_hook_aborts_chain() {
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = later_calls.clone();

        let hooks = HookRegistry::new();
        hooks.register_fn(CHECK_PAGE, "broken", |_| {
            Err(DispatchError::hook("broken", "backend unavailable"))
        });
        hooks.register_fn(CHECK_PAGE, "later", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some("B".to_string()))
        });

        let err = hooks.run(CHECK_PAGE, "A").unwrap_err();
        assert!(matches!(err, DispatchError::Hook { .. }));
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chains_are_independent() {
        let hooks = HookRegistry::new();
        hooks.register_fn("other", "x", |_| Ok(Some("X".to_string())));
        assert_eq!(hooks.run(CHECK_PAGE, "A").unwrap(), "A");

        hooks.clear("other");
        assert_eq!(hooks.run("other", "A").unwrap(), "A");
    }
}
