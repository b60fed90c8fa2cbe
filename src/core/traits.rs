//! Core traits for pagegate components
//!
//! These are the seams between the dispatcher and everything it only
//! consumes: page handlers, the shared header, session state, the
//! configuration source and `checkPage` hooks.

use super::{context::PageContext, error::DispatchResult};

/// A page handler resolved and instantiated for one request.
pub trait Page: Send {
    /// Template identifier of this page.
    ///
    /// `None` or an empty string means no shared header is built.
    fn template(&self) -> Option<&str>;

    /// Whether this request is answered as an AJAX-style fragment.
    ///
    /// AJAX responses never get the shared header.
    fn is_ajax(&self, _ctx: &PageContext) -> bool {
        false
    }

    /// Run the page logic (form handling, data loading).
    fn process(&mut self, ctx: &mut PageContext) -> DispatchResult<()>;

    /// Produce the response body into the context.
    fn render(&mut self, ctx: &mut PageContext) -> DispatchResult<()>;
}

/// The shared page header, built with the template of the page it precedes.
pub trait HeaderPage: Send {
    /// Run the header logic before the page itself is processed.
    fn process(&mut self, ctx: &mut PageContext) -> DispatchResult<()>;
}

/// Session state as seen by the login gate.
pub trait SessionState: Send + Sync {
    /// Identifier of the logged-in user, if any.
    fn user_id(&self) -> Option<&str>;

    /// Whether a user is currently authenticated.
    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

/// Process-wide settings consumed by the dispatcher.
pub trait ConfigProvider: Send + Sync {
    /// Whether module-qualified handlers are searched at all
    fn use_modules(&self) -> bool;

    /// Module identifiers in search priority order
    fn modules(&self) -> Vec<String>;

    /// Extra page names reachable without login
    fn pages_without_login(&self) -> Vec<String>;

    /// Page names deny-listed from the start
    fn unallowed_pages(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A callable registered on a hook chain such as `checkPage`.
///
/// Returning `Ok(Some(name))` with a non-empty name overrides the page and
/// stops the chain. `Ok(None)` and `Ok(Some(""))` leave the page untouched.
pub trait CheckPageHook: Send + Sync {
    /// Return the name of this hook, used in logs and errors
    fn name(&self) -> &str;

    /// Inspect the requested page name and optionally rewrite it.
    fn check_page(&self, page_name: &str) -> DispatchResult<Option<String>>;
}
