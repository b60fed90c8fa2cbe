//! Access policy: deny-list and login gate.
//!
//! The deny-list is read on every dispatch and changed rarely through the
//! administrative calls, so it lives behind an [`ArcSwap`] and is replaced
//! copy-on-write. The login-exempt set is fixed at construction.

use std::{collections::HashSet, sync::Arc};

use arc_swap::ArcSwap;
use log::{debug, info};

use crate::core::{DispatchError, DispatchResult};

/// Page every deny-listed request is sent to.
pub const FALLBACK_PAGE: &str = "Index";

/// Page unauthenticated requests are sent to while the login gate is active.
pub const LOGIN_PAGE: &str = "Login";

/// Module whose presence activates the login gate.
pub const USER_SYSTEM_MODULE: &str = "UserSystem";

/// Pages that are always reachable without a login.
pub const DEFAULT_PAGES_WITHOUT_LOGIN: &[&str] = &["Register", "Login", "Imprint", "LostPassword"];

/// Pages deny-listed by default.
const DEFAULT_UNALLOWED_PAGES: &[&str] = &[];

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The page may be dispatched as requested
    Allowed(String),
    /// The page is deny-listed; dispatch the fallback page instead
    Unallowed,
    /// No user is logged in and the page is not exempt; dispatch the login page
    LoginRequired,
}

impl AccessDecision {
    /// The page name to dispatch for this decision
    pub fn into_page_name(self) -> String {
        match self {
            AccessDecision::Allowed(page) => page,
            AccessDecision::Unallowed => FALLBACK_PAGE.to_string(),
            AccessDecision::LoginRequired => LOGIN_PAGE.to_string(),
        }
    }

    /// Redirect reason for metrics, `None` when allowed
    pub fn redirect_reason(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allowed(_) => None,
            AccessDecision::Unallowed => Some("unallowed"),
            AccessDecision::LoginRequired => Some("login"),
        }
    }
}

/// Deny-list plus login-exempt set.
pub struct AccessPolicy {
    unallowed_pages: ArcSwap<HashSet<String>>,
    pages_without_login: HashSet<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::build(HashSet::new(), Vec::new())
    }
}

fn fallback_page_error() -> DispatchError {
    DispatchError::Validation(format!(
        "page '{FALLBACK_PAGE}' is the fallback for denied pages and cannot be deny-listed"
    ))
}

impl AccessPolicy {
    /// Create a policy.
    ///
    /// `unallowed_pages` is merged with the built-in deny-list and
    /// `pages_without_login` with the built-in exempt pages. The built-in
    /// exempt pages are always kept. Deny-listing the fallback page is
    /// rejected, as with [`AccessPolicy::add_unallowed_pages`].
    pub fn new(
        unallowed_pages: Vec<String>,
        pages_without_login: Vec<String>,
    ) -> DispatchResult<Self> {
        let unallowed: HashSet<String> = unallowed_pages.into_iter().collect();
        if unallowed.contains(FALLBACK_PAGE) {
            return Err(fallback_page_error());
        }
        Ok(Self::build(unallowed, pages_without_login))
    }

    fn build(mut unallowed: HashSet<String>, pages_without_login: Vec<String>) -> Self {
        unallowed.extend(DEFAULT_UNALLOWED_PAGES.iter().map(|p| p.to_string()));

        let mut exempt: HashSet<String> = pages_without_login.into_iter().collect();
        exempt.extend(DEFAULT_PAGES_WITHOUT_LOGIN.iter().map(|p| p.to_string()));

        Self {
            unallowed_pages: ArcSwap::from_pointee(unallowed),
            pages_without_login: exempt,
        }
    }

    /// Decide how a request for `page_name` is handled.
    ///
    /// The deny-list wins over the login gate. The gate is only active when
    /// modules are enabled and the user system module is configured.
    pub fn check(
        &self,
        page_name: &str,
        use_modules: bool,
        modules: &[String],
        has_user: bool,
    ) -> AccessDecision {
        if self.is_unallowed(page_name) {
            return AccessDecision::Unallowed;
        }

        let user_system_active = use_modules && modules.iter().any(|m| m == USER_SYSTEM_MODULE);
        if user_system_active && !has_user && !self.is_login_exempt(page_name) {
            return AccessDecision::LoginRequired;
        }

        AccessDecision::Allowed(page_name.to_string())
    }

    /// The effective page name for a request
    pub fn resolve(
        &self,
        page_name: &str,
        use_modules: bool,
        modules: &[String],
        has_user: bool,
    ) -> String {
        self.check(page_name, use_modules, modules, has_user)
            .into_page_name()
    }

    pub fn is_unallowed(&self, page_name: &str) -> bool {
        self.unallowed_pages.load().contains(page_name)
    }

    pub fn is_login_exempt(&self, page_name: &str) -> bool {
        self.pages_without_login.contains(page_name)
    }

    /// Snapshot of the deny-list, sorted
    pub fn unallowed_pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self.unallowed_pages.load().iter().cloned().collect();
        pages.sort();
        pages
    }

    /// The login-exempt pages, sorted
    pub fn pages_without_login(&self) -> Vec<String> {
        let mut pages: Vec<String> = self.pages_without_login.iter().cloned().collect();
        pages.sort();
        pages
    }

    /// Add pages to the deny-list.
    ///
    /// The fallback page cannot be deny-listed; the whole call is rejected
    /// and the list left unchanged if it is among `page_names`.
    pub fn add_unallowed_pages<I, S>(&self, page_names: I) -> DispatchResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = page_names.into_iter().map(Into::into).collect();
        if names.iter().any(|name| name == FALLBACK_PAGE) {
            return Err(fallback_page_error());
        }

        info!("Adding unallowed pages: {:?}", names);
        self.unallowed_pages.rcu(|current| {
            let mut next = HashSet::clone(current);
            next.extend(names.iter().cloned());
            next
        });
        Ok(())
    }

    pub fn add_unallowed_page(&self, page_name: &str) -> DispatchResult<()> {
        self.add_unallowed_pages([page_name])
    }

    /// Remove pages from the deny-list. Names not in the list are ignored.
    pub fn remove_unallowed_pages<I, S>(&self, page_names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = page_names.into_iter().collect();
        debug!("Removing {} unallowed pages", names.len());
        self.unallowed_pages.rcu(|current| {
            let mut next = HashSet::clone(current);
            for name in &names {
                next.remove(name.as_ref());
            }
            next
        });
    }

    pub fn remove_unallowed_page(&self, page_name: &str) {
        self.remove_unallowed_pages([page_name]);
    }

    /// Empty the deny-list
    pub fn clear_unallowed_pages(&self) {
        info!("Clearing unallowed pages");
        self.unallowed_pages.store(Arc::new(HashSet::new()));
    }
}
