//! Page dispatch pipeline.
//!
//! ```text
//! requested page
//!   → checkPage hook chain   (may rewrite the name)
//!   → access policy          (deny-list → Index, login gate → Login)
//!   → handler resolver       (unqualified, then module search path)
//!   → shared header          (only for templated, non-AJAX pages)
//!   → page process, page render
//! ```
//!
//! Every stage either yields a usable name or handler, or aborts the
//! dispatch with a [`DispatchError`]. Nothing is retried and there is no
//! fallback page on failure.

pub mod hooks;
pub mod metrics;
pub mod policy;
pub mod resolver;


use std::sync::Arc;

use log::{debug, error, info};

use crate::{
    config::Config,
    core::{
        ConfigProvider, DispatchResult, HandlerId, PageContext, PageRegistry, SessionState,
    },
};

pub use hooks::{FnHook, HookRegistry, CHECK_PAGE};
pub use policy::{AccessDecision, AccessPolicy, FALLBACK_PAGE, LOGIN_PAGE};

/// The rendered result of one dispatch.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub request_id: String,
    /// The name as requested
    pub requested_page: String,
    /// The name actually dispatched
    pub page: String,
    pub handler: HandlerId,
    pub header_processed: bool,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Resolves page names to handlers and runs them.
pub struct Dispatcher {
    config: Arc<dyn ConfigProvider>,
    registry: Arc<PageRegistry>,
    hooks: Arc<HookRegistry>,
    policy: AccessPolicy,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// `unallowed_pages` is merged with the deny-list from the configuration.
    /// Fails if the merged deny-list contains the fallback page.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        registry: Arc<PageRegistry>,
        hooks: Arc<HookRegistry>,
        unallowed_pages: Vec<String>,
    ) -> DispatchResult<Self> {
        let mut unallowed = unallowed_pages;
        unallowed.extend(config.unallowed_pages());
        let policy = AccessPolicy::new(unallowed, config.pages_without_login())?;

        Ok(Self {
            config,
            registry,
            hooks,
            policy,
        })
    }

    /// Create a dispatcher from a loaded configuration file
    pub fn from_config(
        config: Config,
        registry: Arc<PageRegistry>,
        hooks: Arc<HookRegistry>,
    ) -> DispatchResult<Self> {
        Self::new(Arc::new(config), registry, hooks, Vec::new())
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Dispatch `page_name` and return the rendered response
    pub fn show_page(
        &self,
        page_name: &str,
        session: &dyn SessionState,
    ) -> DispatchResult<PageResponse> {
        self.dispatch(PageContext::new(page_name), session)
    }

    /// Dispatch with a prepared context (e.g. carrying request vars)
    pub fn dispatch(
        &self,
        mut ctx: PageContext,
        session: &dyn SessionState,
    ) -> DispatchResult<PageResponse> {
        debug!(
            "[{}] Dispatching page '{}'",
            ctx.request_id(),
            ctx.requested_page()
        );

        let result = self.run(&mut ctx, session);
        let elapsed_ms = ctx.request_start().elapsed().as_secs_f64() * 1000.0;
        metrics::record_dispatch(result.as_ref().map(|_| ()), elapsed_ms);

        match result {
            Ok(handler) => Ok(PageResponse {
                request_id: ctx.request_id().to_string(),
                requested_page: ctx.requested_page().to_string(),
                page: ctx.page().to_string(),
                handler,
                header_processed: ctx.header_processed(),
                content_type: ctx.content_type().map(str::to_string),
                body: ctx.take_body(),
            }),
            Err(e) => {
                error!(
                    "[{}] Dispatch of page '{}' failed: {}",
                    ctx.request_id(),
                    ctx.requested_page(),
                    e
                );
                Err(e)
            }
        }
    }

    fn run(&self, ctx: &mut PageContext, session: &dyn SessionState) -> DispatchResult<HandlerId> {
        ctx.set_user_id(session.user_id().map(str::to_string));

        let page_name = self.check_page(ctx.requested_page(), session)?;
        ctx.set_page(page_name);

        let handler_id = resolver::resolve_page(
            &self.registry,
            ctx.page(),
            self.config.use_modules(),
            &self.config.modules(),
        )?;
        debug!("[{}] Using handler {}", ctx.request_id(), handler_id);
        ctx.set_handler(handler_id.clone());

        let mut page = self.registry.create_page(&handler_id)?;

        let header_template = page
            .template()
            .filter(|template| !template.is_empty())
            .map(str::to_string);
        if let Some(template) = header_template {
            if !page.is_ajax(ctx) {
                let mut header = resolver::create_header(&self.registry, &template)?;
                header.process(ctx)?;
                ctx.mark_header_processed();
            }
        }

        page.process(ctx)?;
        page.render(ctx)?;

        Ok(handler_id)
    }

    /// Apply the `checkPage` hooks and the access policy to a page name
    pub fn check_page(&self, page_name: &str, session: &dyn SessionState) -> DispatchResult<String> {
        let hooked = self.hooks.run(CHECK_PAGE, page_name)?;
        if hooked != page_name {
            metrics::record_redirect("hook");
        }

        let decision = self.policy.check(
            &hooked,
            self.config.use_modules(),
            &self.config.modules(),
            session.is_authenticated(),
        );
        if let Some(reason) = decision.redirect_reason() {
            info!("Redirecting page '{}' ({})", hooked, reason);
            metrics::record_redirect(reason);
        }

        Ok(decision.into_page_name())
    }

    /// Add multiple pages to the deny-list
    pub fn add_unallowed_pages<I, S>(&self, page_names: I) -> DispatchResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.add_unallowed_pages(page_names)
    }

    /// Add a single page to the deny-list
    pub fn add_unallowed_page(&self, page_name: &str) -> DispatchResult<()> {
        self.policy.add_unallowed_page(page_name)
    }

    /// Remove multiple pages from the deny-list
    pub fn remove_unallowed_pages<I, S>(&self, page_names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.policy.remove_unallowed_pages(page_names);
    }

    /// Remove a single page from the deny-list
    pub fn remove_unallowed_page(&self, page_name: &str) {
        self.policy.remove_unallowed_page(page_name);
    }

    /// Clear the deny-list
    pub fn clear_unallowed_pages(&self) {
        self.policy.clear_unallowed_pages();
    }
}
