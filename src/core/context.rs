//! Request context management
//!
//! [`PageContext`] holds the per-request state shared by the header and the
//! page handler, and collects the rendered output.

use std::{any::Any, collections::HashMap, time::Instant};

use uuid::Uuid;

use super::registry::HandlerId;

/// Context var carrying the `X-Requested-With` request header.
pub const REQUESTED_WITH_KEY: &str = "requested_with";

/// Context var set by the header to the template it was built for.
pub const HEADER_TEMPLATE_KEY: &str = "header_template";

/// Context that holds per-request state and metadata
pub struct PageContext {
    request_id: String,
    requested_page: String,
    page: String,
    handler: Option<HandlerId>,
    user_id: Option<String>,
    request_start: Instant,
    header_processed: bool,
    content_type: Option<String>,
    body: Vec<u8>,

    /// Custom variables shared between header and page (type-erased, thread-safe)
    vars: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl PageContext {
    /// Create a new context for the requested page name
    pub fn new(requested_page: impl Into<String>) -> Self {
        let requested_page = requested_page.into();
        Self {
            request_id: Uuid::new_v4().to_string(),
            page: requested_page.clone(),
            requested_page,
            handler: None,
            user_id: None,
            request_start: Instant::now(),
            header_processed: false,
            content_type: None,
            body: Vec::new(),
            vars: HashMap::new(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The page name as it arrived, before hooks and access checks
    pub fn requested_page(&self) -> &str {
        &self.requested_page
    }

    /// The effective page name after hooks and access checks
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn handler(&self) -> Option<&HandlerId> {
        self.handler.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn request_start(&self) -> Instant {
        self.request_start
    }

    pub fn header_processed(&self) -> bool {
        self.header_processed
    }

    pub(crate) fn set_page(&mut self, page: String) {
        self.page = page;
    }

    pub(crate) fn set_handler(&mut self, handler: HandlerId) {
        self.handler = Some(handler);
    }

    pub(crate) fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub(crate) fn mark_header_processed(&mut self) {
        self.header_processed = true;
    }

    /// Content type of the rendered body
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Append rendered output
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }

    /// Store a typed value into the context
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.vars.insert(key.into(), Box::new(value));
    }

    /// Get a typed reference from the context
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.vars.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Get a string slice if the stored value is a `String`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get::<String>(key).map(|s| s.as_str())
    }

    /// Check if a key exists in the context
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any + Send + Sync>> {
        self.vars.remove(key)
    }

    /// Whether the client marked the request as `XMLHttpRequest`
    pub fn is_xhr(&self) -> bool {
        self.get_str(REQUESTED_WITH_KEY)
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
    }
}

/// A plain session holding only the user identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
}

impl Session {
    /// A session without a logged-in user
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

impl super::traits::SessionState for Session {
    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}
