use crate::core::{
    context::HEADER_TEMPLATE_KEY, DispatchResult, HeaderPage, PageContext,
};

/// Content type assumed for pages that get the shared header.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// The framework's shared page header.
///
/// Publishes the template of the page being dispatched to the context so
/// the page can render its layout, and marks the response as HTML.
pub struct FrameworkHeader {
    template: String,
}

impl FrameworkHeader {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub(crate) fn create(template: &str) -> DispatchResult<Box<dyn HeaderPage>> {
        Ok(Box::new(Self::new(template)))
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl HeaderPage for FrameworkHeader {
    fn process(&mut self, ctx: &mut PageContext) -> DispatchResult<()> {
        ctx.set(HEADER_TEMPLATE_KEY, self.template.clone());
        if ctx.content_type().is_none() {
            ctx.set_content_type(HTML_CONTENT_TYPE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Namespace, PageRegistry};

    #[test]
    fn test_header_publishes_template() {
        let mut ctx = PageContext::new("Index");
        let mut header = FrameworkHeader::new("index");
        header.process(&mut ctx).unwrap();

        assert_eq!(ctx.get_str(HEADER_TEMPLATE_KEY), Some("index"));
        assert_eq!(ctx.content_type(), Some(HTML_CONTENT_TYPE));
    }

    #[test]
    fn test_header_keeps_content_type() {
        let mut ctx = PageContext::new("Feed");
        ctx.set_content_type("application/rss+xml");
        FrameworkHeader::new("feed").process(&mut ctx).unwrap();
        assert_eq!(ctx.content_type(), Some("application/rss+xml"));
    }

    #[test]
    fn test_framework_defaults_register_header() {
        let registry = PageRegistry::with_framework_defaults();
        assert!(registry.contains_header(Namespace::Framework));
        assert!(!registry.contains_header(Namespace::Application));
        assert_eq!(registry.get_stats().header_count, 1);
    }
}
