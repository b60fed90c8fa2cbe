//! Handler resolution over the module search path.

use log::{debug, trace};

use crate::core::{
    DispatchError, DispatchResult, HandlerId, HeaderPage, Namespace, PageRegistry,
};

/// Locate the handler for `page_name`.
///
/// The unqualified handler wins when registered. Otherwise, with module
/// support enabled, each module is tried in order, application form before
/// framework form, and the first registered one is returned.
pub fn resolve_page(
    registry: &PageRegistry,
    page_name: &str,
    use_modules: bool,
    modules: &[String],
) -> DispatchResult<HandlerId> {
    let unqualified = HandlerId::page(page_name);
    if registry.contains(&unqualified) {
        return Ok(unqualified);
    }

    let mut searched = vec![unqualified];
    if use_modules {
        for module in modules {
            for candidate in [
                HandlerId::module_page(module, page_name),
                HandlerId::framework_module_page(module, page_name),
            ] {
                trace!("Trying handler {}", candidate);
                if registry.contains(&candidate) {
                    debug!("Resolved page '{}' to {}", page_name, candidate);
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }
    }

    Err(DispatchError::Resolution {
        page: page_name.to_string(),
        searched,
    })
}

/// Build the shared header for `template`, preferring the application header.
pub fn create_header(
    registry: &PageRegistry,
    template: &str,
) -> DispatchResult<Box<dyn HeaderPage>> {
    let namespace = [Namespace::Application, Namespace::Framework]
        .into_iter()
        .find(|ns| registry.contains_header(*ns))
        .ok_or_else(|| DispatchError::HeaderResolution {
            template: template.to_string(),
        })?;

    debug!("Building {:?} header for template '{}'", namespace, template);
    registry.create_header(namespace, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Page, PageContext};

    struct Blank;

    impl Page for Blank {
        fn template(&self) -> Option<&str> {
            None
        }

        fn process(&mut self, _ctx: &mut PageContext) -> DispatchResult<()> {
            Ok(())
        }

        fn render(&mut self, _ctx: &mut PageContext) -> DispatchResult<()> {
            Ok(())
        }
    }

    struct NoopHeader;

    impl HeaderPage for NoopHeader {
        fn process(&mut self, _ctx: &mut PageContext) -> DispatchResult<()> {
            Ok(())
        }
    }

    fn blank() -> DispatchResult<Box<dyn Page>> {
        Ok(Box::new(Blank))
    }

    fn modules() -> Vec<String> {
        vec!["Shop".to_string(), "Blog".to_string()]
    }

    #[test]
    fn test_unqualified_handler_wins() {
        let registry = PageRegistry::new();
        registry.register_page("Cart", blank);
        registry.register_module_page("Shop", "Cart", blank);

        let id = resolve_page(&registry, "Cart", true, &modules()).unwrap();
        assert_eq!(id, HandlerId::page("Cart"));
    }

    #[test]
    fn test_module_search_order() {
        let registry = PageRegistry::new();
        registry.register_framework_page("Blog", "Cart", blank);

        let id = resolve_page(&registry, "Cart", true, &modules()).unwrap();
        assert_eq!(id, HandlerId::framework_module_page("Blog", "Cart"));

        // an earlier module wins once it provides the page
        registry.register_framework_page("Shop", "Cart", blank);
        let id = resolve_page(&registry, "Cart", true, &modules()).unwrap();
        assert_eq!(id, HandlerId::framework_module_page("Shop", "Cart"));
    }

    #[test]
    fn test_application_form_before_framework_form() {
        let registry = PageRegistry::new();
        registry.register_framework_page("Shop", "Cart", blank);
        registry.register_module_page("Shop", "Cart", blank);

        let id = resolve_page(&registry, "Cart", true, &modules()).unwrap();
        assert_eq!(id, HandlerId::module_page("Shop", "Cart"));
    }

    #[test]
    fn test_modules_ignored_when_disabled() {
        let registry = PageRegistry::new();
        registry.register_module_page("Shop", "Cart", blank);

        let err = resolve_page(&registry, "Cart", false, &modules()).unwrap_err();
        match err {
            DispatchError::Resolution { page, searched } => {
                assert_eq!(page, "Cart");
                assert_eq!(searched, vec![HandlerId::page("Cart")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exhausted_search_path_fails() {
        let registry = PageRegistry::new();
        let err = resolve_page(&registry, "Cart", true, &modules()).unwrap_err();
        match err {
            DispatchError::Resolution { searched, .. } => assert_eq!(searched.len(), 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_preference() {
        let registry = PageRegistry::new();
        assert!(matches!(
            create_header(&registry, "main"),
            Err(DispatchError::HeaderResolution { .. })
        ));

        registry.register_framework_header(|_| Ok(Box::new(NoopHeader)));
        assert!(create_header(&registry, "main").is_ok());

        registry.register_header(|template| {
            Err(DispatchError::page("Page::Header", format!("app header for {template}")))
        });
        // the application header is chosen once registered
        assert!(matches!(
            create_header(&registry, "main"),
            Err(DispatchError::Page { .. })
        ));
    }
}
