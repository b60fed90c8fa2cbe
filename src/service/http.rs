use std::sync::Arc;

use http::{HeaderValue, Request, Response};

use crate::{
    core::{context::REQUESTED_WITH_KEY, DispatchError, PageContext, SessionState},
    dispatch::{Dispatcher, FALLBACK_PAGE},
    utils::{
        request::{get_query_value, get_req_header_value},
        response::{CommonErrors, ResponseBuilder},
    },
};

/// Query parameter naming the requested page.
pub const PAGE_PARAM: &str = "page";

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// Front controller turning HTTP requests into page dispatches.
///
/// The page name comes from the `page` query parameter. Resolution failures
/// answer 404, every other dispatch failure 500.
pub struct PageHttpApp {
    dispatcher: Arc<Dispatcher>,
    default_page: String,
}

impl PageHttpApp {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            default_page: FALLBACK_PAGE.to_string(),
        }
    }

    /// Page dispatched when the request names none
    pub fn with_default_page(mut self, page: impl Into<String>) -> Self {
        self.default_page = page.into();
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn response(&self, req: &Request<Vec<u8>>, session: &dyn SessionState) -> Response<Vec<u8>> {
        let requested = get_query_value(req.uri(), PAGE_PARAM);
        let page_name = requested
            .as_deref()
            .filter(|page| !page.is_empty())
            .unwrap_or(&self.default_page);

        let mut ctx = PageContext::new(page_name);
        if let Some(requested_with) = get_req_header_value(req.headers(), REQUESTED_WITH_HEADER) {
            ctx.set(REQUESTED_WITH_KEY, requested_with.to_string());
        }
        let request_id = ctx.request_id().to_string();

        let mut resp = match self.dispatcher.dispatch(ctx, session) {
            Ok(page) => ResponseBuilder::success_http(page.body, page.content_type.as_deref()),
            Err(e) => error_response(&e),
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            resp.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        resp
    }
}

fn error_response(e: &DispatchError) -> Response<Vec<u8>> {
    match e {
        DispatchError::Resolution { .. } | DispatchError::HeaderResolution { .. } => {
            CommonErrors::not_found("Page Not Found")
        }
        _ => CommonErrors::internal_server_error("Internal Server Error"),
    }
}

#[cfg(test)]
mod tests {
    use http::{header, StatusCode};

    use super::*;
    use crate::{
        config::Config,
        core::{DispatchResult, Page, PageRegistry, Session},
        dispatch::HookRegistry,
        pages::header::HTML_CONTENT_TYPE,
    };

    struct Greeting {
        template: Option<&'static str>,
        fail: bool,
    }

    impl Page for Greeting {
        fn template(&self) -> Option<&str> {
            self.template
        }

        fn is_ajax(&self, ctx: &PageContext) -> bool {
            ctx.is_xhr()
        }

        fn process(&mut self, _ctx: &mut PageContext) -> DispatchResult<()> {
            if self.fail {
                return Err(DispatchError::page("Page::Broken", "database unavailable"));
            }
            Ok(())
        }

        fn render(&mut self, ctx: &mut PageContext) -> DispatchResult<()> {
            let header = if ctx.header_processed() { "header;" } else { "" };
            let body = format!("{header}{}", ctx.page());
            ctx.write(body);
            Ok(())
        }
    }

    fn app() -> PageHttpApp {
        let registry = PageRegistry::with_framework_defaults();
        registry.register_page("Index", || {
            Ok(Box::new(Greeting {
                template: Some("main"),
                fail: false,
            }))
        });
        registry.register_page("Register", || {
            Ok(Box::new(Greeting {
                template: Some("main"),
                fail: false,
            }))
        });
        registry.register_page("Lost_Password", || {
            Ok(Box::new(Greeting {
                template: Some("main"),
                fail: false,
            }))
        });
        registry.register_page("Broken", || {
            Ok(Box::new(Greeting {
                template: None,
                fail: true,
            }))
        });

        let dispatcher = Dispatcher::from_config(
            Config::default(),
            Arc::new(registry),
            Arc::new(HookRegistry::new()),
        )
        .unwrap();
        PageHttpApp::new(Arc::new(dispatcher))
    }

    fn get(uri: &str) -> Request<Vec<u8>> {
        Request::builder().uri(uri).body(Vec::new()).unwrap()
    }

    #[test]
    fn test_dispatch_named_page() {
        let app = app();
        let resp = app.response(&get("/?page=Register"), &Session::anonymous());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"header;Register");
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            HTML_CONTENT_TYPE
        );
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn test_page_name_is_url_decoded() {
        let app = app();
        let resp = app.response(&get("/?page=Lost%5FPassword"), &Session::anonymous());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"header;Lost_Password");
    }

    #[test]
    fn test_default_page() {
        let app = app();
        let resp = app.response(&get("/"), &Session::anonymous());
        assert_eq!(resp.body(), b"header;Index");

        let resp = app.response(&get("/?page="), &Session::anonymous());
        assert_eq!(resp.body(), b"header;Index");
    }

    #[test]
    fn test_ajax_request_skips_header() {
        let app = app();
        let req = Request::builder()
            .uri("/?page=Register")
            .header(REQUESTED_WITH_HEADER, "XMLHttpRequest")
            .body(Vec::new())
            .unwrap();
        let resp = app.response(&req, &Session::anonymous());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"Register");
    }

    #[test]
    fn test_status_mapping() {
        let app = app();
        let resp = app.response(&get("/?page=Missing"), &Session::anonymous());
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

        let resp = app.response(&get("/?page=Broken"), &Session::anonymous());
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unallowed_page_served_as_fallback() {
        let app = app();
        app.dispatcher().add_unallowed_page("Register").unwrap();
        let resp = app.response(&get("/?page=Register"), &Session::with_user("42"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"header;Index");
    }

    #[test]
    fn test_custom_default_page() {
        let app = app().with_default_page("Register");
        let resp = app.response(&get("/"), &Session::anonymous());
        assert_eq!(resp.body(), b"header;Register");
    }
}
