//! Admin surface for deny-list administration and metrics.
//!
//! Every request must carry the configured key in `x-api-key`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use http::{header, Method, Request, Response};
use log::{error, info};
use matchit::{Match, Router};
use serde::{Deserialize, Serialize};

use crate::{
    config::{is_valid_identifier, Admin},
    core::{DispatchError, DispatchResult},
    dispatch::{metrics, Dispatcher},
    utils::{
        request::get_req_header_value,
        response::{content_type, CommonErrors, ResponseBuilder},
    },
};

const API_KEY_HEADER: &str = "x-api-key";

trait Handler {
    fn handle(
        &self,
        dispatcher: &Dispatcher,
        req: &Request<Vec<u8>>,
        params: BTreeMap<String, String>,
    ) -> DispatchResult<Response<Vec<u8>>>;
}

pub struct AdminApp {
    dispatcher: Arc<Dispatcher>,
    router: Router<HashMap<Method, Box<dyn Handler + Send + Sync>>>,

    config: Admin,
}

impl AdminApp {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Admin) -> Self {
        let mut this = Self {
            dispatcher,
            router: Router::new(),
            config,
        };

        this.route(
            "/admin/unallowed_pages",
            Method::GET,
            Box::new(UnallowedListHandler),
        )
        .route(
            "/admin/unallowed_pages",
            Method::PUT,
            Box::new(UnallowedAddHandler),
        )
        .route(
            "/admin/unallowed_pages",
            Method::DELETE,
            Box::new(UnallowedRemoveHandler),
        )
        .route(
            "/admin/unallowed_pages/{page}",
            Method::PUT,
            Box::new(UnallowedAddHandler),
        )
        .route(
            "/admin/unallowed_pages/{page}",
            Method::DELETE,
            Box::new(UnallowedRemoveHandler),
        )
        .route("/admin/metrics", Method::GET, Box::new(MetricsHandler));

        this
    }

    /// Register a handler for `method` on `path`
    fn route(
        &mut self,
        path: &str,
        method: Method,
        handler: Box<dyn Handler + Send + Sync>,
    ) -> &mut Self {
        if self.router.at(path).is_err() {
            let mut handlers = HashMap::new();
            handlers.insert(method, handler);
            if let Err(e) = self.router.insert(path, handlers) {
                error!("Failed to register admin route {}: {}", path, e);
            }
        } else if let Ok(routes) = self.router.at_mut(path) {
            routes.value.insert(method, handler);
        }
        self
    }

    pub fn response(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        if validate_api_key(req, &self.config.api_key).is_err() {
            return CommonErrors::forbidden("Must provide api key");
        }

        match self.router.at(req.uri().path()) {
            Ok(Match { value, params }) => match value.get(req.method()) {
                Some(handler) => {
                    let params: BTreeMap<String, String> = params
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    match handler.handle(&self.dispatcher, req, params) {
                        Ok(resp) => resp,
                        Err(e) => error_response(e),
                    }
                }
                None => CommonErrors::method_not_allowed(),
            },
            Err(_) => CommonErrors::not_found("Not Found"),
        }
    }
}

fn error_response(e: DispatchError) -> Response<Vec<u8>> {
    match e {
        DispatchError::Validation(_) | DispatchError::Configuration(_) => {
            CommonErrors::bad_request(&e.to_string())
        }
        _ => {
            error!("Admin request failed: {}", e);
            CommonErrors::internal_server_error(&e.to_string())
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PageList {
    pages: Vec<String>,
}

fn unallowed_list(dispatcher: &Dispatcher) -> Response<Vec<u8>> {
    ResponseBuilder::success_json(&PageList {
        pages: dispatcher.policy().unallowed_pages(),
    })
}

/// Page names from the path parameter, or else from the JSON body.
///
/// `None` when neither is present.
fn requested_pages(
    req: &Request<Vec<u8>>,
    params: &BTreeMap<String, String>,
) -> DispatchResult<Option<Vec<String>>> {
    let pages = match params.get("page") {
        Some(page) => vec![page.clone()],
        None if req.body().is_empty() => return Ok(None),
        None => {
            validate_content_type(req)?;
            let list: PageList = serde_json::from_slice(req.body())
                .map_err(|e| DispatchError::Validation(format!("Invalid JSON body: {e}")))?;
            list.pages
        }
    };

    if let Some(name) = pages.iter().find(|name| !is_valid_identifier(name)) {
        return Err(DispatchError::Validation(format!(
            "Invalid page name '{name}'"
        )));
    }
    Ok(Some(pages))
}

struct UnallowedListHandler;

impl Handler for UnallowedListHandler {
    fn handle(
        &self,
        dispatcher: &Dispatcher,
        _req: &Request<Vec<u8>>,
        _params: BTreeMap<String, String>,
    ) -> DispatchResult<Response<Vec<u8>>> {
        Ok(unallowed_list(dispatcher))
    }
}

struct UnallowedAddHandler;

impl Handler for UnallowedAddHandler {
    fn handle(
        &self,
        dispatcher: &Dispatcher,
        req: &Request<Vec<u8>>,
        params: BTreeMap<String, String>,
    ) -> DispatchResult<Response<Vec<u8>>> {
        let pages = requested_pages(req, &params)?
            .ok_or_else(|| DispatchError::Validation("Missing page list".to_string()))?;

        dispatcher.add_unallowed_pages(pages)?;
        Ok(unallowed_list(dispatcher))
    }
}

struct UnallowedRemoveHandler;

impl Handler for UnallowedRemoveHandler {
    fn handle(
        &self,
        dispatcher: &Dispatcher,
        req: &Request<Vec<u8>>,
        params: BTreeMap<String, String>,
    ) -> DispatchResult<Response<Vec<u8>>> {
        match requested_pages(req, &params)? {
            Some(pages) => {
                info!("Removing unallowed pages: {:?}", pages);
                dispatcher.remove_unallowed_pages(pages);
            }
            None => dispatcher.clear_unallowed_pages(),
        }
        Ok(unallowed_list(dispatcher))
    }
}

struct MetricsHandler;

impl Handler for MetricsHandler {
    fn handle(
        &self,
        _dispatcher: &Dispatcher,
        _req: &Request<Vec<u8>>,
        _params: BTreeMap<String, String>,
    ) -> DispatchResult<Response<Vec<u8>>> {
        let text = metrics::gather_text()?;
        Ok(ResponseBuilder::success_http(
            text.into_bytes(),
            Some(content_type::PROMETHEUS_TEXT),
        ))
    }
}

fn validate_api_key(req: &Request<Vec<u8>>, api_key: &str) -> DispatchResult<()> {
    match get_req_header_value(req.headers(), API_KEY_HEADER) {
        Some(key) if key == api_key => Ok(()),
        _ => Err(DispatchError::Validation("Must provide api key".into())),
    }
}

fn validate_content_type(req: &Request<Vec<u8>>) -> DispatchResult<()> {
    match get_req_header_value(req.headers(), header::CONTENT_TYPE.as_str()) {
        Some(ct) if ct.starts_with(content_type::APPLICATION_JSON) => Ok(()),
        _ => Err(DispatchError::Validation(
            "Content-Type must be application/json".into(),
        )),
    }
}
