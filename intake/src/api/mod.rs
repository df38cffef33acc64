//! HTTP surface of the intake service.
//!
//! - `POST /api/feedback`: submit one feedback record
//! - `GET /api/feedback/options`: choices offered by the form

pub mod utils;

use crate::catalog::FormCatalog;
use crate::config::Environment;
use crate::errors::IntakeError;
use crate::handler::{FeedbackHandler, HandlerResult};
use crate::metrics_defs::REQUEST_DURATION;
use hyper::body::{Body, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::histogram;
use shared::http::make_error_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use utils::{HandlerBody, collect_body, json_response};

pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const OPTIONS_PATH: &str = "/api/feedback/options";

pub struct IntakeService {
    handler: Arc<FeedbackHandler>,
    catalog: Arc<FormCatalog>,
    environment: Environment,
}

impl IntakeService {
    pub fn new(handler: Arc<FeedbackHandler>, environment: Environment) -> Self {
        Self {
            handler,
            catalog: Arc::new(FormCatalog::new()),
            environment,
        }
    }

    /// Dispatches a request to its endpoint. Never fails: errors are turned
    /// into responses.
    pub async fn route<B>(&self, req: Request<B>) -> Response<HandlerBody>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let (route, response) = match path.as_str() {
            FEEDBACK_PATH if method == Method::POST => ("feedback", self.submit(req).await),
            OPTIONS_PATH if method == Method::GET => (
                "options",
                json_response(StatusCode::OK, self.catalog.as_ref()),
            ),
            FEEDBACK_PATH | OPTIONS_PATH => (
                "method_not_allowed",
                make_error_response(StatusCode::METHOD_NOT_ALLOWED),
            ),
            _ => {
                tracing::warn!(method = %method, path = %path, "No route matched");
                ("not_found", make_error_response(StatusCode::NOT_FOUND))
            }
        };

        histogram!(
            REQUEST_DURATION,
            "status" => response.status().as_str().to_string(),
            "route" => route
        )
        .record(start.elapsed().as_secs_f64());

        response
    }

    async fn submit<B>(&self, req: Request<B>) -> Response<HandlerBody>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let outcome = match collect_body(req.into_body()).await {
            Ok(bytes) => self.handler.submit_body(&bytes).await,
            Err(e) => Err(e),
        };

        let status = match outcome {
            Ok(_) => StatusCode::OK,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        json_response(status, &HandlerResult::from_outcome(outcome, self.environment))
    }
}

impl Clone for IntakeService {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            catalog: self.catalog.clone(),
            environment: self.environment,
        }
    }
}

impl Service<Request<Incoming>> for IntakeService {
    type Response = Response<HandlerBody>;
    type Error = IntakeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.route(req).await) })
    }
}
