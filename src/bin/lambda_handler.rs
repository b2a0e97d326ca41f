//! AWS Lambda handler for the calculator API
//!
//! Serves projections, goal plans, the option catalog and referral click
//! tracking behind a Lambda Function URL. The catalog is loaded once at cold start.

use aws_lambda_events::event::lambda_function_urls::{LambdaFunctionUrlRequest, LambdaFunctionUrlResponse};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use savings_projection::{
    api::{ApiContext, ApiResponse},
    catalog::{InMemoryCatalog, DEFAULT_CATALOG_PATH},
    EngineConfig, ProjectionEngine,
};
use std::path::Path;
use std::sync::Arc;

/// Catalog CSV location override
const CATALOG_PATH_ENV: &str = "CATALOG_PATH";

/// Caller identity, set by the authorizer in front of the function
const USER_ID_HEADER: &str = "x-user-id";

fn build_context() -> ApiContext {
    let path = std::env::var(CATALOG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string());

    let catalog = match InMemoryCatalog::from_csv_path(Path::new(&path)) {
        Ok(catalog) => {
            log::info!("loaded {} options from {}", catalog.len(), path);
            catalog
        }
        Err(e) => {
            log::warn!("could not load catalog from {} ({}), using built-in catalog", path, e);
            InMemoryCatalog::with_defaults()
        }
    };

    ApiContext::new(ProjectionEngine::new(EngineConfig::default()), Box::new(catalog))
}

fn to_lambda_response(response: ApiResponse) -> Result<LambdaFunctionUrlResponse, Error> {
    let mut lambda_response = LambdaFunctionUrlResponse {
        status_code: response.status as i64,
        headers: Default::default(),
        body: Some(serde_json::to_string(&response.body)?),
        is_base64_encoded: false,
        cookies: Vec::new(),
    };
    lambda_response
        .headers
        .insert("content-type", "application/json".parse()?);
    Ok(lambda_response)
}

async fn handler(
    context: Arc<ApiContext>,
    event: LambdaEvent<LambdaFunctionUrlRequest>,
) -> Result<LambdaFunctionUrlResponse, Error> {
    let request = event.payload;
    let method = request
        .request_context
        .http
        .method
        .clone()
        .unwrap_or_else(|| "GET".to_string());
    let path = request.raw_path.clone().unwrap_or_else(|| "/".to_string());

    let user_id = request
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    log::debug!("{} {} (user {:?})", method, path, user_id);
    let response = context.route(&method, &path, user_id, request.body.as_deref());
    if !response.is_success() {
        log::info!("{} {} -> {}", method, path, response.status);
    }

    to_lambda_response(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let context = Arc::new(build_context());
    run(service_fn(move |event| {
        let context = Arc::clone(&context);
        async move { handler(context, event).await }
    }))
    .await
}
