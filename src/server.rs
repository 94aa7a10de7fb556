// HTTP surface of the service.
//
//   GET /                       - liveness message
//   GET /health                 - health check
//   GET /eta/{stop_id}          - predictions for a stop
//   GET /route-stops/{route}    - stops served by a route
//   GET /debug/test-route-tags  - route tag sweep

use crate::client::{FeedFetcher, FeedQuery};
use crate::config::SweepConfig;
use crate::error::FeedError;
use crate::models::{FeedResponse, Prediction, Stop, SweepReport};
use crate::normalizer::{parse_predictions, parse_route_stops};
use crate::sweep::sweep_route_tags;
use actix_cors::Cors;
use actix_web::error::{InternalError, PathError};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, middleware, web};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a handler needs. Built once at start-up and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<dyn FeedFetcher>,
    pub agency: String,
    pub timezone: Tz,
    pub sweep: SweepConfig,
}

pub struct EtaServer {
    state: AppState,
}

impl EtaServer {
    pub fn new(state: AppState) -> Self {
        EtaServer { state }
    }

    pub async fn run(self, host: &str, port: u16) -> std::io::Result<()> {
        let state = self.state;

        info!(host, port, agency = %state.agency, "starting TTC ETA API");

        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(Cors::permissive())
                .wrap(middleware::Logger::default())
                .wrap(middleware::Compress::default())
                .configure(configure)
        })
        .bind((host, port))?
        .run()
        .await
    }
}

/// Registers every route. Expects `web::Data<AppState>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error))
        .route("/", web::get().to(root))
        .route("/health", web::get().to(health_check))
        .route("/eta/{stop_id}", web::get().to(get_eta))
        .route("/route-stops/{route_tag}", web::get().to(get_route_stops))
        .route("/debug/test-route-tags", web::get().to(test_route_tags));
}

fn path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = req.path(), "rejected path parameter: {}", err);
    let response = HttpResponse::UnprocessableEntity()
        .json(FeedResponse::<()>::error(format!("Invalid path parameter: {}", err)));
    InternalError::from_response(err, response).into()
}

fn respond<T: serde::Serialize>(result: Result<T, FeedError>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(FeedResponse::success(data)),
        Err(e) => {
            warn!("request failed: {}", e);
            HttpResponse::Ok().json(FeedResponse::<T>::error(e.to_string()))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "TTC ETA API is running" }))
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "agency": state.agency,
    }))
}

#[tracing::instrument(skip(state))]
async fn eta_for_stop(state: &AppState, stop_id: u32) -> Result<Vec<Prediction>, FeedError> {
    let body = state
        .feed
        .fetch(&FeedQuery::Predictions {
            stop_id: stop_id.to_string(),
        })
        .await?;
    let predictions = parse_predictions(&body, state.timezone)?;
    info!(count = predictions.len(), "predictions served");
    Ok(predictions)
}

async fn get_eta(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    respond(eta_for_stop(&state, path.into_inner()).await)
}

#[tracing::instrument(skip(state))]
async fn stops_for_route(state: &AppState, route_tag: String) -> Result<Vec<Stop>, FeedError> {
    let body = state.feed.fetch(&FeedQuery::RouteConfig { route_tag }).await?;
    let stops = parse_route_stops(&body)?;
    info!(count = stops.len(), "route stops served");
    Ok(stops)
}

async fn get_route_stops(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    respond(stops_for_route(&state, path.into_inner()).await)
}

async fn test_route_tags(state: web::Data<AppState>) -> HttpResponse {
    let report: Result<SweepReport, FeedError> =
        sweep_route_tags(state.feed.as_ref(), state.sweep).await;
    respond(report)
}
