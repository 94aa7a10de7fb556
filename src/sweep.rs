//! Debug sweep over the agency's route tags.
//!
//! For each of the first few routes in the route list: load the route config,
//! take its first stop and ask for predictions at that stop, then check that
//! the route shows up among them. Routes are checked one at a time with a
//! pause in between so the feed is not hammered.

use crate::client::{FeedFetcher, FeedQuery};
use crate::config::SweepConfig;
use crate::error::{FeedError, Result};
use crate::models::{RouteTagResult, SweepReport};
use crate::normalizer::{parse_predicted_route_tags, parse_route_stops, parse_route_tags};
use std::fmt;
use tokio::time::sleep;
use tracing::{info, warn};

/// Outcome of checking a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCheck {
    RouteConfigFailed(FeedError),
    NoStops,
    PredictionsFailed { stop_id: String, error: FeedError },
    Found { stop_id: String },
    NotFound { stop_id: String },
}

impl fmt::Display for RouteCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteCheck::RouteConfigFailed(e) => write!(f, "routeConfig failed: {}", e),
            RouteCheck::NoStops => write!(f, "routeConfig returned no stops with a stopId"),
            RouteCheck::PredictionsFailed { stop_id, error } => {
                write!(f, "predictions for stop {} failed: {}", stop_id, error)
            }
            RouteCheck::Found { stop_id } => {
                write!(f, "ok: route found in predictions for stop {}", stop_id)
            }
            RouteCheck::NotFound { stop_id } => {
                write!(f, "route not found in predictions for stop {}", stop_id)
            }
        }
    }
}

/// Runs the sweep. Only a failure to load the route list aborts it; every
/// per-route failure is recorded in that route's status.
#[tracing::instrument(skip(feed), err)]
pub async fn sweep_route_tags(feed: &dyn FeedFetcher, config: SweepConfig) -> Result<SweepReport> {
    let route_list = feed.fetch(&FeedQuery::RouteList).await?;
    let route_tags = parse_route_tags(&route_list, config.limit)?;

    info!("sweeping {} route tags", route_tags.len());

    let mut results = Vec::with_capacity(route_tags.len());

    for (i, route_tag) in route_tags.into_iter().enumerate() {
        if i > 0 && !config.delay.is_zero() {
            sleep(config.delay).await;
        }

        let check = check_route(feed, &route_tag).await;
        match &check {
            RouteCheck::Found { .. } => info!(route_tag = %route_tag, "{}", check),
            _ => warn!(route_tag = %route_tag, "{}", check),
        }

        results.push(RouteTagResult {
            route_tag,
            status: check.to_string(),
        });
    }

    Ok(SweepReport {
        tested: results.len(),
        results,
    })
}

async fn check_route(feed: &dyn FeedFetcher, route_tag: &str) -> RouteCheck {
    let stops = match feed
        .fetch(&FeedQuery::RouteConfig {
            route_tag: route_tag.to_string(),
        })
        .await
        .and_then(|body| parse_route_stops(&body))
    {
        Ok(stops) => stops,
        Err(e) => return RouteCheck::RouteConfigFailed(e),
    };

    let Some(first) = stops.into_iter().next() else {
        return RouteCheck::NoStops;
    };
    let stop_id = first.stop_id;

    let predicted = feed
        .fetch(&FeedQuery::Predictions {
            stop_id: stop_id.clone(),
        })
        .await
        .and_then(|body| parse_predicted_route_tags(&body));

    match predicted {
        Ok(tags) if tags.iter().any(|t| t == route_tag) => RouteCheck::Found { stop_id },
        Ok(_) => RouteCheck::NotFound { stop_id },
        Err(error) => RouteCheck::PredictionsFailed { stop_id, error },
    }
}
