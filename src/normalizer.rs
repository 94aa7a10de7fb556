//! Flattens NextBus XML documents into the records served by the API.
//!
//! A predictions document looks like:
//!
//! ```xml
//! <body>
//!   <predictions routeTag="501" stopTitle="Queen St At Yonge St">
//!     <direction title="West - 501 Queen towards Long Branch">
//!       <prediction epochTime="1700000000000" seconds="300" minutes="5"
//!                   isDeparture="false" dirTag="501_1_501" vehicle="9001"
//!                   block="501_2_20" tripTag="48571313"/>
//!     </direction>
//!   </predictions>
//! </body>
//! ```

use crate::error::{ElementError, FeedError, Result};
use crate::models::{Prediction, Stop, UNKNOWN_DIRECTION, UNKNOWN_ROUTE};
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Route and stop attributes of one `<predictions>` block.
#[derive(Debug, Clone, Copy)]
struct BlockContext<'a> {
    route_tag: Option<&'a str>,
    stop_title: Option<&'a str>,
}

fn parse_document(xml: &[u8]) -> Result<Document<'_>> {
    let text = std::str::from_utf8(xml).map_err(|e| FeedError::Parse(e.to_string()))?;
    let doc = Document::parse(text).map_err(|e| FeedError::Parse(e.to_string()))?;

    // The feed reports bad stops and routes with a 200 and an <Error> body.
    if let Some(error) = doc.descendants().find(|n| n.has_tag_name("Error")) {
        let message = error.text().map(str::trim).unwrap_or_default();
        return Err(FeedError::Upstream(if message.is_empty() {
            "feed returned an error document".to_string()
        } else {
            message.to_string()
        }));
    }

    Ok(doc)
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(move |n| n.has_tag_name(name))
}

fn non_empty<'a>(node: Node<'a, '_>, attribute: &str) -> Option<&'a str> {
    node.attribute(attribute).filter(|v| !v.is_empty())
}

/// Parses a predictions document into one record per `<prediction>` element.
///
/// Each record takes its route, stop and direction from its own enclosing
/// `<predictions>` and `<direction>` blocks. Elements that cannot be
/// converted are logged and skipped.
pub fn parse_predictions(xml: &[u8], timezone: Tz) -> Result<Vec<Prediction>> {
    let doc = parse_document(xml)?;
    let mut predictions = Vec::new();

    for block in elements(doc.root(), "predictions") {
        let context = BlockContext {
            route_tag: non_empty(block, "routeTag"),
            stop_title: block.attribute("stopTitle"),
        };

        for direction in elements(block, "direction") {
            let direction_title = direction.attribute("title").unwrap_or(UNKNOWN_DIRECTION);

            for element in direction.children().filter(|n| n.has_tag_name("prediction")) {
                match prediction_from_element(element, context, direction_title, timezone) {
                    Ok(prediction) => predictions.push(prediction),
                    Err(e) => warn!(
                        route_tag = context.route_tag,
                        direction = direction_title,
                        "skipping prediction: {}",
                        e
                    ),
                }
            }
        }
    }

    debug!(count = predictions.len(), "predictions parsed");

    Ok(predictions)
}

fn prediction_from_element(
    element: Node,
    context: BlockContext,
    direction: &str,
    timezone: Tz,
) -> std::result::Result<Prediction, ElementError> {
    let epoch_time = parse_number::<i64>(element.attribute("epochTime"));

    Ok(Prediction {
        route_tag: context
            .route_tag
            .or_else(|| non_empty(element, "routeTag"))
            .unwrap_or(UNKNOWN_ROUTE)
            .to_string(),
        stop_title: context.stop_title.map(String::from),
        vehicle: element.attribute("vehicle").map(String::from),
        minutes: parse_number(element.attribute("minutes")),
        seconds: parse_number(element.attribute("seconds")),
        epoch_time,
        timestamp: format_epoch_millis(epoch_time, timezone)?,
        is_departure: parse_flag(element.attribute("isDeparture")),
        affected_by_layover: parse_flag(element.attribute("affectedByLayover")),
        trip_tag: element.attribute("tripTag").map(String::from),
        block: element.attribute("block").map(String::from),
        dir_tag: element.attribute("dirTag").map(String::from),
        direction: direction.to_string(),
    })
}

/// Missing or non-numeric values count as 0.
fn parse_number<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Renders epoch milliseconds in `timezone`. 0 means the feed sent no time.
pub fn format_epoch_millis(
    epoch_ms: i64,
    timezone: Tz,
) -> std::result::Result<Option<String>, ElementError> {
    if epoch_ms == 0 {
        return Ok(None);
    }

    let utc = Utc
        .timestamp_millis_opt(epoch_ms)
        .single()
        .ok_or(ElementError::EpochOutOfRange(epoch_ms))?;

    Ok(Some(
        utc.with_timezone(&timezone)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    ))
}

/// Parses a routeConfig document into its stops. `<stop>` elements without
/// a `stopId` (the per-direction stop references) are skipped.
pub fn parse_route_stops(xml: &[u8]) -> Result<Vec<Stop>> {
    let doc = parse_document(xml)?;

    let stops: Vec<Stop> = elements(doc.root(), "stop")
        .filter_map(|stop| {
            let stop_id = non_empty(stop, "stopId")?;
            Some(Stop {
                title: stop.attribute("title").map(String::from),
                stop_id: stop_id.to_string(),
                tag: stop.attribute("tag").map(String::from),
            })
        })
        .collect();

    debug!(count = stops.len(), "route stops parsed");

    Ok(stops)
}

/// Parses a routeList document into at most `limit` route tags, in feed order.
pub fn parse_route_tags(xml: &[u8], limit: usize) -> Result<Vec<String>> {
    let doc = parse_document(xml)?;

    Ok(elements(doc.root(), "route")
        .filter_map(|route| non_empty(route, "tag"))
        .take(limit)
        .map(String::from)
        .collect())
}

/// Route tags of every `<predictions>` block, including blocks that carry no
/// `<prediction>` elements right now.
pub fn parse_predicted_route_tags(xml: &[u8]) -> Result<Vec<String>> {
    let doc = parse_document(xml)?;

    Ok(elements(doc.root(), "predictions")
        .filter_map(|block| non_empty(block, "routeTag"))
        .map(String::from)
        .collect())
}
