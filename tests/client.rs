use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use ttc_eta_api::config::FeedConfig;
use ttc_eta_api::normalizer::parse_predictions;
use ttc_eta_api::{FeedError, FeedFetcher, FeedQuery, NextBusClient};

async fn echo_query(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/xml; charset=utf-8")
        .body(format!("<body><query>{}</query></body>", req.query_string()))
}

async fn predictions() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/xml; charset=utf-8")
        .body(include_str!("fixtures/predictions_1234.xml"))
}

async fn unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().finish()
}

async fn slow() -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_secs(5)).await;
    HttpResponse::Ok().finish()
}

/// Starts a throwaway feed on a random local port.
fn start_feed() -> SocketAddr {
    let server = HttpServer::new(|| {
        App::new()
            .route("/echo", web::get().to(echo_query))
            .route("/predictions", web::get().to(predictions))
            .route("/down", web::get().to(unavailable))
            .route("/slow", web::get().to(slow))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

fn client(addr: SocketAddr, path: &str, timeout: Duration) -> NextBusClient {
    NextBusClient::new(FeedConfig {
        base_url: Url::parse(&format!("http://{}{}", addr, path)).unwrap(),
        agency: "ttc".to_string(),
        timeout,
        timezone: chrono_tz::America::Toronto,
    })
    .unwrap()
}

#[actix_web::test]
async fn test_sends_command_agency_and_stop() {
    let addr = start_feed();
    let body = client(addr, "/echo", Duration::from_secs(5))
        .fetch(&FeedQuery::Predictions {
            stop_id: "1234".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "<body><query>command=predictions&a=ttc&stopId=1234</query></body>"
    );
}

#[actix_web::test]
async fn test_route_tags_are_url_encoded() {
    let addr = start_feed();
    let body = client(addr, "/echo", Duration::from_secs(5))
        .fetch(&FeedQuery::RouteConfig {
            route_tag: "50 1&x".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "<body><query>command=routeConfig&a=ttc&r=50+1%26x</query></body>"
    );
}

#[actix_web::test]
async fn test_fetched_document_parses() {
    let addr = start_feed();
    let body = client(addr, "/predictions", Duration::from_secs(5))
        .fetch(&FeedQuery::Predictions {
            stop_id: "1234".to_string(),
        })
        .await
        .unwrap();

    let predictions = parse_predictions(&body, chrono_tz::America::Toronto).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].vehicle.as_deref(), Some("9001"));
}

#[actix_web::test]
async fn test_non_success_status_is_a_transport_error() {
    let addr = start_feed();
    let result = client(addr, "/down", Duration::from_secs(5))
        .fetch(&FeedQuery::RouteList)
        .await;

    match result {
        Err(FeedError::Transport(message)) => assert!(message.contains("503")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[actix_web::test]
async fn test_slow_feed_times_out() {
    let addr = start_feed();
    let result = client(addr, "/slow", Duration::from_millis(200))
        .fetch(&FeedQuery::RouteList)
        .await;

    assert!(matches!(result, Err(FeedError::Transport(_))));
}
