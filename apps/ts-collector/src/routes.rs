//! 路由定义
//!
//! - 探活：GET /、GET /health
//! - 通道列表：GET /channels
//! - 指标快照：GET /metrics
//! - 数据点接收：POST <prefix>/:channel（prefix 默认 /store）

use super::AppState;
use super::handlers::*;
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// 创建网关路由。
pub fn create_router(state: AppState, channel_path_prefix: &str) -> Router {
    let store_path = format!("{}/:channel", channel_path_prefix.trim_end_matches('/'));
    Router::new()
        .route("/", get(ping))
        .route("/health", get(health))
        .route("/channels", get(list_channels))
        .route("/metrics", get(get_metrics))
        .route(&store_path, post(store_datapoints))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use domain::TimestampPrecision;
    use http_body_util::BodyExt;
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use ts_pipeline::{ChannelRegistry, HttpBatchWriter, NoopWriter, PipelineConfig};
    use ts_writer::{InfluxWriter, WriterConfig};

    fn noop_state(max_row_limit: usize) -> AppState {
        let registry = ChannelRegistry::start(
            ["metrics", "events"],
            PipelineConfig {
                max_row_limit,
                ..PipelineConfig::default()
            },
            Arc::new(NoopWriter),
        );
        AppState::new(registry)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn ping_returns_banner_with_request_headers() {
        let app = create_router(noop_state(10), "/store");
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
        assert_eq!(body_text(response).await, "TimeSeries Collector");
    }

    #[tokio::test]
    async fn valid_datapoint_is_accepted_with_no_content() {
        let state = noop_state(10);
        let registry = state.registry.clone();
        let app = create_router(state, "/store");
        let response = app
            .oneshot(post_json(
                "/store/metrics",
                r#"{"name":"cpu","timestamp":1,"values":{"load":0.5}}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(registry.resolve("metrics").expect("channel").buffered().await, 1);
    }

    #[tokio::test]
    async fn incomplete_datapoint_is_bad_request() {
        let app = create_router(noop_state(10), "/store");
        let response = app
            .oneshot(post_json("/store/metrics", r#"{"timestamp":1,"values":{}}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("INVALID.REQUEST"));
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let app = create_router(noop_state(10), "/store");
        let response = app
            .oneshot(post_json(
                "/store/missing",
                r#"{"timestamp":1,"values":{"v":1}}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("CHANNEL.NOT_FOUND"));
    }

    #[tokio::test]
    async fn channels_are_listed_sorted() {
        let app = create_router(noop_state(10), "/store");
        let response = app
            .oneshot(Request::get("/channels").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        assert_eq!(body["data"]["channels"], serde_json::json!(["events", "metrics"]));
    }

    #[tokio::test]
    async fn custom_prefix_is_honoured() {
        let app = create_router(noop_state(10), "/ts/");
        let response = app
            .oneshot(post_json("/ts/events", r#"{"timestamp":1,"values":{"v":1}}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn posted_array_reaches_downstream_as_line_protocol() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/write")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "metrics".into()),
                Matcher::UrlEncoded("precision".into(), "ms".into()),
            ]))
            .match_body("m temp=20 1000\nm,host=a\\ b temp=21 2000")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let writer = InfluxWriter::new(WriterConfig {
            base_url: server.url(),
            write_path: "/write".to_string(),
            precision: TimestampPrecision::Milliseconds,
            timeout: Duration::from_secs(2),
            tls_insecure: false,
        })
        .expect("writer");
        let registry = ChannelRegistry::start(
            ["metrics"],
            PipelineConfig {
                max_row_limit: 2,
                ..PipelineConfig::default()
            },
            Arc::new(HttpBatchWriter::new(writer)),
        );
        let app = create_router(AppState::new(registry.clone()), "/store");

        let response = app
            .oneshot(post_json(
                "/store/metrics",
                r#"[
                    {"name":"m","timestamp":1000,"values":{"temp":20}},
                    {"name":"m","timestamp":2000,"tags":{"host":"a b"},"values":{"temp":21}}
                ]"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        registry.shutdown().await;
        mock.assert_async().await;
    }
}
