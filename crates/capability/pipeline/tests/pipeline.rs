use domain::{Datapoint, TimestampPrecision};
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;
use ts_pipeline::{ChannelRegistry, HttpBatchWriter, PipelineConfig, PipelineError, PushOutcome};
use ts_writer::{InfluxWriter, WriterConfig};

fn http_writer(base_url: String) -> Arc<HttpBatchWriter> {
    let writer = InfluxWriter::new(WriterConfig {
        base_url,
        write_path: "/write".to_string(),
        precision: TimestampPrecision::Milliseconds,
        timeout: Duration::from_secs(2),
        tls_insecure: false,
    })
    .expect("writer");
    Arc::new(HttpBatchWriter::new(writer))
}

fn config(max_row_limit: usize) -> PipelineConfig {
    PipelineConfig {
        max_row_limit,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn full_batch_is_encoded_and_posted_to_channel_database() {
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

    let registry = ChannelRegistry::start(["metrics"], config(2), http_writer(server.url()));
    let first = registry
        .push("metrics", Datapoint::new("m", 1000).with_value("temp", 20))
        .await
        .expect("push");
    assert_eq!(first, PushOutcome::Buffered { buffered: 1 });
    let second = registry
        .push(
            "metrics",
            Datapoint::new("m", 2000)
                .with_tag("host", "a b")
                .with_value("temp", 21),
        )
        .await
        .expect("push");
    assert_eq!(
        second,
        PushOutcome::Emitted {
            sequence: 0,
            size: 2
        }
    );

    registry.shutdown().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_batch_does_not_block_later_batches() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/write")
        .match_query(Matcher::Any)
        .match_body("m v=1 1")
        .with_status(503)
        .with_body("unavailable")
        .expect(1)
        .create_async()
        .await;
    let next = server
        .mock("POST", "/write")
        .match_query(Matcher::Any)
        .match_body("m v=2 2")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let registry = ChannelRegistry::start(["metrics"], config(1), http_writer(server.url()));
    registry
        .push("metrics", Datapoint::new("m", 1).with_value("v", 1))
        .await
        .expect("push");
    registry
        .push("metrics", Datapoint::new("m", 2).with_value("v", 2))
        .await
        .expect("push");

    registry.shutdown().await;
    failing.assert_async().await;
    next.assert_async().await;
}

#[tokio::test]
async fn unknown_channel_never_reaches_downstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/write")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let registry = ChannelRegistry::start(["metrics"], config(1), http_writer(server.url()));
    let err = registry
        .push("other", Datapoint::new("m", 1).with_value("v", 1))
        .await
        .expect_err("unknown");
    assert_eq!(err, PipelineError::UnknownChannel("other".to_string()));

    registry.shutdown().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn shutdown_flushes_sub_threshold_buffer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/write")
        .match_query(Matcher::UrlEncoded("db".into(), "metrics".into()))
        .match_body("m v=1 1")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let registry = ChannelRegistry::start(["metrics"], config(10_000), http_writer(server.url()));
    registry
        .push("metrics", Datapoint::new("m", 1).with_value("v", 1))
        .await
        .expect("push");
    registry.shutdown().await;
    mock.assert_async().await;
}
