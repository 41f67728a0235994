use async_trait::async_trait;
use domain::Datapoint;
use std::sync::{Arc, Mutex};
use ts_ingest::{DatapointSink, IngestError, Ingestor};

struct RecordingSink {
    channels: Vec<&'static str>,
    published: Mutex<Vec<(String, Datapoint)>>,
    /// 接收这么多个数据点后开始返回错误
    fail_after: Option<usize>,
}

impl RecordingSink {
    fn new(channels: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            channels,
            published: Mutex::new(Vec::new()),
            fail_after: None,
        })
    }

    fn failing_after(channels: Vec<&'static str>, fail_after: usize) -> Arc<Self> {
        Arc::new(Self {
            channels,
            published: Mutex::new(Vec::new()),
            fail_after: Some(fail_after),
        })
    }

    fn published(&self) -> Vec<(String, Datapoint)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatapointSink for RecordingSink {
    fn accepts(&self, channel: &str) -> bool {
        self.channels.contains(&channel)
    }

    async fn publish(&self, channel: &str, datapoint: Datapoint) -> Result<(), IngestError> {
        let mut published = self.published.lock().unwrap();
        if self.fail_after.is_some_and(|limit| published.len() >= limit) {
            return Err(IngestError::Pipeline(format!("channel '{channel}' is closed")));
        }
        published.push((channel.to_string(), datapoint));
        Ok(())
    }
}

#[tokio::test]
async fn array_body_publishes_every_datapoint_in_order() {
    let sink = RecordingSink::new(vec!["metrics"]);
    let ingestor = Ingestor::new(sink.clone());
    let body = br#"[
        {"name":"cpu","timestamp":1,"tags":{"host":"a"},"values":{"load":0.5}},
        {"timestamp":2,"values":{"ok":true,"state":"up"}}
    ]"#;

    let count = ingestor.ingest("metrics", body).await.expect("ingest");
    assert_eq!(count, 2);

    let published = sink.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].1.name(), "cpu");
    assert_eq!(published[1].1.name(), "measure");
    assert_eq!(published[1].1.timestamp(), 2);
}

#[tokio::test]
async fn invalid_element_rejects_whole_array() {
    let sink = RecordingSink::new(vec!["metrics"]);
    let ingestor = Ingestor::new(sink.clone());
    let body = br#"[
        {"timestamp":1,"values":{"v":1}},
        {"timestamp":2,"values":{}}
    ]"#;

    let err = ingestor.ingest("metrics", body).await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidPayload(_)));
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn unknown_channel_is_reported_before_decoding() {
    let sink = RecordingSink::new(vec!["metrics"]);
    let ingestor = Ingestor::new(sink.clone());

    let err = ingestor.ingest("other", b"not json").await.unwrap_err();
    assert!(matches!(err, IngestError::UnknownChannel(name) if name == "other"));
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn malformed_json_is_invalid_payload() {
    let sink = RecordingSink::new(vec!["metrics"]);
    let ingestor = Ingestor::new(sink);
    let err = ingestor.ingest("metrics", b"{").await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidPayload(_)));
}

#[tokio::test]
async fn failure_mid_array_keeps_and_counts_published_prefix() {
    let sink = RecordingSink::failing_after(vec!["metrics"], 2);
    let ingestor = Ingestor::new(sink.clone());
    let body = br#"[
        {"timestamp":1,"values":{"v":1}},
        {"timestamp":2,"values":{"v":2}},
        {"timestamp":3,"values":{"v":3}},
        {"timestamp":4,"values":{"v":4}}
    ]"#;

    let before = ts_telemetry::metrics().snapshot().datapoints_received;
    let err = ingestor.ingest("metrics", body).await.unwrap_err();
    assert!(matches!(err, IngestError::Pipeline(_)));

    let timestamps: Vec<i64> = sink
        .published()
        .iter()
        .map(|(_, dp)| dp.timestamp())
        .collect();
    assert_eq!(timestamps, vec![1, 2]);
    // 计数器是进程级的，并行用例只会让它更大
    let after = ts_telemetry::metrics().snapshot().datapoints_received;
    assert!(after - before >= 2);
}
