use super::*;
use crate::pipeline::{FakePipeline, Quality, SourceRef, StreamMode};

fn spec() -> StreamSpec {
    StreamSpec {
        session_id: "s1".to_string(),
        mode: StreamMode::Live,
        output_format: "hls".to_string(),
        source: SourceRef::TunerSlot(0),
        quality: Quality { codec: "h264".to_string(), quality: "1080p".to_string() },
    }
}

#[tokio::test]
async fn traced_pipeline_delegates_to_inner() {
    let inner = FakePipeline::new();
    let traced = TracedPipeline::new(inner.clone());

    let handle = traced.start(&spec()).await.expect("start");
    let health = traced.health(&handle).await.expect("health");
    assert!(health.healthy);
    traced.stop(&handle).await.expect("stop");

    assert_eq!(inner.calls().len(), 3);
}

#[tokio::test]
async fn traced_pipeline_surfaces_inner_errors() {
    let inner = FakePipeline::new();
    inner.fail_next_start(PipelineError::NoValidTransportStream);
    let traced = TracedPipeline::new(inner);

    let result = traced.start(&spec()).await;
    assert!(matches!(result, Err(PipelineError::NoValidTransportStream)));
}
