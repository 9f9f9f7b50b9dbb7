//! Decoder throughput benchmarks
//!
//! Measures:
//! - Per-record typed decoding for the common tags
//! - Framing plus decoding of a full streamed answer
//!
//! Run: cargo bench --bench decode

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fastgpt_core::sse::{decode, decode_stream, DecodePolicy, SseRecord};
use fastgpt_core::{ByteStream, CancellationToken};
use futures::{stream, StreamExt};

const ANSWER: &str = r#"{"id":"","object":"","created":0,"choices":[{"delta":{"role":"assistant","content":"Hello there"},"index":0,"finish_reason":null}]}"#;
const NODE_STATUS: &str = r#"{"status":"running","name":"AI 对话"}"#;
const FLOW_RESPONSES: &str = r#"[{"nodeId":"n1","moduleName":"AI 对话","moduleType":"chatNode","runningTime":1.5,"inputTokens":"102","outputTokens":8,"totalPoints":0.11,"maxToken":2000},{"nodeId":"n2","moduleType":"datasetSearchNode","similarity":0.4,"limit":5000}]"#;

fn streamed_body(answers: usize) -> String {
    let mut body = format!("event: flowNodeStatus\ndata: {}\n\n", NODE_STATUS);
    for _ in 0..answers {
        body.push_str(&format!("event: answer\ndata: {}\n\n", ANSWER));
    }
    body.push_str("event: answer\ndata: [DONE]\n\n");
    body.push_str(&format!("event: flowResponses\ndata: {}\n\n", FLOW_RESPONSES));
    body
}

fn bench_decode_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_record");
    for (tag, data) in [
        ("answer", ANSWER),
        ("flowNodeStatus", NODE_STATUS),
        ("flowResponses", FLOW_RESPONSES),
        ("unknown", ANSWER),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(tag), &data, |b, data| {
            b.iter(|| decode(black_box(SseRecord::new(tag, *data))))
        });
    }
    group.finish();
}

fn bench_decode_stream(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("decode_stream");

    for answers in [16usize, 256] {
        let body = Bytes::from(streamed_body(answers));
        group.bench_with_input(BenchmarkId::from_parameter(answers), &body, |b, body| {
            b.iter(|| {
                // 512-byte chunks approximate network reads
                let chunks: Vec<Result<Bytes, fastgpt_core::TransportError>> = body
                    .chunks(512)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                let bytes: ByteStream = Box::pin(stream::iter(chunks));
                runtime.block_on(async {
                    decode_stream(bytes, DecodePolicy::Surface, CancellationToken::new())
                        .count()
                        .await
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_record, bench_decode_stream);
criterion_main!(benches);
