use bytes::Bytes;
use futures::StreamExt;
use tangent_llm::{decode_sse, profile, BackendKind, TokenDelta};
use tokio_util::sync::CancellationToken;

fn byte_stream(
    chunks: Vec<&'static str>,
) -> impl futures::Stream<Item = reqwest::Result<Bytes>> + Send {
    futures::stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect::<Vec<reqwest::Result<Bytes>>>(),
    )
}

async fn collect_deltas(
    backend: BackendKind,
    chunks: Vec<&'static str>,
) -> Vec<TokenDelta> {
    let stream = decode_sse(byte_stream(chunks), profile(backend), CancellationToken::new());
    stream
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|r| r.expect("no transport error expected"))
        .collect()
}

#[tokio::test]
async fn reassembles_json_split_across_reads() {
    let deltas = collect_deltas(
        BackendKind::OpenAi,
        vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel",
            "lo\"}}]}\n\ndata: [DONE]\n\n",
        ],
    )
    .await;

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].text, "Hello");
    assert_eq!(deltas[0].reasoning, "");
}

#[tokio::test]
async fn stops_at_done_marker() {
    let deltas = collect_deltas(
        BackendKind::OpenAi,
        vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n\
             data: [DONE]\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\"after done\"}}]}\n\n",
        ],
    )
    .await;

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].text, "a");
}

#[tokio::test]
async fn malformed_chunk_is_skipped_not_fatal() {
    let deltas = collect_deltas(
        BackendKind::OpenAi,
        vec![
            "data: {not json at all\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n\
             data: [DONE]\n\n",
        ],
    )
    .await;

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].text, "ok");
}

#[tokio::test]
async fn trailing_buffer_is_flushed_without_done() {
    let deltas = collect_deltas(
        BackendKind::OpenAi,
        vec!["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"],
    )
    .await;

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].text, "tail");
}

#[tokio::test]
async fn claude_dialect_separates_thinking_and_signature() {
    let deltas = collect_deltas(
        BackendKind::Claude,
        vec![
            "data: {\"delta\":{\"type\":\"thinking_delta\",\"thinking\":\"mull \"}}\n\n\
             data: {\"delta\":{\"type\":\"signature_delta\",\"signature\":\"s1\"}}\n\n\
             data: {\"delta\":{\"type\":\"text_delta\",\"text\":\"answer\"}}\n\n\
             data: [DONE]\n\n",
        ],
    )
    .await;

    assert_eq!(deltas.len(), 3);
    assert_eq!(deltas[0].reasoning, "mull ");
    assert_eq!(deltas[1].signature.as_deref(), Some("s1"));
    assert_eq!(deltas[2].text, "answer");
}

#[tokio::test]
async fn google_dialect_splits_on_thought_flag() {
    let deltas = collect_deltas(
        BackendKind::MakerSuite,
        vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"thought\":true,\"text\":\"t\"},{\"text\":\"v\"}]}}]}\n\n",
        ],
    )
    .await;

    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].reasoning, "t");
    assert_eq!(deltas[0].text, "v");
}

#[tokio::test]
async fn cancellation_surfaces_as_distinct_outcome() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let stream = decode_sse(
        byte_stream(vec!["data: [DONE]\n\n"]),
        profile(BackendKind::OpenAi),
        cancel,
    );
    let results: Vec<_> = stream.collect().await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(tangent_llm::TransportError::Cancelled)
    ));
}
