use bytes::Bytes;
use futures::StreamExt;
use relay_transform::streaming::rewrite_sse_stream;
use relay_transform::{ByteStream, ResponseBody, TransformError};

const REASONING_EVENT: &str =
    "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"hi\"}}]}\n\n";
const THINKING_EVENT: &str = "data: {\"choices\":[{\"delta\":{\"thinking\":{\"content\":\"hi\"}}}]}\n\n";

fn upstream(chunks: Vec<&[u8]>) -> ByteStream {
    let owned: Vec<Result<Bytes, std::io::Error>> = chunks
        .into_iter()
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    ResponseBody::from_stream(futures::stream::iter(owned)).into_stream()
}

async fn rewrite_all(chunks: Vec<&[u8]>) -> String {
    let out = ResponseBody::Stream(rewrite_sse_stream(upstream(chunks)))
        .collect()
        .await
        .unwrap();
    String::from_utf8(out.to_vec()).unwrap()
}

#[tokio::test]
async fn test_reasoning_event_split_at_every_offset() {
    let input = REASONING_EVENT.as_bytes();

    for split in 0..=input.len() {
        let output = rewrite_all(vec![&input[..split], &input[split..]]).await;
        assert_eq!(output, THINKING_EVENT, "split at byte {}", split);
    }
}

#[tokio::test]
async fn test_done_passes_through() {
    let output = rewrite_all(vec![b"data: [DONE]\n\n"]).await;
    assert_eq!(output, "data: [DONE]\n\n");
}

#[tokio::test]
async fn test_full_stream_in_order() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"think\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"answer\"}}]}\n\n",
        "data: {oops\n\n",
        "data: [DONE]\n\n",
    );
    // deliberately awkward chunking
    let bytes = body.as_bytes();
    let output = rewrite_all(vec![&bytes[..5], &bytes[5..70], &bytes[70..71], &bytes[71..]]).await;

    assert_eq!(
        output,
        concat!(
            "data: {\"choices\":[{\"delta\":{\"thinking\":{\"content\":\"think\"}}}]}\n\n",
            ": keep-alive\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"answer\"}}]}\n\n",
            "data: {oops\n\n",
            "data: [DONE]\n\n",
        )
    );
}

#[tokio::test]
async fn test_unterminated_tail_is_dropped() {
    let output = rewrite_all(vec![b"data: [DONE]\n\ndata: {\"partial\""]).await;
    assert_eq!(output, "data: [DONE]\n\n");
}

#[tokio::test]
async fn test_multibyte_reasoning_split_mid_character() {
    let event = "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"推理\"}}]}\n\n";
    let bytes = event.as_bytes();
    let cut = event.find('推').unwrap() + 1;

    let output = rewrite_all(vec![&bytes[..cut], &bytes[cut..]]).await;

    assert_eq!(
        output,
        "data: {\"choices\":[{\"delta\":{\"thinking\":{\"content\":\"推理\"}}}]}\n\n"
    );
}

#[tokio::test]
async fn test_upstream_error_ends_stream() {
    let chunks = vec![
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        Err(std::io::Error::new(std::io::ErrorKind::Other, "connection reset")),
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
    ];
    let source = ResponseBody::from_stream(futures::stream::iter(chunks)).into_stream();

    let items: Vec<_> = rewrite_sse_stream(source).collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &Bytes::from_static(b"data: [DONE]\n\n"));
    assert!(matches!(&items[1], Err(TransformError::Stream(msg)) if msg == "connection reset"));
}
