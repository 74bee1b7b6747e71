use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ResponsesRequest, ResponsesResponse};
use crate::core::error::ChatError;
use crate::core::request::{build_wire_request, Request};
use crate::core::sse::{SseDemuxer, StreamEvent};
use crate::core::transport::{Transport, TransportConfig, TransportResponse};

/// Capacity of the per-turn event queue. Large enough to absorb brief
/// consumer stalls; beyond that the producer waits.
pub const STREAM_QUEUE_CAPACITY: usize = 128;

const STREAM_PARAM_MARKER: &str = "\"param\":\"stream\"";
const VERIFY_ORGANIZATION_MARKER: &str = "verify organization";
const UNSUPPORTED_VALUE_MARKER: &str = "unsupported_value";

/// Whether an error body says streaming is not allowed for this
/// model/organization, in which case the request is retried without it.
pub fn should_fallback_to_non_streaming(error_body: &str) -> bool {
    error_body.contains(STREAM_PARAM_MARKER)
        || error_body
            .to_lowercase()
            .contains(VERIFY_ORGANIZATION_MARKER)
        || error_body.contains(UNSUPPORTED_VALUE_MARKER)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Final answer text, trimmed.
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// True when the answer came from the non-streaming retry.
    pub fell_back: bool,
}

impl Completion {
    fn from_response(response: &ResponsesResponse) -> Self {
        let usage = response.usage();
        Self {
            text: response.text().trim().to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            fell_back: false,
        }
    }
}

enum StreamOutcome {
    Completed(String),
    ServerError(String),
    Abandoned(String),
}

/// Client for the Responses API with transparent non-streaming fallback.
#[derive(Clone, Debug)]
pub struct ResponsesClient {
    transport: Transport,
    model: String,
}

impl ResponsesClient {
    pub fn new(config: &TransportConfig, model: impl Into<String>) -> Result<Self, ChatError> {
        if config.api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        Ok(Self {
            transport: Transport::new(config)?,
            model: model.into(),
        })
    }

    /// Runs `request` without streaming and returns the whole answer.
    pub async fn complete(&self, request: &Request) -> Result<Completion, ChatError> {
        let payload = build_wire_request(request, &self.model, false);
        let response = self.fetch_non_streaming(&payload).await?;
        Ok(Completion::from_response(&response))
    }

    /// Streams `request`, publishing events to `events` in arrival order.
    ///
    /// On success the last published event is always [`StreamEvent::Completed`].
    /// Server-side `error` events are consumed here and never published: they
    /// trigger the single non-streaming retry instead. If the receiver goes
    /// away the stream is abandoned and the text gathered so far is returned.
    pub async fn stream(
        &self,
        request: &Request,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<Completion, ChatError> {
        let payload = build_wire_request(request, &self.model, true);

        let response = match self.transport.send(&payload).await? {
            TransportResponse::Success(response) => response,
            TransportResponse::Failure { status, body } => {
                if should_fallback_to_non_streaming(&body) {
                    debug!(status, "Streaming rejected by provider; retrying without stream");
                    let stream_error = format!("http {status}: {body}");
                    return self
                        .retry_without_streaming(&payload, &stream_error, events)
                        .await;
                }
                return Err(ChatError::http(status, body));
            }
        };

        match pump_event_stream(response, events).await? {
            StreamOutcome::Completed(text) => Ok(Completion {
                text: text.trim().to_string(),
                ..Default::default()
            }),
            StreamOutcome::ServerError(error_payload) => {
                debug!(payload = %error_payload, "Stream error event; retrying without stream");
                self.retry_without_streaming(&payload, &error_payload, events)
                    .await
            }
            StreamOutcome::Abandoned(text) => {
                debug!("Stream receiver dropped; abandoning response");
                Ok(Completion {
                    text: text.trim().to_string(),
                    ..Default::default()
                })
            }
        }
    }

    /// Streams `request`, invoking `on_event` for each event in order. Blocks
    /// until the turn ends.
    pub async fn stream_with<F>(&self, request: &Request, mut on_event: F) -> Result<Completion, ChatError>
    where
        F: FnMut(StreamEvent),
    {
        let (tx, mut rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);
        let producer = async move {
            let result = self.stream(request, &tx).await;
            drop(tx);
            result
        };
        let consumer = async {
            while let Some(event) = rx.recv().await {
                on_event(event);
            }
        };
        let (result, ()) = tokio::join!(producer, consumer);
        result
    }

    async fn retry_without_streaming(
        &self,
        payload: &ResponsesRequest,
        stream_error: &str,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<Completion, ChatError> {
        let retry_payload = payload.without_streaming();
        let response = match self.fetch_non_streaming(&retry_payload).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Non-streaming retry failed");
                return Err(ChatError::stream_fallback(stream_error, err));
            }
        };

        let text = response.text();
        if !text.is_empty() {
            let _ = events.send(StreamEvent::TextDelta(text)).await;
        }
        let _ = events.send(StreamEvent::Completed).await;

        Ok(Completion {
            fell_back: true,
            ..Completion::from_response(&response)
        })
    }

    async fn fetch_non_streaming(
        &self,
        payload: &ResponsesRequest,
    ) -> Result<ResponsesResponse, ChatError> {
        match self.transport.send(payload).await? {
            TransportResponse::Success(response) => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice::<ResponsesResponse>(&body)?)
            }
            TransportResponse::Failure { status, body } => Err(ChatError::http(status, body)),
        }
    }
}

/// Reads the SSE body line by line and forwards demultiplexed events until a
/// terminal event, the end of the body, or the receiver going away.
async fn pump_event_stream(
    response: reqwest::Response,
    events: &mpsc::Sender<StreamEvent>,
) -> Result<StreamOutcome, ChatError> {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut demuxer = SseDemuxer::new();
    let mut batch = Vec::new();
    let mut full_text = String::new();

    loop {
        let chunk = stream.next().await.transpose()?;
        let at_eof = chunk.is_none();
        match chunk {
            Some(chunk_bytes) => buffer.extend_from_slice(&chunk_bytes),
            // Flush a final line that lacks a trailing newline.
            None if !buffer.is_empty() => buffer.push(b'\n'),
            None => {}
        }

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => demuxer.process_line(line.trim(), &mut batch),
                Err(err) => warn!(error = %err, "Invalid UTF-8 in stream"),
            }
            buffer.drain(..=newline_pos);

            for event in batch.drain(..) {
                match event {
                    StreamEvent::Error(payload) => return Ok(StreamOutcome::ServerError(payload)),
                    StreamEvent::Completed => {
                        let _ = events.send(StreamEvent::Completed).await;
                        return Ok(StreamOutcome::Completed(full_text));
                    }
                    other => {
                        if let StreamEvent::TextDelta(text) = &other {
                            full_text.push_str(text);
                        }
                        if events.send(other).await.is_err() {
                            return Ok(StreamOutcome::Abandoned(full_text));
                        }
                    }
                }
            }
        }

        if at_eof {
            break;
        }
    }

    // Connection closed without an explicit completion event.
    let _ = events.send(StreamEvent::Completed).await;
    Ok(StreamOutcome::Completed(full_text))
}

/// What a consumer observes for one poll of a [`TurnHandle`].
#[derive(Debug)]
pub enum TurnUpdate {
    Event(StreamEvent),
    Failed(ChatError),
    Finished,
}

/// Consumer end of one in-flight turn.
///
/// Dropping the handle, or calling [`cancel`](Self::cancel), cancels the
/// producer: it stops at its next network read or queue send and publishes
/// nothing further.
#[derive(Debug)]
pub struct TurnHandle {
    turn_id: u64,
    events: mpsc::Receiver<StreamEvent>,
    errors: mpsc::Receiver<ChatError>,
    cancel_token: CancellationToken,
    finished: bool,
}

impl TurnHandle {
    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Waits for exactly one queued item. Events always drain before a
    /// terminal error is reported.
    pub async fn next(&mut self) -> TurnUpdate {
        if self.finished {
            return TurnUpdate::Finished;
        }

        tokio::select! {
            biased;
            Some(event) = self.events.recv() => TurnUpdate::Event(event),
            Some(err) = self.errors.recv() => {
                self.finished = true;
                TurnUpdate::Failed(err)
            }
            else => {
                self.finished = true;
                TurnUpdate::Finished
            }
        }
    }
}

impl Drop for TurnHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Spawns one producer task per turn and hands back its [`TurnHandle`].
#[derive(Clone, Debug)]
pub struct ChatStreamService {
    client: ResponsesClient,
    next_turn_id: Arc<AtomicU64>,
}

impl ChatStreamService {
    pub fn new(client: ResponsesClient) -> Self {
        Self {
            client,
            next_turn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Must be called from within a Tokio runtime.
    pub fn spawn_turn(&self, request: Request) -> TurnHandle {
        let turn_id = self.next_turn_id.fetch_add(1, Ordering::Relaxed);
        let (event_tx, event_rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(1);
        let cancel_token = CancellationToken::new();

        let client = self.client.clone();
        let task_token = cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = client.stream(&request, &event_tx) => {
                    if let Err(err) = result {
                        debug!(turn_id, error = %err, "Turn failed");
                        let _ = error_tx.send(err).await;
                    }
                }
                _ = task_token.cancelled() => {
                    debug!(turn_id, "Turn cancelled; abandoning stream");
                }
            }
        });

        TurnHandle {
            turn_id,
            events: event_rx,
            errors: error_rx,
            cancel_token,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TranscriptRole;
    use crate::core::transcript::Transcript;
    use crate::utils::test_utils::{spawn_mock_server, CannedResponse};
    use std::time::Duration;

    fn client_for(base_url: &str) -> ResponsesClient {
        ResponsesClient::new(&TransportConfig::new(base_url, "test-key"), "gpt-5-mini")
            .expect("client")
    }

    async fn collect_stream(
        client: &ResponsesClient,
        request: &Request,
    ) -> (Vec<StreamEvent>, Result<Completion, ChatError>) {
        let mut events = Vec::new();
        let result = client
            .stream_with(request, |event| events.push(event))
            .await;
        (events, result)
    }

    #[test]
    fn fallback_markers_are_recognized() {
        assert!(should_fallback_to_non_streaming(
            r#"{"error":{"message":"bad","param":"stream"}}"#
        ));
        assert!(should_fallback_to_non_streaming(
            "Your organization must be verified. Please Verify Organization to stream."
        ));
        assert!(should_fallback_to_non_streaming(r#"{"code":"unsupported_value"}"#));
        assert!(!should_fallback_to_non_streaming(r#"{"error":{"message":"invalid api key"}}"#));
        assert!(!should_fallback_to_non_streaming(r#"{"param": "stream"}"#));
    }

    #[test]
    fn missing_api_key_fails_before_any_request() {
        let err = ResponsesClient::new(&TransportConfig::new("http://127.0.0.1:9", "  "), "gpt-4o")
            .expect_err("missing key");
        assert!(matches!(err, ChatError::MissingApiKey));
    }

    #[tokio::test]
    async fn streams_text_delta_and_completion() {
        let server = spawn_mock_server(vec![CannedResponse::sse(
            "event: response.output_text.delta\n\
             data: {\"delta\":\"Hi\"}\n\n\
             event: response.completed\n\
             data: {\"type\":\"response.completed\"}\n\n",
        )])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("  hello  ")).await;

        let completion = result.expect("stream should succeed");
        assert_eq!(completion.text, "Hi");
        assert!(!completion.fell_back);
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta("Hi".into()), StreamEvent::Completed]
        );

        let requests = server.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request_line, "POST /v1/responses HTTP/1.1");
        assert_eq!(requests[0].header("authorization"), Some("Bearer test-key"));
        assert_eq!(requests[0].body["stream"], true);
        assert_eq!(requests[0].body["input"], "hello");
    }

    #[tokio::test]
    async fn interleaved_sub_streams_arrive_in_order() {
        let server = spawn_mock_server(vec![CannedResponse::sse(
            "event: response.output_text.delta\ndata: {\"delta\":\"Let me check. \"}\n\n\
             event: response.web_search_call.delta\ndata: {\"action\":{\"query\":\"tokio mpsc\"}}\n\n\
             event: response.output_text.delta\ndata: {\"delta\":\"Found it.\"}\n\n\
             event: response.reasoning.delta\ndata: {\"delta\":\"Comparing.\"}\n\n\
             event: response.completed\ndata: {}\n\n",
        )])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("q")).await;

        assert_eq!(result.expect("stream").text, "Let me check. Found it.");
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("Let me check. ".into()),
                StreamEvent::ToolDelta("{\"action\":{\"query\":\"tokio mpsc\"}}".into()),
                StreamEvent::TextDelta("Found it.".into()),
                StreamEvent::ReasoningDelta("Comparing.".into()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn body_without_completion_event_still_completes() {
        let server = spawn_mock_server(vec![CannedResponse::sse(
            "event: response.output_text.delta\ndata: partial",
        )])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("q")).await;

        assert_eq!(result.expect("stream").text, "partial");
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta("partial".into()), StreamEvent::Completed]
        );
    }

    #[tokio::test]
    async fn error_event_triggers_exactly_one_non_streaming_retry() {
        let server = spawn_mock_server(vec![
            CannedResponse::sse(
                "event: error\n\
                 data: {\"type\":\"error\",\"code\":\"unsupported_value\"}\n\n",
            ),
            CannedResponse::json(200, r#"{"output_text":"  Recovered answer  ","usage":{"input_tokens":5,"output_tokens":2}}"#),
        ])
        .await;
        let client = client_for(&server.base_url);
        let request = Request::new("hello").with_reasoning("low", "auto");

        let (events, result) = collect_stream(&client, &request).await;

        let completion = result.expect("fallback should succeed");
        assert!(completion.fell_back);
        assert_eq!(completion.text, "Recovered answer");
        assert_eq!((completion.input_tokens, completion.output_tokens), (5, 2));
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("  Recovered answer  ".into()),
                StreamEvent::Completed,
            ]
        );

        let requests = server.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].request_line, requests[1].request_line);
        assert_eq!(requests[0].body["stream"], true);
        assert_eq!(requests[1].body["stream"], false);
        let mut first = requests[0].body.clone();
        first["stream"] = serde_json::Value::Bool(false);
        assert_eq!(first, requests[1].body);
    }

    #[tokio::test]
    async fn error_after_published_deltas_retries_and_appends_whole_answer() {
        let server = spawn_mock_server(vec![
            CannedResponse::sse(
                "event: response.reasoning.delta\ndata: {\"delta\":\"Hmm\"}\n\
                 event: response.output_text.delta\ndata: {\"delta\":\"Par\"}\n\
                 event: error\ndata: {\"type\":\"error\",\"message\":\"stream interrupted\"}\n\
                 event: response.output_text.delta\ndata: {\"delta\":\"never read\"}\n",
            ),
            CannedResponse::json(200, r#"{"output_text":"Partial answer"}"#),
        ])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("hello")).await;

        let completion = result.expect("fallback should succeed");
        assert!(completion.fell_back);
        assert_eq!(completion.text, "Partial answer");
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningDelta("Hmm".into()),
                StreamEvent::TextDelta("Par".into()),
                StreamEvent::TextDelta("Partial answer".into()),
                StreamEvent::Completed,
            ]
        );
        assert_eq!(server.requests().await.len(), 2);

        // Deltas already shown stay; the retried answer is appended whole.
        let mut transcript = Transcript::new();
        transcript.begin_turn("hello");
        for event in events {
            transcript.apply(event);
        }
        let texts: Vec<_> = transcript
            .entries()
            .iter()
            .map(|entry| (entry.role, entry.text.as_str(), entry.finalized))
            .collect();
        assert_eq!(
            texts,
            vec![
                (TranscriptRole::User, "hello", true),
                (TranscriptRole::Reasoning, "Hmm", true),
                (TranscriptRole::Assistant, "ParPartial answer", true),
            ]
        );
    }

    #[tokio::test]
    async fn failed_retry_is_composed_and_never_repeated() {
        let server = spawn_mock_server(vec![
            CannedResponse::sse("event: error\ndata: {\"message\":\"stream not allowed\"}\n\n"),
            CannedResponse::json(500, r#"{"error":{"message":"boom"}}"#),
        ])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("hello")).await;

        let err = result.expect_err("retry failure should surface");
        match &err {
            ChatError::StreamFallback {
                stream_error,
                retry,
            } => {
                assert!(stream_error.contains("stream not allowed"));
                assert_eq!(retry.status(), Some(500));
            }
            other => panic!("expected fallback error, got {other:?}"),
        }
        assert!(events.is_empty());
        assert_eq!(server.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn rejected_stream_param_status_triggers_fallback() {
        let server = spawn_mock_server(vec![
            CannedResponse::json(
                400,
                r#"{"error":{"message":"Your organization must be verified to stream this model.","type":"invalid_request_error","param":"stream","code":"unsupported_value"}}"#,
            ),
            CannedResponse::json(
                200,
                r#"{"output":[{"type":"message","content":[{"type":"output_text","text":"Non-streamed"}]}]}"#,
            ),
        ])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("hello")).await;

        assert_eq!(result.expect("fallback").text, "Non-streamed");
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta("Non-streamed".into()), StreamEvent::Completed]
        );
        let requests = server.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body["stream"], false);
    }

    #[tokio::test]
    async fn unrecognized_error_status_is_not_retried() {
        let server = spawn_mock_server(vec![
            CannedResponse::json(401, r#"{"error":{"message":"Incorrect API key"}}"#),
            CannedResponse::json(200, r#"{"output_text":"should not be fetched"}"#),
        ])
        .await;
        let client = client_for(&server.base_url);

        let (events, result) = collect_stream(&client, &Request::new("hello")).await;

        match result.expect_err("should fail") {
            ChatError::Http { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("expected http error, got {other:?}"),
        }
        assert!(events.is_empty());
        assert_eq!(server.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn error_bodies_are_truncated() {
        let server = spawn_mock_server(vec![CannedResponse::json(502, &"x".repeat(20_000))]).await;
        let client = client_for(&server.base_url);

        match client.complete(&Request::new("hello")).await {
            Err(ChatError::Http { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), crate::core::transport::ERROR_BODY_LIMIT);
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_decodes_non_streaming_response() {
        let server = spawn_mock_server(vec![CannedResponse::json(
            200,
            r#"{"output_text":"Answer\n","usage":{"input_tokens":9,"output_tokens":4}}"#,
        )])
        .await;
        let client = client_for(&server.base_url);

        let completion = client
            .complete(&Request::new("hi").with_system("sys"))
            .await
            .expect("complete");

        assert_eq!(
            completion,
            Completion {
                text: "Answer".into(),
                input_tokens: 9,
                output_tokens: 4,
                fell_back: false,
            }
        );
        let requests = server.requests().await;
        assert_eq!(requests[0].body["stream"], false);
        assert_eq!(requests[0].body["instructions"], "sys");
    }

    #[tokio::test]
    async fn malformed_non_streaming_body_is_a_decode_error() {
        let server = spawn_mock_server(vec![CannedResponse::json(200, "not json")]).await;
        let client = client_for(&server.base_url);

        let err = client
            .complete(&Request::new("hi"))
            .await
            .expect_err("decode should fail");
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn turn_handle_delivers_events_then_finishes() {
        let server = spawn_mock_server(vec![CannedResponse::sse(
            "event: response.output_text.delta\ndata: {\"delta\":\"A\"}\n\
             data: {\"delta\":\"B\"}\n\
             event: response.completed\ndata: {}\n",
        )])
        .await;
        let service = ChatStreamService::new(client_for(&server.base_url));
        let mut handle = service.spawn_turn(Request::new("hi"));

        let mut seen = Vec::new();
        loop {
            match handle.next().await {
                TurnUpdate::Event(event) => seen.push(event),
                TurnUpdate::Failed(err) => panic!("unexpected failure: {err}"),
                TurnUpdate::Finished => break,
            }
        }

        assert_eq!(
            seen,
            vec![
                StreamEvent::TextDelta("A".into()),
                StreamEvent::TextDelta("B".into()),
                StreamEvent::Completed,
            ]
        );
        assert!(handle.is_finished());
        assert!(matches!(handle.next().await, TurnUpdate::Finished));
    }

    #[tokio::test]
    async fn turn_handle_reports_terminal_error_once() {
        let server =
            spawn_mock_server(vec![CannedResponse::json(429, "rate limited")]).await;
        let service = ChatStreamService::new(client_for(&server.base_url));
        let mut handle = service.spawn_turn(Request::new("hi"));

        match handle.next().await {
            TurnUpdate::Failed(ChatError::Http { status, .. }) => assert_eq!(status, 429),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(handle.next().await, TurnUpdate::Finished));
    }

    #[tokio::test]
    async fn cancelling_a_turn_stops_the_producer() {
        let server = spawn_mock_server(vec![CannedResponse::stalled_sse(
            "event: response.output_text.delta\ndata: {\"delta\":\"first\"}\n\n",
        )])
        .await;
        let service = ChatStreamService::new(client_for(&server.base_url));
        let mut handle = service.spawn_turn(Request::new("hi"));

        let first = tokio::time::timeout(Duration::from_secs(5), handle.next())
            .await
            .expect("first event");
        assert!(matches!(first, TurnUpdate::Event(StreamEvent::TextDelta(ref t)) if t == "first"));

        handle.cancel();
        let after_cancel = tokio::time::timeout(Duration::from_secs(5), handle.next())
            .await
            .expect("cancelled turn should end promptly");
        assert!(matches!(after_cancel, TurnUpdate::Finished));
    }
}
