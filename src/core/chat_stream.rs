use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::gemini::{GeminiRequest, GeminiStreamResponse};
use crate::api::{ChatRequest, ChatResponse};
use crate::core::message::Message;
use crate::core::providers::{EndpointFamily, ModelHandle, ProviderError};
use crate::utils::auth::add_auth_headers;
use crate::utils::sse::{SseDecoder, SseLine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// The provider accepted the request; chunks follow.
    Opened,
    Chunk(String),
    Error(String),
    End,
}

#[derive(Debug)]
pub enum TransportError {
    Network(reqwest::Error),
    /// Non-success HTTP status before any text was produced.
    Rejected { status: u16, detail: String },
    /// An error object delivered inside the event stream.
    Provider(String),
    Malformed(String),
    Endpoint(ProviderError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(err) => write!(f, "Network error: {err}"),
            TransportError::Rejected { status, detail } => {
                write!(f, "HTTP {status}: {detail}")
            }
            TransportError::Provider(detail) => f.write_str(detail),
            TransportError::Malformed(detail) => write!(f, "Malformed stream: {detail}"),
            TransportError::Endpoint(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Network(err) => Some(err),
            TransportError::Endpoint(err) => Some(err),
            _ => None,
        }
    }
}

pub type ChunkStream = BoxStream<'static, Result<String, TransportError>>;

/// Opens a streaming completion and yields text fragments in emission order.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(
        &self,
        handle: &ModelHandle,
        messages: &[Message],
    ) -> Result<ChunkStream, TransportError>;
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Condense a provider error body into a single log-friendly line.
pub(crate) fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
        return json_value.to_string();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

enum Payload {
    Text(String),
    Skip,
    Done,
    Failed(TransportError),
}

fn parse_payload(family: EndpointFamily, line: SseLine) -> Payload {
    let data = match line {
        SseLine::Data(data) => data,
        SseLine::Invalid => {
            return Payload::Failed(TransportError::Malformed("invalid UTF-8".into()))
        }
    };

    if data.trim().is_empty() {
        return Payload::Skip;
    }
    if family == EndpointFamily::OpenAiCompatible && data == "[DONE]" {
        return Payload::Done;
    }

    let value: serde_json::Value = match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => return Payload::Failed(TransportError::Malformed(format!("{err}: {data}"))),
    };
    if value.get("error").is_some() {
        return Payload::Failed(TransportError::Provider(format_api_error(&data)));
    }

    let text = match family {
        EndpointFamily::OpenAiCompatible => serde_json::from_value::<ChatResponse>(value)
            .map(|response| {
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
            }),
        EndpointFamily::Gemini => {
            serde_json::from_value::<GeminiStreamResponse>(value).map(|response| response.text())
        }
    };

    match text {
        Ok(Some(text)) if !text.is_empty() => Payload::Text(text),
        Ok(_) => Payload::Skip,
        Err(err) => Payload::Failed(TransportError::Malformed(err.to_string())),
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    family: EndpointFamily,
    queued: VecDeque<Result<String, TransportError>>,
    /// No more input will be read; drain `queued` and stop.
    done: bool,
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, lines: impl IntoIterator<Item = SseLine>) {
        for line in lines {
            if self.done {
                return;
            }
            match parse_payload(self.family, line) {
                Payload::Text(text) => self.queued.push_back(Ok(text)),
                Payload::Skip => {}
                Payload::Done => self.done = true,
                Payload::Failed(err) => {
                    self.queued.push_back(Err(err));
                    self.done = true;
                }
            }
        }
    }
}

/// Turn a raw SSE byte stream into text fragments. The stream ends after the
/// first error.
pub fn decode_event_stream<S, B, E>(bytes: S, family: EndpointFamily) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<TransportError> + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        family,
        queued: VecDeque::new(),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queued.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.push(chunk.as_ref());
                    state.enqueue(lines);
                }
                Some(Err(err)) => {
                    state.queued.push_back(Err(err.into()));
                    state.done = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.enqueue(tail);
                    state.done = true;
                }
            }
        }
    }))
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err)
    }
}

/// Talks to providers over HTTPS with `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(
        &self,
        handle: &ModelHandle,
        messages: &[Message],
    ) -> Result<ChunkStream, TransportError> {
        let url = handle.stream_url().map_err(TransportError::Endpoint)?;
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        let request = add_auth_headers(request, handle.family, &handle.secret);
        let request = match handle.family {
            EndpointFamily::OpenAiCompatible => {
                request.json(&ChatRequest::streaming(&handle.model, messages))
            }
            EndpointFamily::Gemini => request.json(&GeminiRequest::from_messages(messages)),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(TransportError::Rejected {
                status,
                detail: format_api_error(&body),
            });
        }

        Ok(decode_event_stream(
            response.bytes_stream(),
            handle.family,
        ))
    }
}

pub struct StreamParams {
    pub handle: ModelHandle,
    pub messages: Vec<Message>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

impl fmt::Debug for StreamParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamParams")
            .field("handle", &self.handle)
            .field("messages", &self.messages.len())
            .field("stream_id", &self.stream_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    transport: Arc<dyn ChatTransport>,
}

impl ChatStreamService {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, transport }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(run_stream(transport, params, tx));
    }
}

/// Drive one stream to completion, reporting every step on `tx`.
///
/// Every outcome ends with [`StreamMessage::End`] unless the stream was
/// cancelled.
pub async fn run_stream(
    transport: Arc<dyn ChatTransport>,
    params: StreamParams,
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
) {
    let StreamParams {
        handle,
        messages,
        cancel_token,
        stream_id,
    } = params;

    let send = |message: StreamMessage| {
        let _ = tx.send((message, stream_id));
    };

    tokio::select! {
        _ = async {
            debug!(
                provider = %handle.provider,
                model = %handle.model,
                stream_id,
                messages = messages.len(),
                "Opening stream"
            );
            let mut chunks = match transport.open(&handle, &messages).await {
                Ok(chunks) => chunks,
                Err(err) => {
                    warn!(provider = %handle.provider, stream_id, error = %err, "Stream request failed");
                    send(StreamMessage::Error(err.to_string()));
                    send(StreamMessage::End);
                    return;
                }
            };
            send(StreamMessage::Opened);

            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) => send(StreamMessage::Chunk(text)),
                    Err(err) => {
                        warn!(provider = %handle.provider, stream_id, error = %err, "Stream failed mid-response");
                        send(StreamMessage::Error(err.to_string()));
                        break;
                    }
                }
            }
            send(StreamMessage::End);
        } => {}
        _ = cancel_token.cancelled() => {
            debug!(stream_id, "Stream cancelled");
        }
    }
}
