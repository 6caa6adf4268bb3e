use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{PilotError, PilotResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunkKind};

const OMITTED_IMAGE: &str = "<omitted_base64_image>";

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: String) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(&self, messages: &[ChatMessage], cfg: &CallConfig) -> PilotResult<LlmResponse> {
        let body = build_request_body(messages, cfg);

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            messages = messages.len(),
            "sending LLM request"
        );
        tracing::debug!(
            body = %serde_json::to_string(&redact_images(&body)).unwrap_or_default(),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;

        if cfg.stream {
            self.handle_stream(response).await
        } else {
            self.handle_json(response).await
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Accumulate an SSE response into a single reply.
    ///
    /// Bytes are buffered until a full line has arrived, so a multi-byte
    /// character split across network chunks is decoded intact.
    async fn handle_stream(&self, response: reqwest::Response) -> PilotResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut acc = StreamAccumulator::default();

        'stream: while let Some(result) = byte_stream.next().await {
            pending.extend_from_slice(&result?);
            while let Some(line) = take_line(&mut pending) {
                if acc.feed(&line) {
                    break 'stream;
                }
            }
        }
        // A last line without a trailing newline.
        if !acc.done && !pending.is_empty() {
            let line = String::from_utf8_lossy(&pending).into_owned();
            acc.feed(&line);
        }

        tracing::info!(
            provider = %self.id,
            content_len = acc.content.len(),
            reasoning_len = acc.reasoning.len(),
            "LLM stream complete"
        );

        Ok(LlmResponse {
            content: if acc.content.is_empty() { None } else { Some(acc.content) },
            reasoning: acc.reasoning,
        })
    }

    /// Handle a non-streaming JSON response.
    async fn handle_json(&self, response: reqwest::Response) -> PilotResult<LlmResponse> {
        let json: serde_json::Value = response.json().await?;
        let parsed = parse_completion(&json);
        tracing::info!(
            provider = %self.id,
            content_len = parsed.content.as_deref().map(str::len).unwrap_or(0),
            "LLM JSON response received"
        );
        Ok(parsed)
    }
}

/// Turn a non-2xx reply into an `LlmProvider` error carrying status and body.
async fn check_status(response: reqwest::Response) -> PilotResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let err_body = response.text().await.unwrap_or_default();
    Err(PilotError::LlmProvider(format!("{status}: {err_body}")))
}

#[derive(Default)]
struct StreamAccumulator {
    content: String,
    reasoning: String,
    done: bool,
}

impl StreamAccumulator {
    /// Apply one SSE line. Returns true once `[DONE]` has been seen.
    fn feed(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return self.done;
        }
        match sse_parser::parse_sse_line(line) {
            Ok(Some(chunk)) => match chunk.kind {
                StreamChunkKind::Reasoning => self.reasoning.push_str(&chunk.content),
                StreamChunkKind::Content => self.content.push_str(&chunk.content),
                StreamChunkKind::Done => self.done = true,
            },
            Ok(None) => {}
            Err(e) => tracing::debug!("SSE parse skipped: {e}"),
        }
        self.done
    }
}

/// Remove and decode the first complete line from `pending`, if any.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|b| *b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=end).collect();
    Some(String::from_utf8_lossy(&line[..end]).into_owned())
}

fn build_request_body(messages: &[ChatMessage], cfg: &CallConfig) -> serde_json::Value {
    serde_json::json!({
        "model": cfg.model,
        "messages": messages,
        "stream": cfg.stream,
        "temperature": cfg.temperature,
        "max_tokens": cfg.max_tokens,
    })
}

fn parse_completion(json: &serde_json::Value) -> LlmResponse {
    let message = &json["choices"][0]["message"];
    LlmResponse {
        content: message["content"].as_str().map(str::to_string),
        reasoning: message["reasoning_content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
    }
}

/// Copy of a request body with every `image_url` payload replaced, for logging.
fn redact_images(body: &serde_json::Value) -> serde_json::Value {
    let mut log_body = body.clone();
    let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) else {
        return log_body;
    };
    for msg in msgs {
        // Only the parts-array form can carry images.
        let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
            continue;
        };
        for part in parts {
            if part.get("type").and_then(|t| t.as_str()) != Some("image_url") {
                continue;
            }
            if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                *url = serde_json::Value::String(OMITTED_IMAGE.to_string());
            }
        }
    }
    log_body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{ContentPart, ImageUrl};

    fn cfg() -> CallConfig {
        CallConfig {
            model: "gpt-4o".into(),
            stream: false,
            temperature: 0.1,
            max_tokens: 1000,
        }
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("rules"),
            ChatMessage::user_parts(vec![
                ContentPart::Text { text: "screen".into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: "data:image/png;base64,SECRET".into() },
                },
            ]),
        ]
    }

    #[test]
    fn request_body_carries_call_settings() {
        let body = build_request_body(&conversation(), &cfg());
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn redaction_hides_images_but_keeps_text() {
        let body = build_request_body(&conversation(), &cfg());
        let redacted = redact_images(&body);
        let logged = serde_json::to_string(&redacted).unwrap();
        assert!(!logged.contains("SECRET"));
        assert!(logged.contains(OMITTED_IMAGE));
        assert_eq!(redacted["messages"][1]["content"][0]["text"], "screen");
        // The real body is untouched.
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,SECRET"
        );
    }

    #[test]
    fn completion_content_extracted() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"thought\":\"x\"}"}}]
        });
        let resp = parse_completion(&json);
        assert_eq!(resp.content.as_deref(), Some("{\"thought\":\"x\"}"));
    }

    #[test]
    fn null_content_is_absent() {
        let json = serde_json::json!({"choices": [{"message": {"content": null}}]});
        assert!(parse_completion(&json).content.is_none());
    }

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("test".into(), "http://127.0.0.1:1".into(), "k".into())
    }

    /// A 200 response whose body arrives as the given byte chunks.
    fn streamed(chunks: Vec<Vec<u8>>) -> reqwest::Response {
        let stream = futures_util::stream::iter(
            chunks.into_iter().map(Ok::<Vec<u8>, std::io::Error>),
        );
        let body = reqwest::Body::wrap_stream(stream);
        reqwest::Response::from(http::Response::new(body))
    }

    fn delta(field: &str, text: &str) -> String {
        let mut delta = serde_json::Map::new();
        delta.insert(field.to_string(), text.into());
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": delta}]})
        )
    }

    #[tokio::test]
    async fn stream_keeps_characters_split_across_chunks() {
        let body = format!("{}data: [DONE]\n\n", delta("content", "é"));
        let bytes = body.into_bytes();
        // Cut between the two bytes of 'é' (0xC3 0xA9).
        let cut = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let resp = streamed(vec![bytes[..cut].to_vec(), bytes[cut..].to_vec()]);

        let out = provider().handle_stream(resp).await.unwrap();
        assert_eq!(out.content.as_deref(), Some("é"));
    }

    #[tokio::test]
    async fn stream_accumulates_deltas_and_lines_split_mid_way() {
        let first = delta("content", "{\"thought\":");
        let second = delta("content", "\"héllo\"}");
        let (a, b) = second.split_at(10);
        let resp = streamed(vec![
            first.into_bytes(),
            a.as_bytes().to_vec(),
            b.as_bytes().to_vec(),
            b"data: [DONE]\n\n".to_vec(),
        ]);

        let out = provider().handle_stream(resp).await.unwrap();
        assert_eq!(out.content.as_deref(), Some("{\"thought\":\"héllo\"}"));
    }

    #[tokio::test]
    async fn stream_stops_at_done_and_separates_reasoning() {
        let body = format!(
            "{}{}data: [DONE]\n\n{}",
            delta("reasoning_content", "look at the dialog"),
            delta("content", "ok"),
            delta("content", " ignored"),
        );
        let out = provider()
            .handle_stream(streamed(vec![body.into_bytes()]))
            .await
            .unwrap();
        assert_eq!(out.content.as_deref(), Some("ok"));
        assert_eq!(out.reasoning, "look at the dialog");
    }

    #[tokio::test]
    async fn keep_alive_only_stream_has_no_content() {
        let resp = streamed(vec![b": keep-alive\n\n".to_vec(), b": keep-alive\n".to_vec()]);
        let out = provider().handle_stream(resp).await.unwrap();
        assert!(out.content.is_none());
        assert!(out.reasoning.is_empty());
    }

    #[tokio::test]
    async fn final_line_without_newline_is_used() {
        let body = delta("content", "tail");
        let resp = streamed(vec![body.trim_end().as_bytes().to_vec()]);
        let out = provider().handle_stream(resp).await.unwrap();
        assert_eq!(out.content.as_deref(), Some("tail"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_provider_error() {
        let resp = reqwest::Response::from(
            http::Response::builder()
                .status(503)
                .body("model overloaded")
                .unwrap(),
        );
        let err = check_status(resp).await.unwrap_err();
        match err {
            PilotError::LlmProvider(msg) => {
                assert!(msg.contains("503"), "{msg}");
                assert!(msg.contains("model overloaded"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn success_status_passes_through() {
        let resp = reqwest::Response::from(http::Response::new("{}"));
        assert!(check_status(resp).await.is_ok());
    }
}
