//! Blocking chat-completion client implementing [`Translator`].

use crate::config::ServiceConfig;
use deck_core::{TranslationError, Translator};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name.
    model: String,
    /// Conversation: a system instruction and the text to translate.
    messages: Vec<ChatMessage>,
    /// Sampling temperature; translation wants none.
    temperature: f32,
}

/// One message of a chat conversation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Chat completion response body; only the fields we read.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Candidate completions.
    pub choices: Vec<ChatChoice>,
}

/// One completion candidate.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message.
    pub message: ChatResponseMessage,
}

/// Assistant message in a response.
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// Text content; absent for refusals and tool calls.
    pub content: Option<String>,
}

impl ChatRequest {
    /// Build the request for translating `text` into `language`.
    pub fn translation(model: &str, text: &str, language: &str) -> Self {
        let instruction = format!(
            "You are a translation engine. Translate the user's text into {}. \
             Reply with the translation only, without quotes or commentary. \
             Keep line breaks and leave names, numbers and URLs unchanged.",
            language
        );
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: instruction,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: 0.0,
        }
    }
}

/// Translation service backed by a chat completion API.
pub struct ChatTranslator {
    /// HTTP client for API requests
    client: Client,
    config: ServiceConfig,
}

impl ChatTranslator {
    /// Create a client. The configured timeout applies to every request.
    pub fn new(config: ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

impl Translator for ChatTranslator {
    fn translate(&self, text: &str, language: &str) -> Result<String, TranslationError> {
        let request = ChatRequest::translation(&self.config.model, text, language);

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().map_err(map_transport_error)?;

        if !status.is_success() {
            log::error!("Translation API error ({}): {}", status, body);
            return Err(map_status(status, body));
        }

        parse_response(&body)
    }
}

fn map_transport_error(e: reqwest::Error) -> TranslationError {
    if e.is_timeout() {
        TranslationError::Timeout
    } else if e.is_decode() {
        TranslationError::MalformedResponse(e.to_string())
    } else {
        TranslationError::Unavailable(e.to_string())
    }
}

/// Map a non-success status to an error.
pub fn map_status(status: StatusCode, body: String) -> TranslationError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => TranslationError::RateLimited(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranslationError::Unauthorized(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TranslationError::Timeout,
        _ => TranslationError::Service {
            status: status.as_u16(),
            message: body,
        },
    }
}

/// Extract the translated text from a response body.
pub fn parse_response(body: &str) -> Result<String, TranslationError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| TranslationError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| TranslationError::MalformedResponse("no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_body() {
        let request = ChatRequest::translation("gpt-4o-mini", "Hello\nworld", "Finnish");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("into Finnish"));
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hello\nworld");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hei maailma"},"finish_reason":"stop"}],"usage":{"total_tokens":9}}"#;
        assert_eq!(parse_response(body).unwrap(), "Hei maailma");
    }

    #[test]
    fn test_parse_response_keeps_text_verbatim() {
        let body = r#"{"choices":[{"message":{"content":"  Привет \n"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "  Привет \n");
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            parse_response("<html>bad gateway</html>"),
            Err(TranslationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(TranslationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(TranslationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_map_status() {
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            TranslationError::RateLimited("slow down".into())
        );
        assert_eq!(
            map_status(StatusCode::UNAUTHORIZED, "bad key".into()),
            TranslationError::Unauthorized("bad key".into())
        );
        assert_eq!(map_status(StatusCode::GATEWAY_TIMEOUT, String::new()), TranslationError::Timeout);
        assert_eq!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "oops".into()),
            TranslationError::Service {
                status: 500,
                message: "oops".into()
            }
        );
    }

    #[test]
    fn test_unreachable_service_is_a_unit_failure() {
        let config = ServiceConfig {
            api_key: "k".into(),
            endpoint: "http://127.0.0.1:9".into(),
            model: "m".into(),
            timeout: Duration::from_secs(2),
        };
        let translator = ChatTranslator::new(config).unwrap();
        let err = translator.translate("Hello", "Finnish").unwrap_err();
        assert!(matches!(
            err,
            TranslationError::Unavailable(_) | TranslationError::Timeout
        ));
    }
}
