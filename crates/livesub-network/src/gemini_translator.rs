//! Gemini 번역 클라이언트.
//!
//! `POST {endpoint}/models/{model}:generateContent` 로 OCR 텍스트 또는
//! 장면 이미지를 보내고, 첫 후보의 텍스트 파트를 번역문으로 사용한다.
//! 취소는 호출 future를 drop 하는 방식이며, 멀티턴 기록은 성공한 응답만 남긴다.

use std::collections::VecDeque;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, warn};

use livesub_core::config::TranslationConfig;
use livesub_core::error::CoreError;
use livesub_core::models::frame::EncodedImage;
use livesub_core::ports::translator::Translator;

/// 429 응답에 Retry-After가 없을 때 가정하는 대기 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 3;

/// API 키 헤더
const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================
// ChatHistory: 멀티턴 대화 기록
// ============================================================

/// 한 번의 교환 (사용자 파트 + 모델 응답)
#[derive(Debug, Clone)]
struct ChatTurn {
    user_parts: Value,
    model_text: String,
}

/// 최대 교환 수가 제한된 대화 기록
#[derive(Debug, Default)]
struct ChatHistory {
    turns: VecDeque<ChatTurn>,
}

impl ChatHistory {
    fn push(&mut self, turn: ChatTurn, max_turns: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            self.turns.pop_front();
        }
    }

    /// `contents` 배열 (기록 + 현재 사용자 메시지)
    fn contents_with(&self, user_parts: &Value) -> Vec<Value> {
        let mut contents = Vec::with_capacity(self.turns.len() * 2 + 1);
        for turn in &self.turns {
            contents.push(json!({ "role": "user", "parts": turn.user_parts }));
            contents.push(json!({ "role": "model", "parts": [{ "text": turn.model_text }] }));
        }
        contents.push(json!({ "role": "user", "parts": user_parts }));
        contents
    }

    fn len(&self) -> usize {
        self.turns.len()
    }
}

/// 대화 종류: 텍스트와 이미지 기록은 분리된다
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversation {
    Text,
    Image,
}

// ============================================================
// GeminiTranslator
// ============================================================

/// Gemini REST 번역 클라이언트
///
/// **보안**: API 키는 메모리에만 유지하며 로그에 남기지 않는다.
#[derive(Debug)]
pub struct GeminiTranslator {
    /// HTTP 클라이언트
    http_client: reqwest::Client,
    /// API 베이스 URL (예: `https://generativelanguage.googleapis.com/v1beta`)
    endpoint: String,
    api_key: String,
    /// 텍스트 번역 모델
    model: String,
    /// 이미지 번역 모델
    image_model: String,
    temperature: f64,
    text_instruction: String,
    image_instruction: String,
    /// 멀티턴 모드
    chat_mode: bool,
    max_history_turns: usize,
    text_history: Mutex<ChatHistory>,
    image_history: Mutex<ChatHistory>,
}

impl GeminiTranslator {
    /// 새 GeminiTranslator 생성: API 키가 없으면 `CoreError::Config`
    pub fn new(config: &TranslationConfig) -> Result<Self, CoreError> {
        if !config.has_api_key() {
            return Err(CoreError::Config(
                "Gemini API 키 미설정. config.json의 translation.api_key 또는 GEMINI_API_KEY를 설정하세요."
                    .into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            image_model = %config.image_model,
            chat_mode = config.chat_mode,
            timeout = config.timeout_secs,
            "GeminiTranslator 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            temperature: config.temperature,
            text_instruction: config.text_instruction.clone(),
            image_instruction: config.image_instruction.clone(),
            chat_mode: config.chat_mode,
            max_history_turns: config.max_history_turns,
            text_history: Mutex::new(ChatHistory::default()),
            image_history: Mutex::new(ChatHistory::default()),
        })
    }

    /// 텍스트 번역 프롬프트
    fn text_prompt(text: &str, target_language: &str) -> String {
        format!("Target language: {target_language}, text to be translated: \"{text}\"")
    }

    /// 이미지 번역 프롬프트
    fn image_prompt(target_language: &str) -> String {
        format!("Target language: {target_language}")
    }

    fn model_for(&self, conversation: Conversation) -> &str {
        match conversation {
            Conversation::Text => &self.model,
            Conversation::Image => &self.image_model,
        }
    }

    fn history_for(&self, conversation: Conversation) -> &Mutex<ChatHistory> {
        match conversation {
            Conversation::Text => &self.text_history,
            Conversation::Image => &self.image_history,
        }
    }

    /// 현재 기록된 교환 수 (텍스트, 이미지)
    pub fn history_len(&self) -> (usize, usize) {
        (self.text_history.lock().len(), self.image_history.lock().len())
    }

    /// 요청 본문 구성
    fn build_request_body(&self, conversation: Conversation, user_parts: &Value) -> Value {
        let instruction = match conversation {
            Conversation::Text => &self.text_instruction,
            Conversation::Image => &self.image_instruction,
        };

        let contents = if self.chat_mode {
            self.history_for(conversation).lock().contents_with(user_parts)
        } else {
            vec![json!({ "role": "user", "parts": user_parts })]
        };

        json!({
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "contents": contents,
            "generationConfig": { "temperature": self.temperature }
        })
    }

    /// 응답 파싱: `candidates[0].content.parts[*].text`를 이어 붙임
    ///
    /// 후보나 텍스트가 없으면 `None`.
    fn parse_response(body: &str) -> Result<Option<String>, CoreError> {
        let response: Value = serde_json::from_str(body)
            .map_err(|e| CoreError::Network(format!("Gemini 응답 JSON 파싱 실패: {}", e)))?;

        let parts = response
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|p| p.as_array());

        let Some(parts) = parts else {
            if let Some(reason) = response
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
            {
                warn!(block_reason = %reason, "Gemini 요청 차단됨");
            }
            return Ok(None);
        };

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
        let text = text.trim();

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text.to_string()))
        }
    }

    /// Retry-After 헤더 (초): 없거나 해석 불가면 기본값
    fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }

    /// generateContent 호출
    async fn generate(
        &self,
        conversation: Conversation,
        user_parts: Value,
    ) -> Result<Option<String>, CoreError> {
        let model = self.model_for(conversation);
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let request_body = self.build_request_body(conversation, &user_parts);

        debug!(
            endpoint = %self.endpoint,
            model = %model,
            conversation = ?conversation,
            "Gemini API 호출"
        );

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("Gemini API 호출 실패: {}", e)))?;

        let status = response.status();
        let retry_after = Self::retry_after_secs(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("Gemini API 응답 읽기 실패: {}", e)))?;

        match status.as_u16() {
            200..=299 => {}
            429 => {
                warn!(retry_after_secs = retry_after, "Gemini 할당량 초과");
                return Err(CoreError::RateLimit {
                    retry_after_secs: retry_after,
                });
            }
            503 => {
                warn!(status = %status, "Gemini 서비스 일시 불가");
                return Err(CoreError::ServiceUnavailable(
                    body.chars().take(200).collect(),
                ));
            }
            _ => {
                warn!(status = %status, "Gemini API 오류 응답");
                return Err(CoreError::Network(format!(
                    "Gemini API 오류 ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                )));
            }
        }

        let translated = Self::parse_response(&body)?;

        if self.chat_mode {
            if let Some(text) = &translated {
                self.history_for(conversation).lock().push(
                    ChatTurn {
                        user_parts,
                        model_text: text.clone(),
                    },
                    self.max_history_turns,
                );
            }
        }

        debug!(
            chars = translated.as_deref().map(|t| t.chars().count()).unwrap_or(0),
            "Gemini 번역 완료"
        );

        Ok(translated)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Option<String>, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let parts = json!([{ "text": Self::text_prompt(text, target_language) }]);
        self.generate(Conversation::Text, parts).await
    }

    async fn translate_image(
        &self,
        image: &EncodedImage,
        target_language: &str,
    ) -> Result<Option<String>, CoreError> {
        if image.data.is_empty() {
            return Ok(None);
        }

        let parts = json!([
            {
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": B64.encode(&image.data)
                }
            },
            { "text": Self::image_prompt(target_language) }
        ]);
        self.generate(Conversation::Image, parts).await
    }

    fn provider_name(&self) -> &str {
        &self.model
    }
}

// ============================================================
// 테스트
// ============================================================
