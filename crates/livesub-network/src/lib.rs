//! # livesub-network
//!
//! 번역 백엔드 네트워크 어댑터.
//! Gemini `generateContent` REST API를 호출해 OCR 텍스트 또는 장면 이미지를
//! 대상 언어로 번역한다. 멀티턴 모드에서는 대화 기록을 문맥으로 함께 보낸다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use livesub_network::gemini_translator::GeminiTranslator;
//!
//! let translator = GeminiTranslator::new(&config.translation)?;
//! let text = translator.translate("ようこそ", "French").await?;
//! ```

pub mod gemini_translator;
