//! 번역 백엔드 포트.
//!
//! 구현: `livesub-network::gemini_translator::GeminiTranslator`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::EncodedImage;

/// 번역 백엔드
///
/// - 빈 입력은 로컬 no-op (`Ok(None)`), 백엔드를 호출하지 않는다
/// - `Ok(Some("Null"))` / `Ok(Some("Null Quota"))`는 센티넬로 해석된다
/// - 할당량 초과는 `CoreError::RateLimit`으로도 보고할 수 있다
/// - 취소는 호출 future를 drop 하는 방식으로 이뤄진다
#[async_trait]
pub trait Translator: Send + Sync {
    /// 텍스트 번역
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Option<String>, CoreError>;

    /// 장면 이미지 속 텍스트 번역
    async fn translate_image(
        &self,
        image: &EncodedImage,
        target_language: &str,
    ) -> Result<Option<String>, CoreError>;

    /// 제공자 이름 (예: "gemini-2.0-flash")
    fn provider_name(&self) -> &str;
}
