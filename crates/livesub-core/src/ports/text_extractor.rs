//! 텍스트 추출(OCR) 포트.
//!
//! 구현: `livesub-vision::local_text_extractor::LocalTextExtractor` (Tesseract)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::Frame;

/// 텍스트 추출기: 영역 크롭에서 인식된 텍스트 반환
///
/// 텍스트가 없으면 빈 문자열을 반환하며 에러가 아니다.
/// 에러는 엔진 자체의 실패에만 사용하고, 파이프라인은 이를 빈 텍스트로 취급한다.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 영역 이미지에서 텍스트 추출
    async fn extract_text(&self, region: &Frame) -> Result<String, CoreError>;

    /// 제공자 이름 (예: "local-tesseract")
    fn provider_name(&self) -> &str;
}
