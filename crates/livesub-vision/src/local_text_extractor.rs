//! 로컬 텍스트 추출기: Tesseract 래퍼.
//!
//! `OcrExtractor`를 `TextExtractor` 포트로 감싼다.
//! `ocr` feature가 꺼져 있으면 항상 빈 문자열을 반환한다.

use std::time::Duration;

use async_trait::async_trait;

use livesub_core::config::OcrConfig;
use livesub_core::error::CoreError;
use livesub_core::models::frame::Frame;
use livesub_core::ports::text_extractor::TextExtractor;

// ============================================================
// LocalTextExtractor: Tesseract 래퍼
// ============================================================

/// 로컬 텍스트 추출기 (Tesseract 기반)
///
/// 영역당 인식 시간은 `timeout`으로 제한되며, 초과하면 `OcrError`를 반환한다.
pub struct LocalTextExtractor {
    #[cfg(feature = "ocr")]
    extractor: crate::ocr::OcrExtractor,
    timeout: Duration,
}

impl LocalTextExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        #[cfg(not(feature = "ocr"))]
        tracing::warn!("ocr feature 없이 빌드됨: 모든 영역이 빈 텍스트로 인식됩니다");

        Self {
            #[cfg(feature = "ocr")]
            extractor: crate::ocr::OcrExtractor::new(
                config.tessdata_path.clone(),
                config.language.clone(),
            ),
            timeout: config.timeout(),
        }
    }

    /// OCR 엔진이 빌드에 포함되어 있는지
    pub fn is_available() -> bool {
        cfg!(feature = "ocr")
    }
}

impl Default for LocalTextExtractor {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

#[async_trait]
impl TextExtractor for LocalTextExtractor {
    async fn extract_text(&self, region: &Frame) -> Result<String, CoreError> {
        if region.is_empty() {
            return Ok(String::new());
        }

        #[cfg(feature = "ocr")]
        {
            let recognition = self.extractor.extract_async(region);
            match tokio::time::timeout(self.timeout, recognition).await {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(e)) => Err(CoreError::OcrError(e.to_string())),
                Err(_) => {
                    tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "OCR 타임아웃");
                    Err(CoreError::OcrError("인식 타임아웃".to_string()))
                }
            }
        }

        #[cfg(not(feature = "ocr"))]
        {
            let _ = self.timeout;
            tracing::trace!("ocr feature 비활성화: 빈 텍스트 반환");
            Ok(String::new())
        }
    }

    fn provider_name(&self) -> &str {
        "local-tesseract"
    }
}
