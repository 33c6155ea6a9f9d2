//! OCR 텍스트 추출 모듈.
//!
//! `leptess` 기반 Tesseract OCR 래퍼.
//! `ocr` feature flag 활성화 시에만 빌드된다.

use std::path::PathBuf;
use thiserror::Error;

use livesub_core::models::frame::Frame;

/// OCR 에러 타입
#[derive(Debug, Error)]
pub enum OcrError {
    /// Tesseract 초기화 실패
    #[error("OCR 초기화 실패: {0}")]
    Init(String),

    /// 이미지 설정 실패
    #[error("OCR 이미지 설정 실패: {0}")]
    ImageSetup(String),

    /// 텍스트 추출 실패
    #[error("OCR 텍스트 추출 실패: {0}")]
    Extraction(String),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,

    /// 비동기 작업 실패
    #[error("OCR 비동기 작업 실패: {0}")]
    Async(String),
}

/// OCR 텍스트 추출기
#[derive(Debug, Clone)]
pub struct OcrExtractor {
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
    /// Tesseract 언어 코드 (예: "jpn")
    language: String,
}

impl OcrExtractor {
    pub fn new(tessdata_path: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            tessdata_path,
            language: language.into(),
        }
    }

    /// 프레임에서 텍스트 추출 (동기)
    pub fn extract(&self, frame: &Frame) -> Result<String, OcrError> {
        if frame.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        run_tesseract(
            tessdata.as_deref(),
            &self.language,
            frame.pixels(),
            frame.width(),
            frame.height(),
        )
    }

    /// 프레임에서 텍스트 추출 (비동기, `spawn_blocking`)
    pub async fn extract_async(&self, frame: &Frame) -> Result<String, OcrError> {
        if frame.is_empty() {
            return Err(OcrError::EmptyImage);
        }

        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        let language = self.language.clone();
        let (w, h) = frame.dimensions();
        let raw_data = frame.pixels().to_vec();

        tokio::task::spawn_blocking(move || {
            run_tesseract(tessdata.as_deref(), &language, &raw_data, w, h)
        })
        .await
        .map_err(|e| OcrError::Async(format!("작업 조인 실패: {e}")))?
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// tessdata 경로 반환
    pub fn tessdata_path(&self) -> Option<&PathBuf> {
        self.tessdata_path.as_ref()
    }
}

fn run_tesseract(
    tessdata: Option<&str>,
    language: &str,
    rgba: &[u8],
    w: u32,
    h: u32,
) -> Result<String, OcrError> {
    let mut lt =
        leptess::LepTess::new(tessdata, language).map_err(|e| OcrError::Init(format!("{e}")))?;

    lt.set_image_from_mem(rgba, w as i32, h as i32, 4, (w * 4) as i32)
        .map_err(|_| OcrError::ImageSetup("이미지 메모리 설정 실패".to_string()))?;

    let text = lt
        .get_utf8_text()
        .map_err(|e| OcrError::Extraction(format!("{e}")))?;

    Ok(text.trim().to_string())
}
