//! # livesub-vision
//!
//! 이미지 처리 크레이트.
//! 스크린 캡처, 분수 영역 → 픽셀 좌표 변환, 크롭, 센티넬 quick-reject,
//! 문자열 유사도, 이미지 모드용 WebP 인코딩, Tesseract OCR을 담당한다.

pub mod capture;
pub mod encoder;
pub mod geometry;
pub mod local_text_extractor;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod sentinel;
pub mod similarity;
