//! WebP 인코더.
//!
//! 이미지 모드 번역에 보낼 장면 크롭을 WebP로 인코딩한다.
//! 긴 변이 `max_dimension`을 넘으면 비율을 유지해 축소한 뒤 인코딩.

use image::imageops::{self, FilterType};
use livesub_core::error::CoreError;
use livesub_core::models::frame::{EncodedImage, Frame};
use tracing::debug;

use crate::geometry::frame_view;

/// WebP MIME 타입
pub const WEBP_MIME_TYPE: &str = "image/webp";

/// WebP 품질 프리셋
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebPQuality {
    /// 낮은 품질 (60%)
    Low = 60,
    /// 높은 품질 (85%): 대사 글자가 뭉개지지 않도록 기본값
    High = 85,
}

/// 장면 이미지 인코더
#[derive(Debug, Clone, Copy)]
pub struct SceneEncoder {
    quality: WebPQuality,
    /// 긴 변 최대 픽셀 (0이면 축소하지 않음)
    max_dimension: u32,
}

impl SceneEncoder {
    pub fn new(quality: WebPQuality, max_dimension: u32) -> Self {
        Self {
            quality,
            max_dimension,
        }
    }

    /// 프레임을 WebP `EncodedImage`로 인코딩
    pub fn encode(&self, frame: &Frame) -> Result<EncodedImage, CoreError> {
        if frame.is_empty() {
            return Err(CoreError::Validation {
                field: "frame".to_string(),
                message: "빈 프레임은 인코딩할 수 없음".to_string(),
            });
        }

        let (w, h) = frame.dimensions();
        let (tw, th) = fit_within(w, h, self.max_dimension);

        let data = if (tw, th) == (w, h) {
            encode_webp(frame.pixels(), w, h, self.quality)
        } else {
            let source = frame_view(frame)?;
            let resized = imageops::resize(&source, tw, th, FilterType::Triangle);
            encode_webp(resized.as_raw(), tw, th, self.quality)
        };

        debug!(
            "WebP 인코딩: {}x{} → {}x{} → {} bytes (품질 {})",
            w,
            h,
            tw,
            th,
            data.len(),
            self.quality as u8
        );

        Ok(EncodedImage {
            data,
            mime_type: WEBP_MIME_TYPE.to_string(),
        })
    }
}

impl Default for SceneEncoder {
    fn default() -> Self {
        Self::new(WebPQuality::High, 1280)
    }
}

/// RGBA8 버퍼 WebP 인코딩
pub fn encode_webp(rgba: &[u8], width: u32, height: u32, quality: WebPQuality) -> Vec<u8> {
    let encoder = webp::Encoder::from_rgba(rgba, width, height);
    encoder.encode(quality as u8 as f32).to_vec()
}

/// 긴 변이 `max_dimension` 이하가 되도록 비율 유지 축소한 크기
fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}
