//! 프레임(스크린샷) 모델.
//!
//! 한 사이클이 캡처한 불변 이미지와 픽셀 좌표계의 직사각형,
//! 이미지 모드 번역에 쓰는 인코딩된 이미지 페이로드를 정의.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// RGBA8 바이트 수
const BYTES_PER_PIXEL: usize = 4;

/// 캡처된 프레임 (RGBA8, 행 우선)
///
/// 캡처한 사이클이 단독 소유하며, 크롭이 모두 소비되면 drop 된다.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// RGBA8 버퍼로 프레임 생성: 버퍼 길이가 `width * height * 4`와 다르면 에러
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(CoreError::Validation {
                field: "pixels".to_string(),
                message: format!(
                    "{width}x{height} 프레임은 {expected} 바이트가 필요하지만 {} 바이트가 주어짐",
                    pixels.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 단색 프레임 (테스트/빈 화면용)
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(pixel_count * BYTES_PER_PIXEL);
        for _ in 0..pixel_count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA8 원시 바이트
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// 너비 또는 높이가 0인지
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 픽셀 좌표 직사각형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// 인코딩된 이미지 (이미지 모드 번역 페이로드)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// 인코딩된 바이트 (예: WebP)
    pub data: Vec<u8>,
    /// MIME 타입 (예: "image/webp")
    pub mime_type: String,
}
