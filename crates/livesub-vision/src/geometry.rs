//! 영역 계산.
//!
//! `RegionLayout`의 분수 좌표를 프레임 크기에 맞춰 픽셀 좌표로 변환하고,
//! 프레임에서 영역을 잘라낸다. 프레임 크기가 바뀔 때만 다시 계산한다.

use image::{imageops, GenericImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use livesub_core::error::CoreError;
use livesub_core::models::frame::{Frame, Rect};
use livesub_core::models::region::{FractionalRect, RegionLayout};
use tracing::debug;

/// 프레임 버퍼를 복사 없이 빌려 쓰는 RGBA 이미지 뷰
pub type FrameView<'a> = ImageBuffer<Rgba<u8>, &'a [u8]>;

/// 0.69 × 200 = 137.999… 같은 오차가 한 픽셀 어긋나지 않도록 더하는 여유
const ROUNDING_SLACK: f64 = 1e-6;

/// 한 프레임 크기에 대해 계산된 픽셀 영역
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRegions {
    pub frame_width: u32,
    pub frame_height: u32,
    pub dialog_box: Rect,
    pub speaker_name: Rect,
    pub options: Rect,
    pub sentinel: Rect,
    pub sentinel_search: Rect,
    pub scene: Rect,
}

/// 분수 영역 → 픽셀 영역 (프레임 안으로 클램프)
///
/// 좌표는 `(fx·W, fy·H, fw·W, fh·H)`를 내림한 값이다 (부동소수 오차 보정 포함).
pub fn resolve_rect(fraction: FractionalRect, width: u32, height: u32) -> Rect {
    let scale = |f: f64, dim: u32| -> u32 {
        (f.clamp(0.0, 1.0) * dim as f64 + ROUNDING_SLACK).floor() as u32
    };

    let x = scale(fraction.x, width).min(width);
    let y = scale(fraction.y, height).min(height);
    let w = scale(fraction.w, width).min(width - x);
    let h = scale(fraction.h, height).min(height - y);

    Rect { x, y, w, h }
}

/// 레이아웃 전체를 한 번에 변환
pub fn resolve_regions(layout: &RegionLayout, width: u32, height: u32) -> ResolvedRegions {
    ResolvedRegions {
        frame_width: width,
        frame_height: height,
        dialog_box: resolve_rect(layout.dialog_box, width, height),
        speaker_name: resolve_rect(layout.speaker_name, width, height),
        options: resolve_rect(layout.options, width, height),
        sentinel: resolve_rect(layout.sentinel, width, height),
        sentinel_search: resolve_rect(layout.sentinel_search, width, height),
        scene: resolve_rect(layout.scene, width, height),
    }
}

/// 프레임 크기별 캐시를 가진 영역 계산기
#[derive(Debug, Clone)]
pub struct RegionResolver {
    layout: RegionLayout,
    cached: Option<ResolvedRegions>,
}

impl RegionResolver {
    pub fn new(layout: RegionLayout) -> Self {
        Self {
            layout,
            cached: None,
        }
    }

    /// 프레임 크기에 맞는 영역 반환 (크기가 같으면 캐시 사용)
    pub fn resolve(&mut self, width: u32, height: u32) -> ResolvedRegions {
        if let Some(cached) = self.cached {
            if cached.frame_width == width && cached.frame_height == height {
                return cached;
            }
        }

        let resolved = resolve_regions(&self.layout, width, height);
        debug!("영역 재계산: {width}x{height}");
        self.cached = Some(resolved);
        resolved
    }
}

/// 프레임을 `image` 뷰로 빌리기
pub fn frame_view(frame: &Frame) -> Result<FrameView<'_>, CoreError> {
    let (w, h) = frame.dimensions();
    ImageBuffer::from_raw(w, h, frame.pixels())
        .ok_or_else(|| CoreError::Internal(format!("RGBA 버퍼 크기 불일치: {w}x{h}")))
}

/// 프레임에서 영역 잘라내기
///
/// 영역은 프레임 안으로 클램프된다 (`crop_imm` 동작).
pub fn crop(frame: &Frame, rect: Rect) -> Result<Frame, CoreError> {
    let view = frame_view(frame)?;
    let region = imageops::crop_imm(&view, rect.x, rect.y, rect.w, rect.h);
    let (w, h) = region.dimensions();

    let mut cropped = RgbaImage::new(w, h);
    cropped
        .copy_from(&*region, 0, 0)
        .map_err(|e| CoreError::Internal(format!("크롭 실패: {e}")))?;
    Frame::new(w, h, cropped.into_raw())
}
