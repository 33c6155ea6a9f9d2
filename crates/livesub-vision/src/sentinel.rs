//! 센티넬 quick-reject.
//!
//! 직전에 받아들인 사이클의 센티넬 패치(축소 휘도)를 현재 프레임의
//! 탐색 창 안에서 찾는다. 패치를 타일로 나눠, 모든 타일의 평균 휘도 차이가
//! 허용치 이하인 위치가 있으면 "변경 없음"으로 보고 OCR을 건너뛴다.
//!
//! 명목 위치를 먼저 비교하고, 실패하면 탐색 창 전체를 1픽셀(축소 기준) 간격으로 훑는다.
//! 허용치를 넘는 타일이 하나라도 나오면 해당 위치 비교를 즉시 중단한다.

use image::{imageops, GrayImage};
use livesub_core::error::CoreError;
use livesub_core::models::frame::{Frame, Rect};
use tracing::debug;

use crate::geometry::{frame_view, ResolvedRegions};

/// 비교 타일 한 변 (축소 좌표)
const TILE_SIZE: u32 = 8;

/// 축소된 휘도 패치
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaPatch {
    image: GrayImage,
}

impl LumaPatch {
    /// 프레임 영역을 `factor`×`factor` 블록 평균으로 축소한 휘도 패치
    ///
    /// 블록에 못 미치는 가장자리 픽셀은 버린다.
    pub fn from_region(frame: &Frame, rect: Rect, factor: u32) -> Result<Self, CoreError> {
        let factor = factor.max(1);
        let (fw, fh) = frame.dimensions();
        let x = rect.x.min(fw);
        let y = rect.y.min(fh);
        let w = rect.w.min(fw - x) / factor;
        let h = rect.h.min(fh - y) / factor;
        if w == 0 || h == 0 {
            return Ok(Self {
                image: GrayImage::new(0, 0),
            });
        }

        // 블록 경계에 맞춰 자른 뒤 정수 배율로 면적 평균 축소
        let view = frame_view(frame)?;
        let aligned = imageops::crop_imm(&view, x, y, w * factor, h * factor);
        let gray = imageops::grayscale(&*aligned);
        let image = if factor == 1 {
            gray
        } else {
            imageops::thumbnail(&gray, w, h)
        };

        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// 다음 사이클 비교용으로 보관하는 센티넬
#[derive(Debug, Clone)]
pub struct SentinelSnapshot {
    patch: LumaPatch,
    frame_size: (u32, u32),
    /// 탐색 창 기준 명목 위치 (축소 좌표)
    nominal_offset: (u32, u32),
}

/// 센티넬 비교기
#[derive(Debug, Clone, Copy)]
pub struct SentinelMatcher {
    /// 축소 배율
    downscale: u32,
    /// 일치로 볼 타일 평균 휘도 차이 상한
    tolerance: u8,
}

impl SentinelMatcher {
    pub fn new(downscale: u32, tolerance: u8) -> Self {
        Self {
            downscale: downscale.max(1),
            tolerance,
        }
    }

    /// 현재 프레임의 센티넬 패치 저장
    ///
    /// 패치 원점은 탐색 창의 축소 격자에 맞춘다. 그래야 같은 프레임이 명목 위치에서 정확히 일치한다.
    pub fn snapshot(
        &self,
        frame: &Frame,
        regions: &ResolvedRegions,
    ) -> Result<SentinelSnapshot, CoreError> {
        let search = regions.sentinel_search;
        let sentinel = regions.sentinel;
        let nominal_offset = (
            sentinel.x.saturating_sub(search.x) / self.downscale,
            sentinel.y.saturating_sub(search.y) / self.downscale,
        );
        let aligned = Rect {
            x: search.x + nominal_offset.0 * self.downscale,
            y: search.y + nominal_offset.1 * self.downscale,
            w: sentinel.w,
            h: sentinel.h,
        };

        Ok(SentinelSnapshot {
            patch: LumaPatch::from_region(frame, aligned, self.downscale)?,
            frame_size: frame.dimensions(),
            nominal_offset,
        })
    }

    /// 이전 센티넬이 현재 프레임 탐색 창 안에 그대로 있는지
    pub fn is_unchanged(
        &self,
        previous: &SentinelSnapshot,
        frame: &Frame,
        regions: &ResolvedRegions,
    ) -> bool {
        // 해상도가 바뀌면 항상 변경
        if previous.frame_size != frame.dimensions() || previous.patch.is_empty() {
            return false;
        }

        let window = match LumaPatch::from_region(frame, regions.sentinel_search, self.downscale) {
            Ok(window) => window,
            Err(e) => {
                debug!("센티넬 탐색 창 생성 실패: {e}");
                return false;
            }
        };
        let patch = &previous.patch;
        if window.width() < patch.width() || window.height() < patch.height() {
            debug!("센티넬 탐색 창이 패치보다 작음: 변경으로 처리");
            return false;
        }

        let max_ox = window.width() - patch.width();
        let max_oy = window.height() - patch.height();
        let (nx, ny) = previous.nominal_offset;
        let (nx, ny) = (nx.min(max_ox), ny.min(max_oy));

        if self.matches_at(&window, patch, nx, ny) {
            return true;
        }

        for oy in 0..=max_oy {
            for ox in 0..=max_ox {
                if (ox, oy) == (nx, ny) {
                    continue;
                }
                if self.matches_at(&window, patch, ox, oy) {
                    debug!(offset_x = ox, offset_y = oy, "센티넬 이동 위치에서 일치");
                    return true;
                }
            }
        }

        false
    }

    /// 창의 (ox, oy) 위치에 패치를 겹쳤을 때 모든 타일이 허용치 이내인지
    fn matches_at(&self, window: &LumaPatch, patch: &LumaPatch, ox: u32, oy: u32) -> bool {
        let (pw, ph) = (patch.width(), patch.height());

        for ty in (0..ph).step_by(TILE_SIZE as usize) {
            for tx in (0..pw).step_by(TILE_SIZE as usize) {
                let ex = (tx + TILE_SIZE).min(pw);
                let ey = (ty + TILE_SIZE).min(ph);
                if self.is_tile_changed(window, patch, ox, oy, (tx, ty, ex, ey)) {
                    return false;
                }
            }
        }

        true
    }

    /// 타일 하나의 평균 절대 차이가 허용치를 넘는지
    fn is_tile_changed(
        &self,
        window: &LumaPatch,
        patch: &LumaPatch,
        ox: u32,
        oy: u32,
        (sx, sy, ex, ey): (u32, u32, u32, u32),
    ) -> bool {
        let window_stride = window.width() as usize;
        let patch_stride = patch.width() as usize;
        let window_data = window.image.as_raw();
        let patch_data = patch.image.as_raw();

        let mut diff_sum = 0u64;
        for y in sy..ey {
            let w_row = (oy + y) as usize * window_stride + ox as usize;
            let p_row = y as usize * patch_stride;
            let w_slice = &window_data[w_row + sx as usize..w_row + ex as usize];
            let p_slice = &patch_data[p_row + sx as usize..p_row + ex as usize];

            for (a, b) in w_slice.iter().zip(p_slice) {
                diff_sum += u64::from(a.abs_diff(*b));
            }
        }

        let pixel_count = u64::from((ex - sx) * (ey - sy));
        diff_sum > u64::from(self.tolerance) * pixel_count
    }
}
