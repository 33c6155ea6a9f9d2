//! 분수 좌표 영역 테이블.
//!
//! 대사 박스, 화자 이름, 선택지, 센티넬 등 이름 붙은 영역을
//! 프레임 크기에 대한 비율로 정의한다. 픽셀 변환은 `livesub-vision::geometry` 담당.

use serde::{Deserialize, Serialize};

/// 프레임 크기 대비 비율 직사각형 (각 값 0.0 ~ 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionalRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FractionalRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// 모든 값이 [0, 1] 범위이고 면적이 양수인지
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x) && in_unit(self.y) && in_unit(self.w) && in_unit(self.h)
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// 이름 붙은 영역 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// 대사 본문
    DialogBox,
    /// 화자 이름
    SpeakerName,
    /// 선택지 (화면 상단)
    Options,
    /// quick-reject용 센티넬 패치
    Sentinel,
    /// 센티넬 탐색 창
    SentinelSearch,
    /// 이미지 모드 번역 대상 장면
    Scene,
}

/// 영역 테이블: 설정 데이터로 취급
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionLayout {
    #[serde(default = "default_dialog_box")]
    pub dialog_box: FractionalRect,
    #[serde(default = "default_speaker_name")]
    pub speaker_name: FractionalRect,
    #[serde(default = "default_options")]
    pub options: FractionalRect,
    #[serde(default = "default_sentinel")]
    pub sentinel: FractionalRect,
    /// 센티넬 패치를 포함하도록 여유를 둔 탐색 창
    #[serde(default = "default_sentinel_search")]
    pub sentinel_search: FractionalRect,
    #[serde(default = "default_scene")]
    pub scene: FractionalRect,
}

fn default_dialog_box() -> FractionalRect {
    FractionalRect::new(0.12, 0.76, 0.58, 0.23)
}
fn default_speaker_name() -> FractionalRect {
    FractionalRect::new(0.09, 0.67, 0.60, 0.10)
}
fn default_options() -> FractionalRect {
    FractionalRect::new(0.12, 0.0, 0.58, 0.66)
}
fn default_sentinel() -> FractionalRect {
    FractionalRect::new(0.14, 0.69, 0.25, 0.25)
}
fn default_sentinel_search() -> FractionalRect {
    FractionalRect::new(0.13, 0.60, 0.30, 0.36)
}
fn default_scene() -> FractionalRect {
    FractionalRect::new(0.10, 0.10, 0.60, 0.90)
}

impl Default for RegionLayout {
    fn default() -> Self {
        Self {
            dialog_box: default_dialog_box(),
            speaker_name: default_speaker_name(),
            options: default_options(),
            sentinel: default_sentinel(),
            sentinel_search: default_sentinel_search(),
            scene: default_scene(),
        }
    }
}

impl RegionLayout {
    /// 종류별 비율 영역 조회
    pub fn get(&self, kind: RegionKind) -> FractionalRect {
        match kind {
            RegionKind::DialogBox => self.dialog_box,
            RegionKind::SpeakerName => self.speaker_name,
            RegionKind::Options => self.options,
            RegionKind::Sentinel => self.sentinel,
            RegionKind::SentinelSearch => self.sentinel_search,
            RegionKind::Scene => self.scene,
        }
    }

    /// 유효하지 않은 첫 영역 반환
    pub fn first_invalid(&self) -> Option<RegionKind> {
        [
            RegionKind::DialogBox,
            RegionKind::SpeakerName,
            RegionKind::Options,
            RegionKind::Sentinel,
            RegionKind::SentinelSearch,
            RegionKind::Scene,
        ]
        .into_iter()
        .find(|kind| !self.get(*kind).is_valid())
    }
}
