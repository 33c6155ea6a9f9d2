//! 애플리케이션 설정 구조체.
//!
//! 번역 백엔드, 캡처 영역, 변경 감지, OCR, 자막 렌더러 설정을 정의한다.
//! `ConfigManager`가 JSON 파일에서 로드하며, 모든 필드에 기본값이 있어
//! 일부만 적힌 설정 파일도 로드된다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::region::RegionLayout;

/// API 키 자리표시자: 미설정으로 취급
pub const API_KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 번역 백엔드 설정
    #[serde(default)]
    pub translation: TranslationConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 변경 감지/디스패치 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// OCR 설정
    #[serde(default)]
    pub ocr: OcrConfig,
    /// 자막 렌더러 설정
    #[serde(default)]
    pub subtitle: SubtitleConfig,
}

// ============================================================
// 번역 설정
// ============================================================

/// 번역 백엔드 (Gemini) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// API 키 (빈 값 또는 자리표시자면 시작 불가)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// REST 엔드포인트 베이스 URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// 텍스트 번역 모델
    #[serde(default = "default_model")]
    pub model: String,
    /// 이미지 번역 모델
    #[serde(default = "default_model")]
    pub image_model: String,
    /// 번역 대상 언어
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// 멀티턴 모드: 이전 대화를 문맥으로 유지
    #[serde(default)]
    pub chat_mode: bool,
    /// 이미지 입력 모드: OCR 텍스트 대신 장면 이미지를 전송
    #[serde(default)]
    pub image_input: bool,
    /// 생성 온도
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 멀티턴 모드에서 유지할 최대 교환 수
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// 텍스트 번역 시스템 지시문
    #[serde(default = "default_text_instruction")]
    pub text_instruction: String,
    /// 이미지 번역 시스템 지시문
    #[serde(default = "default_image_instruction")]
    pub image_instruction: String,
}

fn default_api_key() -> String {
    API_KEY_PLACEHOLDER.to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_target_language() -> String {
    "Traditional Chinese".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_history_turns() -> usize {
    20
}
fn default_text_instruction() -> String {
    concat!(
        "You are a highly skilled translation engine.",
        " Your function is to translate OCR texts from a visual novel style game accurately into the target language,",
        " ensuring that the original tone and cultural nuances are preserved.",
        " You will also try to improve the translation quality according to the previous translation.",
        " Please also try to correct possibly inaccurate OCR recognition.",
        " 選択肢 only marks that the texts inside {} were recognized in the top part of the screen,",
        " so please ignore the 選択肢 and the curly braces in the output.",
        " If there is nothing to translate, answer exactly: Null.",
        " Avoid adding any explanations or annotations to the translated text."
    )
    .to_string()
}
fn default_image_instruction() -> String {
    concat!(
        "You are a highly skilled translation engine.",
        " Your function is to translate the texts in the attached screenshot accurately into the target language,",
        " ensuring that the original tone and cultural nuances are preserved.",
        " You will also try to improve the translation quality according to the previous translation.",
        " If there is nothing to translate, answer exactly: Null.",
        " Avoid adding any explanations or annotations to the translated text."
    )
    .to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            endpoint: default_endpoint(),
            model: default_model(),
            image_model: default_model(),
            target_language: default_target_language(),
            chat_mode: false,
            image_input: false,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_history_turns: default_max_history_turns(),
            text_instruction: default_text_instruction(),
            image_instruction: default_image_instruction(),
        }
    }
}

impl TranslationConfig {
    /// API 키가 실제로 설정되었는지 (빈 값/자리표시자 제외)
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }

    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 화면 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처할 모니터 인덱스 (None이면 주 모니터)
    #[serde(default)]
    pub monitor_index: Option<usize>,
    /// 캡처 직전 오버레이를 숨겨 자기 캡처 회피
    #[serde(default)]
    pub hide_overlay_during_capture: bool,
    /// 오버레이 숨김 후 캡처까지 대기 (밀리초)
    #[serde(default = "default_hide_settle_ms")]
    pub hide_settle_ms: u64,
    /// 영역 테이블
    #[serde(default)]
    pub regions: RegionLayout,
}

fn default_hide_settle_ms() -> u64 {
    60
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            monitor_index: None,
            hide_overlay_during_capture: false,
            hide_settle_ms: default_hide_settle_ms(),
            regions: RegionLayout::default(),
        }
    }
}

impl CaptureConfig {
    pub fn hide_settle(&self) -> Duration {
        Duration::from_millis(self.hide_settle_ms)
    }
}

// ============================================================
// 변경 감지 설정
// ============================================================

/// 변경 감지 및 디스패치 타이밍 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 이 값 미만의 유사도만 변경으로 취급 (튜닝 가능)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// 전체 사이클 후 대기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// quick-reject로 건너뛴 뒤 대기 (밀리초)
    #[serde(default = "default_unchanged_pause_ms")]
    pub unchanged_pause_ms: u64,
    /// 진행 중 요청 취소 전 안정화 지연 (밀리초)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// 할당량 초과 후 디스패치 금지 시간 (밀리초)
    #[serde(default = "default_quota_cooldown_ms")]
    pub quota_cooldown_ms: u64,
    /// 선택지 OCR이 이 글자 수를 초과해야 조합에 포함
    #[serde(default = "default_options_min_chars")]
    pub options_min_chars: usize,
    /// 센티넬 quick-reject 사용 여부
    #[serde(default = "default_true")]
    pub quick_reject: bool,
    /// 센티넬 일치로 볼 평균 휘도 차이 상한 (0~255)
    #[serde(default = "default_sentinel_tolerance")]
    pub sentinel_tolerance: u8,
    /// 센티넬 비교 전 축소 배율
    #[serde(default = "default_sentinel_downscale")]
    pub sentinel_downscale: u32,
}

fn default_true() -> bool {
    true
}
fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_unchanged_pause_ms() -> u64 {
    100
}
fn default_settle_delay_ms() -> u64 {
    300
}
fn default_quota_cooldown_ms() -> u64 {
    3_000
}
fn default_options_min_chars() -> usize {
    4
}
fn default_sentinel_tolerance() -> u8 {
    8
}
fn default_sentinel_downscale() -> u32 {
    4
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            poll_interval_ms: default_poll_interval_ms(),
            unchanged_pause_ms: default_unchanged_pause_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            quota_cooldown_ms: default_quota_cooldown_ms(),
            options_min_chars: default_options_min_chars(),
            quick_reject: true,
            sentinel_tolerance: default_sentinel_tolerance(),
            sentinel_downscale: default_sentinel_downscale(),
        }
    }
}

impl DetectionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn unchanged_pause(&self) -> Duration {
        Duration::from_millis(self.unchanged_pause_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_millis(self.quota_cooldown_ms)
    }
}

// ============================================================
// OCR 설정
// ============================================================

/// Tesseract OCR 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract 언어 코드
    #[serde(default = "default_ocr_language")]
    pub language: String,
    /// tessdata 경로 (None이면 시스템 기본값)
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
    /// 영역당 인식 타임아웃 (밀리초): 초과 시 빈 텍스트
    #[serde(default = "default_ocr_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_ocr_language() -> String {
    "jpn".to_string()
}
fn default_ocr_timeout_ms() -> u64 {
    5_000
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_ocr_language(),
            tessdata_path: None,
            timeout_ms: default_ocr_timeout_ms(),
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================
// 자막 설정
// ============================================================

/// 자막 렌더러 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleRenderer {
    /// 터미널에 자막 박스 출력
    #[default]
    Terminal,
    /// tracing 로그로만 출력
    Log,
}

/// 자막 렌더러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    #[serde(default)]
    pub renderer: SubtitleRenderer,
    /// 터미널 줄바꿈 폭 (문자 수)
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
}

fn default_wrap_width() -> usize {
    60
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            renderer: SubtitleRenderer::Terminal,
            wrap_width: default_wrap_width(),
        }
    }
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            translation: TranslationConfig::default(),
            capture: CaptureConfig::default(),
            detection: DetectionConfig::default(),
            ocr: OcrConfig::default(),
            subtitle: SubtitleConfig::default(),
        }
    }

    /// 파이프라인 시작 전 검증: 실패 시 루프를 시작하지 않는다
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.translation.has_api_key() {
            return Err(CoreError::Config(
                "Gemini API 키가 설정되지 않았습니다. config.json의 translation.api_key 또는 \
                 LIVESUB_GEMINI_API_KEY 환경 변수를 설정하세요."
                    .to_string(),
            ));
        }

        let threshold = self.detection.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(CoreError::Validation {
                field: "detection.similarity_threshold".to_string(),
                message: format!("0 초과 1 이하여야 함 (현재 {threshold})"),
            });
        }

        if self.detection.sentinel_downscale == 0 {
            return Err(CoreError::Validation {
                field: "detection.sentinel_downscale".to_string(),
                message: "1 이상이어야 함".to_string(),
            });
        }

        if let Some(kind) = self.capture.regions.first_invalid() {
            return Err(CoreError::Validation {
                field: format!("capture.regions.{kind:?}"),
                message: "비율 값은 0~1 범위, 너비/높이는 0보다 커야 함".to_string(),
            });
        }

        if self.translation.target_language.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "translation.target_language".to_string(),
                message: "비어 있을 수 없음".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
