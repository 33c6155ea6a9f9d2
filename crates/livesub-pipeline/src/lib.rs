//! # livesub-pipeline
//!
//! 대사 변경 감지와 취소 가능한 번역 디스패치.
//!
//! ## 구조
//!
//! - [`composer`]: 영역별 OCR 텍스트 → 하나의 표시 문자열
//! - [`detector`]: 유사도 기반 변경 판정 + 빈 화면 디바운스
//! - [`dispatcher`]: 요청 ID 발급, 번역 태스크 spawn/취소, 쿨다운
//! - [`pipeline`]: 캡처 → quick-reject → OCR → 판정 → 디스패치를 도는 구동 루프
//!
//! 모든 상태 변경은 구동 루프 태스크 하나에서만 일어난다. 번역 태스크는
//! 결과를 채널로 돌려보낼 뿐 상태를 직접 건드리지 않는다.

pub mod composer;
pub mod detector;
pub mod dispatcher;
pub mod pipeline;

pub use detector::DetectorState;
pub use pipeline::{CycleOutcome, PipelinePorts, TranslationPipeline};
