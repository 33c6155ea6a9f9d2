//! 도메인 모델.
//!
//! 캡처 프레임, 영역 좌표, 번역 요청/결과 타입을 정의한다.

pub mod frame;
pub mod region;
pub mod translation;
