//! 번역 요청/결과 모델.
//!
//! 백엔드 응답(`Result<Option<String>, CoreError>`)을 파이프라인이 다루는
//! `TranslationOutcome`으로 정규화한다. 센티넬 문자열 "Null"/"Null Quota"는
//! 번역문이 아니라 제어 신호로 해석된다.

use crate::error::CoreError;
use crate::models::frame::EncodedImage;

/// 백엔드가 "번역할 것 없음"을 알리는 센티넬
pub const NO_TRANSLATION_SENTINEL: &str = "Null";

/// 백엔드가 할당량 초과를 알리는 센티넬
pub const QUOTA_SENTINEL: &str = "Null Quota";

/// 번역 실패 시 자막에 표시하는 마커 (빈 응답)
pub const TRANSLATION_FAILED_MARKER: &str = "[Translation Failed]";

/// 번역 실패 시 자막에 표시하는 마커 (백엔드 에러)
pub const ERROR_MARKER: &str = "[Error]";

/// 번역 입력: 조합된 텍스트 또는 장면 이미지
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationInput {
    Text(String),
    Image(EncodedImage),
}

impl TranslationInput {
    /// 로그용 짧은 설명
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("text({} chars)", text.chars().count()),
            Self::Image(image) => format!("image({}, {} bytes)", image.mime_type, image.data.len()),
        }
    }
}

/// 번역 요청: 감지된 변경 하나당 한 번 발행
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// 단조 증가 요청 ID (마지막 발행 요청이 이긴다)
    pub request_id: u64,
    pub input: TranslationInput,
    pub target_language: String,
}

/// 실패 원인
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 백엔드가 텍스트 없이 응답
    EmptyResponse,
    /// 네트워크/API 에러
    Backend(String),
}

/// 번역 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// 번역 성공 (trim 완료)
    Success(String),
    /// 백엔드가 "Null" 반환: 이전 번역 유지
    NoTranslation,
    /// 할당량 초과: 이전 번역 + 안내, 쿨다운
    QuotaExceeded,
    /// 실패: 마커 표시
    Failure(FailureReason),
    /// 명시적 취소: 조용히 폐기
    Cancelled,
}

impl TranslationOutcome {
    /// 백엔드 응답을 결과로 정규화
    pub fn from_backend(result: Result<Option<String>, CoreError>) -> Self {
        match result {
            Ok(Some(text)) => {
                let trimmed = text.trim();
                if trimmed == NO_TRANSLATION_SENTINEL {
                    Self::NoTranslation
                } else if trimmed == QUOTA_SENTINEL {
                    Self::QuotaExceeded
                } else if trimmed.is_empty() {
                    Self::Failure(FailureReason::EmptyResponse)
                } else {
                    Self::Success(trimmed.to_string())
                }
            }
            Ok(None) => Self::Failure(FailureReason::EmptyResponse),
            Err(CoreError::RateLimit { .. }) => Self::QuotaExceeded,
            Err(e) => Self::Failure(FailureReason::Backend(e.to_string())),
        }
    }

    /// 실패 결과의 자막 마커 (실패가 아니면 None)
    pub fn failure_marker(&self) -> Option<&'static str> {
        match self {
            Self::Failure(FailureReason::EmptyResponse) => Some(TRANSLATION_FAILED_MARKER),
            Self::Failure(FailureReason::Backend(_)) => Some(ERROR_MARKER),
            _ => None,
        }
    }
}
