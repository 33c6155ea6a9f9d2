//! 변경 감지기.
//!
//! 조합된 문자열을 직전에 받아들인 문자열과 비교해 이번 사이클의 결정을 내린다.
//! 빈 문자열은 두 사이클 연속일 때만 지우기로 이어진다 (OCR 프레임 하나가
//! 빠져도 자막이 깜빡이지 않도록).

use livesub_vision::similarity::similarity;
use tracing::debug;

/// 파이프라인 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectorState {
    /// 화면에 텍스트 없음
    #[default]
    Idle,
    /// 텍스트 표시 중, 대기 중인 변경 없음
    Stable,
    /// 변경 감지, 이번 사이클에 아직 디스패치 전
    ChangePending,
    /// 번역 요청 진행 중
    Translating,
    /// 텍스트가 사라짐, 한 번 더 빈 사이클이면 지움
    Clearing,
}

/// 사이클 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// 의미 있는 변경: 새 요청 발행
    Dispatch,
    /// 변경이지만 쿨다운 중이라 보류 (받아들이지 않음)
    Deferred,
    /// 변경 없음
    Unchanged,
    /// 첫 번째 빈 사이클: 지우기 대기
    PendingClear,
    /// 두 번째 연속 빈 사이클: 자막 지움
    Clear,
}

/// 유사도 기반 변경 감지기
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    threshold: f64,
    last_composed: String,
    pending_clear: bool,
}

impl ChangeDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_composed: String::new(),
            pending_clear: false,
        }
    }

    /// 이번 사이클의 조합 문자열 관찰
    ///
    /// `dispatch_allowed`가 false(쿨다운)면 변경을 보류하고 상태를 바꾸지 않는다.
    pub fn observe(&mut self, composed: &str, dispatch_allowed: bool) -> Decision {
        if composed.trim().is_empty() {
            return self.observe_blank();
        }

        let score = similarity(composed, &self.last_composed);
        if score >= self.threshold {
            self.pending_clear = false;
            return Decision::Unchanged;
        }

        if !dispatch_allowed {
            debug!(similarity = score, "쿨다운 중 변경 보류");
            return Decision::Deferred;
        }

        debug!(similarity = score, "대사 변경 감지");
        self.last_composed = composed.to_string();
        self.pending_clear = false;
        Decision::Dispatch
    }

    fn observe_blank(&mut self) -> Decision {
        if self.pending_clear {
            self.pending_clear = false;
            self.last_composed.clear();
            return Decision::Clear;
        }

        // 이미 비어 있으면 지울 것이 없음
        if self.last_composed.is_empty() {
            return Decision::Unchanged;
        }

        self.pending_clear = true;
        Decision::PendingClear
    }

    /// 마지막으로 받아들인 조합 문자열
    pub fn last_composed(&self) -> &str {
        &self.last_composed
    }

    pub fn is_pending_clear(&self) -> bool {
        self.pending_clear
    }
}
