//! 번역 디스패처.
//!
//! 요청마다 단조 증가 ID를 발급하고 번역을 별도 태스크로 실행한다.
//! 태스크는 취소 신호(oneshot)와 백엔드 호출을 경쟁시키며, 결과는
//! `Completion`으로 구동 루프에 돌려보낸다. 활성 요청은 항상 최대 하나다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use livesub_core::models::translation::{
    TranslationInput, TranslationOutcome, TranslationRequest,
};
use livesub_core::ports::translator::Translator;

/// 번역 태스크 완료 메시지
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request_id: u64,
    pub outcome: TranslationOutcome,
}

/// 진행 중 번역 핸들: drop 하면 취소된다
#[derive(Debug)]
pub struct TranslationHandle {
    request_id: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl TranslationHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// 취소 신호 전송 (이미 끝난 태스크면 무시)
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for TranslationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 번역 디스패처
pub struct TranslationDispatcher {
    translator: Arc<dyn Translator>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    next_id: u64,
    active: Option<TranslationHandle>,
    cooldown_until: Option<Instant>,
}

impl TranslationDispatcher {
    pub fn new(
        translator: Arc<dyn Translator>,
        completion_tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            translator,
            completion_tx,
            next_id: 0,
            active: None,
            cooldown_until: None,
        }
    }

    /// 새 요청 발행: 이전 활성 요청은 취소된다
    pub fn dispatch(&mut self, input: TranslationInput, target_language: &str) -> u64 {
        self.cancel_active();

        self.next_id += 1;
        let request = TranslationRequest {
            request_id: self.next_id,
            input,
            target_language: target_language.to_string(),
        };
        let request_id = request.request_id;

        info!(
            request_id,
            input = %request.input.describe(),
            provider = self.translator.provider_name(),
            "번역 요청 발행"
        );

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let translator = self.translator.clone();
        let completion_tx = self.completion_tx.clone();

        let join = tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel_rx => TranslationOutcome::Cancelled,
                result = run_request(translator.as_ref(), &request) => {
                    TranslationOutcome::from_backend(result)
                }
            };
            let _ = completion_tx.send(Completion {
                request_id: request.request_id,
                outcome,
            });
        });

        self.active = Some(TranslationHandle {
            request_id,
            cancel_tx: Some(cancel_tx),
            join,
        });
        request_id
    }

    /// 활성 요청 취소: 취소된 요청 ID 반환
    pub fn cancel_active(&mut self) -> Option<u64> {
        let mut handle = self.active.take()?;
        handle.cancel();
        debug!(request_id = handle.request_id, "번역 요청 취소");
        Some(handle.request_id)
    }

    /// 완료 메시지가 활성 요청의 것이면 활성 상태를 해제하고 true
    pub fn complete(&mut self, request_id: u64) -> bool {
        match &self.active {
            Some(handle) if handle.request_id == request_id => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// 발행 후 완료 처리 전인 요청이 있는지
    pub fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_request_id(&self) -> Option<u64> {
        self.active.as_ref().map(TranslationHandle::request_id)
    }

    /// `now`부터 `duration` 동안 디스패치 금지
    pub fn start_cooldown(&mut self, now: Instant, duration: Duration) {
        self.cooldown_until = Some(now + duration);
    }

    pub fn is_cooling_down(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }
}

async fn run_request(
    translator: &dyn Translator,
    request: &TranslationRequest,
) -> Result<Option<String>, livesub_core::error::CoreError> {
    match &request.input {
        TranslationInput::Text(text) => translator.translate(text, &request.target_language).await,
        TranslationInput::Image(image) => {
            translator
                .translate_image(image, &request.target_language)
                .await
        }
    }
}
