//! 번역 파이프라인 구동 루프.
//!
//! 한 태스크가 사이클(캡처 → quick-reject → OCR → 조합 → 판정 → 디스패치)을
//! 순차 실행하고, 사이클 사이에 번역 완료 메시지를 처리한다.
//! `last_translated`, 감지기, 활성 요청은 이 태스크만 읽고 쓴다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use livesub_core::config::AppConfig;
use livesub_core::error::CoreError;
use livesub_core::models::frame::Frame;
use livesub_core::models::translation::{TranslationInput, TranslationOutcome};
use livesub_core::ports::frame_source::FrameSource;
use livesub_core::ports::subtitle_sink::SubtitleSink;
use livesub_core::ports::text_extractor::TextExtractor;
use livesub_core::ports::translator::Translator;
use livesub_vision::encoder::SceneEncoder;
use livesub_vision::geometry::{crop, RegionResolver, ResolvedRegions};
use livesub_vision::sentinel::{SentinelMatcher, SentinelSnapshot};

use crate::composer::{compose, RegionTexts};
use crate::detector::{ChangeDetector, Decision, DetectorState};
use crate::dispatcher::{Completion, TranslationDispatcher};

/// 파이프라인이 사용하는 포트 묶음
#[derive(Clone)]
pub struct PipelinePorts {
    pub frame_source: Arc<dyn FrameSource>,
    pub text_extractor: Arc<dyn TextExtractor>,
    pub translator: Arc<dyn Translator>,
    pub sink: Arc<dyn SubtitleSink>,
}

/// 한 사이클의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 캡처 실패: 다음 사이클에서 재시도
    CaptureFailed,
    /// 센티넬 일치: OCR 생략
    Skipped,
    /// 변경 없음
    Unchanged,
    /// 새 요청 발행
    Dispatched(u64),
    /// 쿨다운으로 변경 보류
    Deferred,
    /// 첫 번째 빈 사이클
    PendingClear,
    /// 자막 지움
    Cleared,
}

/// 파이프라인 타이밍/동작 설정 (AppConfig에서 추출)
#[derive(Debug, Clone)]
struct PipelineSettings {
    target_language: String,
    image_input: bool,
    hide_overlay_during_capture: bool,
    hide_settle: Duration,
    quick_reject: bool,
    options_min_chars: usize,
    poll_interval: Duration,
    unchanged_pause: Duration,
    settle_delay: Duration,
    quota_cooldown: Duration,
}

impl PipelineSettings {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            target_language: config.translation.target_language.clone(),
            image_input: config.translation.image_input,
            hide_overlay_during_capture: config.capture.hide_overlay_during_capture,
            hide_settle: config.capture.hide_settle(),
            quick_reject: config.detection.quick_reject,
            options_min_chars: config.detection.options_min_chars,
            poll_interval: config.detection.poll_interval(),
            unchanged_pause: config.detection.unchanged_pause(),
            settle_delay: config.detection.settle_delay(),
            quota_cooldown: config.detection.quota_cooldown(),
        }
    }
}

/// 할당량 초과 안내 문구
pub fn quota_notice(cooldown: Duration) -> String {
    let secs = cooldown.as_secs() + u64::from(cooldown.subsec_nanos() > 0);
    format!("Gemini Quota Exceeded, retrying in {secs} seconds...")
}

/// 변경 감지 + 번역 디스패치 파이프라인
pub struct TranslationPipeline {
    ports: PipelinePorts,
    settings: PipelineSettings,
    resolver: RegionResolver,
    matcher: SentinelMatcher,
    encoder: SceneEncoder,
    /// 마지막으로 받아들인 사이클의 센티넬
    sentinel: Option<SentinelSnapshot>,
    detector: ChangeDetector,
    dispatcher: TranslationDispatcher,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    last_translated: String,
    state: DetectorState,
}

impl TranslationPipeline {
    /// 파이프라인 생성: 설정 검증 실패 시 루프를 시작하지 않는다
    pub fn new(config: &AppConfig, ports: PipelinePorts) -> Result<Self, CoreError> {
        config.validate()?;

        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let dispatcher = TranslationDispatcher::new(ports.translator.clone(), completion_tx);

        Ok(Self {
            settings: PipelineSettings::from_config(config),
            resolver: RegionResolver::new(config.capture.regions.clone()),
            matcher: SentinelMatcher::new(
                config.detection.sentinel_downscale,
                config.detection.sentinel_tolerance,
            ),
            encoder: SceneEncoder::default(),
            sentinel: None,
            detector: ChangeDetector::new(config.detection.similarity_threshold),
            dispatcher,
            completion_rx,
            last_translated: String::new(),
            state: DetectorState::Idle,
            ports,
        })
    }

    // ============================================================
    // 구동 루프
    // ============================================================

    /// 종료 신호가 올 때까지 사이클 반복
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            target_language = %self.settings.target_language,
            image_input = self.settings.image_input,
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            "번역 파이프라인 시작"
        );
        self.ports.sink.start();

        let mut next_cycle = Instant::now();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }

                _ = sleep_until(next_cycle) => {
                    let outcome = tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => break,
                        outcome = self.poll_cycle() => outcome,
                    };
                    next_cycle = Instant::now() + self.pause_after(outcome);
                }
            }
        }

        self.shutdown();
    }

    /// 사이클 후 대기 시간
    fn pause_after(&self, outcome: CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Skipped => self.settings.unchanged_pause,
            _ => self.settings.poll_interval,
        }
    }

    /// 종료: 활성 요청 취소 후 자막 정지
    pub fn shutdown(&mut self) {
        if let Some(id) = self.dispatcher.cancel_active() {
            debug!(request_id = id, "종료로 번역 요청 취소");
        }
        self.ports.sink.stop();
        info!("번역 파이프라인 종료");
    }

    // ============================================================
    // 사이클
    // ============================================================

    /// 한 사이클 실행
    pub async fn poll_cycle(&mut self) -> CycleOutcome {
        let frame = match self.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("프레임 캡처 실패: {e}");
                return CycleOutcome::CaptureFailed;
            }
        };

        let regions = self.resolver.resolve(frame.width(), frame.height());

        let candidate = if self.settings.quick_reject {
            if let Some(previous) = &self.sentinel {
                if self.matcher.is_unchanged(previous, &frame, &regions) {
                    trace!("센티넬 일치: OCR 생략");
                    self.state = self.settled_state();
                    return CycleOutcome::Skipped;
                }
            }
            match self.matcher.snapshot(&frame, &regions) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    debug!("센티넬 생성 실패: {e}");
                    None
                }
            }
        } else {
            None
        };

        let texts = self.extract_regions(&frame, &regions).await;
        let composed = compose(&texts, self.settings.options_min_chars);

        let dispatch_allowed = !self.dispatcher.is_cooling_down(Instant::now());
        match self.detector.observe(&composed, dispatch_allowed) {
            Decision::Dispatch => {
                self.sentinel = candidate;
                let request_id = self.dispatch(&frame, &regions, composed).await;
                CycleOutcome::Dispatched(request_id)
            }
            Decision::Unchanged => {
                self.sentinel = candidate;
                self.state = self.settled_state();
                CycleOutcome::Unchanged
            }
            Decision::Deferred => {
                // 쿨다운 이후 다시 OCR 하도록 센티넬을 버림
                self.sentinel = None;
                CycleOutcome::Deferred
            }
            Decision::PendingClear => {
                self.sentinel = None;
                self.state = DetectorState::Clearing;
                CycleOutcome::PendingClear
            }
            Decision::Clear => {
                self.sentinel = candidate;
                self.clear();
                CycleOutcome::Cleared
            }
        }
    }

    async fn capture(&self) -> Result<Frame, CoreError> {
        if !self.settings.hide_overlay_during_capture {
            return self.ports.frame_source.capture_frame().await;
        }

        self.ports.sink.hide();
        sleep(self.settings.hide_settle).await;
        let result = self.ports.frame_source.capture_frame().await;
        self.ports.sink.show();
        result
    }

    /// 대사/화자/선택지 영역 OCR: 실패는 빈 텍스트
    async fn extract_regions(&self, frame: &Frame, regions: &ResolvedRegions) -> RegionTexts {
        let dialog = crop(frame, regions.dialog_box);
        let speaker = crop(frame, regions.speaker_name);
        let options = crop(frame, regions.options);

        let (dialog, speaker, options) = tokio::join!(
            self.extract_one("dialog", dialog),
            self.extract_one("speaker", speaker),
            self.extract_one("options", options),
        );

        RegionTexts {
            dialog,
            speaker,
            options,
        }
    }

    async fn extract_one(&self, region: &str, crop: Result<Frame, CoreError>) -> String {
        let result = match crop {
            Ok(image) => self.ports.text_extractor.extract_text(&image).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                debug!(region, "OCR 실패, 빈 텍스트로 처리: {e}");
                String::new()
            }
        }
    }

    /// 새 요청 발행: 진행 중 요청이 있으면 이전 번역을 다시 표시하고 안정화 후 취소
    async fn dispatch(&mut self, frame: &Frame, regions: &ResolvedRegions, composed: String) -> u64 {
        self.state = DetectorState::ChangePending;

        if self.dispatcher.is_pending() {
            self.ports.sink.update(&self.last_translated);
            sleep(self.settings.settle_delay).await;
            self.dispatcher.cancel_active();
        }

        let input = if self.settings.image_input {
            match crop(frame, regions.scene).and_then(|scene| self.encoder.encode(&scene)) {
                Ok(image) => TranslationInput::Image(image),
                Err(e) => {
                    warn!("장면 이미지 인코딩 실패, 텍스트로 대체: {e}");
                    TranslationInput::Text(composed)
                }
            }
        } else {
            TranslationInput::Text(composed)
        };

        let request_id = self
            .dispatcher
            .dispatch(input, &self.settings.target_language);
        self.state = DetectorState::Translating;
        request_id
    }

    /// 두 번째 빈 사이클: 활성 요청 취소, 자막 지움
    fn clear(&mut self) {
        self.dispatcher.cancel_active();
        self.last_translated.clear();
        self.ports.sink.update("");
        self.state = DetectorState::Idle;
        debug!("자막 지움");
    }

    fn settled_state(&self) -> DetectorState {
        if self.dispatcher.is_pending() {
            DetectorState::Translating
        } else if self.detector.last_composed().is_empty() {
            DetectorState::Idle
        } else {
            DetectorState::Stable
        }
    }

    // ============================================================
    // 완료 처리
    // ============================================================

    /// 번역 완료 처리: 활성 요청이 아니면 폐기
    pub fn handle_completion(&mut self, completion: Completion) {
        let Completion {
            request_id,
            outcome,
        } = completion;

        if !self.dispatcher.complete(request_id) {
            debug!(request_id, "대체된 요청의 결과 폐기");
            return;
        }

        match outcome {
            TranslationOutcome::Success(text) => {
                info!(request_id, chars = text.chars().count(), "번역 완료");
                self.last_translated = text;
                self.ports.sink.update(&self.last_translated);
            }
            TranslationOutcome::NoTranslation => {
                debug!(request_id, "번역할 내용 없음: 이전 번역 유지");
                self.ports.sink.update(&self.last_translated);
            }
            TranslationOutcome::QuotaExceeded => {
                let cooldown = self.settings.quota_cooldown;
                warn!(
                    request_id,
                    cooldown_ms = cooldown.as_millis() as u64,
                    "번역 할당량 초과"
                );
                self.dispatcher.start_cooldown(Instant::now(), cooldown);
                let text = format!("{}\n{}", self.last_translated, quota_notice(cooldown));
                self.ports.sink.update(&text);
            }
            outcome @ TranslationOutcome::Failure(_) => {
                warn!(request_id, ?outcome, "번역 실패");
                if let Some(marker) = outcome.failure_marker() {
                    self.ports.sink.update(marker);
                }
            }
            TranslationOutcome::Cancelled => {
                debug!(request_id, "번역 취소됨");
            }
        }

        self.state = self.settled_state();
    }

    /// 대기 중인 완료 메시지를 모두 처리: 처리한 개수 반환
    pub fn drain_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion);
            handled += 1;
        }
        handled
    }

    /// 완료 메시지 하나를 기다려 처리
    pub async fn process_next_completion(&mut self) -> bool {
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.handle_completion(completion);
                true
            }
            None => false,
        }
    }

    // ============================================================
    // 조회
    // ============================================================

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn last_translated(&self) -> &str {
        &self.last_translated
    }

    pub fn last_composed(&self) -> &str {
        self.detector.last_composed()
    }

    pub fn active_request_id(&self) -> Option<u64> {
        self.dispatcher.active_request_id()
    }

    pub fn is_cooling_down(&self) -> bool {
        self.dispatcher.is_cooling_down(Instant::now())
    }
}
