//! 번역 파이프라인 통합 테스트.
//!
//! 스크립트 화면 → 캡처 → quick-reject → OCR → 변경 감지 → 번역 → 자막
//! cross-crate 연동을 인메모리 포트로 검증한다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

use livesub_core::config::AppConfig;
use livesub_core::error::CoreError;
use livesub_core::models::frame::{EncodedImage, Frame, Rect};
use livesub_core::ports::frame_source::FrameSource;
use livesub_core::ports::subtitle_sink::SubtitleSink;
use livesub_core::ports::text_extractor::TextExtractor;
use livesub_core::ports::translator::Translator;
use livesub_pipeline::{CycleOutcome, DetectorState, PipelinePorts, TranslationPipeline};
use livesub_vision::encoder::WEBP_MIME_TYPE;
use livesub_vision::geometry::{resolve_regions, ResolvedRegions};

const FRAME_WIDTH: u32 = 400;
const FRAME_HEIGHT: u32 = 200;
const QUOTA_NOTICE: &str = "Gemini Quota Exceeded, retrying in 3 seconds...";

// ============================================================
// 목 포트
// ============================================================

/// 싱크와 번역기가 함께 쓰는 시각별 호출 기록
#[derive(Debug, Clone, Default)]
struct EventLog(Arc<Mutex<Vec<(Instant, String)>>>);

impl EventLog {
    fn record(&self, event: String) {
        self.0.lock().push((Instant::now(), event));
    }

    /// 이벤트의 (순번, 시각)
    fn position(&self, event: &str) -> Option<(usize, Instant)> {
        self.0
            .lock()
            .iter()
            .enumerate()
            .find(|(_, (_, e))| e == event)
            .map(|(i, (at, _))| (i, *at))
    }
}

/// 현재 화면에 "보이는" 내용
#[derive(Debug, Clone, Default)]
struct ScreenState {
    /// 프레임 전체를 채우는 회색 밝기 (센티넬 비교 대상)
    shade: u8,
    /// 센티넬 안쪽 작은 글자 패치의 밝기
    word: Option<u8>,
    speaker: String,
    dialog: String,
    options: String,
    capture_fails: bool,
    speaker_ocr_fails: bool,
}

/// 스크립트 화면: 프레임 소스 + 영역 크기로 구분하는 OCR
struct ScriptedScreen {
    state: Mutex<ScreenState>,
    regions: ResolvedRegions,
    captures: AtomicUsize,
    ocr_calls: AtomicUsize,
}

impl ScriptedScreen {
    fn new(config: &AppConfig) -> Self {
        Self {
            state: Mutex::new(ScreenState::default()),
            regions: resolve_regions(&config.capture.regions, FRAME_WIDTH, FRAME_HEIGHT),
            captures: AtomicUsize::new(0),
            ocr_calls: AtomicUsize::new(0),
        }
    }

    /// 화면 교체: 밝기가 다르면 센티넬도 달라진다
    fn show(&self, shade: u8, speaker: &str, dialog: &str) {
        let mut state = self.state.lock();
        state.shade = shade;
        state.speaker = speaker.to_string();
        state.dialog = dialog.to_string();
        state.options.clear();
    }

    fn show_options(&self, shade: u8, options: &str) {
        let mut state = self.state.lock();
        state.shade = shade;
        state.options = options.to_string();
    }

    /// 배경은 그대로 두고 센티넬 안에 작은 글자만 찍는다
    fn show_word(&self, brightness: u8, dialog: &str) {
        let mut state = self.state.lock();
        state.word = Some(brightness);
        state.dialog = dialog.to_string();
    }

    /// 센티넬 타일 하나 안에 들어가는 16x8 글자 위치
    fn word_rect(&self) -> Rect {
        let s = self.regions.sentinel;
        Rect {
            x: s.x + 36,
            y: s.y + 6,
            w: 16,
            h: 8,
        }
    }

    fn set_capture_fails(&self, fails: bool) {
        self.state.lock().capture_fails = fails;
    }

    fn set_speaker_ocr_fails(&self, fails: bool) {
        self.state.lock().speaker_ocr_fails = fails;
    }

    fn ocr_calls(&self) -> usize {
        self.ocr_calls.load(Ordering::SeqCst)
    }

    fn is_region(rect: Rect, frame: &Frame) -> bool {
        frame.dimensions() == (rect.w, rect.h)
    }
}

#[async_trait]
impl FrameSource for ScriptedScreen {
    async fn capture_frame(&self) -> Result<Frame, CoreError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        if state.capture_fails {
            return Err(CoreError::Capture("display unavailable".to_string()));
        }
        let s = state.shade;
        let frame = Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, [s, s, s, 255]);
        let Some(v) = state.word else {
            return Ok(frame);
        };

        let word = self.word_rect();
        let mut pixels = frame.pixels().to_vec();
        for y in word.y..word.y + word.h {
            for x in word.x..word.x + word.w {
                let offset = ((y * FRAME_WIDTH + x) * 4) as usize;
                pixels[offset..offset + 3].copy_from_slice(&[v, v, v]);
            }
        }
        Frame::new(FRAME_WIDTH, FRAME_HEIGHT, pixels)
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

#[async_trait]
impl TextExtractor for ScriptedScreen {
    async fn extract_text(&self, region: &Frame) -> Result<String, CoreError> {
        self.ocr_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();

        if Self::is_region(self.regions.dialog_box, region) {
            Ok(state.dialog.clone())
        } else if Self::is_region(self.regions.speaker_name, region) {
            if state.speaker_ocr_fails {
                return Err(CoreError::OcrError("engine crashed".to_string()));
            }
            Ok(state.speaker.clone())
        } else if Self::is_region(self.regions.options, region) {
            Ok(state.options.clone())
        } else {
            Err(CoreError::OcrError(format!(
                "unknown region {:?}",
                region.dimensions()
            )))
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

type Reply = Box<dyn Fn(&str) -> Result<Option<String>, CoreError> + Send + Sync>;

/// 응답 규칙과 지연을 정할 수 있는 번역기
struct ScriptedTranslator {
    delay: Duration,
    reply: Reply,
    texts: Mutex<Vec<String>>,
    images: Mutex<Vec<EncodedImage>>,
    events: EventLog,
}

impl ScriptedTranslator {
    fn new(delay: Duration) -> Self {
        Self::with_reply(delay, |text| Ok(Some(format!("FR:{text}"))))
    }

    fn with_reply<F>(delay: Duration, reply: F) -> Self
    where
        F: Fn(&str) -> Result<Option<String>, CoreError> + Send + Sync + 'static,
    {
        Self {
            delay,
            reply: Box::new(reply),
            texts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
            events: EventLog::default(),
        }
    }

    fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    fn images(&self) -> Vec<EncodedImage> {
        self.images.lock().clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(
        &self,
        text: &str,
        _target_language: &str,
    ) -> Result<Option<String>, CoreError> {
        self.texts.lock().push(text.to_string());
        self.events.record(format!("translate:{text}"));
        tokio::time::sleep(self.delay).await;
        self.events.record(format!("done:{text}"));
        (self.reply)(text)
    }

    async fn translate_image(
        &self,
        image: &EncodedImage,
        _target_language: &str,
    ) -> Result<Option<String>, CoreError> {
        self.images.lock().push(image.clone());
        tokio::time::sleep(self.delay).await;
        Ok(Some("Image FR".to_string()))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkCall {
    Start,
    Stop,
    Show,
    Hide,
    Update(String),
}

/// 호출 기록 자막 싱크
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    events: EventLog,
}

impl RecordingSink {
    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    fn updates(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SinkCall::Update(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SubtitleSink for RecordingSink {
    fn start(&self) {
        self.calls.lock().push(SinkCall::Start);
    }

    fn stop(&self) {
        self.calls.lock().push(SinkCall::Stop);
    }

    fn show(&self) {
        self.calls.lock().push(SinkCall::Show);
    }

    fn hide(&self) {
        self.calls.lock().push(SinkCall::Hide);
    }

    fn update(&self, text: &str) {
        self.events.record(format!("update:{text}"));
        self.calls.lock().push(SinkCall::Update(text.to_string()));
    }
}

// ============================================================
// 하네스
// ============================================================

fn test_config() -> AppConfig {
    let mut config = AppConfig::default_config();
    config.translation.api_key = "test-key".to_string();
    config.translation.target_language = "French".to_string();
    config
}

struct Harness {
    screen: Arc<ScriptedScreen>,
    translator: Arc<ScriptedTranslator>,
    sink: Arc<RecordingSink>,
    events: EventLog,
    pipeline: TranslationPipeline,
}

impl Harness {
    fn new(config: AppConfig, mut translator: ScriptedTranslator) -> Self {
        let events = EventLog::default();
        translator.events = events.clone();

        let screen = Arc::new(ScriptedScreen::new(&config));
        let translator = Arc::new(translator);
        let sink = Arc::new(RecordingSink {
            calls: Mutex::new(Vec::new()),
            events: events.clone(),
        });

        let ports = PipelinePorts {
            frame_source: screen.clone(),
            text_extractor: screen.clone(),
            translator: translator.clone(),
            sink: sink.clone(),
        };
        let pipeline = TranslationPipeline::new(&config, ports).unwrap();

        Self {
            screen,
            translator,
            sink,
            events,
            pipeline,
        }
    }

    fn with_default_translator() -> Self {
        Self::new(test_config(), ScriptedTranslator::new(Duration::from_millis(50)))
    }

    /// 활성 요청이 끝날 때까지 완료 메시지 처리
    async fn settle(&mut self) {
        while self.pipeline.active_request_id().is_some() {
            assert!(self.pipeline.process_next_completion().await);
        }
    }
}

// ============================================================
// 시나리오
// ============================================================

/// 번역 → 변화 없음 → 빈 화면 1회(대기) → 빈 화면 2회(지움)
#[tokio::test(start_paused = true)]
async fn end_to_end_four_cycles() {
    let translator = ScriptedTranslator::with_reply(Duration::from_millis(50), |_| {
        Ok(Some("Bienvenue !".to_string()))
    });
    let mut h = Harness::new(test_config(), translator);

    // 1: 새 대사
    h.screen.show(40, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    assert_eq!(h.pipeline.state(), DetectorState::Translating);
    h.settle().await;
    assert_eq!(h.translator.texts(), vec!["Alice：\nWelcome!"]);
    assert_eq!(h.sink.updates(), vec!["Bienvenue !"]);
    assert_eq!(h.pipeline.last_translated(), "Bienvenue !");
    assert_eq!(h.pipeline.state(), DetectorState::Stable);

    // 2: 배경만 바뀌고 대사는 그대로
    h.screen.show(120, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Unchanged);
    assert_eq!(h.translator.texts().len(), 1);
    assert_eq!(h.sink.updates().len(), 1);

    // 3: 첫 번째 빈 사이클
    h.screen.show(200, "", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::PendingClear);
    assert_eq!(h.pipeline.state(), DetectorState::Clearing);
    assert_eq!(h.sink.updates().len(), 1);

    // 4: 두 번째 빈 사이클
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Cleared);
    assert_eq!(h.sink.updates(), vec!["Bienvenue !", ""]);
    assert_eq!(h.pipeline.state(), DetectorState::Idle);
    assert_eq!(h.pipeline.last_translated(), "");
    assert_eq!(h.pipeline.last_composed(), "");
    assert_eq!(h.translator.texts().len(), 1);
}

/// 같은 조합 문자열이면 다시 디스패치하지 않는다
#[tokio::test(start_paused = true)]
async fn identical_text_is_not_redispatched() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Hello", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    h.settle().await;

    h.screen.show(160, "Hello", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Unchanged);
    assert_eq!(h.translator.texts(), vec!["Hello："]);
}

/// 연속 두 번 바뀌면 마지막 대사의 번역만 자막에 도착한다
#[tokio::test(start_paused = true)]
async fn rapid_changes_deliver_only_latest() {
    let mut h = Harness::new(
        test_config(),
        ScriptedTranslator::new(Duration::from_secs(1)),
    );

    h.screen.show(40, "Alice", "The first line of dialog.");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));

    h.screen.show(200, "Bob", "Something entirely different!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(2));
    assert_eq!(h.pipeline.active_request_id(), Some(2));

    h.settle().await;

    let updates = h.sink.updates();
    assert!(updates.iter().all(|u| !u.contains("The first line")));
    assert_eq!(
        updates.last().map(String::as_str),
        Some("FR:Bob：\nSomething entirely different!")
    );
    // 취소 전 이전 번역("")을 다시 표시한 것 외에는 최신 번역 하나뿐
    assert_eq!(updates.iter().filter(|u| !u.is_empty()).count(), 1);
    assert_eq!(h.translator.texts().len(), 2);
}

/// 진행 중 요청이 있으면 이전 번역을 다시 표시하고, 안정화 대기 후에 새 요청을 보낸다
#[tokio::test(start_paused = true)]
async fn superseding_change_repushes_then_settles_before_dispatch() {
    let mut h = Harness::new(
        test_config(),
        ScriptedTranslator::new(Duration::from_secs(1)),
    );

    h.screen.show(40, "Alice", "The first line of dialog.");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));

    h.screen.show(200, "Bob", "Something entirely different!");
    let started = Instant::now();
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(2));
    assert!(Instant::now() - started >= Duration::from_millis(300));

    h.settle().await;

    // 재표시("") → 300ms 이상 뒤 요청 2 시작
    let (repush_index, repushed_at) = h.events.position("update:").unwrap();
    let (request_index, requested_at) = h
        .events
        .position("translate:Bob：\nSomething entirely different!")
        .unwrap();
    assert!(repush_index < request_index);
    assert!(requested_at - repushed_at >= Duration::from_millis(300));

    // 요청 1은 취소되어 번역기가 끝까지 돌지 않았다
    assert!(h
        .events
        .position("done:Alice：\nThe first line of dialog.")
        .is_none());
    assert_eq!(
        h.sink.updates(),
        vec!["", "FR:Bob：\nSomething entirely different!"]
    );
}

/// 배경은 같고 센티넬 안 글자 하나만 바뀌어도 OCR 후 디스패치
#[tokio::test(start_paused = true)]
async fn small_local_change_is_dispatched() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    h.settle().await;
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Skipped);

    h.screen.show_word(255, "Welcome! Again?");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(2));
    h.settle().await;
    assert_eq!(
        h.sink.updates().last().map(String::as_str),
        Some("FR:Alice：\nWelcome! Again?")
    );
}

/// 건너뛴 사이클도 상태를 갱신한다
#[tokio::test(start_paused = true)]
async fn skipped_cycle_reports_settled_state() {
    let mut h = Harness::new(
        test_config(),
        ScriptedTranslator::new(Duration::from_secs(1)),
    );

    h.screen.show(40, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Skipped);
    assert_eq!(h.pipeline.state(), DetectorState::Translating);

    h.settle().await;
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Skipped);
    assert_eq!(h.pipeline.state(), DetectorState::Stable);
}

/// 할당량 초과: 이전 번역 + 안내, 쿨다운 동안 변경 보류
#[tokio::test(start_paused = true)]
async fn quota_exceeded_shows_notice_and_cools_down() {
    let translator = ScriptedTranslator::with_reply(Duration::from_millis(50), |text| {
        if text.contains("Hello") {
            Ok(Some("Bonjour".to_string()))
        } else if text.contains("quota") {
            Ok(Some("Null Quota".to_string()))
        } else {
            Ok(Some(format!("FR:{text}")))
        }
    });
    let mut h = Harness::new(test_config(), translator);

    h.screen.show(40, "Alice", "Hello");
    h.pipeline.poll_cycle().await;
    h.settle().await;

    h.screen.show(120, "Bob", "This one hits the quota");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(2));
    h.settle().await;

    assert_eq!(
        h.sink.updates().last().cloned(),
        Some(format!("Bonjour\n{QUOTA_NOTICE}"))
    );
    assert_eq!(h.pipeline.last_translated(), "Bonjour");
    assert!(h.pipeline.is_cooling_down());

    // 쿨다운 중 변경은 보류
    h.screen.show(200, "Carol", "A brand new sentence appears");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Deferred);
    assert_eq!(h.translator.texts().len(), 2);

    tokio::time::advance(Duration::from_secs(3)).await;
    assert!(!h.pipeline.is_cooling_down());

    // 화면이 그대로여도 보류된 변경을 다시 읽어 디스패치
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(3));
    h.settle().await;
    assert_eq!(
        h.sink.updates().last().map(String::as_str),
        Some("FR:Carol：\nA brand new sentence appears")
    );
}

/// 429 에러도 할당량 초과로 처리, 안내는 설정된 쿨다운 기준
#[tokio::test(start_paused = true)]
async fn rate_limit_error_is_quota() {
    let translator = ScriptedTranslator::with_reply(Duration::from_millis(10), |_| {
        Err(CoreError::RateLimit {
            retry_after_secs: 30,
        })
    });
    let mut h = Harness::new(test_config(), translator);

    h.screen.show(40, "Alice", "Hello");
    h.pipeline.poll_cycle().await;
    h.settle().await;

    assert_eq!(h.sink.updates(), vec![format!("\n{QUOTA_NOTICE}")]);
    assert!(h.pipeline.is_cooling_down());
}

/// 빈 사이클 한 번 뒤 텍스트가 돌아오면 지우지 않는다
#[tokio::test(start_paused = true)]
async fn single_blank_cycle_does_not_clear() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Alice", "Welcome!");
    h.pipeline.poll_cycle().await;
    h.settle().await;

    h.screen.show(120, "", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::PendingClear);

    h.screen.show(200, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Unchanged);

    // 대기 표시가 풀렸으므로 다시 빈 화면이어도 첫 번째 빈 사이클
    h.screen.show(80, "", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::PendingClear);

    assert!(!h.sink.updates().iter().any(String::is_empty));
    assert_eq!(h.translator.texts().len(), 1);
}

/// 지우기로 취소된 요청의 결과는 자막을 건드리지 않는다
#[tokio::test(start_paused = true)]
async fn cancelled_request_is_silent() {
    let mut h = Harness::new(
        test_config(),
        ScriptedTranslator::new(Duration::from_secs(5)),
    );

    h.screen.show(40, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));

    h.screen.show(120, "", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::PendingClear);
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Cleared);
    assert_eq!(h.pipeline.active_request_id(), None);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.pipeline.drain_completions(), 1);

    assert_eq!(h.sink.updates(), vec![""]);
    assert_eq!(h.pipeline.last_translated(), "");
    assert_eq!(h.pipeline.state(), DetectorState::Idle);
}

/// Null은 이전 번역 유지, 에러/빈 응답은 마커
#[tokio::test(start_paused = true)]
async fn backend_failures_render_markers() {
    let translator = ScriptedTranslator::with_reply(Duration::from_millis(10), |text| {
        if text.contains("Hello") {
            Ok(Some("Bonjour".to_string()))
        } else if text.contains("nothing") {
            Ok(Some("Null".to_string()))
        } else if text.contains("network") {
            Err(CoreError::Network("connection reset".to_string()))
        } else {
            Ok(None)
        }
    });
    let mut h = Harness::new(test_config(), translator);

    h.screen.show(20, "Alice", "Hello");
    h.pipeline.poll_cycle().await;
    h.settle().await;

    h.screen.show(80, "", "……there is nothing here");
    h.pipeline.poll_cycle().await;
    h.settle().await;
    assert_eq!(h.sink.updates(), vec!["Bonjour", "Bonjour"]);

    h.screen.show(140, "Bob", "The network goes down now");
    h.pipeline.poll_cycle().await;
    h.settle().await;
    assert_eq!(h.sink.updates().last().map(String::as_str), Some("[Error]"));
    assert_eq!(h.pipeline.last_translated(), "Bonjour");

    h.screen.show(220, "Carol", "Silence from the backend");
    h.pipeline.poll_cycle().await;
    h.settle().await;
    assert_eq!(
        h.sink.updates().last().map(String::as_str),
        Some("[Translation Failed]")
    );
    assert_eq!(h.pipeline.last_translated(), "Bonjour");
}

/// 이미지 모드: OCR 텍스트 대신 장면 WebP 전송
#[tokio::test(start_paused = true)]
async fn image_mode_sends_scene_image() {
    let mut config = test_config();
    config.translation.image_input = true;
    let mut h = Harness::new(config, ScriptedTranslator::new(Duration::from_millis(10)));

    h.screen.show(40, "Alice", "Welcome!");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    h.settle().await;

    let images = h.translator.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].mime_type, WEBP_MIME_TYPE);
    assert_eq!(&images[0].data[0..4], b"RIFF");
    assert!(h.translator.texts().is_empty());
    assert_eq!(h.sink.updates(), vec!["Image FR"]);
}

/// 센티넬이 같으면 OCR 없이 건너뛴다
#[tokio::test(start_paused = true)]
async fn quick_reject_skips_ocr() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Alice", "Welcome!");
    h.pipeline.poll_cycle().await;
    assert_eq!(h.screen.ocr_calls(), 3);

    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Skipped);
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Skipped);
    assert_eq!(h.screen.ocr_calls(), 3);
    assert_eq!(h.screen.captures.load(Ordering::SeqCst), 3);
}

/// quick-reject를 끄면 매 사이클 OCR
#[tokio::test(start_paused = true)]
async fn quick_reject_disabled_runs_ocr_every_cycle() {
    let mut config = test_config();
    config.detection.quick_reject = false;
    let mut h = Harness::new(config, ScriptedTranslator::new(Duration::from_millis(10)));

    h.screen.show(40, "Alice", "Welcome!");
    h.pipeline.poll_cycle().await;
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Unchanged);
    assert_eq!(h.screen.ocr_calls(), 6);
}

/// 선택지는 길이 조건을 넘으면 조합 앞에 붙는다
#[tokio::test(start_paused = true)]
async fn long_options_are_composed_first() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "", "どうする？");
    h.screen.show_options(40, "戦う 逃げる");
    h.pipeline.poll_cycle().await;

    assert_eq!(
        h.translator.texts(),
        vec!["選択肢：{\n戦う 逃げる}\nどうする？"]
    );
}

/// 캡처 실패는 다음 사이클에서 재시도
#[tokio::test(start_paused = true)]
async fn capture_failure_is_retried() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Alice", "Welcome!");
    h.screen.set_capture_fails(true);
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::CaptureFailed);
    assert_eq!(h.screen.ocr_calls(), 0);
    assert!(h.sink.calls().is_empty());

    h.screen.set_capture_fails(false);
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
}

/// OCR 에러는 빈 텍스트로 취급
#[tokio::test(start_paused = true)]
async fn ocr_error_is_empty_text() {
    let mut h = Harness::with_default_translator();

    h.screen.show(40, "Alice", "Welcome!");
    h.screen.set_speaker_ocr_fails(true);
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Dispatched(1));
    assert_eq!(h.translator.texts(), vec!["Welcome!"]);
}

/// 자기 캡처 회피: 캡처 전후로 숨김/표시
#[tokio::test(start_paused = true)]
async fn overlay_hidden_during_capture() {
    let mut config = test_config();
    config.capture.hide_overlay_during_capture = true;
    let mut h = Harness::new(config, ScriptedTranslator::new(Duration::from_millis(10)));

    h.screen.show(40, "", "");
    assert_eq!(h.pipeline.poll_cycle().await, CycleOutcome::Unchanged);
    assert_eq!(h.sink.calls(), vec![SinkCall::Hide, SinkCall::Show]);
}

/// 종료 시 진행 중 요청을 취소하고 자막을 정지
#[tokio::test(start_paused = true)]
async fn shutdown_cancels_active_request() {
    let mut h = Harness::new(
        test_config(),
        ScriptedTranslator::new(Duration::from_secs(5)),
    );

    h.screen.show(40, "Alice", "Welcome!");
    h.pipeline.poll_cycle().await;
    h.pipeline.shutdown();
    assert_eq!(h.pipeline.active_request_id(), None);

    tokio::time::sleep(Duration::from_secs(10)).await;
    h.pipeline.drain_completions();

    assert_eq!(h.sink.calls(), vec![SinkCall::Stop]);
}

/// 구동 루프: start → 번역 표시 → 종료 신호 → stop
#[tokio::test(start_paused = true)]
async fn run_loop_until_shutdown() {
    let h = Harness::with_default_translator();
    h.screen.show(40, "Alice", "Welcome!");

    let Harness {
        screen,
        translator,
        sink,
        mut pipeline,
        ..
    } = h;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        pipeline.run(shutdown_rx).await;
        pipeline
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown_tx.send(true).unwrap();
    let pipeline = task.await.unwrap();

    let calls = sink.calls();
    assert_eq!(calls.first(), Some(&SinkCall::Start));
    assert_eq!(calls.last(), Some(&SinkCall::Stop));
    assert!(calls.contains(&SinkCall::Update("FR:Alice：\nWelcome!".to_string())));

    // 같은 화면은 센티넬로 건너뛰므로 번역은 한 번
    assert_eq!(translator.texts().len(), 1);
    assert_eq!(screen.ocr_calls(), 3);
    assert!(screen.captures.load(Ordering::SeqCst) > 2);
    assert_eq!(pipeline.last_translated(), "FR:Alice：\nWelcome!");
}
