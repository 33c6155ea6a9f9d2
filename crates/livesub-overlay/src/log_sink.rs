//! 로그 자막 싱크.
//!
//! 화면 렌더러 없이 자막 변경을 tracing 로그로 남긴다 (헤드리스 실행용).

use parking_lot::Mutex;
use tracing::{debug, info};

use livesub_core::ports::subtitle_sink::SubtitleSink;

use crate::state::{OverlayState, SubtitleCommand};

/// tracing 기반 자막 싱크
#[derive(Debug, Default)]
pub struct LogSubtitleSink {
    state: Mutex<OverlayState>,
}

impl LogSubtitleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 상태 복제본
    pub fn snapshot(&self) -> OverlayState {
        self.state.lock().clone()
    }

    fn apply(&self, command: SubtitleCommand) {
        let mut state = self.state.lock();
        if !state.apply(command) {
            return;
        }

        match state.displayed_text() {
            Some(text) if !text.is_empty() => info!(subtitle = %text, "자막"),
            Some(_) => debug!("자막 비움"),
            None => debug!(running = state.is_running(), "자막 숨김"),
        }
    }
}

impl SubtitleSink for LogSubtitleSink {
    fn start(&self) {
        self.apply(SubtitleCommand::Start);
    }

    fn stop(&self) {
        self.apply(SubtitleCommand::Stop);
    }

    fn show(&self) {
        self.apply(SubtitleCommand::Show);
    }

    fn hide(&self) {
        self.apply(SubtitleCommand::Hide);
    }

    fn update(&self, text: &str) {
        self.apply(SubtitleCommand::Update(text.to_string()));
    }
}
