//! 터미널 자막 렌더러.
//!
//! 명령 채널을 소비하며 `OverlayState`가 바뀔 때만 자막 박스를 다시 그린다.
//! 줄바꿈은 문자(char) 수 기준이다.

use std::io::Write;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::state::{OverlayState, SubtitleCommand};

/// 화면 지우기 + 커서 홈 (ANSI)
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// 터미널 자막 렌더러
pub struct TerminalOverlay<W: Write> {
    out: W,
    wrap_width: usize,
    clear_screen: bool,
    state: OverlayState,
    redraws: usize,
}

impl<W: Write> TerminalOverlay<W> {
    pub fn new(out: W, wrap_width: usize) -> Self {
        Self {
            out,
            wrap_width: wrap_width.max(1),
            clear_screen: true,
            state: OverlayState::new(),
            redraws: 0,
        }
    }

    /// 다시 그릴 때 화면 지우기 여부 (기본 true)
    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    /// 채널이 닫히거나 `Stop`을 받을 때까지 명령 처리, 출력 대상을 돌려준다
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SubtitleCommand>) -> W {
        while let Some(command) = rx.recv().await {
            let stop = command == SubtitleCommand::Stop;
            self.handle(command);
            if stop {
                debug!("자막 렌더러 정지");
                break;
            }
        }
        self.out
    }

    /// 명령 하나 반영: 상태가 바뀌면 다시 그림
    pub fn handle(&mut self, command: SubtitleCommand) {
        if !self.state.apply(command) {
            return;
        }
        if let Err(e) = self.redraw() {
            warn!("자막 출력 실패: {e}");
        }
    }

    fn redraw(&mut self) -> std::io::Result<()> {
        self.redraws += 1;

        if self.clear_screen {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }

        if let Some(text) = self.state.displayed_text() {
            let border = "─".repeat(self.wrap_width);
            writeln!(self.out, "{border}")?;
            for line in wrap(text, self.wrap_width) {
                writeln!(self.out, "{line}")?;
            }
            writeln!(self.out, "{border}")?;
        }

        self.out.flush()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// 다시 그린 횟수
    pub fn redraw_count(&self) -> usize {
        self.redraws
    }
}

/// 줄마다 `width` 문자 단위로 자른 행 목록
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let chars: Vec<char> = paragraph.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }

    lines
}
