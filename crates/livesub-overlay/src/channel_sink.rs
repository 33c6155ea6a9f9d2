//! 채널 기반 자막 싱크.
//!
//! `SubtitleSink` 호출을 `SubtitleCommand`로 바꿔 무제한 채널에 넣는다.
//! 전송은 블로킹하지 않으며, 수신 측이 닫혀 있으면 명령은 버려진다.

use tokio::sync::mpsc;
use tracing::debug;

use livesub_core::ports::subtitle_sink::SubtitleSink;

use crate::state::SubtitleCommand;

/// 명령 채널 자막 싱크
#[derive(Debug, Clone)]
pub struct ChannelSubtitleSink {
    tx: mpsc::UnboundedSender<SubtitleCommand>,
}

impl ChannelSubtitleSink {
    /// 싱크와 명령 수신기 생성
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SubtitleCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: SubtitleCommand) {
        if let Err(e) = self.tx.send(command) {
            debug!("자막 렌더러 종료됨, 명령 폐기: {:?}", e.0);
        }
    }
}

impl SubtitleSink for ChannelSubtitleSink {
    fn start(&self) {
        self.send(SubtitleCommand::Start);
    }

    fn stop(&self) {
        self.send(SubtitleCommand::Stop);
    }

    fn show(&self) {
        self.send(SubtitleCommand::Show);
    }

    fn hide(&self) {
        self.send(SubtitleCommand::Hide);
    }

    fn update(&self, text: &str) {
        self.send(SubtitleCommand::Update(text.to_string()));
    }
}
