//! # livesub-overlay
//!
//! 자막 출력 어댑터.
//!
//! 파이프라인은 `SubtitleSink` 명령을 보내기만 하고 기다리지 않는다.
//! [`channel_sink::ChannelSubtitleSink`]가 명령을 채널로 넘기면
//! [`terminal::TerminalOverlay`]가 별도 태스크에서 [`state::OverlayState`]에
//! 반영하고, 상태가 바뀐 경우에만 다시 그린다.
//! [`log_sink::LogSubtitleSink`]는 렌더러 없이 tracing 로그로만 출력한다.

pub mod channel_sink;
pub mod log_sink;
pub mod state;
pub mod terminal;

pub use channel_sink::ChannelSubtitleSink;
pub use log_sink::LogSubtitleSink;
pub use state::{OverlayState, SubtitleCommand};
pub use terminal::TerminalOverlay;
