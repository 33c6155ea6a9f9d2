//! 프레임 소스 포트.
//!
//! 구현: `livesub-vision::capture::ScreenCapture` (xcap)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::Frame;

/// 프레임 소스: 호출마다 독립된 전체 화면 캡처를 반환
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 현재 장면 전체 캡처
    async fn capture_frame(&self) -> Result<Frame, CoreError>;

    /// 소스 이름 (예: "xcap-primary")
    fn source_name(&self) -> &str;
}
