//! 스크린 캡처.
//!
//! xcap 기반 모니터 캡처. 캡처는 블로킹 호출이므로 `spawn_blocking`에서 실행한다.

use async_trait::async_trait;
use livesub_core::error::CoreError;
use livesub_core::models::frame::Frame;
use livesub_core::ports::frame_source::FrameSource;
use tracing::debug;
use xcap::Monitor;

/// 스크린 캡처: xcap 기반
///
/// `monitor_index`가 없으면 주 모니터(없으면 첫 모니터)를 캡처한다.
#[derive(Debug, Clone, Default)]
pub struct ScreenCapture {
    monitor_index: Option<usize>,
}

impl ScreenCapture {
    pub fn new(monitor_index: Option<usize>) -> Self {
        Self { monitor_index }
    }

    /// 모니터 캡처 (동기)
    pub fn capture_blocking(monitor_index: Option<usize>) -> Result<Frame, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        let monitor = match monitor_index {
            Some(index) => monitors
                .into_iter()
                .nth(index)
                .ok_or_else(|| CoreError::Capture(format!("모니터 인덱스 {index} 없음")))?,
            None => {
                let mut monitors = monitors;
                let primary = monitors
                    .iter()
                    .position(|m| m.is_primary().unwrap_or(false))
                    .unwrap_or(0);
                if monitors.is_empty() {
                    return Err(CoreError::Capture("모니터를 찾을 수 없음".to_string()));
                }
                monitors.swap_remove(primary)
            }
        };

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        let (w, h) = (image.width(), image.height());
        debug!("스크린 캡처 완료: {}x{}", w, h);

        Frame::new(w, h, image.into_raw())
    }

    /// 사용 가능한 모니터 수
    pub fn monitor_count() -> Result<usize, CoreError> {
        Monitor::all()
            .map(|m| m.len())
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))
    }
}

#[async_trait]
impl FrameSource for ScreenCapture {
    async fn capture_frame(&self) -> Result<Frame, CoreError> {
        let monitor_index = self.monitor_index;
        tokio::task::spawn_blocking(move || Self::capture_blocking(monitor_index))
            .await
            .map_err(|e| CoreError::Capture(format!("캡처 작업 조인 실패: {e}")))?
    }

    fn source_name(&self) -> &str {
        "xcap"
    }
}
