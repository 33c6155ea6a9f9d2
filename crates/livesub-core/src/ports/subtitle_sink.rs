//! 자막 싱크 포트.
//!
//! 구현: `livesub-overlay` crate (채널 싱크 + 터미널 렌더러, 로그 싱크)

/// 자막 싱크: 최종 렌더링 담당
///
/// 모든 명령은 fire-and-forget, 멱등이며 디스패치 경로를 블로킹하지 않는다.
/// `update("")`는 가시성을 바꾸지 않고 텍스트만 지운다.
/// `hide`/`show`는 텍스트와 무관하게 가시성만 토글한다.
pub trait SubtitleSink: Send + Sync {
    /// 오버레이 시작
    fn start(&self);

    /// 오버레이 종료
    fn stop(&self);

    /// 오버레이 표시
    fn show(&self);

    /// 오버레이 숨김 (자기 캡처 회피용)
    fn hide(&self);

    /// 자막 텍스트 교체
    fn update(&self, text: &str);
}
