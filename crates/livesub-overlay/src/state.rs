//! 오버레이 상태.
//!
//! 자막 명령을 상태에 반영하는 리듀서. 렌더러와 분리되어 있어
//! 어떤 출력 방식이든 같은 규칙을 따른다.

/// 자막 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleCommand {
    Start,
    Stop,
    Show,
    Hide,
    Update(String),
}

/// 오버레이 표시 상태
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayState {
    running: bool,
    visible: bool,
    text: String,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령 반영: 상태가 바뀌었으면 true
    ///
    /// - `Start`: 실행 + 표시
    /// - `Stop`: 정지, 숨김, 텍스트 삭제
    /// - `Update`: 텍스트만 교체 (표시 여부는 그대로), 같은 텍스트면 no-op
    /// - `Show`/`Hide`: 표시 여부만 전환
    pub fn apply(&mut self, command: SubtitleCommand) -> bool {
        let before = self.clone();

        match command {
            SubtitleCommand::Start => {
                self.running = true;
                self.visible = true;
            }
            SubtitleCommand::Stop => {
                self.running = false;
                self.visible = false;
                self.text.clear();
            }
            SubtitleCommand::Show => self.visible = true,
            SubtitleCommand::Hide => self.visible = false,
            SubtitleCommand::Update(text) => {
                if self.text != text {
                    self.text = text;
                }
            }
        }

        *self != before
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 실제로 화면에 보이는 텍스트 (숨김/정지면 None)
    pub fn displayed_text(&self) -> Option<&str> {
        (self.running && self.visible).then_some(self.text.as_str())
    }
}
