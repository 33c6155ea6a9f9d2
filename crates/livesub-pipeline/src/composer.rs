//! 표시 문자열 조합.
//!
//! 선택지 블록 → 화자 이름 → 대사 본문 순서로 한 줄씩 이어 붙인다.

/// 선택지 블록 머리
pub const OPTIONS_PREFIX: &str = "選択肢：{";

/// 화자 이름 뒤에 붙는 전각 콜론
pub const SPEAKER_SUFFIX: char = '：';

/// 한 사이클에서 인식된 영역별 텍스트
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTexts {
    pub dialog: String,
    pub speaker: String,
    pub options: String,
}

impl RegionTexts {
    pub fn new(
        dialog: impl Into<String>,
        speaker: impl Into<String>,
        options: impl Into<String>,
    ) -> Self {
        Self {
            dialog: dialog.into(),
            speaker: speaker.into(),
            options: options.into(),
        }
    }
}

/// 영역 텍스트를 하나의 표시 문자열로 조합
///
/// 선택지는 trim 후 글자 수가 `options_min_chars`를 초과할 때만 포함된다
/// (상단 배경에서 잡힌 OCR 잡음 제거).
pub fn compose(texts: &RegionTexts, options_min_chars: usize) -> String {
    let dialog = texts.dialog.trim();
    let speaker = texts.speaker.trim();
    let options = texts.options.trim();

    let mut lines: Vec<String> = Vec::with_capacity(4);

    if options.chars().count() > options_min_chars {
        lines.push(OPTIONS_PREFIX.to_string());
        lines.push(format!("{options}}}"));
    }

    if !speaker.is_empty() {
        lines.push(format!("{speaker}{SPEAKER_SUFFIX}"));
    }

    if !dialog.is_empty() {
        lines.push(dialog.to_string());
    }

    lines.join("\n").trim().to_string()
}
