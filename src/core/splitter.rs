use crate::domain::model::{SectionBody, SectionTag};
use regex::Regex;
use std::sync::LazyLock;

static MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(/?)([A-Z]+)\}$").expect("valid section marker pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    Start(SectionTag),
    End,
}

fn parse_marker(line: &str) -> Option<Marker> {
    let caps = MARKER_PATTERN.captures(line)?;
    if caps[1].is_empty() {
        Some(Marker::Start(SectionTag::from_code(&caps[2])))
    } else {
        // 結束標籤名稱不要求與開始標籤一致
        Some(Marker::End)
    }
}

#[derive(Debug)]
enum SplitState {
    Idle,
    InSection { tag: SectionTag, body: Vec<String> },
}

/// 逐行的區段切分狀態機
///
/// 只保留目前開啟區段的內容，不會緩衝整個檔案。每次 `push_line`
/// 關閉一個區段（遇到結束標籤或下一個開始標籤）時回傳該區段；
/// 檔案結束時呼叫 `finish` 取回未關閉的區段。
#[derive(Debug)]
pub struct SectionSplitter {
    state: SplitState,
}

impl SectionSplitter {
    pub fn new() -> Self {
        Self {
            state: SplitState::Idle,
        }
    }

    pub fn push_line(&mut self, line: &str) -> Option<SectionBody> {
        let line = line.trim();

        match parse_marker(line) {
            Some(Marker::Start(tag)) => {
                let previous = std::mem::replace(
                    &mut self.state,
                    SplitState::InSection {
                        tag,
                        body: Vec::new(),
                    },
                );
                Self::flush(previous)
            }
            Some(Marker::End) => {
                let previous = std::mem::replace(&mut self.state, SplitState::Idle);
                Self::flush(previous)
            }
            None => {
                if let SplitState::InSection { body, .. } = &mut self.state {
                    if !line.is_empty() {
                        body.push(line.to_string());
                    }
                }
                None
            }
        }
    }

    /// 檔案結束；未關閉的區段視同遇到結束標籤
    pub fn finish(self) -> Option<SectionBody> {
        Self::flush(self.state)
    }

    fn flush(state: SplitState) -> Option<SectionBody> {
        match state {
            SplitState::InSection { tag, body } if !body.is_empty() => {
                Some(SectionBody { tag, lines: body })
            }
            _ => None,
        }
    }
}

impl Default for SectionSplitter {
    fn default() -> Self {
        Self::new()
    }
}
