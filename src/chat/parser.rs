use serde::{Deserialize, Serialize};

/// A renderable component extracted from a fenced block in generated text.
/// The payload schemas mirror the props of the SPA's generative-ui
/// components.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "component", content = "props", rename_all = "lowercase")]
pub enum UiComponent {
    Chart(ChartSpec),
    Note(NoteSpec),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartSpec {
    pub data: Vec<ChartPoint>,
    #[serde(rename = "type")]
    pub kind: ChartKind,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NoteSpec {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    White,
    Yellow,
    Blue,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceMarker {
    Chart,
    Note,
}

impl FenceMarker {
    fn from_info_string(info: &str) -> Option<Self> {
        match info {
            "chart" => Some(FenceMarker::Chart),
            "note" => Some(FenceMarker::Note),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum ScanState {
    Outside,
    /// Inside a fence. `marker` is None for fences with an unrecognized info
    /// string (ordinary code blocks), which are tracked only so their
    /// closing delimiter is not mistaken for an opener.
    Inside {
        marker: Option<FenceMarker>,
        payload: String,
    },
}

/// Incremental scanner for marker-tagged fenced blocks in streamed text.
///
/// Fences are line-oriented: an opener line ```` ```chart ```` (or
/// ```` ```note ````), payload lines, then a closing ```` ``` ```` line.
/// The scanner consumes streamed deltas, assembling lines across chunk
/// boundaries, so a fence delimiter split between two deltas is detected
/// exactly as if it had arrived whole. Each line is examined once; nothing
/// is rescanned as the transcript grows.
#[derive(Debug)]
pub struct FenceScanner {
    state: ScanState,
    line: String,
}

impl Default for FenceScanner {
    fn default() -> Self {
        FenceScanner::new()
    }
}

impl FenceScanner {
    pub fn new() -> Self {
        FenceScanner {
            state: ScanState::Outside,
            line: String::new(),
        }
    }

    /// Feeds a streamed text delta. Returns the components whose closing
    /// fence was completed by this delta; an unclosed fence yields nothing
    /// and leaves prior state untouched.
    pub fn push(&mut self, delta: &str) -> Vec<UiComponent> {
        let mut found = Vec::new();
        for c in delta.chars() {
            if c == '\n' {
                self.consume_line(&mut found);
            } else {
                self.line.push(c);
            }
        }
        found
    }

    /// Flushes the trailing unterminated line at end of stream, so a closing
    /// fence without a final newline still closes.
    pub fn finish(&mut self) -> Vec<UiComponent> {
        let mut found = Vec::new();
        if !self.line.is_empty() {
            self.consume_line(&mut found);
        }
        found
    }

    fn consume_line(&mut self, found: &mut Vec<UiComponent>) {
        let line = std::mem::take(&mut self.line);
        let trimmed = line.trim();

        match &mut self.state {
            ScanState::Outside => {
                if let Some(info) = trimmed.strip_prefix("```") {
                    self.state = ScanState::Inside {
                        marker: FenceMarker::from_info_string(info.trim()),
                        payload: String::new(),
                    };
                }
            }
            ScanState::Inside { marker, payload } => {
                if trimmed == "```" {
                    let marker = *marker;
                    let payload = std::mem::take(payload);
                    self.state = ScanState::Outside;
                    if let Some(marker) = marker {
                        match parse_payload(marker, &payload) {
                            Ok(component) => found.push(component),
                            Err(e) => {
                                log::warn!("Discarding malformed {:?} block: {}", marker, e)
                            }
                        }
                    }
                } else {
                    payload.push_str(&line);
                    payload.push('\n');
                }
            }
        }
    }
}

fn parse_payload(marker: FenceMarker, payload: &str) -> Result<UiComponent, serde_json::Error> {
    match marker {
        FenceMarker::Chart => serde_json::from_str(payload).map(UiComponent::Chart),
        FenceMarker::Note => serde_json::from_str(payload).map(UiComponent::Note),
    }
}
