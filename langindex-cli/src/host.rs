//! A non-interactive [`EditorHost`]: every prompt is answered from the
//! command line, and edits go straight to files.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use langindex::{
    Error, Position, TextRange,
    commands::{EditorHost, EditorSelection, PickItem, Severity},
};

#[derive(Debug, Default)]
pub struct ArgsHost {
    selection: Option<EditorSelection>,
    inputs: Mutex<VecDeque<String>>,
    picks: Mutex<VecDeque<String>>,
    multi_pick: Option<Vec<String>>,
    file: Option<PathBuf>,
    scratch_out: Option<PathBuf>,
    scratch: Mutex<Option<String>>,
}

impl ArgsHost {
    pub fn new() -> Self {
        ArgsHost::default()
    }

    /// Selects `range` of the file at `path`.
    pub fn select_in_file(mut self, path: &Path, range: TextRange) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        self.selection = Some(EditorSelection {
            path: Some(path.to_path_buf()),
            text,
            range,
        });
        Ok(self)
    }

    /// Selects the whole of `text`, held in no file.
    pub fn select_text(mut self, text: &str) -> Self {
        let last = text.lines().count().saturating_sub(1);
        let end = text.lines().last().map(|line| line.chars().count()).unwrap_or(0);
        self.selection = Some(EditorSelection {
            path: None,
            text: text.to_string(),
            range: TextRange::new(Position::new(0, 0), Position::new(last, end)),
        });
        self
    }

    /// Queues the answer to the next input prompt.
    pub fn answer(self, input: impl Into<String>) -> Self {
        self.inputs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(input.into());
        self
    }

    /// Queues the label chosen at the next pick prompt.
    pub fn choose(self, label: impl Into<String>) -> Self {
        self.picks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(label.into());
        self
    }

    pub fn choose_many(mut self, labels: Vec<String>) -> Self {
        self.multi_pick = Some(labels);
        self
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    /// Writes scratch documents to `path` instead of stdout.
    pub fn scratch_to(mut self, path: Option<PathBuf>) -> Self {
        self.scratch_out = path;
        self
    }
}

/// Byte offset of a line/character position, clamped to the text.
fn byte_offset(text: &str, position: Position) -> usize {
    let mut offset = 0;
    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        if line_no == position.line {
            let content = line.trim_end_matches(['\n', '\r']);
            return offset
                + content
                    .char_indices()
                    .nth(position.character)
                    .map(|(i, _)| i)
                    .unwrap_or(content.len());
        }
        offset += line.len();
    }
    text.len()
}

/// `text` with `range` replaced by `replacement`.
pub fn replace_range(text: &str, range: TextRange, replacement: &str) -> String {
    let start = byte_offset(text, range.start);
    let end = byte_offset(text, range.end).max(start);
    format!("{}{}{}", &text[..start], replacement, &text[end..])
}

#[async_trait]
impl EditorHost for ArgsHost {
    fn selection(&self) -> Option<EditorSelection> {
        self.selection.clone()
    }

    async fn input(&self, _title: &str, _placeholder: &str) -> Option<String> {
        self.inputs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    async fn pick(&self, _title: &str, items: &[PickItem]) -> Option<usize> {
        let label = self
            .picks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()?;
        items.iter().position(|item| item.label == label)
    }

    async fn pick_many(&self, _title: &str, items: &[PickItem]) -> Option<Vec<usize>> {
        let labels = self.multi_pick.as_ref()?;
        Some(
            labels
                .iter()
                .filter_map(|label| items.iter().position(|item| &item.label == label))
                .collect(),
        )
    }

    async fn pick_file(&self, _title: &str) -> Option<PathBuf> {
        self.file.clone()
    }

    async fn replace(&self, range: TextRange, text: &str) -> Result<(), Error> {
        match &self.selection {
            Some(EditorSelection {
                path: Some(path),
                text: document,
                ..
            }) => {
                fs::write(path, replace_range(document, range, text))?;
                tracing::debug!(file = %path.display(), "selection replaced");
            }
            _ => println!("{}", text),
        }
        Ok(())
    }

    async fn open_scratch(&self, _locale: &str, text: &str) -> Result<(), Error> {
        match &self.scratch_out {
            Some(path) => fs::write(path, text)?,
            None => println!("{}", text),
        }
        *self.scratch.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        Ok(())
    }

    async fn scratch_text(&self) -> Option<String> {
        self.scratch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => eprintln!("{}", message),
            Severity::Warning => eprintln!("Warning: {}", message),
            Severity::Error => eprintln!("Error: {}", message),
        }
    }

    fn begin_progress(&self, title: &str) {
        eprintln!("{}...", title);
    }

    fn end_progress(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_range_counts_chars() {
        let text = "a = \"你好\";\nb = 1;\n";
        let range = TextRange::on_line(0, 4, 8);
        assert_eq!(replace_range(text, range, "t('hi')"), "a = t('hi');\nb = 1;\n");
    }

    #[test]
    fn test_replace_range_on_crlf_line() {
        let text = "x\r\ny = 'ok';\r\n";
        let range = TextRange::on_line(1, 4, 8);
        assert_eq!(replace_range(text, range, "t('k')"), "x\r\ny = t('k');\r\n");
    }

    #[tokio::test]
    async fn test_pick_by_label() {
        let host = ArgsHost::new().choose("b");
        let items = vec![
            PickItem {
                label: "a".into(),
                detail: String::new(),
            },
            PickItem {
                label: "b".into(),
                detail: String::new(),
            },
        ];
        assert_eq!(host.pick("", &items).await, Some(1));
        assert_eq!(host.pick("", &items).await, None);
    }
}
