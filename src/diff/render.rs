//! Line diff renderer
//!
//! Turns a token-level edit script into one record per physical line, with
//! independent 1-based numbering for the left (base) and right (revised)
//! sides. Edit spans may start or end in the middle of a line, so partial
//! fragments are buffered per side until that side's line break arrives.

use serde::{Deserialize, Serialize};

use super::edit_script::{EditKind, EditOp, EditScriptSource, SimilarDiff, cleanup_semantic};
use super::format::DIFF_STYLES;

/// How a rendered line relates the two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Equal,
    Deletion,
    Insertion,
}

/// One rendered line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub left_number: Option<usize>,
    pub right_number: Option<usize>,
    pub classification: Classification,
    /// HTML-escaped line text without its line break
    pub content: String,
}

/// Output of a render call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub lines: Vec<LineRecord>,
    pub styles: String,
}

impl RenderResult {
    /// Number of deleted lines
    pub fn deletions(&self) -> usize {
        self.count(Classification::Deletion)
    }

    /// Number of inserted lines
    pub fn insertions(&self) -> usize {
        self.count(Classification::Insertion)
    }

    /// Check if any line differs
    pub fn has_changes(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.classification != Classification::Equal)
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        if !self.has_changes() {
            "No changes".to_string()
        } else {
            format!("+{} -{} lines", self.insertions(), self.deletions())
        }
    }

    fn count(&self, classification: Classification) -> usize {
        self.lines
            .iter()
            .filter(|line| line.classification == classification)
            .count()
    }
}

/// Render two texts with the default `similar`-backed edit script
pub fn render(left: &str, right: &str) -> RenderResult {
    render_with(&SimilarDiff::default(), left, right)
}

/// Render two texts with a caller-supplied edit script source
pub fn render_with(source: &impl EditScriptSource, left: &str, right: &str) -> RenderResult {
    let ops = cleanup_semantic(source.edit_script(left, right));
    render_ops(&ops)
}

/// Text of the line currently being assembled on one side
#[derive(Debug, Default)]
struct PendingLine {
    text: String,
    /// Holds changed text, or no longer lines up with the other side
    dirty: bool,
}

impl PendingLine {
    fn take(&mut self) -> String {
        self.dirty = false;
        std::mem::take(&mut self.text)
    }
}

#[derive(Debug)]
struct LineBuilder {
    lines: Vec<LineRecord>,
    left: PendingLine,
    right: PendingLine,
    left_number: usize,
    right_number: usize,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            left: PendingLine::default(),
            right: PendingLine::default(),
            left_number: 1,
            right_number: 1,
        }
    }

    fn push_equal(&mut self, content: String) {
        self.lines.push(LineRecord {
            left_number: Some(self.left_number),
            right_number: Some(self.right_number),
            classification: Classification::Equal,
            content: html_escape::encode_text(&content).into_owned(),
        });
        self.left_number += 1;
        self.right_number += 1;
    }

    fn push_deletion(&mut self, content: String) {
        self.lines.push(LineRecord {
            left_number: Some(self.left_number),
            right_number: None,
            classification: Classification::Deletion,
            content: html_escape::encode_text(&content).into_owned(),
        });
        self.left_number += 1;
    }

    fn push_insertion(&mut self, content: String) {
        self.lines.push(LineRecord {
            left_number: None,
            right_number: Some(self.right_number),
            classification: Classification::Insertion,
            content: html_escape::encode_text(&content).into_owned(),
        });
        self.right_number += 1;
    }

    /// A line break shared by both sides ends the current line on each
    fn end_both(&mut self) {
        let unchanged = !self.left.dirty && !self.right.dirty;
        let left = self.left.take();
        let right = self.right.take();
        if unchanged {
            self.push_equal(left);
        } else {
            self.push_deletion(left);
            self.push_insertion(right);
        }
    }

    fn end_left(&mut self) {
        let left = self.left.take();
        self.push_deletion(left);
        // The right line started alongside the one just closed; it can no longer match
        if !self.right.text.is_empty() {
            self.right.dirty = true;
        }
    }

    fn end_right(&mut self) {
        let right = self.right.take();
        self.push_insertion(right);
        if !self.left.text.is_empty() {
            self.left.dirty = true;
        }
    }

    fn feed(&mut self, op: &EditOp) {
        let mut fragments = op.text.split('\n').peekable();
        while let Some(fragment) = fragments.next() {
            let terminated = fragments.peek().is_some();
            match op.kind {
                EditKind::Equal => {
                    self.left.text.push_str(fragment);
                    self.right.text.push_str(fragment);
                    if terminated {
                        self.end_both();
                    }
                }
                EditKind::Delete => {
                    if !fragment.is_empty() {
                        self.left.text.push_str(fragment);
                        self.left.dirty = true;
                    }
                    if terminated {
                        self.end_left();
                    }
                }
                EditKind::Insert => {
                    if !fragment.is_empty() {
                        self.right.text.push_str(fragment);
                        self.right.dirty = true;
                    }
                    if terminated {
                        self.end_right();
                    }
                }
            }
        }
    }

    /// Flush unterminated final lines. An empty remainder is the phantom
    /// fragment after a trailing line break and produces nothing.
    fn finish(mut self) -> Vec<LineRecord> {
        let left_open = !self.left.text.is_empty();
        let right_open = !self.right.text.is_empty();
        if left_open && right_open && !self.left.dirty && !self.right.dirty {
            self.end_both();
        } else {
            if left_open {
                let left = self.left.take();
                self.push_deletion(left);
            }
            if right_open {
                let right = self.right.take();
                self.push_insertion(right);
            }
        }
        self.lines
    }
}

/// Render an already computed edit script
pub fn render_ops(ops: &[EditOp]) -> RenderResult {
    let mut builder = LineBuilder::new();
    for op in ops {
        builder.feed(op);
    }
    RenderResult {
        lines: builder.finish(),
        styles: DIFF_STYLES.to_string(),
    }
}
