//! Token-level edit scripts
//!
//! An edit script is an ordered list of Equal/Delete/Insert spans. The spans
//! come from an [`EditScriptSource`] (by default the `similar` crate) and are
//! then passed through [`cleanup_semantic`] so that edits land on boundaries a
//! human would pick.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Kind of an edit span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Equal,
    Delete,
    Insert,
}

/// One span of an edit script. The text may contain embedded line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    pub kind: EditKind,
    pub text: String,
}

impl EditOp {
    pub fn new(kind: EditKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(EditKind::Equal, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(EditKind::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(EditKind::Insert, text)
    }
}

/// Rebuild the left text (Equal + Delete spans)
pub fn left_text(ops: &[EditOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != EditKind::Insert)
        .map(|op| op.text.as_str())
        .collect()
}

/// Rebuild the right text (Equal + Insert spans)
pub fn right_text(ops: &[EditOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != EditKind::Delete)
        .map(|op| op.text.as_str())
        .collect()
}

/// Anything that can compute an edit script between two texts.
///
/// Implementations must uphold the reconstruction invariant: [`left_text`] and
/// [`right_text`] of the returned script equal the inputs.
pub trait EditScriptSource {
    fn edit_script(&self, left: &str, right: &str) -> Vec<EditOp>;
}

/// Token granularity used by [`SimilarDiff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Chars,
    #[default]
    Words,
    Lines,
}

/// Edit scripts computed with `similar`
#[derive(Debug, Clone)]
pub struct SimilarDiff {
    granularity: Granularity,
    algorithm: Algorithm,
    timeout: Option<Duration>,
}

impl Default for SimilarDiff {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            algorithm: Algorithm::Myers,
            timeout: None,
        }
    }
}

impl SimilarDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token granularity
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Use the patience algorithm instead of Myers
    pub fn patience(mut self, patience: bool) -> Self {
        self.algorithm = if patience {
            Algorithm::Patience
        } else {
            Algorithm::Myers
        };
        self
    }

    /// Bound the diff computation; past the deadline `similar` falls back to a
    /// coarser (still valid) script.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl EditScriptSource for SimilarDiff {
    fn edit_script(&self, left: &str, right: &str) -> Vec<EditOp> {
        let mut config = TextDiff::configure();
        config.algorithm(self.algorithm);
        if let Some(timeout) = self.timeout {
            config.deadline(Instant::now() + timeout);
        }

        let diff = match self.granularity {
            Granularity::Chars => config.diff_chars(left, right),
            Granularity::Words => config.diff_words(left, right),
            Granularity::Lines => config.diff_lines(left, right),
        };

        let mut ops: Vec<EditOp> = Vec::new();
        for change in diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => EditKind::Equal,
                ChangeTag::Delete => EditKind::Delete,
                ChangeTag::Insert => EditKind::Insert,
            };
            match ops.last_mut() {
                Some(last) if last.kind == kind => last.text.push_str(change.value()),
                _ => ops.push(EditOp::new(kind, change.value())),
            }
        }
        ops
    }
}

/// Span text with its length in chars
#[derive(Debug, Default)]
struct Run {
    text: String,
    chars: usize,
}

impl Run {
    fn new(text: String) -> Self {
        let chars = text.chars().count();
        Self { text, chars }
    }

    fn push(&mut self, other: &Run) {
        self.text.push_str(&other.text);
        self.chars += other.chars;
    }
}

/// Intermediate form: alternating equalities and change runs
#[derive(Debug)]
enum Segment {
    Equal(Run),
    Change { deleted: Run, inserted: Run },
}

impl Segment {
    fn change_len(&self) -> Option<usize> {
        match self {
            Segment::Change { deleted, inserted } => Some(deleted.chars.max(inserted.chars)),
            Segment::Equal(_) => None,
        }
    }
}

fn segments(ops: Vec<EditOp>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for op in ops.into_iter().filter(|op| !op.text.is_empty()) {
        let run = Run::new(op.text);
        match (op.kind, out.last_mut()) {
            (EditKind::Equal, Some(Segment::Equal(text))) => text.push(&run),
            (EditKind::Equal, _) => out.push(Segment::Equal(run)),
            (EditKind::Delete, Some(Segment::Change { deleted, .. })) => deleted.push(&run),
            (EditKind::Insert, Some(Segment::Change { inserted, .. })) => inserted.push(&run),
            (EditKind::Delete, _) => out.push(Segment::Change {
                deleted: run,
                inserted: Run::default(),
            }),
            (EditKind::Insert, _) => out.push(Segment::Change {
                deleted: Run::default(),
                inserted: run,
            }),
        }
    }
    out
}

/// Fold `change, equal, change` at the end of `segments` into one change when
/// the equality is no longer than either edit. Returns whether it folded.
fn dissolve_tail(segments: &mut Vec<Segment>) -> bool {
    let n = segments.len();
    if n < 3 {
        return false;
    }
    let Segment::Equal(equal) = &segments[n - 2] else {
        return false;
    };
    let short = match (segments[n - 3].change_len(), segments[n - 1].change_len()) {
        (Some(before), Some(after)) => equal.chars <= before && equal.chars <= after,
        _ => false,
    };
    if !short {
        return false;
    }

    let (
        Some(Segment::Change {
            deleted: after_deleted,
            inserted: after_inserted,
        }),
        Some(Segment::Equal(equal)),
        Some(Segment::Change { deleted, inserted }),
    ) = (segments.pop(), segments.pop(), segments.last_mut())
    else {
        unreachable!("tail shape checked above");
    };
    deleted.push(&equal);
    deleted.push(&after_deleted);
    inserted.push(&equal);
    inserted.push(&after_inserted);
    true
}

/// Semantic cleanup of an edit script.
///
/// Normalizes the script (no empty spans, no adjacent spans of the same kind,
/// each change run ordered as one Delete followed by one Insert) and then
/// dissolves short equalities that sit between two larger edits into those
/// edits. Both reconstruction invariants are preserved.
pub fn cleanup_semantic(ops: Vec<EditOp>) -> Vec<EditOp> {
    let mut cleaned: Vec<Segment> = Vec::new();
    for segment in segments(ops) {
        cleaned.push(segment);
        // A fold grows the last change, which can make the previous equality short too
        while dissolve_tail(&mut cleaned) {}
    }

    let mut out = Vec::with_capacity(cleaned.len() * 2);
    for segment in cleaned {
        match segment {
            Segment::Equal(run) => out.push(EditOp::equal(run.text)),
            Segment::Change { deleted, inserted } => {
                if !deleted.text.is_empty() {
                    out.push(EditOp::delete(deleted.text));
                }
                if !inserted.text.is_empty() {
                    out.push(EditOp::insert(inserted.text));
                }
            }
        }
    }
    out
}
