//! Formatters for rendered diffs
//!
//! Line records are produced once by the renderer and serialized here into
//! whatever the consumer displays: HTML for the browser editor, plain text for
//! the terminal.

use super::render::{Classification, LineRecord, RenderResult};

/// Style sheet shipped alongside every rendered diff
pub const DIFF_STYLES: &str = r#"
.diff-container {
    font-family: ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, Liberation Mono, Courier New, monospace;
    font-size: 0.875rem;
    line-height: 1.25rem;
    width: 100%;
}
.diff-line {
    display: flex;
    border-bottom: 1px solid hsl(var(--border));
}
.line-number {
    padding: 0 0.5rem;
    text-align: right;
    min-width: 3rem;
    user-select: none;
    color: hsl(var(--muted-foreground));
    border-right: 1px solid hsl(var(--border));
}
.line-content {
    padding: 0 0.5rem;
    white-space: pre;
    flex: 1;
    overflow-x: auto;
}
.diff-deletion {
    background-color: rgba(239, 68, 68, 0.2);
}
.diff-addition {
    background-color: rgba(34, 197, 94, 0.2);
}
.diff-equal {
    color: hsl(var(--foreground));
}
.diff-deletion-text {
    color: rgb(239, 68, 68);
    text-decoration: line-through;
}
.diff-addition-text {
    color: rgb(34, 197, 94);
}
"#;

/// Serializes a render result into a target markup
pub trait DiffFormatter {
    fn format(&self, result: &RenderResult) -> String;
}

fn number_cell(number: Option<usize>) -> String {
    number.map(|n| n.to_string()).unwrap_or_default()
}

/// HTML markup, one `diff-line` row per record
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl HtmlFormatter {
    fn line(&self, line: &LineRecord) -> String {
        let content = match line.classification {
            Classification::Equal => {
                format!(r#"<span class="diff-equal">{}</span>"#, line.content)
            }
            Classification::Deletion => format!(
                r#"<div class="diff-deletion"><span class="diff-deletion-text">{}</span></div>"#,
                line.content
            ),
            Classification::Insertion => format!(
                r#"<div class="diff-addition"><span class="diff-addition-text">{}</span></div>"#,
                line.content
            ),
        };
        format!(
            r#"<div class="diff-line"><div class="line-number">{}</div><div class="line-number">{}</div><div class="line-content">{}</div></div>"#,
            number_cell(line.left_number),
            number_cell(line.right_number),
            content
        )
    }
}

impl DiffFormatter for HtmlFormatter {
    /// Content is already escaped by the renderer and is embedded as is
    fn format(&self, result: &RenderResult) -> String {
        let rows: Vec<String> = result.lines.iter().map(|line| self.line(line)).collect();
        format!(r#"<div class="diff-container">{}</div>"#, rows.join("\n"))
    }
}

/// Terminal-friendly rendering: both line numbers, a marker and the text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl DiffFormatter for PlainFormatter {
    fn format(&self, result: &RenderResult) -> String {
        let width = result
            .lines
            .iter()
            .flat_map(|line| [line.left_number, line.right_number])
            .flatten()
            .max()
            .unwrap_or(0)
            .to_string()
            .len();

        let mut out = String::new();
        for line in &result.lines {
            let marker = match line.classification {
                Classification::Equal => ' ',
                Classification::Deletion => '-',
                Classification::Insertion => '+',
            };
            out.push_str(&format!(
                "{:>width$} {:>width$} {} {}\n",
                number_cell(line.left_number),
                number_cell(line.right_number),
                marker,
                html_escape::decode_html_entities(&line.content),
                width = width
            ));
        }
        out
    }
}
