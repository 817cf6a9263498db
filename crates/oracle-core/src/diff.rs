//! Line diffs between expected and actual output

use similar::{ChangeTag, TextDiff};

/// Kind of a rendered diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    /// `@@ -a,b +c,d @@`
    Hunk,
    /// Present only in the expected (golden) text
    Removed,
    /// Present only in the actual text
    Added,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: DiffTag,
    pub text: String,
}

impl DiffLine {
    fn new(tag: DiffTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    /// Unified-diff prefix character for this line
    pub fn sign(&self) -> &'static str {
        match self.tag {
            DiffTag::Hunk => "",
            DiffTag::Removed => "-",
            DiffTag::Added => "+",
            DiffTag::Context => " ",
        }
    }
}

/// Unified line diff of `expected` against `actual` with `context` lines around each change
pub fn line_diff(expected: &str, actual: &str, context: usize) -> Vec<DiffLine> {
    let diff = TextDiff::from_lines(expected, actual);
    let mut lines = Vec::new();

    for group in diff.grouped_ops(context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let new_start = first.new_range().start;
        lines.push(DiffLine::new(
            DiffTag::Hunk,
            format!(
                "@@ -{},{} +{},{} @@",
                old_start + 1,
                last.old_range().end - old_start,
                new_start + 1,
                last.new_range().end - new_start
            ),
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let tag = match change.tag() {
                    ChangeTag::Delete => DiffTag::Removed,
                    ChangeTag::Insert => DiffTag::Added,
                    ChangeTag::Equal => DiffTag::Context,
                };
                lines.push(DiffLine::new(tag, change.value().trim_end_matches(['\r', '\n'])));
            }
        }
    }

    lines
}

/// Plain-text rendering of [`line_diff`]
pub fn render_diff(expected: &str, actual: &str, context: usize) -> String {
    line_diff(expected, actual, context)
        .iter()
        .map(|line| format!("{}{}\n", line.sign(), line.text))
        .collect()
}
