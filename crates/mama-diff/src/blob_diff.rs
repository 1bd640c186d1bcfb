//! Line diffs of file contents, grouped into hunks and rendered in unified
//! format. Non-UTF-8 content is summarized by size instead of diffed.

use std::fmt::{self, Write as _};

use similar::{ChangeTag, DiffOp, TextDiff};

/// Context lines kept around each change unless configured otherwise.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Line-level difference between two stored or working copies of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    pub hunks: Vec<DiffHunk>,
    /// Line count of the old side (0 for binary content).
    pub old_lines: usize,
    pub new_lines: usize,
    /// Either side failed UTF-8 decoding; `hunks` holds one size summary.
    pub binary: bool,
}

impl BlobDiff {
    fn unchanged(old_lines: usize, new_lines: usize, binary: bool) -> Self {
        Self {
            hunks: Vec::new(),
            old_lines,
            new_lines,
            binary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// `+` lines over all hunks.
    pub fn additions(&self) -> usize {
        self.lines().filter(|l| matches!(l, DiffLine::Added(_))).count()
    }

    /// `-` lines over all hunks.
    pub fn deletions(&self) -> usize {
        self.lines().filter(|l| matches!(l, DiffLine::Removed(_))).count()
    }

    fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|h| h.lines.iter())
    }

    /// `diff -u` style text: `---`/`+++` labels, then each hunk.
    /// Identical blobs render as the empty string.
    pub fn to_unified(&self, old_label: &str, new_label: &str) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!("--- {old_label}\n+++ {new_label}\n");
        for hunk in &self.hunks {
            let _ = writeln!(out, "{}", hunk.header());
            for line in &hunk.lines {
                let _ = writeln!(out, "{line}");
            }
        }
        out
    }
}

/// Changed lines plus surrounding context. Starts are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -s,c +s,c @@` header line.
    ///
    /// An empty side is reported at the line before it, as `diff -u` does.
    pub fn header(&self) -> String {
        let side = |start: usize, count: usize| {
            let start = if count == 0 { start.saturating_sub(1) } else { start };
            format!("{start},{count}")
        };
        format!(
            "@@ -{} +{} @@",
            side(self.old_start, self.old_count),
            side(self.new_start, self.new_count)
        )
    }
}

/// One line of a hunk, without its line terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (marker, text) = match self {
            Self::Context(text) => (' ', text),
            Self::Added(text) => ('+', text),
            Self::Removed(text) => ('-', text),
        };
        write!(f, "{marker}{text}")
    }
}

/// Compute a line-by-line diff with [`DEFAULT_CONTEXT_LINES`] of context.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    diff_blobs_with_context(old, new, DEFAULT_CONTEXT_LINES)
}

/// Compute a line-by-line diff between two byte slices.
///
/// The content is interpreted as UTF-8 text. If either side is not valid
/// UTF-8, a single synthetic hunk noting the binary difference is returned.
pub fn diff_blobs_with_context(old: &[u8], new: &[u8], context: usize) -> BlobDiff {
    let (Ok(old_str), Ok(new_str)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return make_binary_diff(old, new);
    };

    let old_lines = old_str.lines().count();
    let new_lines = new_str.lines().count();
    if old_str == new_str {
        return BlobDiff::unchanged(old_lines, new_lines, false);
    }

    let text_diff = TextDiff::from_lines(old_str, new_str);
    let hunks = text_diff
        .grouped_ops(context)
        .iter()
        .filter_map(|group| build_hunk(&text_diff, group))
        .collect();

    BlobDiff {
        hunks,
        old_lines,
        new_lines,
        binary: false,
    }
}

fn build_hunk(text_diff: &TextDiff<'_, '_, '_, str>, group: &[DiffOp]) -> Option<DiffHunk> {
    let first = group.first()?;
    let last = group.last()?;
    let old_range = first.old_range().start..last.old_range().end;
    let new_range = first.new_range().start..last.new_range().end;

    let lines = group
        .iter()
        .flat_map(|op| text_diff.iter_changes(op))
        .map(|change| {
            let text = change.value().trim_end_matches(|c: char| c == '\n' || c == '\r').to_string();
            match change.tag() {
                ChangeTag::Equal => DiffLine::Context(text),
                ChangeTag::Delete => DiffLine::Removed(text),
                ChangeTag::Insert => DiffLine::Added(text),
            }
        })
        .collect();

    Some(DiffHunk {
        old_start: old_range.start + 1,
        old_count: old_range.len(),
        new_start: new_range.start + 1,
        new_count: new_range.len(),
        lines,
    })
}

/// Binary content gets one hunk summarizing each non-empty side by size.
fn make_binary_diff(old: &[u8], new: &[u8]) -> BlobDiff {
    if old == new {
        return BlobDiff::unchanged(0, 0, true);
    }

    let summary = |bytes: &[u8]| format!("(binary content, {} bytes)", bytes.len());
    let mut hunk = DiffHunk {
        old_start: 1,
        old_count: 0,
        new_start: 1,
        new_count: 0,
        lines: Vec::with_capacity(2),
    };
    if !old.is_empty() {
        hunk.old_count = 1;
        hunk.lines.push(DiffLine::Removed(summary(old)));
    }
    if !new.is_empty() {
        hunk.new_count = 1;
        hunk.lines.push(DiffLine::Added(summary(new)));
    }

    BlobDiff {
        hunks: vec![hunk],
        old_lines: 0,
        new_lines: 0,
        binary: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_renders_nothing() {
        let content = b"hello\nworld\n";
        let diff = diff_blobs(content, content);
        assert!(diff.is_empty());
        assert_eq!(diff.to_unified("a", "b"), "");
    }

    #[test]
    fn appended_line_is_one_addition() {
        let diff = diff_blobs(b"line1\n", b"line1\nline2\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 0);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(
            diff.hunks[0].lines,
            vec![
                DiffLine::Context("line1".into()),
                DiffLine::Added("line2".into())
            ]
        );
    }

    #[test]
    fn changed_line_is_removed_then_added() {
        let diff = diff_blobs(b"hello world\n", b"hello universe\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
    }

    #[test]
    fn unified_rendering() {
        let diff = diff_blobs(b"a\nb\nc\n", b"a\nB\nc\n");
        let text = diff.to_unified("c1/f.txt", "c2/f.txt");
        assert_eq!(
            text,
            "--- c1/f.txt\n+++ c2/f.txt\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn empty_side_header() {
        let diff = diff_blobs(b"", b"new content\n");
        assert_eq!(diff.hunks[0].header(), "@@ -0,0 +1,1 @@");
        let diff = diff_blobs(b"old\n", b"");
        assert_eq!(diff.hunks[0].header(), "@@ -1,1 +0,0 @@");
    }

    #[test]
    fn context_size_controls_hunk_split() {
        let old = b"a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
        let new = b"A\nb\nc\nd\ne\nf\ng\nh\ni\nJ\n";
        assert_eq!(diff_blobs_with_context(old, new, 3).hunks.len(), 2);
        assert_eq!(diff_blobs_with_context(old, new, 5).hunks.len(), 1);
    }

    #[test]
    fn zero_context_has_only_changes() {
        let diff = diff_blobs_with_context(b"a\nb\nc\n", b"a\nX\nc\n", 0);
        let hunk = &diff.hunks[0];
        assert!(hunk.lines.iter().all(|l| !matches!(l, DiffLine::Context(_))));
        assert_eq!((hunk.old_start, hunk.old_count), (2, 1));
    }

    #[test]
    fn binary_sides_are_summarized() {
        let diff = diff_blobs(&[0u8, 1, 2, 0xFF], &[4u8, 0xFE, 0xFD]);
        assert!(diff.binary);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].lines.len(), 2);
    }

    #[test]
    fn identical_binary_is_empty() {
        let diff = diff_blobs(&[0xFF, 0xFE], &[0xFF, 0xFE]);
        assert!(diff.is_empty());
    }

    #[test]
    fn line_counts_cover_whole_blobs() {
        let diff = diff_blobs(b"1\n2\n3\n4\n5\n", b"1\nx\n3\ny\n5\n");
        assert_eq!(diff.old_lines, 5);
        assert_eq!(diff.new_lines, 5);
    }
}
