//! Line diff with a bounded context window.
//!
//! Match is exact text equality of the masked artifacts; the diff is only
//! rendered for reporting. Rendering is plain text and byte-stable for a
//! given input pair so the tool's own output stays snapshot-testable —
//! coloring happens at the console layer, never here.

use difference::{Changeset, Difference};

/// Outcome of comparing an expected artifact against an actual one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub is_match: bool,
    /// Empty when matched; otherwise `- expected` / `+ actual` lines with
    /// unchanged context, elided with `...` when a context limit is set.
    pub rendered: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Same,
    Add,
    Rem,
}

/// Compare two artifacts. `context_lines == 0` renders full context;
/// `N > 0` keeps at most N unchanged lines on each side of a change.
pub fn diff(expected: &str, actual: &str, context_lines: usize) -> Diff {
    if expected == actual {
        return Diff {
            is_match: true,
            rendered: String::new(),
        };
    }
    let lines = split_lines(&Changeset::new(expected, actual, "\n"));
    Diff {
        is_match: false,
        rendered: render(&lines, context_lines),
    }
}

/// Flatten the changeset into per-line records.
fn split_lines(changeset: &Changeset) -> Vec<(Kind, String)> {
    let mut lines = Vec::new();
    for d in &changeset.diffs {
        let (kind, text) = match d {
            Difference::Same(t) => (Kind::Same, t),
            Difference::Add(t) => (Kind::Add, t),
            Difference::Rem(t) => (Kind::Rem, t),
        };
        for line in text.split('\n') {
            lines.push((kind, line.to_owned()));
        }
    }
    lines
}

fn render(lines: &[(Kind, String)], context_lines: usize) -> String {
    let keep = keep_mask(lines, context_lines);
    let mut out = String::new();
    let mut elided = false;
    for (i, (kind, text)) in lines.iter().enumerate() {
        if !keep[i] {
            if !elided {
                out.push_str("...\n");
                elided = true;
            }
            continue;
        }
        elided = false;
        let marker = match kind {
            Kind::Same => "  ",
            Kind::Add => "+ ",
            Kind::Rem => "- ",
        };
        out.push_str(marker);
        out.push_str(text);
        out.push('\n');
    }
    out
}

/// Which lines survive the context window. Zero means keep everything.
fn keep_mask(lines: &[(Kind, String)], context_lines: usize) -> Vec<bool> {
    if context_lines == 0 {
        return vec![true; lines.len()];
    }
    let mut keep = vec![false; lines.len()];
    for (i, (kind, _)) in lines.iter().enumerate() {
        if *kind == Kind::Same {
            continue;
        }
        let lo = i.saturating_sub(context_lines);
        let hi = (i + context_lines).min(lines.len().saturating_sub(1));
        for slot in &mut keep[lo..=hi] {
            *slot = true;
        }
    }
    keep
}
