// # -----------------------------
// # crates/patcher/src/lib.rs
// # -----------------------------
//! Best-effort search/replace block patcher.
//!
//! A model response carries zero or more edit blocks:
//!
//! ```text
//! <<<<<<< SEARCH
//! const x = 1;
//! =======
//! const x = 2;
//! >>>>>>> REPLACE
//! ```
//!
//! Blocks are applied in order to a working copy of the document. Malformed
//! blocks and blocks whose search text cannot be found are skipped; the
//! patcher never fails.

use serde::Serialize;

/// Opens an edit block. The trailing newline belongs to the marker.
pub const SEARCH_START: &str = "<<<<<<< SEARCH\n";
/// Separates the search text from the replace text.
pub const DIVIDER: &str = "=======\n";
/// Closes an edit block.
pub const REPLACE_END: &str = ">>>>>>> REPLACE";

/// One search/replace pair extracted from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditInstruction {
    pub search: String,
    pub replace: String,
}

impl EditInstruction {
    /// A whitespace-only search text means "insert at the top".
    pub fn is_prepend(&self) -> bool {
        self.search.trim().is_empty()
    }

    /// Applies this instruction to `doc`, returning the new document.
    fn apply(&self, doc: &str) -> (String, InstructionOutcome) {
        if self.is_prepend() {
            let mut out = String::with_capacity(self.replace.len() + 1 + doc.len());
            out.push_str(&self.replace);
            out.push('\n');
            out.push_str(doc);
            return (out, InstructionOutcome::Prepended);
        }
        match doc.find(&self.search) {
            Some(at) => {
                let mut out = String::with_capacity(doc.len() - self.search.len() + self.replace.len());
                out.push_str(&doc[..at]);
                out.push_str(&self.replace);
                out.push_str(&doc[at + self.search.len()..]);
                (out, InstructionOutcome::Replaced { at })
            }
            None => (doc.to_string(), InstructionOutcome::NotFound),
        }
    }
}

/// What happened to a single well-formed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstructionOutcome {
    /// First occurrence replaced; `at` is the byte offset in the document
    /// as it was before this instruction ran.
    Replaced { at: usize },
    Prepended,
    NotFound,
}

/// Result of [`apply_changes_with_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub text: String,
    pub instructions: Vec<EditInstruction>,
    pub outcomes: Vec<InstructionOutcome>,
    /// Blocks opened by a search-start marker that lacked a divider or a
    /// replace-end marker. Text before the first marker is not counted.
    pub malformed: usize,
}

impl PatchReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, InstructionOutcome::NotFound))
            .count()
    }

    pub fn not_found(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    /// True when every block in the response was well formed and applied.
    pub fn is_complete(&self) -> bool {
        self.malformed == 0 && self.not_found() == 0
    }
}

enum Segment {
    Blank,
    Malformed,
    Edit(EditInstruction),
}

/// Offset of the first divider that starts a line. A run of `=` at the end
/// of a code line (`# ==========`) is not a divider.
fn find_divider(text: &str) -> Option<usize> {
    text.match_indices(DIVIDER)
        .map(|(at, _)| at)
        .find(|&at| at == 0 || text.as_bytes()[at - 1] == b'\n')
}

fn parse_segment(segment: &str) -> Segment {
    if segment.trim().is_empty() {
        return Segment::Blank;
    }
    let Some(at) = find_divider(segment) else {
        return Segment::Malformed;
    };
    if !segment.contains(REPLACE_END) {
        return Segment::Malformed;
    }
    let search_raw = &segment[..at];
    let after_divider = &segment[at + DIVIDER.len()..];
    let after_divider = match find_divider(after_divider) {
        Some(next) => &after_divider[..next],
        None => after_divider,
    };
    let replace_raw = after_divider
        .split(REPLACE_END)
        .next()
        .unwrap_or_default();
    Segment::Edit(EditInstruction {
        search: search_raw.trim_end().to_string(),
        replace: replace_raw.trim_end().to_string(),
    })
}

/// Extracts the well-formed instructions of `response`, in order.
pub fn parse_instructions(response: &str) -> Vec<EditInstruction> {
    response
        .split(SEARCH_START)
        .filter_map(|seg| match parse_segment(seg) {
            Segment::Edit(e) => Some(e),
            _ => None,
        })
        .collect()
}

/// Applies every edit block of `response` to `base` and returns the result.
///
/// Blocks run sequentially on the cumulative document, so a later block may
/// target text introduced by an earlier one. Only the first literal
/// occurrence of a search text is replaced. Blocks that are malformed or
/// whose search text is absent leave the document untouched.
pub fn apply_changes(base: &str, response: &str) -> String {
    apply_changes_with_report(base, response).text
}

/// Same as [`apply_changes`], keeping track of what each block did.
pub fn apply_changes_with_report(base: &str, response: &str) -> PatchReport {
    let mut doc = base.to_string();
    let mut instructions = Vec::new();
    let mut outcomes = Vec::new();
    let mut malformed = 0;

    for (i, segment) in response.split(SEARCH_START).enumerate() {
        match parse_segment(segment) {
            Segment::Blank => {}
            Segment::Malformed => {
                if i > 0 {
                    malformed += 1;
                }
            }
            Segment::Edit(edit) => {
                let (next, outcome) = edit.apply(&doc);
                doc = next;
                instructions.push(edit);
                outcomes.push(outcome);
            }
        }
    }

    PatchReport {
        text: doc,
        instructions,
        outcomes,
        malformed,
    }
}

/// Renders the block format so a model can be told to emit it. Uses the same
/// marker constants the parser splits on.
pub fn edit_format_instructions() -> String {
    format!(
        "Describe every change as one or more edit blocks and output nothing else.\n\
         Each block has this exact shape:\n\
         {SEARCH_START}<exact lines copied from the current code>\n\
         {DIVIDER}<the new lines>\n\
         {REPLACE_END}\n\
         Rules:\n\
         - The SEARCH part must match the current code exactly, whitespace included, \
         and be long enough to be unique.\n\
         - Only the first occurrence of the SEARCH part is replaced.\n\
         - Blocks are applied in order; a block may target text written by an earlier one.\n\
         - To insert at the very top of the file, leave the SEARCH part empty.\n\
         - To delete code, leave the REPLACE part empty.\n"
    )
}
