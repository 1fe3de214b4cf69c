//! Heuristic prompt detection over accumulated debugger output.
//!
//! pdb emits no structured end-of-response marker, so idleness is
//! inferred from the formatting conventions of its known output modes.
//! The rules live in an ordered table so new output shapes can be added
//! without touching control flow.
//!
//! Known limitation: debugged-program output that happens to mimic one
//! of these shapes (a stray `(Pdb)` or `[EOF]` printed by the target
//! script) causes a false early return. That risk is accepted and
//! documented rather than papered over with further guessing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// The interactive prompt token pdb prints when awaiting a command.
pub const PROMPT_TOKEN: &str = "(Pdb)";

/// Marker printed at the end of a source listing.
pub const EOF_MARKER: &str = "[EOF]";

/// Marker prefixing the current source line when execution is paused.
const CURRENT_LINE_MARKER: &str = "\n-> ";

/// A line that begins with a line number, as in `l` / `ll` listings.
#[allow(clippy::unwrap_used)] // Pattern is a compile-time constant.
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d").unwrap());

/// One entry in the ordered detection table.
pub struct PromptRule {
    /// Short identifier used in trace logs.
    pub name: &'static str,
    /// Predicate over the full accumulated (right-trimmed) text.
    pub matches: fn(&str) -> bool,
}

/// Detection rules, checked in order; any match means "idle".
pub static RULES: &[PromptRule] = &[
    PromptRule {
        name: "current_line",
        matches: current_line_shape,
    },
    PromptRule {
        name: "listing_eof",
        matches: listing_eof_shape,
    },
    PromptRule {
        name: "code_listing",
        matches: code_listing_shape,
    },
    PromptRule {
        name: "short_response",
        matches: short_response_shape,
    },
];

/// Whether the accumulated output indicates pdb is idle and awaiting
/// the next command. Pure function of the full text; callers re-run it
/// on every incremental update.
#[must_use]
pub fn looks_idle(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    for rule in RULES {
        if (rule.matches)(trimmed) {
            trace!(rule = rule.name, "prompt detected");
            return true;
        }
    }
    false
}

/// Paused at a source position: a `-> code` line is present and the
/// final line is real code, not another `> frame` control marker.
fn current_line_shape(text: &str) -> bool {
    if !text.contains(CURRENT_LINE_MARKER) {
        return false;
    }
    text.lines()
        .last()
        .map(str::trim)
        .is_some_and(|last| !last.is_empty() && !last.starts_with('>'))
}

/// A source listing ran off the end of the file.
fn listing_eof_shape(text: &str) -> bool {
    text.ends_with(EOF_MARKER)
}

/// A finished code-listing response: the prompt token is present and
/// the tail of the output looks like numbered source lines.
fn code_listing_shape(text: &str) -> bool {
    if !text.contains(PROMPT_TOKEN) {
        return false;
    }
    text.lines()
        .rev()
        .take(3)
        .map(str::trim)
        .any(|line| !line.is_empty() && (line.contains(EOF_MARKER) || NUMBERED_LINE.is_match(line)))
}

/// A one-line evaluated-expression response such as `(Pdb) 10`.
fn short_response_shape(text: &str) -> bool {
    text.lines().count() <= 2 && text.starts_with(PROMPT_TOKEN)
}
