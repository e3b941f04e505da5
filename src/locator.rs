//! Message re-identification
//!
//! Pages re-render and reorder between sessions, so a saved bookmark has to
//! be matched back to a live element heuristically. Exact snippet equality is
//! the strongest signal, a shared 20-character prefix tolerates small edits,
//! and the saved index is the last resort.

use crate::bookmark::Bookmark;
use crate::snippet::{char_prefix, snippet};

/// Number of leading snippet characters compared by the prefix pass.
pub const PREFIX_MATCH_CHARS: usize = 20;

/// Which pass produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Recomputed snippet equals the saved one
    Exact,
    /// Recomputed snippet starts with the saved snippet's prefix
    Prefix,
    /// Positional fallback on the saved index
    Index,
}

/// A located candidate and how it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    /// The matching candidate
    pub item: T,
    /// Its position in the candidate list
    pub position: usize,
    /// The pass that matched it
    pub kind: MatchKind,
}

/// Find the candidate a bookmark refers to.
///
/// `text_of` returns the visible text of a candidate; it is normalized with
/// the same snippet function used at save time. Passes run in order over the
/// whole candidate list and the first match wins.
///
/// # Examples
///
/// ```
/// use gpt_saver::bookmark::Bookmark;
/// use gpt_saver::locator::{locate, MatchKind};
///
/// let mut bm = Bookmark::capture("https://chatgpt.com/c/1", 0, "second message");
/// bm.index = 0;
/// let page = ["first message", "second  message"];
/// let found = locate(&bm, &page, |t| t.to_string()).unwrap();
/// assert_eq!(found.position, 1);
/// assert_eq!(found.kind, MatchKind::Exact);
/// ```
pub fn locate<T, F>(bookmark: &Bookmark, candidates: &[T], text_of: F) -> Option<Located<T>>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    let snippets: Vec<String> = candidates.iter().map(|c| snippet(&text_of(c))).collect();

    let found = snippets
        .iter()
        .position(|s| *s == bookmark.text_snippet)
        .map(|pos| (pos, MatchKind::Exact))
        .or_else(|| {
            let prefix = char_prefix(&bookmark.text_snippet, PREFIX_MATCH_CHARS);
            snippets
                .iter()
                .position(|s| s.starts_with(prefix))
                .map(|pos| (pos, MatchKind::Prefix))
        })
        .or_else(|| {
            bookmark
                .position()
                .filter(|pos| *pos < candidates.len())
                .map(|pos| (pos, MatchKind::Index))
        });

    found.map(|(position, kind)| Located {
        item: candidates[position].clone(),
        position,
        kind,
    })
}
