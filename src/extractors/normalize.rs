// src/extractors/normalize.rs
//! Canonical matching form of text: lowercase, Turkish letters folded to Latin,
//! punctuation replaced by spaces, whitespace collapsed.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("Failed to compile NON_WORD_RE"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// Three or more single letters separated by single spaces, e.g. "s u r e c".
static LETTER_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\p{L}(?: \p{L}){2,}\b").expect("Failed to compile LETTER_RUN_RE")
});

// A lone "i" split off the following word ("i cerik" -> "icerik").
static SPLIT_I_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bi c").expect("Failed to compile SPLIT_I_RE"));

/// Folds one already-lowercased character. `None` drops it.
fn fold_char(c: char) -> Option<char> {
    match c {
        'ç' => Some('c'),
        'ğ' => Some('g'),
        'ı' => Some('i'),
        'ö' => Some('o'),
        'ş' => Some('s'),
        'ü' => Some('u'),
        // Circumflex vowels still used in Turkish business text ("kâr", "hâlâ").
        'â' => Some('a'),
        'î' => Some('i'),
        'û' => Some('u'),
        // Lowercasing 'İ' yields "i" + U+0307; the combining dot carries no meaning here.
        '\u{0307}' => None,
        other => Some(other),
    }
}

/// Returns the matching form of `text`. Idempotent.
pub fn normalize(text: &str) -> String {
    let folded: String = text.to_lowercase().chars().filter_map(fold_char).collect();
    let spaced = NON_WORD_RE.replace_all(&folded, " ");
    let collapsed = WHITESPACE_RE.replace_all(&spaced, " ");
    let merged = LETTER_RUN_RE.replace_all(collapsed.trim(), |caps: &Captures| {
        caps[0].replace(' ', "")
    });
    SPLIT_I_RE.replace_all(&merged, "ic").into_owned()
}
