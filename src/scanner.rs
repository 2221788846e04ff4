//! Boundary scanning over a target text.
//!
//! All functions work on `&[char]` so that indices line up with the cursor
//! position of a typing session. None of them allocate or mutate.

/// Comment syntax of the language a sample is written in.
///
/// An empty config disables comment skipping entirely; indentation skipping
/// still applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentConfig {
    pub line_tokens: Vec<String>,
    pub block_pairs: Vec<(String, String)>,
}

impl CommentConfig {
    pub fn new<L, B>(line_tokens: L, block_pairs: B) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        B: IntoIterator<Item = (String, String)>,
    {
        Self {
            line_tokens: line_tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
            block_pairs: block_pairs
                .into_iter()
                .filter(|(start, end)| !start.is_empty() && !end.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_tokens.is_empty() && self.block_pairs.is_empty()
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Index just past `token` if it occurs at `index`.
fn token_end(text: &[char], index: usize, token: &str) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    let mut i = index;
    for expected in token.chars() {
        if text.get(i) != Some(&expected) {
            return None;
        }
        i += 1;
    }
    Some(i)
}

/// First blank-free index at or after `index` on the same line.
fn skip_blanks(text: &[char], index: usize) -> usize {
    let mut i = index;
    while i < text.len() && is_blank(text[i]) {
        i += 1;
    }
    i
}

/// Index of the character after the nearest newline before `index`, or 0.
pub fn line_start(text: &[char], index: usize) -> usize {
    let index = index.min(text.len());
    text[..index]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(0, |newline| newline + 1)
}

/// First index at or after `line_start` that is neither a space nor a tab.
pub fn indent_end(text: &[char], line_start: usize) -> usize {
    skip_blanks(text, line_start)
}

/// End of a comment starting exactly at `index`.
///
/// Line comments run up to and including the next newline, block comments up
/// to and including their end token. Unterminated comments run to the end of
/// the text.
pub fn comment_end(text: &[char], index: usize, config: &CommentConfig) -> Option<usize> {
    for token in &config.line_tokens {
        if let Some(after) = token_end(text, index, token) {
            let end = text[after..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(text.len(), |newline| after + newline + 1);
            return Some(end);
        }
    }

    for (start, end) in &config.block_pairs {
        if let Some(after) = token_end(text, index, start) {
            let close = (after..text.len()).find_map(|i| token_end(text, i, end));
            return Some(close.unwrap_or(text.len()));
        }
    }

    None
}

/// End of the skippable region starting at `index`.
///
/// Indentation is resolved before comments. A comment counts when it starts
/// at the current index, or after blanks on the same line as long as those
/// blanks do not run into a line break. Returns `index` itself when nothing
/// can be skipped, and is idempotent on its own output.
pub fn skippable_region_end(text: &[char], index: usize, config: &CommentConfig) -> usize {
    let mut pos = index.min(text.len());

    loop {
        let indent = indent_end(text, line_start(text, pos));
        if pos < indent {
            pos = indent;
            continue;
        }

        if let Some(end) = comment_end(text, pos, config).filter(|&end| end > pos) {
            pos = end;
            continue;
        }

        let after_blanks = skip_blanks(text, pos);
        if after_blanks > pos && text.get(after_blanks).is_some_and(|&c| c != '\n') {
            if let Some(end) = comment_end(text, after_blanks, config) {
                pos = end;
                continue;
            }
        }

        return pos;
    }
}

/// Initial cursor position for a fresh session.
///
/// Skips blank lines and comments at the top of the text, but never the
/// indentation of the first line with real content, since there is no
/// preceding keystroke that could have triggered an indentation skip.
pub fn leading_skip_end(text: &[char], config: &CommentConfig) -> usize {
    let mut pos = 0;

    loop {
        let after_blanks = skip_blanks(text, pos);
        match text.get(after_blanks) {
            Some('\n') => {
                pos = after_blanks + 1;
                continue;
            }
            Some(_) => {
                if let Some(end) = comment_end(text, after_blanks, config) {
                    pos = end;
                    continue;
                }
            }
            // only blanks left
            None => return text.len(),
        }

        return pos;
    }
}

/// Start of the auto-skipped region that ends at `region_end`.
///
/// This is the smallest index whose skippable region ends exactly at
/// `region_end`. `None` means `region_end` was reached by ordinary typing.
///
/// Starts lying strictly inside a region skipped from an earlier start are
/// never candidates, since the cursor jumps over them. A `//` inside a block
/// comment is such a start.
pub fn skipped_region_start(
    text: &[char],
    region_end: usize,
    config: &CommentConfig,
) -> Option<usize> {
    let region_end = region_end.min(text.len());
    let mut covered_until = 0;

    for start in 0..region_end {
        if start < covered_until {
            continue;
        }
        let end = skippable_region_end(text, start, config);
        if end == region_end && end > start {
            return Some(start);
        }
        covered_until = covered_until.max(end);
    }

    None
}
