//! Sentence segmentation and similarity scoring.
//!
//! Similarity is the Ratcliff/Obershelp "gestalt" ratio: twice the number
//! of characters in matching blocks divided by the total length of both
//! strings. Matching blocks are found by recursively taking the longest
//! common substring and recursing on both sides of it.

use std::collections::HashMap;

/// Fragments shorter than this (in characters) are discarded as noise
pub const MIN_SENTENCE_LEN: usize = 20;

/// Sequences at least this long drop over-represented elements from the
/// match index.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Split text into sentences.
///
/// Splits on whitespace following `.`, `!` or `?`, and on runs of
/// newlines. Pieces are trimmed and those shorter than
/// [`MIN_SENTENCE_LEN`] characters are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut pieces: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let newlines_only = if matches!(prev, Some('.' | '!' | '?')) && ch.is_whitespace() {
            false
        } else if ch == '\n' {
            true
        } else {
            prev = Some(ch);
            continue;
        };
        let in_run = |c: char| {
            if newlines_only {
                c == '\n'
            } else {
                c.is_whitespace()
            }
        };

        let mut last = ch;
        let mut end = text.len();
        while let Some(&(j, c)) = chars.peek() {
            if !in_run(c) {
                end = j;
                break;
            }
            last = c;
            chars.next();
        }
        pieces.push(&text[start..idx]);
        start = end;
        prev = Some(last);
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_LEN)
        .map(str::to_string)
        .collect()
}

/// Case-insensitive similarity ratio in `[0, 1]`
pub fn similarity(a: &str, b: &str) -> f64 {
    sequence_ratio(&a.to_lowercase(), &b.to_lowercase())
}

/// Case-sensitive similarity ratio in `[0, 1]`. Two empty strings are
/// identical.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a, &b).ratio()
}

/// Index and score of the best-scoring candidate.
///
/// Ties go to the earliest candidate. Returns `None` when there are no
/// candidates or none of them shares a single character with `sentence`.
pub fn best_match<S: AsRef<str>>(sentence: &str, candidates: &[S]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let score = similarity(sentence, candidate.as_ref());
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((i, score));
        }
    }
    best
}

/// Score of the best-scoring candidate, `0.0` when there is none
pub fn best_score<S: AsRef<str>>(sentence: &str, candidates: &[S]) -> f64 {
    best_match(sentence, candidates).map_or(0.0, |(_, score)| score)
}

#[derive(Debug, Clone, Copy)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Longest-matching-block sequence matcher over two char sequences
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matched as f64 / total as f64
    }

    fn matching_blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
            blocks.push(m);
        }

        blocks.sort_by_key(|m| (m.a, m.b));
        blocks
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` within the given bounds,
    /// preferring the earliest start in `a`, then in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (a, b) = (self.a, self.b);
        let mut best = Block {
            a: alo,
            b: blo,
            size: 0,
        };

        // j2len[j] = length of the longest match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.size {
                        best = Block {
                            a: i + 1 - k,
                            b: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next;
        }

        // Elements dropped from the index can still extend a match
        while best.a > alo && best.b > blo && a[best.a - 1] == b[best.b - 1] {
            best.a -= 1;
            best.b -= 1;
            best.size += 1;
        }
        while best.a + best.size < ahi
            && best.b + best.size < bhi
            && a[best.a + best.size] == b[best.b + best.size]
        {
            best.size += 1;
        }

        best
    }
}
