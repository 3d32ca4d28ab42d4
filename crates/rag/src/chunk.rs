//! Recursive character text splitting.
//!
//! Splits extracted text on progressively finer separators (paragraph,
//! line, word, then raw characters), then greedily merges the fragments
//! into chunks of at most `chunk_size` with a sliding-window overlap of
//! at most `chunk_overlap` carried between adjacent chunks. Sizes are
//! UTF-8 byte lengths; the character fallback only cuts on char
//! boundaries, so byte-bounded chunks never exceed the equivalent
//! character count. The process is deterministic: identical input and
//! parameters always produce the identical chunk sequence.

use crate::types::ChunkCandidate;
use docqa_core::{AppError, AppResult};
use std::collections::VecDeque;

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into chunk candidates. `chunk_size` and `overlap` are
/// byte lengths.
///
/// # Errors
/// Returns `AppError::Config` if `overlap >= chunk_size`, and
/// `AppError::NoChunksProduced` if no non-empty chunk results.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<ChunkCandidate>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    let mut fragments = Vec::new();
    fragment(text, &SEPARATORS, chunk_size, overlap, &mut fragments);

    let candidates: Vec<ChunkCandidate> = merge_fragments(&fragments, chunk_size, overlap)
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(i, text)| ChunkCandidate {
            position: i as u32,
            text,
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::NoChunksProduced);
    }

    tracing::debug!(
        "Split {} characters into {} chunks",
        text.len(),
        candidates.len()
    );

    Ok(candidates)
}

/// Recursively break `text` into fragments no longer than `max_len`,
/// preferring the coarsest separator that works.
fn fragment<'a>(
    text: &'a str,
    separators: &[&str],
    max_len: usize,
    overlap: usize,
    out: &mut Vec<&'a str>,
) {
    if text.is_empty() {
        return;
    }
    if text.len() <= max_len {
        out.push(text);
        return;
    }

    match separators.split_first() {
        Some((sep, rest)) => {
            for part in split_keeping_separator(text, sep) {
                if part.len() <= max_len {
                    out.push(part);
                } else {
                    fragment(part, rest, max_len, overlap, out);
                }
            }
        }
        None => {
            // Character-level fallback for separator-free runs. Windows
            // are sized to the overlap so the merge step can still carry
            // exact continuity between chunks.
            let step = if overlap > 0 { overlap } else { max_len };
            let mut start = 0;
            while start < text.len() {
                let mut end = (start + step).min(text.len());
                while end < text.len() && !text.is_char_boundary(end) {
                    end += 1;
                }
                out.push(&text[start..end]);
                start = end;
            }
        }
    }
}

/// Split on `sep`, keeping the separator attached to the preceding part
/// so that the fragments concatenate back to the original text.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(sep) {
        let end = idx + sep.len();
        parts.push(&rest[..end]);
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

/// Greedily merge fragments into chunks of at most `chunk_size`
/// characters. When a chunk is emitted, a suffix of its fragments of at
/// most `overlap` characters is retained to seed the next chunk.
fn merge_fragments(fragments: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for frag in fragments {
        if total + frag.len() > chunk_size && !window.is_empty() {
            chunks.push(window.iter().copied().collect::<String>());

            while total > overlap || (total + frag.len() > chunk_size && total > 0) {
                match window.pop_front() {
                    Some(front) => total -= front.len(),
                    None => break,
                }
            }
        }
        window.push_back(frag);
        total += frag.len();
    }

    if !window.is_empty() {
        chunks.push(window.iter().copied().collect::<String>());
    }

    chunks
}
