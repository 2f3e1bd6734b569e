//! Length-bounded splitting of outbound replies.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk limit must be at least one character")]
    ZeroLimit,
}

/// Split `text` into consecutive pieces of at most `max_len` characters.
///
/// Concatenating the result yields `text` exactly. A piece ends just after the
/// last newline inside the window when there is one, otherwise just after the
/// last whitespace, otherwise at the window edge. A boundary cut is only taken
/// when the piece before it has visible text, so no piece is blank unless the
/// whole window is. Multi-byte characters are never divided.
pub fn chunk(text: &str, max_len: usize) -> Result<Vec<String>, ChunkError> {
    if max_len == 0 {
        return Err(ChunkError::ZeroLimit);
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset just past the max_len-th character, or None if it all fits
        let Some((window_end, _)) = remaining.char_indices().nth(max_len) else {
            chunks.push(remaining.to_string());
            break;
        };
        let window = &remaining[..window_end];

        let has_text = |end: usize| !window[..end].trim().is_empty();
        let split_at = window
            .rfind('\n')
            .map(|idx| idx + 1)
            .filter(|&end| has_text(end))
            .or_else(|| {
                window
                    .char_indices()
                    .rev()
                    .find(|(_, c)| c.is_whitespace())
                    .map(|(idx, ch)| idx + ch.len_utf8())
                    .filter(|&end| has_text(end))
            })
            .unwrap_or(window_end);

        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }

    Ok(chunks)
}
