//! Long-reply splitting for Telegram delivery.
//!
//! Telegram caps messages at 4096 characters, and long agent answers
//! read better as a few shorter bubbles anyway. Replies are split on
//! paragraph boundaries first, then sentence boundaries, and only
//! hard-chunked when a single sentence exceeds the preferred length.

/// Absolute Bot API limit per message, in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Preferred part length for readability.
pub const PREFERRED_MESSAGE_LEN: usize = 600;

/// Split a reply into delivery-sized parts, in order.
///
/// Short replies come back as a single part; blank input yields none.
/// Every returned part is non-empty, trimmed, and at most
/// [`MAX_MESSAGE_LEN`] characters.
pub fn split_reply(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= PREFERRED_MESSAGE_LEN {
        return vec![trimmed.to_string()];
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in trimmed.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if char_len(&current) + char_len(paragraph) > PREFERRED_MESSAGE_LEN {
            flush(&mut parts, &mut current);

            if char_len(paragraph) > PREFERRED_MESSAGE_LEN {
                for sentence in split_sentences(paragraph) {
                    if char_len(&current) + char_len(&sentence) > PREFERRED_MESSAGE_LEN {
                        flush(&mut parts, &mut current);
                    }
                    if char_len(&sentence) > PREFERRED_MESSAGE_LEN {
                        parts.extend(hard_chunks(&sentence, PREFERRED_MESSAGE_LEN));
                    } else {
                        if !current.is_empty() {
                            current.push(' ');
                        }
                        current.push_str(&sentence);
                    }
                }
            } else {
                current.push_str(paragraph);
            }
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
    }
    flush(&mut parts, &mut current);

    parts
        .into_iter()
        .flat_map(|part| {
            if char_len(&part) > MAX_MESSAGE_LEN {
                hard_chunks(&part, MAX_MESSAGE_LEN)
            } else {
                vec![part]
            }
        })
        .collect()
}

fn flush(parts: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    current.clear();
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut prev_was_terminal = false;

    for (idx, ch) in text.char_indices() {
        if prev_was_terminal && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            start = idx;
            prev_was_terminal = false;
            continue;
        }
        prev_was_terminal = matches!(ch, '.' | '!' | '?');
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Split into chunks of at most `limit` characters, on char boundaries.
fn hard_chunks(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
