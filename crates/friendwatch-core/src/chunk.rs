//! Splitting long notifications into payload-sized chunks.
//!
//! Lengths are counted in `char`s so truncation never cuts a code point in
//! half.

/// Split `text` into chunks of at most `max_len` characters.
///
/// Text that already fits is returned unchanged as a single chunk.
/// Otherwise lines are packed greedily; a chunk is flushed as soon as the
/// next line would overflow it. A line longer than `max_len` is truncated to
/// `max_len` and emitted alone. Joining the chunks with `\n` gives back the
/// original text, apart from those truncated lines.
///
/// A `max_len` of zero yields no chunks.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }
    if text.chars().count() <= max_len {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > max_len {
            flush(&mut chunks, &mut current, &mut current_len);
            chunks.push(line.chars().take(max_len).collect());
            continue;
        }

        // Joining adds one newline per line after the first.
        let separator = usize::from(!current.is_empty());
        let needed = current_len
            .saturating_add(separator)
            .saturating_add(line_len);
        if needed > max_len {
            flush(&mut chunks, &mut current, &mut current_len);
            current_len = line_len;
        } else {
            current_len = needed;
        }
        current.push(line);
    }

    flush(&mut chunks, &mut current, &mut current_len);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut Vec<&str>, current_len: &mut usize) {
    if !current.is_empty() {
        chunks.push(current.join("\n"));
        current.clear();
    }
    *current_len = 0;
}
