/// First `max_chars` characters, never splitting a UTF-8 sequence.
#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}


/// Single-line preview of document content: whitespace runs collapse to one
/// space and anything past `max_chars` becomes `...`.
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        format!("{}...", safe_truncate(&flat, max_chars))
    } else {
        flat
    }
}
