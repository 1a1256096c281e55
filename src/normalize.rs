/// Tokens dropped during normalization; they label a section without
/// naming it ("Chapter 2", "Section: Theory").
pub const STOP_WORDS: [&str; 6] = ["chapter", "section", "part", "paragraph", "item", "heading"];

const CATEGORY_MARKERS: [&str; 3] = ["chapter", "section", "part"];

const MARKUP_CHARS: &[char] = &['*', '_', '#', '`', '~', '|', '>', '=', '-', '"', '\''];

/// Canonical form of a heading for comparison: lowercased, punctuation
/// replaced by spaces, whitespace collapsed, stop words removed.
pub fn normalize_heading(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ch == '_' {
            cleaned.push(ch);
        } else {
            cleaned.push(' ');
        }
    }

    cleaned
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect::<Vec<&str>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Strips leading enumeration tokens: "1.", "2)", "3.1", "IV." and
/// sequences of them. Roman numerals require an explicit separator so
/// words starting with I/V/X survive.
pub fn strip_enumeration(text: &str) -> &str {
    let mut rest = text.trim();
    loop {
        let len = numeral_prefix_len(rest);
        if len == 0 {
            break;
        }
        rest = rest[len..].trim_start();
    }
    rest
}

fn numeral_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();

    if bytes.first().is_some_and(u8::is_ascii_digit) {
        let mut i = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        while i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        return match bytes.get(i) {
            Some(b'.' | b')' | b':') => i + 1,
            Some(b' ' | b'\t') => i,
            _ => 0,
        };
    }

    let mut i = 0;
    while i < bytes.len()
        && matches!(
            bytes[i],
            b'I' | b'V' | b'X' | b'L' | b'C' | b'i' | b'v' | b'x' | b'l' | b'c'
        )
    {
        i += 1;
    }
    if i > 0 && matches!(bytes.get(i), Some(b'.' | b')')) {
        return i + 1;
    }

    0
}

/// Trims markup delimiters (bold markers, quotes, rules) from both ends.
pub fn trim_markup(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || MARKUP_CHARS.contains(&c))
}

/// Drops a leading category-marker word ("Chapter 1: Theory" -> "1: Theory").
pub fn strip_category_prefix(text: &str) -> &str {
    let trimmed = text.trim_start();

    for marker in CATEGORY_MARKERS {
        let Some(prefix) = trimmed.get(..marker.len()) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case(marker) {
            continue;
        }
        let rest = &trimmed[marker.len()..];
        if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == ':' || c == '.')
        {
            return rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '.');
        }
    }

    trimmed
}
