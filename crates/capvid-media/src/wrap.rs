//! Column word-wrapping for caption text.
//!
//! Each input line is wrapped independently; runs of whitespace inside a
//! line collapse to single spaces. Words longer than the column width are
//! force-broken at the column bound only, never at hyphens, so a
//! hyphenated word wraps as one unit while it fits. A line that wraps to
//! nothing still yields one empty output line, so blank input lines are
//! never dropped.

/// Wrap `text` to `columns` characters per line.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut out = Vec::new();
    for line in text.split('\n') {
        let wrapped = wrap_line(line, columns);
        if wrapped.is_empty() {
            out.push(String::new());
        } else {
            out.extend(wrapped);
        }
    }
    out
}

fn wrap_line(line: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        for chunk in break_word(word, columns) {
            let chunk_len = chunk.chars().count();
            let needed = if current.is_empty() {
                chunk_len
            } else {
                current_len + 1 + chunk_len
            };

            if needed <= columns {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(&chunk);
                current_len += chunk_len;
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = chunk;
                current_len = current.chars().count();
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a word into column-sized chunks; words that fit pass through.
fn break_word(word: &str, columns: usize) -> Vec<String> {
    if word.chars().count() <= columns {
        return vec![word.to_string()];
    }
    word.chars()
        .collect::<Vec<_>>()
        .chunks(columns)
        .map(|c| c.iter().collect())
        .collect()
}
