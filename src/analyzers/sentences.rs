//! Sentence boundaries over char offsets.

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// The sentence containing chars `[start, end)`: from just after the previous
/// terminator (leading whitespace skipped) to the next terminator inclusive,
/// or the end of the text.
pub fn sentence_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let start = start.min(chars.len());
    let end = end.clamp(start, chars.len());

    let mut sentence_start = chars[..start]
        .iter()
        .rposition(|c| is_terminator(*c))
        .map(|i| i + 1)
        .unwrap_or(0);
    while sentence_start < start && chars[sentence_start].is_whitespace() {
        sentence_start += 1;
    }

    let sentence_end = chars[end..]
        .iter()
        .position(|c| is_terminator(*c))
        .map(|i| end + i + 1)
        .unwrap_or(chars.len());

    (sentence_start, sentence_end)
}

/// Split `text` into sentence char ranges, trimmed of surrounding whitespace.
/// Runs of terminators ("?!", "...") stay with their sentence.
pub fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        if is_terminator(chars[i]) {
            while i + 1 < chars.len() && is_terminator(chars[i + 1]) {
                i += 1;
            }
            push_trimmed(&chars, start, i + 1, &mut out);
            start = i + 1;
        }
        i += 1;
    }
    push_trimmed(&chars, start, chars.len(), &mut out);
    out
}

fn push_trimmed(chars: &[char], mut start: usize, mut end: usize, out: &mut Vec<(usize, usize)>) {
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if start < end {
        out.push((start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::slice_chars;

    #[test]
    fn test_bounds_inside_second_sentence() {
        let text = "First one. The ball was thrown by Sam. Last.";
        let (s, e) = sentence_bounds(text, 20, 26);
        assert_eq!(slice_chars(text, s, e), Some("The ball was thrown by Sam."));
    }

    #[test]
    fn test_bounds_without_terminators() {
        let text = "no punctuation here";
        assert_eq!(sentence_bounds(text, 3, 5), (0, 19));
    }

    #[test]
    fn test_split_sentences() {
        let text = "  One.  Two?! Three";
        let parts: Vec<_> = split_sentences(text)
            .into_iter()
            .map(|(s, e)| slice_chars(text, s, e).unwrap())
            .collect();
        assert_eq!(parts, vec!["One.", "Two?!", "Three"]);
    }
}
