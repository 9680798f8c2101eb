//! Text segmentation
//!
//! Splits input into chunks the provider accepts in one request. Paragraphs
//! are packed greedily; a paragraph that is too large on its own is broken
//! at sentence boundaries. A single sentence longer than the limit is kept
//! whole rather than cut mid-word.

/// Emphasis markup removed before synthesis
const EMPHASIS_MARKER: &str = "**";

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = " ";

/// Split `text` into ordered, non-empty chunks of at most `max_chars` characters
///
/// Lengths are counted in `char`s. The only chunks allowed to exceed
/// `max_chars` are single sentences that are longer than the limit.
pub fn segment(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = normalize(text);
    let mut packer = Packer::new(max_chars);

    for paragraph in normalized.split(PARAGRAPH_SEPARATOR).map(str::trim) {
        if paragraph.is_empty() {
            continue;
        }

        let paragraph_len = char_len(paragraph);

        if packer.fits(paragraph_len, PARAGRAPH_SEPARATOR) {
            packer.append(paragraph, paragraph_len, PARAGRAPH_SEPARATOR);
            continue;
        }

        packer.flush();

        if paragraph_len <= max_chars {
            packer.append(paragraph, paragraph_len, PARAGRAPH_SEPARATOR);
            continue;
        }

        for sentence in sentences(paragraph) {
            let sentence_len = char_len(sentence);

            if !packer.fits(sentence_len, SENTENCE_SEPARATOR) {
                packer.flush();
            }

            packer.append(sentence, sentence_len, SENTENCE_SEPARATOR);
        }
    }

    packer.finish()
}

/// Normalize line endings, strip emphasis markers and fold lone newlines into spaces
///
/// Blank-line paragraph breaks survive; a newline inside a paragraph does not.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace(EMPHASIS_MARKER, "");
    let bytes = text.as_bytes();

    text.char_indices()
        .map(|(i, c)| {
            let lone = c == '\n'
                && (i == 0 || bytes[i - 1] != b'\n')
                && bytes.get(i + 1).is_none_or(|next| *next != b'\n');

            if lone { ' ' } else { c }
        })
        .collect()
}

/// Split a paragraph after `.`, `!` or `?` when followed by whitespace
///
/// The whitespace run between sentences is consumed; punctuation stays with
/// the sentence it ends.
fn sentences(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let end = i + c.len_utf8();
        if !chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            continue;
        }

        out.push(&paragraph[start..end]);

        while chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            chars.next();
        }

        start = chars.peek().map_or(paragraph.len(), |(j, _)| *j);
    }

    if start < paragraph.len() {
        out.push(&paragraph[start..]);
    }

    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Greedy accumulator for the chunk currently being built
struct Packer {
    max_chars: usize,
    current: String,
    current_len: usize,
    chunks: Vec<String>,
}

impl Packer {
    const fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            current: String::new(),
            current_len: 0,
            chunks: Vec::new(),
        }
    }

    /// Whether `len` more characters plus a separator still fit
    ///
    /// The separator is counted even for an empty chunk, which keeps a
    /// piece of exactly `max_chars` on a chunk of its own.
    fn fits(&self, len: usize, separator: &str) -> bool {
        self.current_len + len + separator.len() <= self.max_chars
    }

    fn append(&mut self, piece: &str, len: usize, separator: &str) {
        if !self.current.is_empty() {
            self.current.push_str(separator);
            self.current_len += separator.len();
        }

        self.current.push_str(piece);
        self.current_len += len;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
        }
        self.current_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(fill: char, len: usize) -> String {
        std::iter::repeat_n(fill, len).collect()
    }

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn three_thousand_char_paragraphs_pack_into_two_chunks() {
        let text = [paragraph('a', 1000), paragraph('b', 1000), paragraph('c', 1000)].join("\n\n");

        let chunks = segment(&text, 2800);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2002);
        assert_eq!(chunks[0], format!("{}\n\n{}", paragraph('a', 1000), paragraph('b', 1000)));
        assert_eq!(chunks[1], paragraph('c', 1000));
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(segment("Hello there.", 2800), vec!["Hello there.".to_owned()]);
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        assert!(segment("", 100).is_empty());
        assert!(segment("  \n\n \r\n\r\n  ", 100).is_empty());
        assert!(segment("****", 100).is_empty());
    }

    #[test]
    fn strips_emphasis_and_folds_lone_newlines() {
        let chunks = segment("This is **bold**\nand wraps.\r\n\r\nNext paragraph.", 2800);

        assert_eq!(chunks, vec!["This is bold and wraps.\n\nNext paragraph.".to_owned()]);
    }

    #[test]
    fn normalize_keeps_paragraph_breaks() {
        assert_eq!(normalize("a\nb\n\nc\r\nd"), "a b\n\nc d");
        assert_eq!(normalize("\nlead"), " lead");
        assert_eq!(normalize("trail\n"), "trail ");
    }

    #[test]
    fn oversized_paragraph_splits_at_sentences() {
        let text = "One two three. Four five six! Seven eight nine? Ten eleven twelve.";

        let chunks = segment(text, 30);

        assert_eq!(
            chunks,
            vec![
                "One two three. Four five six!".to_owned(),
                "Seven eight nine?".to_owned(),
                "Ten eleven twelve.".to_owned(),
            ]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
    }

    #[test]
    fn overlong_sentence_is_emitted_verbatim() {
        let long = format!("{}.", paragraph('x', 50));
        let text = format!("Short one. {long} Tail end.");

        let chunks = segment(&text, 20);

        assert_eq!(chunks, vec!["Short one.".to_owned(), long, "Tail end.".to_owned()]);
    }

    #[test]
    fn sentence_leftovers_pack_with_following_paragraph() {
        let text = "Alpha beta gamma. Delta epsilon.\n\nZeta.";

        let chunks = segment(text, 21);

        assert_eq!(chunks, vec!["Alpha beta gamma.".to_owned(), "Delta epsilon.\n\nZeta.".to_owned()]);
    }

    #[test]
    fn punctuation_without_whitespace_does_not_split() {
        assert_eq!(sentences("Version 1.2.3 shipped. Done"), vec!["Version 1.2.3 shipped.", "Done"]);
        assert_eq!(sentences("Wait...  what?!  Yes."), vec!["Wait...", "what?!", "Yes."]);
    }

    #[test]
    fn piece_of_exactly_max_chars_stands_alone() {
        let text = format!("{}\n\nb", paragraph('a', 10));

        let chunks = segment(&text, 10);

        assert_eq!(chunks, vec![paragraph('a', 10), "b".to_owned()]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = format!("{}\n\n{}", paragraph('é', 4), paragraph('ü', 4));

        let chunks = segment(&text, 10);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 10);
    }

    #[test]
    fn chunks_respect_limit_and_preserve_content() {
        let inputs = [
            "Lorem ipsum dolor sit amet. Consectetur adipiscing elit!\nSed do eiusmod?\n\n\n\nTempor incididunt.",
            "**Heading**\n\nFirst line\nsecond line. Third sentence here. And a fourth one!\n\nEnd.",
            "No punctuation at all just a very long run of words that keeps going and going",
            "A. B. C. D. E. F. G. H. I. J. K. L. M. N. O. P.",
        ];

        for input in inputs {
            for max in [5, 12, 25, 60, 2800] {
                let chunks = segment(input, max);

                for chunk in &chunks {
                    assert!(!chunk.is_empty());
                    let single_sentence = sentences(chunk).len() == 1 && !chunk.contains(PARAGRAPH_SEPARATOR);
                    assert!(chunk.chars().count() <= max || single_sentence, "{chunk:?} exceeds {max}");
                }

                assert_eq!(squash(&chunks.concat()), squash(&normalize(input)), "content changed for max={max}");
            }
        }
    }

    #[test]
    fn paragraph_joins_reconstruct_normalized_text() {
        let input = "First para\nwraps here.\n\nSecond para.\n\n\n\nThird **para**.";

        let chunks = segment(input, 2800);
        let expected: Vec<_> = normalize(input)
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect();

        assert_eq!(chunks.join(PARAGRAPH_SEPARATOR), expected.join(PARAGRAPH_SEPARATOR));
    }
}
