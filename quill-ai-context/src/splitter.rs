//! Recursive character text splitter.
//!
//! Splits page text into chunks bounded by a character budget, preferring the
//! coarsest separator that produces pieces within budget and carrying a
//! configurable overlap between consecutive chunks so that sentences cut at a
//! chunk boundary still appear whole in one of its neighbors.
//!
//! The separator cascade is tried in order: paragraph breaks, line breaks,
//! spaces, and finally raw character windows for text with no separators at
//! all. Pieces that fit the budget are merged greedily; oversized pieces
//! recurse with the next finer separator.

/// Separators tried from coarsest to finest. The empty string is the
/// terminal case: fixed character windows.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Character-budget text splitter with overlap.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextSplitter {
    /// Create a splitter with the given chunk size and overlap, both in
    /// characters. The overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks of at most `chunk_size` characters,
    /// dropping whitespace-only fragments.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (sep, finer) = match separators.split_first() {
            Some(pair) => pair,
            None => return vec![text.to_string()],
        };

        if sep.is_empty() {
            return self.char_windows(text);
        }
        if !text.contains(sep) {
            return self.split_with(text, finer);
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in text.split(sep) {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
            } else {
                // flush what fits, then break the oversized piece down further
                chunks.extend(self.merge(&pending, sep));
                pending.clear();
                chunks.extend(self.split_with(piece, finer));
            }
        }
        chunks.extend(self.merge(&pending, sep));
        chunks
    }

    /// Greedily join pieces (each already within budget) up to `chunk_size`,
    /// keeping a tail of pieces totalling at most `chunk_overlap` characters
    /// as the start of the next chunk.
    fn merge(&self, pieces: &[&str], sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();

        for &piece in pieces {
            if !window.is_empty() && joined_len(&window, sep_len) + sep_len + char_len(piece) > self.chunk_size {
                chunks.push(window.join(sep));
                while !window.is_empty()
                    && (joined_len(&window, sep_len) > self.chunk_overlap
                        || joined_len(&window, sep_len) + sep_len + char_len(piece) > self.chunk_size)
                {
                    window.remove(0);
                }
            }
            window.push(piece);
        }
        if !window.is_empty() {
            chunks.push(window.join(sep));
        }
        chunks
    }

    /// Terminal case for text with no usable separators: fixed character
    /// windows stepping by `chunk_size - chunk_overlap`.
    fn char_windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = (self.chunk_size - self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn joined_len(pieces: &[&str], sep_len: usize) -> usize {
    let content: usize = pieces.iter().map(|p| char_len(p)).sum();
    content + sep_len * pieces.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::new(100, 20);
        let chunks = splitter.split("a short paragraph");
        assert_eq!(chunks, vec!["a short paragraph".to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let splitter = TextSplitter::default();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn chunks_respect_the_character_budget() {
        let splitter = TextSplitter::new(50, 10);
        let text = "one two three four five six seven eight nine ten eleven twelve \
                    thirteen fourteen fifteen sixteen seventeen eighteen";
        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= 50,
                "chunk over budget: {chunk:?}"
            );
        }
    }

    #[test]
    fn paragraph_breaks_are_preferred_over_word_breaks() {
        let splitter = TextSplitter::new(30, 0);
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = splitter.split(text);
        assert_eq!(chunks, vec![
            "first paragraph here".to_string(),
            "second paragraph here".to_string(),
        ]);
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let splitter = TextSplitter::new(30, 15);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            // the carry-over words that open a chunk must close the previous one
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_character_windows() {
        let splitter = TextSplitter::new(10, 2);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0], "abcdefghij");
        // step is chunk_size - overlap = 8
        assert!(chunks[1].starts_with("ij"));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn multibyte_text_is_split_on_character_boundaries() {
        let splitter = TextSplitter::new(5, 1);
        let text = "αβγδεζηθικλμ";
        let chunks = splitter.split(text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 5);
        }
        assert!(chunks.concat().contains('α'));
    }
}
