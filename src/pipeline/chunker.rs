//! Content chunking and recombination for oversized documents
//!
//! `split` walks the text in steps of `chunk_size` characters. Every chunk
//! but the last tries to end on a sentence boundary (`.`, `!` or `?`,
//! then whitespace, then an uppercase letter) found within `window`
//! characters before the target cut; otherwise it is cut exactly at
//! `chunk_size`. The next chunk starts `overlap` characters before the
//! previous cut, so adjacent chunks share that region. `combine` joins
//! chunk bodies in index order and does not remove the overlap.
//!
//! All lengths are in characters, not bytes.

/// Separator placed between chunk bodies by [`combine`]
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// One segment of a split document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    pub index: usize,
    pub text: String,
    pub is_last: bool,
}

/// Chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub overlap: usize,
    /// How far back from the target cut to look for a sentence boundary
    pub window: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            overlap: 100,
            window: 200,
        }
    }
}

impl ChunkSettings {
    /// True if `text` must be split before transformation
    pub fn needs_split(&self, text: &str) -> bool {
        text.chars().count() > self.chunk_size
    }
}

/// Splits `text` into overlapping, boundary-aware chunks
///
/// Text no longer than `chunk_size` comes back as a single chunk equal to
/// the input. A zero `chunk_size` is treated as 1 and an `overlap` that
/// would stall progress is ignored for that step.
pub fn split(text: &str, settings: ChunkSettings) -> Vec<ContentChunk> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let chunk_size = settings.chunk_size.max(1);

    if len <= chunk_size {
        return vec![ContentChunk {
            index: 0,
            text: text.to_string(),
            is_last: true,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let target = start + chunk_size;
        if target >= len {
            chunks.push(make_chunk(&chars, chunks.len(), start, len, true));
            break;
        }

        let floor = start + settings.overlap + 1;
        let cut = find_sentence_boundary(&chars, target, settings.window, floor).unwrap_or(target);
        chunks.push(make_chunk(&chars, chunks.len(), start, cut, false));

        let next = cut.saturating_sub(settings.overlap);
        start = if next > start { next } else { cut };
    }

    chunks
}

fn make_chunk(chars: &[char], index: usize, start: usize, end: usize, is_last: bool) -> ContentChunk {
    ContentChunk {
        index,
        text: chars[start..end].iter().collect(),
        is_last,
    }
}

/// Finds the cut position just after a sentence terminator
///
/// Looks at terminators in `[target - window, target)`, nearest to `target`
/// first, and never returns a cut below `floor`.
fn find_sentence_boundary(chars: &[char], target: usize, window: usize, floor: usize) -> Option<usize> {
    let lowest = target.saturating_sub(window).max(floor.saturating_sub(1));

    (lowest..target).rev().find_map(|i| {
        let is_boundary = matches!(chars[i], '.' | '!' | '?')
            && chars.get(i + 1).is_some_and(|c| c.is_whitespace())
            && chars.get(i + 2).is_some_and(|c| c.is_uppercase());
        let cut = i + 1;
        (is_boundary && cut >= floor).then_some(cut)
    })
}

/// Joins chunk bodies in index order with [`CHUNK_SEPARATOR`]
pub fn combine<S: AsRef<str>>(bodies: &[S]) -> String {
    bodies
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(CHUNK_SEPARATOR)
}

/// Worst-case chunk count when no sentence boundary is ever found
pub fn max_chunk_count(len: usize, settings: ChunkSettings) -> usize {
    if len <= settings.chunk_size {
        return 1;
    }
    let step = settings.chunk_size.saturating_sub(settings.overlap).max(1);
    (len - settings.overlap).div_ceil(step)
}
