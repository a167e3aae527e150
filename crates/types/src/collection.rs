use crate::SharedFontData;
use crate::font::{FontStyle, FontWeight};
use crate::requirement::FontKey;

/// One font face handed to the render boundary.
#[derive(Clone)]
pub struct FontEntry {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    pub bytes: SharedFontData,
}

impl FontEntry {
    pub fn new(family: impl Into<String>, weight: FontWeight, style: FontStyle, bytes: SharedFontData) -> Self {
        Self {
            family: family.into(),
            weight: weight.value(),
            italic: style.is_italic(),
            bytes,
        }
    }

    pub fn key(&self) -> FontKey {
        let style = if self.italic { FontStyle::Italic } else { FontStyle::Normal };
        FontKey::new(&self.family, FontWeight::new(self.weight as u32), style)
    }
}

impl std::fmt::Debug for FontEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontEntry")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("italic", &self.italic)
            .field("data_len", &self.bytes.len())
            .finish()
    }
}

/// Ordered, append-only set of fonts built fresh for a single conversion.
///
/// Entries can only be added; once the collection is wrapped in an `Arc` and
/// passed to the render boundary it is effectively frozen.
#[derive(Debug, Default)]
pub struct FontCollection {
    entries: Vec<FontEntry>,
}

impl FontCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Returns `false` (and leaves the collection untouched)
    /// when a face with the same key is already present.
    pub fn push(&mut self, entry: FontEntry) -> bool {
        let key = entry.key();
        if self.contains(&key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, key: &FontKey) -> bool {
        self.entries.iter().any(|e| &e.key() == key)
    }

    pub fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the font binaries held by the collection.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.bytes.len()).sum()
    }
}
