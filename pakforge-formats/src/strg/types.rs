use crate::common::{FourCC, Game};
use crate::fourcc;

pub const STRG_MAGIC: u32 = 0x87654321;

pub const LANGUAGE_ENGLISH: FourCC = fourcc!(b"ENGL");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringData {
    pub text: String,
    /// False means the text is identical to the English entry. Corruption
    /// onward shares the English bytes on disk instead of duplicating them.
    pub localized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageData {
    pub language: FourCC,
    pub strings: Vec<StringData>,
}

/// Localized string table. Every language holds the same number of strings;
/// names are optional and sparse (indexes without a name hold an empty
/// string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    pub game: Game,
    pub languages: Vec<LanguageData>,
    pub string_names: Vec<String>,
}

impl StringTable {
    pub fn string_count(&self) -> usize {
        self.languages.first().map_or(0, |lang| lang.strings.len())
    }

    pub fn english_index(&self) -> Option<usize> {
        self.languages
            .iter()
            .position(|lang| lang.language == LANGUAGE_ENGLISH)
    }

    pub fn name_by_index(&self, index: usize) -> &str {
        self.string_names.get(index).map_or("", String::as_str)
    }
}
