//! Cyrillic-to-Latin transliteration for file and folder names.
//!
//! The scheme is fixed: each of the 37 source letters maps to a Latin letter or
//! digraph, two of them (`ъ`, `ь`) are dropped, and anything else outside
//! `[A-Za-z0-9_]` becomes `_`.
//!
//! # Examples
//!
//! ```
//! use dirsort::transliterate::{normalize_file_name, transliterate};
//!
//! assert_eq!(transliterate("Щука"), "SCHuka");
//! assert_eq!(transliterate("my file (1)"), "my_file__1_");
//! assert_eq!(normalize_file_name("звіт.pdf"), "zvjet.pdf");
//! ```
use std::collections::HashMap;
use std::sync::LazyLock;

/// Source letters in table order (lower case).
const CYRILLIC_SYMBOLS: &str = "абвгдеёжзийклмнопрстуфхцчшщъыьэюяєіїґ";

/// Latin replacements, index-aligned with [`CYRILLIC_SYMBOLS`].
const LATIN_SYMBOLS: [&str; 37] = [
    "a", "b", "v", "g", "d", "e", "e", "j", "z", "i", "j", "k", "l", "m", "n", "o", "p", "r", "s",
    "t", "u", "f", "h", "ts", "ch", "sh", "sch", "", "y", "", "e", "yu", "u", "ja", "je", "ji",
    "g",
];

static DEFAULT: LazyLock<Transliterator> = LazyLock::new(Transliterator::new);

/// Character table for the transliteration scheme.
#[derive(Debug, Clone)]
pub struct Transliterator {
    table: HashMap<char, String>,
}

impl Transliterator {
    /// Builds the table for both letter cases.
    pub fn new() -> Self {
        let mut table = HashMap::with_capacity(LATIN_SYMBOLS.len() * 2);
        for (cyrillic, latin) in CYRILLIC_SYMBOLS.chars().zip(LATIN_SYMBOLS) {
            table.insert(cyrillic, latin.to_string());
            for upper in cyrillic.to_uppercase() {
                table.insert(upper, latin.to_uppercase());
            }
        }
        Self { table }
    }

    /// Transliterates `name`. Never fails; the result only contains
    /// `[A-Za-z0-9_]`.
    pub fn transliterate(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for c in name.chars() {
            if let Some(latin) = self.table.get(&c) {
                out.push_str(latin);
            } else if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
            } else {
                out.push('_');
            }
        }
        out
    }

    /// Number of source letters covered, counting both cases.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Transliterator {
    fn default() -> Self {
        Self::new()
    }
}

/// Transliterates `name` with the shared default table.
pub fn transliterate(name: &str) -> String {
    DEFAULT.transliterate(name)
}

/// Builds the destination file name: stem and extension are transliterated
/// separately so the extension dot survives.
pub fn normalize_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}.{}", transliterate(stem), transliterate(ext))
        }
        _ => transliterate(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    #[test]
    fn test_table_covers_both_cases() {
        assert_eq!(CYRILLIC_SYMBOLS.chars().count(), 37);
        assert_eq!(Transliterator::new().len(), 74);
    }

    #[test]
    fn test_lowercase_letters() {
        assert_eq!(transliterate("привіт"), "privjet");
        assert_eq!(transliterate("щука"), "schuka");
        assert_eq!(transliterate("цех"), "tseh");
    }

    #[test]
    fn test_uppercase_digraphs() {
        assert_eq!(transliterate("Щ"), "SCH");
        assert_eq!(transliterate("ЦЮ"), "TSYU");
        assert_eq!(transliterate("Ґ"), "G");
    }

    #[test]
    fn test_soft_and_hard_signs_are_elided() {
        assert_eq!(transliterate("ъ"), "");
        assert_eq!(transliterate("ь"), "");
        assert_eq!(transliterate("Ъ"), "");
        assert_eq!(transliterate("альбом"), "albom");
    }

    #[test]
    fn test_scheme_quirks_are_kept() {
        // я, є, і, ї map one slot "late"; the names rely on it
        assert_eq!(transliterate("я"), "u");
        assert_eq!(transliterate("є"), "ja");
        assert_eq!(transliterate("і"), "je");
        assert_eq!(transliterate("ї"), "ji");
    }

    #[test]
    fn test_non_word_characters_become_underscores() {
        assert_eq!(transliterate("a b-c.d"), "a_b_c_d");
        assert_eq!(transliterate("файл (копія)"), "fajl__kopjeu_");
        assert_eq!(transliterate("café"), "caf_");
        assert_eq!(transliterate("日本"), "__");
    }

    #[test]
    fn test_ascii_word_characters_pass_through() {
        assert_eq!(transliterate("Report_2024"), "Report_2024");
        assert_eq!(transliterate(""), "");
    }

    #[test]
    fn test_output_is_safe_and_idempotent() {
        let samples = [
            "Привіт, світ!",
            "ЩЮЯЄІЇҐ ъь",
            "ёжик в тумане...",
            "ГаЛиНа@#$%^&*()",
            "  --  ",
        ];
        for sample in samples {
            let once = transliterate(sample);
            assert!(is_safe(&once), "unsafe output {once:?} for {sample:?}");
            assert_eq!(transliterate(&once), once);
        }
    }

    #[test]
    fn test_every_alphabet_letter_maps_to_ascii() {
        let upper: String = CYRILLIC_SYMBOLS.chars().flat_map(char::to_uppercase).collect();
        for name in [CYRILLIC_SYMBOLS.to_string(), upper] {
            let out = transliterate(&name);
            assert!(is_safe(&out));
            assert!(!out.contains('_'));
        }
    }

    #[test]
    fn test_normalize_file_name_keeps_extension_dot() {
        assert_eq!(normalize_file_name("report.PDF"), "report.PDF");
        assert_eq!(normalize_file_name("звіт.pdf"), "zvjet.pdf");
        assert_eq!(normalize_file_name("my photo.final.jpg"), "my_photo_final.jpg");
    }

    #[test]
    fn test_normalize_file_name_without_extension() {
        assert_eq!(normalize_file_name("README"), "README");
        assert_eq!(normalize_file_name(".bashrc"), "_bashrc");
        assert_eq!(normalize_file_name("trailing."), "trailing_");
    }
}
