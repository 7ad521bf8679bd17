//! Attribute key normalizer
//!
//! Maps a human-readable attribute name (or value) to a stable,
//! URL-safe ASCII slug used inside facet index keys. Deterministic and
//! pure; distinct inputs may legitimately collapse to the same slug.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Slugify a raw attribute name or value
///
/// Lowercases, strips diacritics via NFD decomposition, transliterates
/// Cyrillic to ASCII, and collapses every other character run into a
/// single `-`. Returns an empty string for empty (or all-separator)
/// input.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for ch in input.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() {
                if pending_sep && !out.is_empty() {
                    out.push('-');
                }
                pending_sep = false;
                out.push(lower);
            } else if let Some(mapped) = transliterate_cyrillic(lower) {
                if mapped.is_empty() {
                    // Soft/hard signs vanish without breaking the word
                    continue;
                }
                if pending_sep && !out.is_empty() {
                    out.push('-');
                }
                pending_sep = false;
                out.push_str(mapped);
            } else {
                pending_sep = true;
            }
        }
    }

    out
}

/// Fixed Cyrillic-to-ASCII table
///
/// Matches the transliteration the feed's historical slugs were built
/// with (`Колір` -> `kolir`, `Розмір постачальника` ->
/// `rozmir-postacalnika`), Ukrainian letters included.
fn transliterate_cyrillic(ch: char) -> Option<&'static str> {
    let mapped = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'і' => "i",
        'ї' => "yi",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "c",
        'ш' => "sh",
        'щ' => "shch",
        'ь' => "",
        'ю' => "yu",
        'я' => "ya",
        'э' => "e",
        'ы' => "y",
        'ё' => "e",
        'ъ' => "",
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_ascii() {
        assert_eq!(slugify("Color"), "color");
        assert_eq!(slugify("Supplier size"), "supplier-size");
    }

    #[test]
    fn slugifies_ukrainian_attribute_names() {
        assert_eq!(slugify("Колір"), "kolir");
        assert_eq!(slugify("Бренд"), "brend");
        assert_eq!(slugify("Склад"), "sklad");
        assert_eq!(slugify("Розмір постачальника"), "rozmir-postacalnika");
    }

    #[test]
    fn strips_latin_diacritics() {
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        // ß has no ASCII mapping and becomes a separator
        assert_eq!(slugify("Größe"), "gro-e");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Вага, кг"), "vaha-kh");
        assert_eq!(slugify("  --  "), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn is_deterministic() {
        let a = slugify("Розмір постачальника");
        let b = slugify("Розмір постачальника");
        assert_eq!(a, b);
    }
}
