//! File names derived from automation titles.

use unicode_normalization::UnicodeNormalization;

/// Stem used when a title slugifies to nothing.
pub const DEFAULT_STEM: &str = "automation";

/// Extension of stored automation files.
pub const EXTENSION: &str = "json";

const SEPARATORS: &[char] = &[' ', ',', '-', '.', '_'];

/// Reduce `text` to lowercase ASCII letters, digits and `-._`.
///
/// Accented letters are decomposed (NFD) and keep their ASCII base. Spaces
/// become `-` and commas become `.`; any other character is dropped, as are
/// separators at either end.
#[must_use]
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric() || SEPARATORS.contains(c))
        .collect();
    kept.trim_matches(SEPARATORS)
        .chars()
        .map(|c| match c {
            ' ' => '-',
            ',' => '.',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// `<slug>.json`, falling back to [`DEFAULT_STEM`].
#[must_use]
pub fn file_name(title: &str) -> String {
    let slug = slugify(title);
    let stem = if slug.is_empty() { DEFAULT_STEM } else { &slug };
    format!("{stem}.{EXTENSION}")
}
