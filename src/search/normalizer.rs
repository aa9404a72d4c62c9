//! Text normalization
//!
//! A fixed pipeline of plain functions: fold diacritics, lowercase, then split
//! on whitespace. The same pipeline runs over field content at build time and
//! over query strings at search time, so both sides agree on what a term is.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

type Step = fn(&str) -> String;

/// Normalization steps, applied in order before tokenization
const PIPELINE: [Step; 2] = [fold_diacritics, lowercase];

/// Normalize text into terms. Pure and idempotent.
pub fn normalize(text: &str) -> Vec<String> {
    let normalized = PIPELINE
        .iter()
        .fold(text.to_string(), |acc, step| step(&acc));

    normalized.split_whitespace().map(str::to_string).collect()
}

/// Replace accented Latin characters with their closest unaccented form.
///
/// NFKD splits base letters from combining marks. Marks on a Latin base are
/// dropped. Marks on other scripts (vowel signs, tonos) are kept and the
/// result is recomposed to NFC.
/// Latin letters that have no decomposition go through [`fold_letter`].
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut latin_base = false;
    for c in text.nfkd() {
        if is_combining_mark(c) {
            if !latin_base {
                out.push(c);
            }
            continue;
        }
        latin_base = is_latin(c);
        match fold_letter(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out.nfc().collect()
}

/// Lowercasing can reintroduce marks (`İ` lowercases to `i` + U+0307), so the
/// result is folded again.
pub fn lowercase(text: &str) -> String {
    fold_diacritics(&text.to_lowercase())
}

/// Letters from the Latin blocks (Basic Latin through Latin Extended-E)
fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || (c.is_alphabetic()
            && matches!(
                c,
                '\u{00C0}'..='\u{024F}'
                    | '\u{1E00}'..='\u{1EFF}'
                    | '\u{2C60}'..='\u{2C7F}'
                    | '\u{A720}'..='\u{A7FF}'
                    | '\u{AB30}'..='\u{AB6F}'
            ))
}

fn fold_letter(c: char) -> Option<&'static str> {
    let folded = match c {
        'ø' => "o",
        'Ø' => "O",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ß' => "ss",
        'ẞ' => "SS",
        'đ' => "d",
        'Đ' => "D",
        'ð' => "d",
        'Ð' => "D",
        'ł' => "l",
        'Ł' => "L",
        'þ' => "th",
        'Þ' => "TH",
        'ı' => "i",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("São Paulo"), vec!["sao", "paulo"]);
        assert_eq!(normalize("código"), vec!["codigo"]);
        assert_eq!(normalize("O Código da Vinci"), vec!["o", "codigo", "da", "vinci"]);
    }

    #[test]
    fn test_letters_without_decomposition() {
        assert_eq!(normalize("Øresund Straße"), vec!["oresund", "strasse"]);
        assert_eq!(normalize("Łódź"), vec!["lodz"]);
    }

    #[test]
    fn test_dotted_capital_i() {
        assert_eq!(normalize("İstanbul"), vec!["istanbul"]);
    }

    #[test]
    fn test_splits_on_any_whitespace() {
        assert_eq!(normalize("  stephen\tking \n"), vec!["stephen", "king"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t ").is_empty());
    }

    #[test]
    fn test_no_stemming_or_stop_words() {
        assert_eq!(normalize("the books of a"), vec!["the", "books", "of", "a"]);
    }

    #[test]
    fn test_stacked_latin_marks() {
        assert_eq!(normalize("Tiếng Việt"), vec!["tieng", "viet"]);
    }

    #[test]
    fn test_keeps_vowel_signs_of_other_scripts() {
        assert_eq!(normalize("का"), vec!["का"]);
        assert_ne!(normalize("का"), normalize("कि"));
        assert_eq!(normalize("กิน กน"), vec!["กิน", "กน"]);
        assert_eq!(normalize("Ελλάδα"), vec!["ελλάδα"]);
    }

    #[test]
    fn test_non_latin_output_is_composed() {
        // decomposed alpha with tonos comes back precomposed
        assert_eq!(normalize("\u{03B1}\u{0301}"), vec!["\u{03AC}"]);
        // Hangul syllables survive NFKD
        assert_eq!(normalize("한국"), vec!["한국"]);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in "[ -~À-žΑ-Ωα-ωẞİ\t\n]{0,40}") {
            let once = normalize(&text);
            let twice = normalize(&once.join(" "));
            prop_assert_eq!(&once, &twice);
            for term in &once {
                prop_assert_eq!(normalize(term), vec![term.clone()]);
            }
        }

        #[test]
        fn normalize_is_idempotent_for_marked_scripts(
            text in "[ a-zÀ-žक-हा-ौก-ฮิ-ฺ\u{0300}-\u{0308}]{0,30}"
        ) {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once.join(" ")), once.clone());
            for term in &once {
                prop_assert_eq!(normalize(term), vec![term.clone()]);
            }
        }
    }
}
