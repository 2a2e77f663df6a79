// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deterministic filename derivation for attached declaration files.
//!
//! Every structural mutation in `ops` re-runs `derive_filename` over the
//! affected rows, so the functions here must stay pure: same inputs, same
//! string, no ambient state. Accented characters are preserved as-is.

/// File extensions accepted for attachment and import, lower-case.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// Strips filesystem-forbidden characters (`\ / : * ? " < > |`) and control
/// characters, collapses whitespace runs to a single space and trims the ends.
///
/// Idempotent. May produce an empty string; callers tolerate that.
pub fn sanitize_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    let mut pending_space = false;

    for ch in filename.chars() {
        if matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
            continue;
        }
        if ch.is_control() {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    out
}

/// Derives the export-ready filename for an attached file.
///
/// Base is `sanitize_filename("{rb}. {brand} {article_name}")`. A sibling
/// index of `Some(i)` with `i > 0` renders as a ` (i+1)` suffix; the first
/// image in a row (index 0, or `None`) gets no suffix. The extension is
/// appended verbatim and is expected to be lower-cased at the point of prior
/// extraction ([`file_extension`]).
pub fn derive_filename(
    rb: u32,
    brand: &str,
    article_name: &str,
    extension: &str,
    sibling_index: Option<usize>,
) -> String {
    let mut name = sanitize_filename(&format!("{rb}. {brand} {article_name}"));

    if let Some(index) = sibling_index {
        if index > 0 {
            name.push_str(&format!(" ({})", index + 1));
        }
    }

    name.push('.');
    name.push_str(extension);
    name
}

/// Returns the lower-cased extension of `filename`.
///
/// A name without a dot yields the whole name, matching the behavior the
/// import pipeline has always had; a trailing dot yields an empty string.
pub fn file_extension(filename: &str) -> String {
    filename.rsplit('.').next().unwrap_or("").to_lowercase()
}

/// Whether `filename` carries one of the [`ALLOWED_EXTENSIONS`].
pub fn is_allowed_file_type(filename: &str) -> bool {
    let extension = file_extension(filename);
    ALLOWED_EXTENSIONS.contains(&extension.as_str())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{derive_filename, file_extension, is_allowed_file_type, sanitize_filename};

    #[rstest]
    #[case("a\\b/c:d*e?f\"g<h>i|j", "abcdefghij")]
    #[case("  Stolica   drvena  ", "Stolica drvena")]
    #[case("tab\there", "tab here")]
    #[case("čćđšž ČĆĐŠŽ", "čćđšž ČĆĐŠŽ")]
    #[case("", "")]
    fn sanitize_strips_and_collapses(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(input), expected);
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_filename("a\u{0}b\u{1f}c\u{9f}d"), "abcd");
    }

    #[rstest]
    #[case("a\\b/c:d")]
    #[case("  Stolica   drvena  ")]
    #[case("čista vrijednost")]
    fn sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize_filename(input);
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn derive_first_image_has_no_suffix() {
        assert_eq!(
            derive_filename(5, "Acme", "Foo Bar", "jpg", None),
            "5. Acme Foo Bar.jpg"
        );
        assert_eq!(
            derive_filename(5, "Acme", "Foo Bar", "jpg", Some(0)),
            "5. Acme Foo Bar.jpg"
        );
    }

    #[test]
    fn derive_second_image_renders_suffix_two() {
        assert_eq!(
            derive_filename(5, "Acme", "Foo Bar", "png", Some(1)),
            "5. Acme Foo Bar (2).png"
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_filename(12, "Brand", "Artikl š", "pdf", Some(3));
        let b = derive_filename(12, "Brand", "Artikl š", "pdf", Some(3));
        assert_eq!(a, "12. Brand Artikl š (4).pdf");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_with_empty_brand_collapses_the_gap() {
        assert_eq!(derive_filename(3, "", "Stol", "jpg", None), "3. Stol.jpg");
    }

    #[test]
    fn derive_tolerates_everything_sanitizing_to_empty() {
        let name = derive_filename(5, "", "***", "jpg", None);
        assert_eq!(name, "5..jpg");
    }

    #[rstest]
    #[case("Foto.JPG", "jpg")]
    #[case("scan.pdf", "pdf")]
    #[case("archive.tar.gz", "gz")]
    #[case("no-extension", "no-extension")]
    #[case("trailing.", "")]
    fn extension_is_lowercased_last_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(file_extension(input), expected);
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPEG", true)]
    #[case("a.png", true)]
    #[case("a.pdf", true)]
    #[case("a.gif", false)]
    #[case("a.zip", false)]
    fn allowed_file_types(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_allowed_file_type(input), expected);
    }
}
