//! Text sanitization for the PDF renderer.
//!
//! The document uses the builtin Helvetica fonts, which cover only the
//! latin-1 range. Common typographic characters the narrative service likes
//! to emit are substituted with ASCII equivalents; any remaining character
//! outside latin-1 is dropped, not escaped.

/// Typographic substitutions applied before the latin-1 filter.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2019}', "'"),
    ('\u{2018}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
    ('\u{2022}', "*"),
    ('\u{00B7}', "-"),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
];

/// Sanitizes text down to the latin-1 subset the renderer can encode.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else if (c as u32) < 256 {
            out.push(c);
        }
        // Anything else is dropped.
    }
    out
}
