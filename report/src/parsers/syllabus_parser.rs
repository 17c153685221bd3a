//! Extracts chapter titles from the HTML syllabus markup carried by the exam
//! record and classifies them into subjects by keyword.
//!
//! This is the manual half of the chapter indexer: it runs whether or not the
//! AI-assisted extraction succeeded, so the index never depends on the
//! external service being reachable.

use scraper::{Html, Selector};

use crate::types::Subject;

/// Keywords marking a chapter title as mathematical.
pub const MATH_KEYWORDS: &[&str] = &[
    "functions",
    "algebra",
    "calculus",
    "geometry",
    "trigonometry",
    "sets",
    "relations",
    "probability",
    "statistics",
];

/// Keywords marking a chapter title as physics.
pub const PHYSICS_KEYWORDS: &[&str] = &[
    "mechanics",
    "electrostatics",
    "capacitance",
    "physics",
    "force",
    "energy",
];

/// Keywords marking a chapter title as chemistry.
pub const CHEMISTRY_KEYWORDS: &[&str] = &[
    "electrochemistry",
    "solutions",
    "organic",
    "inorganic",
    "chemistry",
];

/// Classifies a chapter title into a subject by keyword.
///
/// Mathematics keywords are checked first, then physics, then chemistry;
/// titles matching nothing fall back to Mathematics, mirroring how the
/// syllabus lists trail with mathematics chapters.
pub fn classify_chapter(title: &str) -> Subject {
    let lower = title.to_lowercase();
    if MATH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Subject::Mathematics
    } else if PHYSICS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Subject::Physics
    } else if CHEMISTRY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Subject::Chemistry
    } else {
        Subject::Mathematics
    }
}

/// True when the title hits the physics or chemistry keyword denylists.
/// Used to keep science chapters out of the Mathematics index.
pub fn is_science_chapter(title: &str) -> bool {
    let lower = title.to_lowercase();
    PHYSICS_KEYWORDS
        .iter()
        .chain(CHEMISTRY_KEYWORDS.iter())
        .any(|kw| lower.contains(kw))
}

/// Parses the syllabus markup and returns each `<li>` item's text, trimmed,
/// paired with its keyword-classified subject. Blank items are dropped.
pub fn syllabus_chapters(html: &str) -> Vec<(Subject, String)> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let doc = Html::parse_fragment(html);
    let li = Selector::parse("li").unwrap();
    let mut chapters = Vec::new();
    for element in doc.select(&li) {
        let title = element.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        chapters.push((classify_chapter(&title), title));
    }
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_items_are_extracted_and_classified() {
        let html = "<ul>\
            <li>Functions</li>\
            <li>Electrostatics</li>\
            <li>Electrochemistry</li>\
            <li>  </li>\
        </ul>";
        let chapters = syllabus_chapters(html);
        assert_eq!(
            chapters,
            vec![
                (Subject::Mathematics, "Functions".to_string()),
                (Subject::Physics, "Electrostatics".to_string()),
                (Subject::Chemistry, "Electrochemistry".to_string()),
            ]
        );
    }

    #[test]
    fn unmatched_titles_fall_back_to_mathematics() {
        assert_eq!(classify_chapter("Something Novel"), Subject::Mathematics);
    }

    #[test]
    fn keyword_priority_is_math_first() {
        // "Solutions" alone is chemistry, but a math keyword wins when both hit.
        assert_eq!(classify_chapter("Solutions"), Subject::Chemistry);
        assert_eq!(
            classify_chapter("Probability of Solutions"),
            Subject::Mathematics
        );
    }

    #[test]
    fn science_denylist_detects_both_subjects() {
        assert!(is_science_chapter("Capacitance"));
        assert!(is_science_chapter("Organic Chemistry Basics"));
        assert!(!is_science_chapter("Sets and Relations"));
    }

    #[test]
    fn empty_markup_yields_no_chapters() {
        assert!(syllabus_chapters("").is_empty());
        assert!(syllabus_chapters("<p>no list here</p>").is_empty());
    }
}
