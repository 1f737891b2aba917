//! Splits a generated letter into the five fixed sections.
//!
//! Detection is a lowercase substring match per trimmed line. The line that
//! triggers a boundary opens the new section. Text before the first trigger
//! is the header. A letter without trigger phrases lands entirely in
//! `header`, and nothing ever opens `body`, so it stays empty unless edited.

use std::collections::BTreeMap;

use crate::models::cover_letter::{CoverLetterSection, SectionName};

fn boundary(line: &str) -> Option<SectionName> {
    let lower = line.to_lowercase();
    if lower.contains("dear") && lower.contains("hiring manager") {
        Some(SectionName::Introduction)
    } else if lower.contains("sincerely") || lower.contains("best regards") {
        Some(SectionName::Conclusion)
    } else if lower.contains("thank you") && lower.contains("consideration") {
        Some(SectionName::Signature)
    } else {
        None
    }
}

pub fn parse_sections(letter: &str) -> BTreeMap<SectionName, CoverLetterSection> {
    let mut sections: BTreeMap<SectionName, CoverLetterSection> = SectionName::ALL
        .into_iter()
        .map(|name| (name, CoverLetterSection::new(name, String::new())))
        .collect();

    let mut current = SectionName::Header;
    let mut buffer: Vec<&str> = Vec::new();

    for line in letter.split('\n').map(str::trim) {
        if let Some(next) = boundary(line) {
            if !buffer.is_empty() {
                set_content(&mut sections, current, &buffer);
                buffer.clear();
            }
            current = next;
        }
        buffer.push(line);
    }
    if !buffer.is_empty() {
        set_content(&mut sections, current, &buffer);
    }

    sections
}

fn set_content(
    sections: &mut BTreeMap<SectionName, CoverLetterSection>,
    name: SectionName,
    lines: &[&str],
) {
    if let Some(section) = sections.get_mut(&name) {
        section.content = lines.join("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(sections: &BTreeMap<SectionName, CoverLetterSection>, name: SectionName) -> &str {
        sections[&name].content.as_str()
    }

    #[test]
    fn test_parses_standard_letter() {
        let letter = "Jane Doe\njane@example.com\n\nDear Hiring Manager,\nI am excited to apply.\nI built payment systems.\nThank you for your consideration.\nSincerely,\n  Jane Doe  ";
        let sections = parse_sections(letter);

        assert_eq!(content(&sections, SectionName::Header), "Jane Doe\njane@example.com\n");
        assert_eq!(
            content(&sections, SectionName::Introduction),
            "Dear Hiring Manager,\nI am excited to apply.\nI built payment systems."
        );
        assert_eq!(
            content(&sections, SectionName::Signature),
            "Thank you for your consideration."
        );
        assert_eq!(content(&sections, SectionName::Conclusion), "Sincerely,\nJane Doe");
        assert_eq!(content(&sections, SectionName::Body), "");
        assert!(sections.values().all(|s| !s.is_edited && s.version_history.is_empty()));
    }

    #[test]
    fn test_letter_without_triggers_collapses_into_header() {
        let sections = parse_sections("안녕하세요.\n저는 백엔드 개발자입니다.");
        assert_eq!(
            content(&sections, SectionName::Header),
            "안녕하세요.\n저는 백엔드 개발자입니다."
        );
        assert_eq!(sections.len(), 5);
        assert!(SectionName::ALL[1..]
            .iter()
            .all(|name| sections[name].content.is_empty()));
    }

    #[test]
    fn test_trigger_on_first_line_leaves_header_empty() {
        let sections = parse_sections("DEAR HIRING MANAGER,\nHello\nBest regards,\nKim");
        assert_eq!(content(&sections, SectionName::Header), "");
        assert_eq!(content(&sections, SectionName::Introduction), "DEAR HIRING MANAGER,\nHello");
        assert_eq!(content(&sections, SectionName::Conclusion), "Best regards,\nKim");
    }

    #[test]
    fn test_empty_letter() {
        let sections = parse_sections("");
        assert_eq!(content(&sections, SectionName::Header), "");
    }
}
