// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic language detection for English, Arabic, and Arabish.
//!
//! Arabish is Arabic written in Latin script with digit substitutions
//! ("3akar", "sha2a"). Zero-cost detection, no model call.

use marhaba_core::types::Language;

/// Arabish words in Latin script. Two or more hits classify as Mixed.
const ARABISH_LEXICON: &[&str] = &[
    "marhaba", "shukran", "afwan", "na3am", "3akar", "sha2a", "ghorfa", "si3r", "maw2i3",
    "habibi", "yalla", "khalas", "wallah", "inshallah",
];

/// Strong Arabish markers with digit substitutions. A single hit is enough.
const ARABISH_STRONG: &[&str] = &["3akar", "sha2a", "ghorfa", "si3r", "maw2i3", "na3am"];

/// Share of Arabic-script characters above which text is Arabic.
const ARABIC_RATIO_THRESHOLD: f32 = 0.3;

/// Result of a language detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageDetection {
    pub language: Language,
    pub confidence: f32,
}

/// Detects the language of a message.
#[derive(Debug, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, text: &str) -> LanguageDetection {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return LanguageDetection {
                language: Language::English,
                confidence: 0.5,
            };
        }

        let mut arabic_chars = 0usize;
        let mut total_chars = 0usize;
        for c in trimmed.chars() {
            if c.is_whitespace() {
                continue;
            }
            total_chars += 1;
            if ('\u{0600}'..='\u{06FF}').contains(&c) {
                arabic_chars += 1;
            }
        }
        if total_chars == 0 {
            return LanguageDetection {
                language: Language::English,
                confidence: 0.5,
            };
        }

        let ratio = arabic_chars as f32 / total_chars as f32;
        if ratio > ARABIC_RATIO_THRESHOLD {
            return LanguageDetection {
                language: Language::Arabic,
                confidence: (ratio * 1.5).min(1.0),
            };
        }

        let lower = trimmed.to_lowercase();
        let arabish_hits = ARABISH_LEXICON.iter().filter(|w| lower.contains(*w)).count();
        if arabish_hits >= 2 {
            return LanguageDetection {
                language: Language::Mixed,
                confidence: 0.7,
            };
        }
        if ARABISH_STRONG.iter().any(|w| lower.contains(w)) {
            return LanguageDetection {
                language: Language::Mixed,
                confidence: 0.6,
            };
        }

        LanguageDetection {
            language: Language::English,
            confidence: 0.8,
        }
    }

    /// Quick check used by the translate stage.
    pub fn is_arabic(&self, text: &str) -> bool {
        let det = self.detect(text);
        det.language == Language::Arabic && det.confidence > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english() {
        let detector = LanguageDetector::new();
        let det = detector.detect("my salesforce dashboard is broken");
        assert_eq!(det.language, Language::English);
    }

    #[test]
    fn detects_arabic_script() {
        let detector = LanguageDetector::new();
        let det = detector.detect("مرحبا، عندي مشكلة في النظام");
        assert_eq!(det.language, Language::Arabic);
        assert!(det.confidence > 0.5);
    }

    #[test]
    fn mostly_latin_with_one_arabic_word_is_not_arabic() {
        let detector = LanguageDetector::new();
        let det = detector.detect("hello can you help me with this مرحبا please thanks a lot");
        assert_ne!(det.language, Language::Arabic);
    }

    #[test]
    fn two_arabish_words_is_mixed() {
        let detector = LanguageDetector::new();
        let det = detector.detect("marhaba, shukran for the help");
        assert_eq!(det.language, Language::Mixed);
    }

    #[test]
    fn single_strong_arabish_marker_is_mixed() {
        let detector = LanguageDetector::new();
        let det = detector.detect("looking for sha2a in dubai");
        assert_eq!(det.language, Language::Mixed);
    }

    #[test]
    fn empty_defaults_to_english() {
        let detector = LanguageDetector::new();
        let det = detector.detect("   ");
        assert_eq!(det.language, Language::English);
        assert_eq!(det.confidence, 0.5);
    }
}
