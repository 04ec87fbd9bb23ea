//! Keyword rule engine.
//!
//! Deterministic fallback classifier. Counts how many distinct keywords of
//! each category appear in the text and picks the category with the most
//! hits:
//! - blank text → `Unknown` / 0.0
//! - no hits anywhere → `Other` / 0.5
//! - otherwise the top category, ties going to the earlier category in
//!   invoice, contract, receipt, ID document order
//!
//! Confidence grows by 0.15 per matched keyword from a 0.5 base and is
//! capped at 0.95.

use tracing::debug;

use super::keywords::KeywordSet;
use super::types::{ClassificationResult, DocumentType, is_blank, round_confidence};

/// Confidence reported when text is readable but nothing matched.
pub const NO_MATCH_CONFIDENCE: f64 = 0.5;

/// Base confidence before keyword hits are added.
const BASE_CONFIDENCE: f64 = 0.5;

/// Confidence added per distinct keyword hit.
const CONFIDENCE_PER_MATCH: f64 = 0.15;

/// Upper bound on rule-based confidence.
pub const MAX_RULE_CONFIDENCE: f64 = 0.95;

/// Keyword hit count for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScore {
    pub document_type: DocumentType,
    pub matches: usize,
}

/// Keyword-scoring rule engine.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    keywords: KeywordSet,
}

impl RuleEngine {
    /// Create a rule engine over the built-in keyword tables.
    pub fn default_rules() -> Self {
        Self::new(KeywordSet::builtin())
    }

    /// Create a rule engine over a custom keyword set.
    pub fn new(keywords: KeywordSet) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Per-category keyword hit counts, in priority order.
    ///
    /// A keyword occurring several times counts once.
    pub fn scores(&self, text: &str) -> Vec<CategoryScore> {
        let lowered = text.to_lowercase();
        self.keywords
            .categories()
            .iter()
            .map(|category| CategoryScore {
                document_type: category.document_type,
                matches: category
                    .keywords
                    .iter()
                    .filter(|kw| lowered.contains(kw.as_str()))
                    .count(),
            })
            .collect()
    }

    /// Classify text by keyword hits. Never fails.
    pub fn score_and_classify(&self, text: &str) -> ClassificationResult {
        if is_blank(text) {
            return ClassificationResult::unknown();
        }

        let scores = self.scores(text);

        // Strict `>` keeps the first category on ties.
        let mut best: Option<CategoryScore> = None;
        for score in &scores {
            if best.is_none_or(|b| score.matches > b.matches) {
                best = Some(*score);
            }
        }

        let result = match best {
            Some(top) if top.matches > 0 => ClassificationResult::new(
                top.document_type,
                confidence_for_matches(top.matches),
            ),
            _ => ClassificationResult::new(DocumentType::Other, NO_MATCH_CONFIDENCE),
        };

        debug!(
            document_type = %result.document_type,
            confidence = result.confidence,
            scores = ?scores,
            "Rule-based classification"
        );
        result
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Rule confidence for a winning match count, capped and rounded.
pub fn confidence_for_matches(matches: usize) -> f64 {
    let raw = BASE_CONFIDENCE + matches as f64 * CONFIDENCE_PER_MATCH;
    round_confidence(raw.min(MAX_RULE_CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ClassificationResult {
        RuleEngine::default_rules().score_and_classify(text)
    }

    #[test]
    fn finnish_invoice_is_capped_at_max() {
        let result = classify("LASKU Loppusumma: 100.00 EUR Eräpäivä: 31.12.2024");
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn empty_input_is_unknown() {
        assert_eq!(classify(""), ClassificationResult::unknown());
    }

    #[test]
    fn whitespace_input_is_unknown() {
        let result = classify("   \n\t  ");
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn separator_only_input_is_unknown() {
        let result = classify("\x1c\x1d\x1e\x1f");
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn no_keywords_is_other() {
        let result = classify("The quick brown fox jumps over the lazy dog");
        assert_eq!(result.document_type, DocumentType::Other);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn two_contract_keywords() {
        let result = classify("SOPIMUS Allekirjoitus");
        assert_eq!(result.document_type, DocumentType::Contract);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn single_keyword_confidence() {
        let result = classify("PASSPORT Republic of Finland Number: FIN123456");
        assert_eq!(result.document_type, DocumentType::IdDocument);
        assert_eq!(result.confidence, 0.65);
    }

    #[test]
    fn receipt_beats_single_invoice_hit() {
        // kuitti, kassakuitti, kiitos vs. yhteensä
        let result = classify("KASSAKUITTI\nKiitos ostoksestasi!\nYhteensä: 25.50 EUR");
        assert_eq!(result.document_type, DocumentType::Receipt);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let engine = RuleEngine::default_rules();
        let scores = engine.scores("sopimus sopimus sopimus");
        let contract = scores
            .iter()
            .find(|s| s.document_type == DocumentType::Contract)
            .unwrap();
        assert_eq!(contract.matches, 1);
        assert_eq!(engine.score_and_classify("sopimus sopimus sopimus").confidence, 0.65);
    }

    #[test]
    fn overlapping_keywords_count_separately() {
        // "laskun" contains "lasku": both are distinct keywords
        let scores = RuleEngine::default_rules().scores("laskun numero");
        assert_eq!(scores[0].document_type, DocumentType::Invoice);
        assert_eq!(scores[0].matches, 2);
    }

    #[test]
    fn multi_word_phrase_matches() {
        let result = classify("Payment DUE DATE next week");
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert_eq!(result.confidence, 0.65);
    }

    #[test]
    fn tie_goes_to_invoice_before_contract() {
        // one invoice hit (invoice), one contract hit (contract)
        let result = classify("contract invoice");
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert_eq!(result.confidence, 0.65);
    }

    #[test]
    fn tie_goes_to_receipt_before_id_document() {
        let result = classify("beleg passport");
        assert_eq!(result.document_type, DocumentType::Receipt);
    }

    #[test]
    fn tie_goes_to_contract_before_id_document() {
        let result = classify("vertrag ajokortti");
        assert_eq!(result.document_type, DocumentType::Contract);
    }

    #[test]
    fn confidence_is_monotonic_and_capped() {
        let mut previous = 0.0;
        for matches in 1..20 {
            let c = confidence_for_matches(matches);
            assert!(c >= previous, "confidence dropped at {matches}");
            assert!(c <= MAX_RULE_CONFIDENCE);
            previous = c;
        }
        assert_eq!(confidence_for_matches(1), 0.65);
        assert_eq!(confidence_for_matches(2), 0.8);
        assert_eq!(confidence_for_matches(3), 0.95);
        assert_eq!(confidence_for_matches(10), 0.95);
    }

    #[test]
    fn classification_is_deterministic() {
        let engine = RuleEngine::default_rules();
        let text = "Kuitti: thank you for your purchase, total 12 EUR";
        assert_eq!(engine.score_and_classify(text), engine.score_and_classify(text));
    }

    #[test]
    fn non_ascii_and_mixed_text_does_not_panic() {
        let result = classify("ÄÖÅ 日本語 ☃ \u{0} PERSONALAUSWEIS");
        assert_eq!(result.document_type, DocumentType::IdDocument);
    }

    #[test]
    fn custom_keyword_set() {
        let engine = RuleEngine::new(KeywordSet::new([(
            DocumentType::Receipt,
            vec!["bon"],
        )]));
        assert_eq!(
            engine.score_and_classify("Bon de caisse").document_type,
            DocumentType::Receipt
        );
        assert_eq!(
            engine.score_and_classify("invoice").document_type,
            DocumentType::Other
        );
    }

    #[test]
    fn empty_keyword_set_yields_other() {
        let engine = RuleEngine::new(KeywordSet::new(Vec::<(DocumentType, Vec<&str>)>::new()));
        let result = engine.score_and_classify("anything at all");
        assert_eq!(result.document_type, DocumentType::Other);
        assert_eq!(result.confidence, NO_MATCH_CONFIDENCE);
    }
}
