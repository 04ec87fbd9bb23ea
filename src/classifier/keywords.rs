//! Per-category keyword tables for the rule engine.
//!
//! Keywords are matched as lowercase substrings, so multi-word phrases
//! ("due date") and Finnish/German inflected stems work without tokenizing.

use super::types::DocumentType;

const INVOICE_KEYWORDS: &[&str] = &[
    "lasku",
    "invoice",
    "laskun",
    "total",
    "loppusumma",
    "yhteensä",
    "amount",
    "viitenumero",
    "reference",
    "eräpäivä",
    "due date",
    "alv",
    "vat",
    "faktura",
    "rechnung",
];

const CONTRACT_KEYWORDS: &[&str] = &[
    "sopimus",
    "contract",
    "allekirjoitus",
    "signature",
    "osapuoli",
    "party",
    "sopimusehto",
    "terms",
    "voimassaolo",
    "validity",
    "agreement",
    "vertrag",
];

const RECEIPT_KEYWORDS: &[&str] = &[
    "kuitti",
    "receipt",
    "kassakuitti",
    "cash register",
    "ostoskuitti",
    "myyntikuitti",
    "sale receipt",
    "thank you",
    "kiitos",
    "beleg",
];

const ID_DOCUMENT_KEYWORDS: &[&str] = &[
    "henkilötunnus",
    "personal id",
    "passi",
    "passport",
    "ajokortti",
    "driver",
    "henkilökortti",
    "id card",
    "identity",
    "personalausweis",
    "license",
];

/// Keyword set for one scored category.
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub document_type: DocumentType,
    pub keywords: Vec<String>,
}

/// Mapping from scored document types to their keywords.
///
/// Entries are kept in tie-break priority order. Built once and shared
/// read-only; there is no mutation path after construction.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    categories: Vec<CategoryKeywords>,
}

impl KeywordSet {
    /// The built-in Finnish/English/German/Swedish keyword tables.
    pub fn builtin() -> Self {
        Self::new([
            (DocumentType::Invoice, INVOICE_KEYWORDS),
            (DocumentType::Contract, CONTRACT_KEYWORDS),
            (DocumentType::Receipt, RECEIPT_KEYWORDS),
            (DocumentType::IdDocument, ID_DOCUMENT_KEYWORDS),
        ])
    }

    /// Build a keyword set from `(type, keywords)` pairs.
    ///
    /// Entries are reordered into the fixed priority order
    /// (invoice, contract, receipt, ID document). Keywords are lowercased
    /// and de-duplicated; empty keywords and `Other`/`Unknown` entries are
    /// dropped since they can never be scored.
    pub fn new<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (DocumentType, K)>,
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: [Option<Vec<String>>; 4] = Default::default();
        for (document_type, keywords) in entries {
            let Some(idx) = DocumentType::SCORED.iter().position(|t| *t == document_type) else {
                continue;
            };
            let slot = slots[idx].get_or_insert_with(Vec::new);
            for keyword in keywords {
                let keyword = keyword.as_ref().trim().to_lowercase();
                if !keyword.is_empty() && !slot.contains(&keyword) {
                    slot.push(keyword);
                }
            }
        }

        let categories = DocumentType::SCORED
            .into_iter()
            .zip(slots)
            .filter_map(|(document_type, keywords)| {
                keywords.map(|keywords| CategoryKeywords {
                    document_type,
                    keywords,
                })
            })
            .collect();

        Self { categories }
    }

    /// Categories in tie-break priority order.
    pub fn categories(&self) -> &[CategoryKeywords] {
        &self.categories
    }

    /// Keywords configured for a document type (empty if none).
    pub fn keywords_for(&self, document_type: DocumentType) -> &[String] {
        self.categories
            .iter()
            .find(|c| c.document_type == document_type)
            .map(|c| c.keywords.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::builtin()
    }
}
