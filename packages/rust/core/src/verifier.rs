//! Cross-checks each block's chart kind across catalog, prose and payload.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use reportforge_modules::Catalog;
use reportforge_shared::{
    CatalogEntry, ChartKind, ConsistencyFinding, ContentBlock, DeclaredKind, Discrepancy, Severity,
};

/// Every known chart phrase, longest first, whitespace-tolerant and word-bounded.
static PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut phrases: Vec<&str> = ChartKind::ALL
        .iter()
        .flat_map(|kind| kind.phrases().iter().copied())
        .collect();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("valid regex")
});

/// What a block's prose says about its chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProseMention {
    None,
    Single(ChartKind),
    /// Two or more distinct kinds, in first-seen order.
    Ambiguous(Vec<ChartKind>),
}

/// Scan free text for chart phrases.
pub fn scan_prose(text: &str) -> ProseMention {
    let mut kinds: Vec<ChartKind> = Vec::new();
    for m in PHRASE_RE.find_iter(text) {
        let phrase = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some(kind) = ChartKind::from_phrase(&phrase) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    match kinds.len() {
        0 => ProseMention::None,
        1 => ProseMention::Single(kinds[0]),
        _ => ProseMention::Ambiguous(kinds),
    }
}

/// Advisory consistency check over assembled blocks. Pure and idempotent.
pub struct ConsistencyVerifier<'a> {
    catalog: &'a Catalog,
}

impl<'a> ConsistencyVerifier<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// One finding per block whose sources disagree, in block order.
    pub fn verify(&self, blocks: &[ContentBlock]) -> Vec<ConsistencyFinding> {
        blocks
            .iter()
            .filter_map(|block| {
                let Some(entry) = self.catalog.get(&block.module_id) else {
                    warn!(module = %block.module_id, "block has no catalog entry, skipping");
                    return None;
                };
                self.check(entry, block)
            })
            .collect()
    }

    /// Compare one block against its catalog entry.
    pub fn check(&self, entry: &CatalogEntry, block: &ContentBlock) -> Option<ConsistencyFinding> {
        if block.is_placeholder() {
            return None;
        }
        let Some(rendered) = block.rendered_kind else {
            debug!(module = %block.module_id, "block has no rendered chart, skipping");
            return None;
        };
        let expected = entry.chart_kind;

        let declared = match scan_prose(&block.prose) {
            ProseMention::Single(kind) => DeclaredKind::Stated(kind),
            ProseMention::Ambiguous(kinds) => DeclaredKind::Ambiguous(kinds),
            ProseMention::None => DeclaredKind::Stated(block.declared_kind.unwrap_or(expected)),
        };

        let mut issues = Vec::new();
        if rendered != expected {
            issues.push(Discrepancy::CatalogVsRendered);
        }
        match declared.stated() {
            Some(stated) => {
                if stated != expected {
                    issues.push(Discrepancy::CatalogVsText);
                }
                if stated != rendered {
                    issues.push(Discrepancy::TextVsRendered);
                }
            }
            None => issues.push(Discrepancy::AmbiguousText),
        }
        if issues.is_empty() {
            return None;
        }

        let severity = if issues == [Discrepancy::AmbiguousText] {
            Severity::Info
        } else {
            Severity::Warning
        };
        Some(ConsistencyFinding {
            module_id: block.module_id.clone(),
            expected_kind: expected,
            declared_kind: declared,
            rendered_kind: Some(rendered),
            severity,
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportforge_shared::{BlockFailure, ChartPayload, FailureKind, ModuleId};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new("a", "A", ChartKind::Bar),
            CatalogEntry::new("b", "B", ChartKind::Line),
            CatalogEntry::new("landscape", "Landscape", ChartKind::Radar),
        ])
        .unwrap()
    }

    fn block(id: &str, prose: &str, declared: ChartKind, rendered: ChartKind) -> ContentBlock {
        ContentBlock {
            module_id: ModuleId::new(id),
            title: id.to_uppercase(),
            prose: prose.into(),
            declared_kind: Some(declared),
            rendered_kind: Some(rendered),
            series: Some(ChartPayload::empty(rendered)),
            enrichment: None,
            enrichment_surfaced: false,
            no_data: false,
            failure: None,
        }
    }

    #[test]
    fn scan_finds_single_kind_once() {
        assert_eq!(
            scan_prose("The Bar Chart shows it. The bar  chart again."),
            ProseMention::Single(ChartKind::Bar)
        );
        assert_eq!(scan_prose("A donut chart."), ProseMention::Single(ChartKind::Doughnut));
        assert_eq!(scan_prose("No charts here, just a barchart."), ProseMention::None);
    }

    #[test]
    fn scan_reports_ambiguity_in_order() {
        assert_eq!(
            scan_prose("The pie chart, or rather the bar graph, and the pie chart."),
            ProseMention::Ambiguous(vec![ChartKind::Pie, ChartKind::Bar])
        );
    }

    #[test]
    fn scan_prefers_longest_phrase() {
        assert_eq!(
            scan_prose("See the polar area chart."),
            ProseMention::Single(ChartKind::PolarArea)
        );
    }

    #[test]
    fn radar_catalog_with_pie_prose() {
        let catalog = catalog();
        let blocks = vec![block(
            "landscape",
            "The pie chart compares competitors.",
            ChartKind::Pie,
            ChartKind::Radar,
        )];
        let findings = ConsistencyVerifier::new(&catalog).verify(&blocks);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.declared_kind, DeclaredKind::Stated(ChartKind::Pie));
        assert_eq!(f.expected_kind, ChartKind::Radar);
        assert_eq!(f.rendered_kind, Some(ChartKind::Radar));
        assert_eq!(
            f.issues,
            vec![Discrepancy::CatalogVsText, Discrepancy::TextVsRendered]
        );
        assert_eq!(f.severity, Severity::Warning);
    }

    #[test]
    fn consistent_blocks_yield_nothing() {
        let catalog = catalog();
        let blocks = vec![block("a", "The bar chart ranks.", ChartKind::Bar, ChartKind::Bar)];
        assert!(ConsistencyVerifier::new(&catalog).verify(&blocks).is_empty());
    }

    #[test]
    fn silent_prose_falls_back_to_declared_kind() {
        let catalog = catalog();
        let quiet = block("a", "Segments ranked by size.", ChartKind::Bar, ChartKind::Bar);
        assert!(ConsistencyVerifier::new(&catalog).verify(&[quiet]).is_empty());

        let mislabelled = block("a", "Segments ranked by size.", ChartKind::Pie, ChartKind::Bar);
        let findings = ConsistencyVerifier::new(&catalog).verify(&[mislabelled]);
        assert_eq!(findings[0].declared_kind, DeclaredKind::Stated(ChartKind::Pie));
    }

    #[test]
    fn rendered_mismatch_is_flagged() {
        let catalog = catalog();
        let blocks = vec![block("a", "The bar chart ranks.", ChartKind::Bar, ChartKind::Line)];
        let findings = ConsistencyVerifier::new(&catalog).verify(&blocks);
        assert_eq!(
            findings[0].issues,
            vec![Discrepancy::CatalogVsRendered, Discrepancy::TextVsRendered]
        );
    }

    #[test]
    fn ambiguity_alone_is_info() {
        let catalog = catalog();
        let blocks = vec![block(
            "b",
            "The line chart, unlike a pie chart, tracks time.",
            ChartKind::Line,
            ChartKind::Line,
        )];
        let findings = ConsistencyVerifier::new(&catalog).verify(&blocks);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].issues, vec![Discrepancy::AmbiguousText]);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(
            findings[0].declared_kind,
            DeclaredKind::Ambiguous(vec![ChartKind::Line, ChartKind::Pie])
        );
    }

    #[test]
    fn placeholders_and_unknown_modules_are_skipped() {
        let catalog = catalog();
        let entry = catalog.get(&ModuleId::new("a")).unwrap().clone();
        let blocks = vec![
            ContentBlock::placeholder(&entry, BlockFailure::new(FailureKind::Timeout, "slow")),
            block("ghost", "The pie chart.", ChartKind::Pie, ChartKind::Bar),
        ];
        assert!(ConsistencyVerifier::new(&catalog).verify(&blocks).is_empty());
    }

    #[test]
    fn verification_is_idempotent() {
        let catalog = catalog();
        let blocks = vec![
            block("a", "The bar chart ranks.", ChartKind::Bar, ChartKind::Bar),
            block("b", "The scatter plot tracks.", ChartKind::Line, ChartKind::Line),
        ];
        let snapshot = blocks.clone();
        let verifier = ConsistencyVerifier::new(&catalog);
        let first = verifier.verify(&blocks);
        let second = verifier.verify(&blocks);
        assert_eq!(first, second);
        assert_eq!(blocks, snapshot);
    }
}
