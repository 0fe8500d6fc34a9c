//! KGML pathway-document parsing, isolated on a blocking worker pool.
//!
//! Parsing a KGML document is CPU-bound and must not stall the async
//! scheduler, so [`ExtractorPool`] runs [`parser::extract`] on
//! `spawn_blocking` workers, bounded by a semaphore sized to the machine's
//! core count minus one. The boundary is pure message passing: an owned
//! document string and target id go in, an owned [`Extraction`] comes out;
//! no shared state crosses it.

pub mod parser;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::warn;

use pathscout_shared::PathwayRelation;

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Result of parsing one pathway document against a target gene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// KGML entry id the target gene matched, if the pathway mentions it.
    pub matched_entry: Option<String>,
    /// Relations touching the matched entry, deduplicated by
    /// `(entry_id, gene_code, relation_type)`.
    pub relations: Vec<PathwayRelation>,
    /// All entry id → name pairs seen in the document.
    pub entry_names: std::collections::HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// ExtractorPool
// ---------------------------------------------------------------------------

/// Bounded pool of blocking extraction workers.
pub struct ExtractorPool {
    permits: Arc<Semaphore>,
}

impl ExtractorPool {
    /// Pool bounded to `workers` simultaneous extractions.
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Pool sized to the available cores minus one, leaving a core for the
    /// async runtime.
    pub fn with_default_size() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self::new(cores.saturating_sub(1))
    }

    /// Extract relations for `target_gene_id` from `document` on a worker.
    ///
    /// Worker failures (a panicking parse) degrade to the empty extraction,
    /// matching the parser's own error behavior.
    pub async fn extract(&self, document: String, target_gene_id: String) -> Extraction {
        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Extraction::default(), // semaphore closed: shutting down
        };

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            parser::extract(&document, &target_gene_id)
        });

        match handle.await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(error = %e, "extraction worker failed");
                Extraction::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal KGML document in the shape KEGG serves: the target gene
    /// (entry 10) relates to two other genes and one compound.
    const FIXTURE: &str = r#"<?xml version="1.0"?>
<pathway name="path:hsa04510" org="hsa" number="04510" title="Focal adhesion">
  <entry id="10" name="hsa:5747" type="gene">
    <graphics name="PTK2" type="rectangle"/>
  </entry>
  <entry id="20" name="hsa:100 hsa:101" type="gene">
    <graphics name="ADORA2A" type="rectangle"/>
  </entry>
  <entry id="30" name="hsa:200" type="gene"/>
  <entry id="40" name="cpd:C00076" type="compound"/>
  <relation entry1="10" entry2="20" type="PPrel">
    <subtype name="activation" value="--&gt;"/>
    <subtype name="phosphorylation" value="+p"/>
  </relation>
  <relation entry1="30" entry2="10" type="PPrel">
    <subtype name="inhibition" value="--|"/>
  </relation>
  <relation entry1="10" entry2="40" type="PCrel"/>
  <relation entry1="10" entry2="20" type="PPrel">
    <subtype name="activation" value="--&gt;"/>
    <subtype name="phosphorylation" value="+p"/>
  </relation>
  <relation entry1="20" entry2="30" type="PPrel"/>
</pathway>
"#;

    #[test]
    fn extracts_relations_touching_the_target() {
        let extraction = parser::extract(FIXTURE, "5747");

        assert_eq!(extraction.matched_entry.as_deref(), Some("10"));
        assert_eq!(extraction.relations.len(), 2);

        let first = &extraction.relations[0];
        assert_eq!(first.entry_id, "20");
        assert_eq!(first.gene_code, "hsa:100"); // first code of a multi-code name
        assert_eq!(first.relation_type, "activation/phosphorylation");
        assert_eq!(first.pathway, "Focal adhesion");

        let second = &extraction.relations[1];
        assert_eq!(second.gene_code, "hsa:200");
        assert_eq!(second.relation_type, "inhibition");
    }

    #[test]
    fn duplicate_relations_are_collapsed() {
        let extraction = parser::extract(FIXTURE, "5747");
        let mut keys: Vec<_> = extraction
            .relations
            .iter()
            .map(|r| (&r.entry_id, &r.gene_code, &r.relation_type))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn non_gene_endpoints_are_discarded() {
        let extraction = parser::extract(FIXTURE, "5747");
        // The compound relation (entry 40, cpd: prefix) must not appear.
        assert!(extraction.relations.iter().all(|r| r.entry_id != "40"));
    }

    #[test]
    fn unreferenced_gene_yields_nothing() {
        let extraction = parser::extract(FIXTURE, "99999");
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn non_xml_input_yields_nothing() {
        assert_eq!(parser::extract("404 not found", "5747"), Extraction::default());
        assert_eq!(parser::extract("", "5747"), Extraction::default());
    }

    #[test]
    fn truncated_document_yields_nothing() {
        // Cut inside the first relation's opening tag.
        let cut = FIXTURE.find("entry2=\"20\"").expect("fixture anchor");
        let extraction = parser::extract(&FIXTURE[..cut], "5747");
        // Whatever was readable before the break is discarded wholesale.
        assert!(extraction.relations.is_empty());
    }

    #[test]
    fn relation_without_subtypes_is_association() {
        let doc = r#"<?xml version="1.0"?>
<pathway name="path:hsa00001" title="Test">
  <entry id="1" name="hsa:5747" type="gene"/>
  <entry id="2" name="hsa:300" type="gene"/>
  <relation entry1="1" entry2="2" type="PPrel"/>
</pathway>
"#;
        let extraction = parser::extract(doc, "5747");
        assert_eq!(extraction.relations.len(), 1);
        assert_eq!(extraction.relations[0].relation_type, "association");
    }

    #[test]
    fn subtype_with_explicit_end_tag_is_kept() {
        let doc = r#"<?xml version="1.0"?>
<pathway name="path:hsa00001" title="Test">
  <entry id="1" name="hsa:5747" type="gene"/>
  <entry id="2" name="hsa:300" type="gene"/>
  <relation entry1="1" entry2="2" type="PPrel">
    <subtype name="activation" value="--&gt;"></subtype>
    <subtype name="phosphorylation" value="+p"></subtype>
  </relation>
</pathway>
"#;
        let extraction = parser::extract(doc, "5747");
        assert_eq!(extraction.relations.len(), 1);
        assert_eq!(
            extraction.relations[0].relation_type,
            "activation/phosphorylation"
        );
    }

    #[test]
    fn missing_title_falls_back() {
        let doc = r#"<?xml version="1.0"?>
<pathway name="path:hsa00001">
  <entry id="1" name="hsa:5747" type="gene"/>
  <entry id="2" name="hsa:300" type="gene"/>
  <relation entry1="1" entry2="2" type="PPrel"/>
</pathway>
"#;
        let extraction = parser::extract(doc, "5747");
        assert_eq!(extraction.relations[0].pathway, "Unknown Pathway");
    }

    #[test]
    fn extraction_roundtrips_through_cache_json() {
        let extraction = parser::extract(FIXTURE, "5747");
        let json = serde_json::to_string(&extraction).expect("serialize");
        let parsed: Extraction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, extraction);
    }

    #[tokio::test]
    async fn pool_extracts_off_the_async_thread() {
        let pool = ExtractorPool::new(2);
        let extraction = pool.extract(FIXTURE.to_string(), "5747".to_string()).await;
        assert_eq!(extraction.relations.len(), 2);
    }

    #[tokio::test]
    async fn pool_handles_garbage_input() {
        let pool = ExtractorPool::new(1);
        let extraction = pool
            .extract("<?xml version=\"1.0\"?><pathway".to_string(), "1".to_string())
            .await;
        assert_eq!(extraction, Extraction::default());
    }
}
