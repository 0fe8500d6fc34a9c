//! Core domain types for pathscout.

use serde::{Deserialize, Serialize};

/// Current schema version for durable cache records.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Sentinel returned when a gene or drug display name could not be resolved.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Organism-scoped prefix of human gene codes in KEGG (`hsa:5747`).
pub const HUMAN_GENE_PREFIX: &str = "hsa:";

/// Relation type recorded when a KGML relation carries no subtypes.
pub const ASSOCIATION_RELATION: &str = "association";

// ---------------------------------------------------------------------------
// Cache categories
// ---------------------------------------------------------------------------

/// Durable cache categories. Each category holds one payload shape; a key is
/// only meaningful within its category.
pub mod category {
    /// Raw response bodies, keyed by request URL.
    pub const API: &str = "api";
    /// Resolved gene display names, keyed by gene code.
    pub const GENE: &str = "gene";
    /// Pathway code lists, keyed by `pathway_{gene}`.
    pub const PATH: &str = "path";
    /// Drug code lists, keyed by `drugs_{gene}`.
    pub const DRUG: &str = "drug";
    /// Resolved drug display names, keyed by drug code.
    pub const DRUG_NAME: &str = "drug_name";
    /// Per-pathway extraction results, keyed by `pathway_result_{url}_{gene}`.
    pub const PARSED: &str = "parsed";
    /// Whole-scan relation lists, keyed by `all_relations_{gene}`.
    pub const RELATIONS: &str = "relations";
    /// Final gene→drugs mappings, keyed by `gene_drugs_{gene}`.
    pub const RESULT: &str = "result";
}

// ---------------------------------------------------------------------------
// PathwayRelation
// ---------------------------------------------------------------------------

/// One relation edge extracted from a pathway document, touching the query
/// gene on one side.
///
/// Within a single extraction result no two relations share the same
/// `(entry_id, gene_code, relation_type)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayRelation {
    /// KGML entry id of the related endpoint within its pathway document.
    pub entry_id: String,
    /// KEGG gene code of the related endpoint (always `hsa:`-prefixed).
    pub gene_code: String,
    /// Slash-joined relation subtype names, or [`ASSOCIATION_RELATION`].
    pub relation_type: String,
    /// Human-readable title of the pathway the relation came from.
    pub pathway: String,
}

/// Strip the organism prefix from a gene identifier (`hsa:5747` → `5747`).
///
/// KGML entry names embed the full code but entry ids do not, so matching
/// uses the bare identifier.
pub fn bare_gene_id(gene_code: &str) -> &str {
    match gene_code.split_once(':') {
        Some((_, id)) => id,
        None => gene_code,
    }
}
