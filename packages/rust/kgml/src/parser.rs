//! KGML relation extraction.
//!
//! A KGML pathway document holds `entry` elements (graph nodes: genes,
//! orthologs, compounds, maps) and `relation` elements (edges between two
//! entry ids, annotated with `subtype` children). Extraction finds the entry
//! matching the target gene and collects every relation touching it whose
//! other endpoint is a human gene.
//!
//! Parsing never raises past this module: malformed input yields the same
//! empty result as a document that simply does not mention the gene.

use std::collections::{HashMap, HashSet};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use pathscout_shared::{ASSOCIATION_RELATION, HUMAN_GENE_PREFIX, PathwayRelation, UNKNOWN_NAME};

use crate::Extraction;

/// Title recorded when the pathway element carries none.
const UNKNOWN_PATHWAY: &str = "Unknown Pathway";

/// Extract the relations touching `target_gene_id` from a KGML document.
///
/// `target_gene_id` is the bare identifier without the organism prefix
/// (`5747`, not `hsa:5747`); KGML entry ids do not carry the prefix.
pub fn extract(document: &str, target_gene_id: &str) -> Extraction {
    // Fast-path reject anything that is not an XML document.
    if !document.trim_start().starts_with("<?xml") {
        return Extraction::default();
    }

    match DocumentScan::run(document, target_gene_id) {
        Ok(extraction) => extraction,
        Err(e) => {
            debug!(error = %e, "KGML parse failed, discarding document");
            Extraction::default()
        }
    }
}

/// An edge as it appears in the document, before endpoint resolution.
struct RawRelation {
    entry1: String,
    entry2: String,
    subtypes: Vec<String>,
}

/// Accumulated state of one pass over the document's events.
#[derive(Default)]
struct DocumentScan {
    title: Option<String>,
    entry_names: HashMap<String, String>,
    matched_entry: Option<String>,
    relations: Vec<RawRelation>,
    open_relation: Option<RawRelation>,
}

impl DocumentScan {
    fn run(document: &str, target_gene_id: &str) -> quick_xml::Result<Extraction> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut scan = DocumentScan::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                // Subtypes are usually serialized self-closing but an
                // explicit end tag is equally valid; both arms accept them.
                Event::Start(e) => match e.name().as_ref() {
                    b"pathway" => scan.title = attr(&e, "title"),
                    b"entry" => scan.record_entry(&e, target_gene_id),
                    b"relation" => scan.open_relation = open_relation(&e),
                    b"subtype" => scan.record_subtype(&e),
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"entry" => scan.record_entry(&e, target_gene_id),
                    b"relation" => {
                        if let Some(relation) = open_relation(&e) {
                            scan.relations.push(relation);
                        }
                    }
                    b"subtype" => scan.record_subtype(&e),
                    _ => {}
                },
                Event::End(e) if e.name().as_ref() == b"relation" => {
                    if let Some(relation) = scan.open_relation.take() {
                        scan.relations.push(relation);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(scan.resolve())
    }

    /// Record an entry and check it against the target gene. Gene/ortholog
    /// (or untyped) entries whose name or id mention the target are
    /// candidates; the last one in document order wins.
    fn record_entry(&mut self, element: &BytesStart<'_>, target_gene_id: &str) {
        let (Some(id), Some(name)) = (attr(element, "id"), attr(element, "name")) else {
            return;
        };
        let entry_type = attr(element, "type").unwrap_or_default();

        if matches!(entry_type.as_str(), "gene" | "ortholog" | "")
            && (name.contains(target_gene_id) || id.contains(target_gene_id))
        {
            self.matched_entry = Some(id.clone());
        }
        self.entry_names.insert(id, name);
    }

    /// Attach a subtype name to the relation currently being read.
    fn record_subtype(&mut self, element: &BytesStart<'_>) {
        if let (Some(relation), Some(name)) = (self.open_relation.as_mut(), attr(element, "name")) {
            relation.subtypes.push(name);
        }
    }

    /// Resolve raw relations against the entry table into the final result.
    fn resolve(self) -> Extraction {
        // A pathway with no reference to the gene contributes nothing.
        let Some(gene_entry_id) = self.matched_entry else {
            return Extraction::default();
        };

        let title = self.title.unwrap_or_else(|| UNKNOWN_PATHWAY.to_string());
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut relations = Vec::new();

        for raw in self.relations {
            if raw.entry1 != gene_entry_id && raw.entry2 != gene_entry_id {
                continue;
            }

            let other_id = if raw.entry1 == gene_entry_id {
                &raw.entry2
            } else {
                &raw.entry1
            };

            let Some(other_name) = self.entry_names.get(other_id) else {
                continue;
            };
            if other_name.is_empty() || other_name == UNKNOWN_NAME {
                continue;
            }

            // An entry name may list several equivalent codes; only the
            // first is used.
            let gene_code = match other_name.split_once(' ') {
                Some((first, _)) => first,
                None => other_name.as_str(),
            };
            if !gene_code.starts_with(HUMAN_GENE_PREFIX) {
                continue;
            }

            let relation_type = if raw.subtypes.is_empty() {
                ASSOCIATION_RELATION.to_string()
            } else {
                raw.subtypes.join("/")
            };

            let key = (other_id.clone(), gene_code.to_string(), relation_type.clone());
            if seen.insert(key) {
                relations.push(PathwayRelation {
                    entry_id: other_id.clone(),
                    gene_code: gene_code.to_string(),
                    relation_type,
                    pathway: title.clone(),
                });
            }
        }

        Extraction {
            matched_entry: Some(gene_entry_id),
            relations,
            entry_names: self.entry_names,
        }
    }
}

/// Begin a relation from its entry1/entry2 attributes.
fn open_relation(element: &BytesStart<'_>) -> Option<RawRelation> {
    Some(RawRelation {
        entry1: attr(element, "entry1")?,
        entry2: attr(element, "entry2")?,
        subtypes: Vec::new(),
    })
}

/// Read an attribute value as an owned, unescaped string.
fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}
