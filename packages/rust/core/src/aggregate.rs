//! Relation aggregation and ranking.
//!
//! A scan yields one relation per (pathway, edge); the same neighbor gene
//! usually shows up in several pathways with different relation subtypes.
//! Aggregation collapses that stream to one relation per gene, then ranks
//! genes by how strong their relation subtype is.

use std::collections::HashMap;

use pathscout_shared::PathwayRelation;

/// Relation strength, lower is stronger. Activation is the most
/// pharmacologically interesting signal, direct regulation beats the
/// unspecific binding/association bucket, and anything unrecognized ranks
/// last.
fn relation_priority(relation_type: &str) -> u8 {
    if relation_type.contains("activation") {
        0
    } else if relation_type.contains("inhibition") {
        1
    } else if relation_type.contains("expression") {
        2
    } else if relation_type == "binding/association" {
        3
    } else {
        4
    }
}

/// Collapse raw relations to one per gene and rank the strongest `top`.
///
/// The first relation seen for a gene is kept, except that a later
/// activation relation overwrites whatever was held before. Relations back
/// to the query gene itself are dropped. Ranking is a stable sort on
/// priority, so genes with equal strength keep their discovery order.
pub fn aggregate(
    query_gene: &str,
    relations: &[PathwayRelation],
    top: usize,
) -> Vec<PathwayRelation> {
    let mut by_gene: Vec<PathwayRelation> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for relation in relations {
        if relation.gene_code == query_gene {
            continue;
        }

        match index.get(&relation.gene_code) {
            Some(&slot) => {
                if relation.relation_type.contains("activation") {
                    by_gene[slot] = relation.clone();
                }
            }
            None => {
                index.insert(relation.gene_code.clone(), by_gene.len());
                by_gene.push(relation.clone());
            }
        }
    }

    by_gene.sort_by_key(|r| relation_priority(&r.relation_type));
    by_gene.truncate(top);
    by_gene
}
