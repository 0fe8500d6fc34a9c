//! Drug enrichment for ranked genes.
//!
//! Each ranked gene resolves to its display name plus the set of drugs KEGG
//! links to it. Genes are enriched concurrently, and within one gene the
//! drug-name lookups are concurrent too; everything shares the pipeline
//! limiter so KEGG never sees more in-flight requests than the configured
//! bound.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use pathscout_client::KeggClient;
use pathscout_shared::{PathwayRelation, UNKNOWN_NAME};

/// A ranked gene with its resolved display name and compatible drugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedGene {
    pub gene_code: String,
    pub name: String,
    pub relation_type: String,
    pub pathway: String,
    pub drugs: Vec<String>,
}

/// Resolves names and drug lists for ranked genes.
pub struct DrugEnricher {
    client: Arc<KeggClient>,
    limiter: Arc<Semaphore>,
}

impl DrugEnricher {
    pub fn new(client: Arc<KeggClient>, limiter: Arc<Semaphore>) -> Self {
        Self { client, limiter }
    }

    /// Enrich ranked relations, preserving their rank order.
    ///
    /// Genes whose record cannot be resolved to a name are dropped; a gene
    /// with no linked drugs is kept with an empty drug list.
    #[instrument(skip_all, fields(genes = ranked.len()))]
    pub async fn enrich(&self, ranked: &[PathwayRelation]) -> Vec<EnrichedGene> {
        let mut tasks = JoinSet::new();
        for (rank, relation) in ranked.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let limiter = Arc::clone(&self.limiter);
            let relation = relation.clone();
            tasks.spawn(async move {
                let enriched = enrich_gene(client, limiter, relation).await;
                (rank, enriched)
            });
        }

        let mut slots: Vec<Option<EnrichedGene>> = vec![None; ranked.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((rank, enriched)) => slots[rank] = enriched,
                Err(e) => warn!(error = %e, "enrichment task failed"),
            }
        }

        slots.into_iter().flatten().collect()
    }
}

/// Resolve one gene: display name, then drug codes, then drug names.
async fn enrich_gene(
    client: Arc<KeggClient>,
    limiter: Arc<Semaphore>,
    relation: PathwayRelation,
) -> Option<EnrichedGene> {
    let name = {
        let _permit = limiter.acquire().await.ok()?;
        client.gene_name(&relation.gene_code).await
    };
    if name == UNKNOWN_NAME {
        debug!(gene = %relation.gene_code, "gene record unresolved, dropping from report");
        return None;
    }

    let drug_codes = {
        let _permit = limiter.acquire().await.ok()?;
        client.drug_codes(&relation.gene_code).await
    };

    let mut lookups = JoinSet::new();
    for code in drug_codes {
        let client = Arc::clone(&client);
        let limiter = Arc::clone(&limiter);
        lookups.spawn(async move {
            let _permit = limiter.acquire().await.ok()?;
            Some(client.drug_name(&code).await)
        });
    }

    // BTreeSet both deduplicates drugs listed under several codes and fixes
    // the display order.
    let mut drugs = BTreeSet::new();
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok(Some(drug_name)) if drug_name != UNKNOWN_NAME => {
                drugs.insert(drug_name);
            }
            Ok(_) => {}
            Err(e) => warn!(gene = %relation.gene_code, error = %e, "drug lookup failed"),
        }
    }

    Some(EnrichedGene {
        gene_code: relation.gene_code,
        name,
        relation_type: relation.relation_type,
        pathway: relation.pathway,
        drugs: drugs.into_iter().collect(),
    })
}
