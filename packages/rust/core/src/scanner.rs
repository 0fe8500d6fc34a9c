//! Batched pathway scanning.
//!
//! For a query gene, the scanner lists the pathways KEGG links to it, then
//! fetches and parses their KGML documents in batches. Fetches share the
//! pipeline-wide concurrency limiter; parses run on the extraction pool.
//! Once enough relations have accumulated the scan stops early and any
//! in-flight batch work is abandoned.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use pathscout_client::KeggClient;
use pathscout_kgml::ExtractorPool;
use pathscout_shared::{PathwayRelation, ScanConfig, bare_gene_id, category};
use pathscout_store::CacheStore;

/// Scans pathway documents for relations touching a query gene.
pub struct PathwayScanner {
    client: Arc<KeggClient>,
    cache: Arc<CacheStore>,
    pool: Arc<ExtractorPool>,
    limiter: Arc<Semaphore>,
    config: ScanConfig,
}

impl PathwayScanner {
    pub fn new(
        client: Arc<KeggClient>,
        cache: Arc<CacheStore>,
        pool: Arc<ExtractorPool>,
        limiter: Arc<Semaphore>,
        config: ScanConfig,
    ) -> Self {
        Self {
            client,
            cache,
            pool,
            limiter,
            config,
        }
    }

    /// Collect relations touching `gene_code` across its linked pathways.
    ///
    /// The whole scan result is cached per gene; individual pathway parses
    /// are cached separately so a re-scan with different tuning can reuse
    /// them.
    #[instrument(skip_all, fields(gene = %gene_code))]
    pub async fn scan(&self, gene_code: &str) -> Vec<PathwayRelation> {
        let scan_key = format!("all_relations_{gene_code}");
        if let Some(cached) = self.cache.get_json(category::RELATIONS, &scan_key).await {
            debug!("scan served from cache");
            return cached;
        }

        let started = Instant::now();
        let mut codes = self.client.pathway_codes(gene_code).await;
        if codes.len() > self.config.max_pathways {
            codes.truncate(self.config.max_pathways);
        }
        if codes.is_empty() {
            warn!("gene is not linked to any pathway");
            return Vec::new();
        }

        let target = bare_gene_id(gene_code).to_string();
        let mut relations: Vec<PathwayRelation> = Vec::new();
        let mut scanned = 0usize;

        'batches: for batch in codes.chunks(self.config.batch_size) {
            let mut tasks = JoinSet::new();
            for code in batch {
                let url = self.client.pathway_kgml_url(code);
                let parse_key = format!("pathway_result_{url}_{gene_code}");
                tasks.spawn(scan_pathway(
                    Arc::clone(&self.client),
                    Arc::clone(&self.cache),
                    Arc::clone(&self.pool),
                    Arc::clone(&self.limiter),
                    url,
                    parse_key,
                    target.clone(),
                ));
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(found) => {
                        scanned += 1;
                        relations.extend(found);
                    }
                    Err(e) => warn!(error = %e, "pathway task failed"),
                }

                // Dropping the set aborts whatever is still in flight.
                if relations.len() >= self.config.min_relations {
                    debug!(
                        count = relations.len(),
                        "relation threshold reached, stopping scan early"
                    );
                    break 'batches;
                }
            }
        }

        if !relations.is_empty() {
            self.cache
                .put_json(category::RELATIONS, &scan_key, &relations)
                .await;
        }

        info!(
            pathways = scanned,
            relations = relations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pathway scan complete"
        );
        relations
    }
}

/// One pathway: cached parse result, or fetch + extract + cache.
async fn scan_pathway(
    client: Arc<KeggClient>,
    cache: Arc<CacheStore>,
    pool: Arc<ExtractorPool>,
    limiter: Arc<Semaphore>,
    url: String,
    parse_key: String,
    target: String,
) -> Vec<PathwayRelation> {
    if let Some(cached) = cache.get_json(category::PARSED, &parse_key).await {
        return cached;
    }

    // The permit spans fetch and extract: the global bound counts whole
    // in-flight operations, not just their network half.
    let _permit = match limiter.acquire().await {
        Ok(permit) => permit,
        Err(_) => return Vec::new(), // limiter closed: shutting down
    };
    let document = client.fetch(&url).await;
    if document.is_empty() {
        return Vec::new();
    }

    let extraction = pool.extract(document, target).await;
    cache
        .put_json(category::PARSED, &parse_key, &extraction.relations)
        .await;
    extraction.relations
}
