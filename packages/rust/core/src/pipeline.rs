//! End-to-end scan pipeline.
//!
//! [`Pipeline`] wires the client, cache, extractor pool, and shared
//! concurrency limiter together and runs the three phases in order: scan
//! pathways for relations, rank the related genes, resolve drugs for the
//! top of the ranking. The finished report is cached per gene so a repeat
//! query answers without touching the network.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument};

use pathscout_client::KeggClient;
use pathscout_kgml::ExtractorPool;
use pathscout_shared::{Result, ScanConfig, category};
use pathscout_store::CacheStore;

use crate::aggregate::aggregate;
use crate::enrich::{DrugEnricher, EnrichedGene};
use crate::scanner::PathwayScanner;

/// Receives phase transitions while a scan runs. Implemented by the CLI
/// spinner; library callers can pass [`SilentProgress`].
pub trait ProgressReporter: Send + Sync {
    fn phase(&self, message: &str);
}

/// Reporter that discards all progress.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _message: &str) {}
}

/// The assembled scan pipeline.
pub struct Pipeline {
    client: Arc<KeggClient>,
    cache: Arc<CacheStore>,
    scanner: PathwayScanner,
    enricher: DrugEnricher,
    config: ScanConfig,
}

impl Pipeline {
    /// Assemble a pipeline from runtime config and an opened cache.
    pub fn new(config: ScanConfig, cache: Arc<CacheStore>) -> Result<Self> {
        let client = Arc::new(KeggClient::new(
            &config.base_url,
            config.request_timeout,
            Arc::clone(&cache),
        )?);
        let limiter = Arc::new(Semaphore::new(config.max_concurrency));
        let pool = Arc::new(ExtractorPool::with_default_size());

        let scanner = PathwayScanner::new(
            Arc::clone(&client),
            Arc::clone(&cache),
            pool,
            Arc::clone(&limiter),
            config.clone(),
        );
        let enricher = DrugEnricher::new(Arc::clone(&client), limiter);

        Ok(Self {
            client,
            cache,
            scanner,
            enricher,
            config,
        })
    }

    /// Display name of the query gene itself.
    pub async fn gene_display_name(&self, gene_code: &str) -> String {
        self.client.gene_name(gene_code).await
    }

    /// Run the full scan for `gene_code` and return the enriched ranking.
    ///
    /// An empty result means the gene has no usable pathway relations; it is
    /// not cached, so a later run gets a fresh attempt.
    #[instrument(skip_all, fields(gene = %gene_code))]
    pub async fn related_drugs(
        &self,
        gene_code: &str,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedGene> {
        let report_key = format!("gene_drugs_{gene_code}");
        if let Some(cached) = self.cache.get_json(category::RESULT, &report_key).await {
            info!("report served from cache");
            return cached;
        }

        progress.phase("scanning pathways");
        let relations = self.scanner.scan(gene_code).await;
        if relations.is_empty() {
            return Vec::new();
        }

        progress.phase("ranking related genes");
        let ranked = aggregate(gene_code, &relations, self.config.top_genes);

        progress.phase("resolving drugs");
        let report = self.enricher.enrich(&ranked).await;

        if !report.is_empty() {
            self.cache
                .put_json(category::RESULT, &report_key, &report)
                .await;
        }
        info!(genes = report.len(), "scan pipeline complete");
        report
    }
}
