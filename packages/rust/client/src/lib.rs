//! KEGG REST client with transparent caching.
//!
//! [`KeggClient::fetch`] is the single transport boundary of the pipeline:
//! every response is cached through [`CacheStore`] under the `api` category,
//! and every failure mode (non-success status, timeout, transport error)
//! resolves to empty text — logged, never raised. Empty results are not
//! cached so transient failures can be retried on a later run.
//!
//! On top of `fetch` sit the four logical KEGG endpoints the pipeline uses:
//! entity records (`/get/{id}`), pathway links (`/link/pathway/{id}`), drug
//! links (`/link/drug/{id}`), and pathway KGML documents
//! (`/get/path:{code}/kgml`).

mod names;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use pathscout_shared::{PathscoutError, Result, UNKNOWN_NAME, category};
use pathscout_store::CacheStore;

pub use names::NameCleaner;

/// User-Agent string for KEGG requests.
const USER_AGENT: &str = concat!("pathscout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// KeggClient
// ---------------------------------------------------------------------------

/// Cached HTTP client for the KEGG REST API.
pub struct KeggClient {
    http: Client,
    cache: Arc<CacheStore>,
    base_url: String,
    names: NameCleaner,
}

impl KeggClient {
    /// Create a client against `base_url` with a fixed per-request timeout.
    pub fn new(base_url: &str, timeout: Duration, cache: Arc<CacheStore>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PathscoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
            names: NameCleaner::new(),
        })
    }

    /// URL of the KGML document for a pathway code (`path:hsa04510` or
    /// `hsa04510`).
    pub fn pathway_kgml_url(&self, code: &str) -> String {
        let code = match code.split_once(':') {
            Some((_, bare)) => bare,
            None => code,
        };
        format!("{}/get/path:{code}/kgml", self.base_url)
    }

    /// Cached GET. Returns the body text, or empty text on any failure.
    pub async fn fetch(&self, url: &str) -> String {
        if let Some(cached) = self.cache.get_text(category::API, url).await {
            return cached;
        }

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "request failed");
                return String::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "non-success response");
            return String::new();
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "failed to read response body");
                return String::new();
            }
        };

        self.cache.put_text(category::API, url, &body).await;
        body
    }

    // -----------------------------------------------------------------------
    // Entity names
    // -----------------------------------------------------------------------

    /// Resolve a gene code to its display name, or [`UNKNOWN_NAME`].
    ///
    /// The name sits on the flat-file line starting with `NAME`, tab-delimited
    /// from the marker.
    pub async fn gene_name(&self, gene_code: &str) -> String {
        if let Some(cached) = self.cache.get_text(category::GENE, gene_code).await {
            return cached;
        }

        let url = format!("{}/get/{gene_code}", self.base_url);
        let text = self.fetch(&url).await;
        if text.is_empty() {
            return UNKNOWN_NAME.to_string();
        }

        let Some(name_line) = text.trim().lines().find(|line| line.starts_with("NAME")) else {
            debug!(gene_code, "entity record has no NAME line");
            return UNKNOWN_NAME.to_string();
        };

        let name = self.names.gene_name(after_tab(name_line));
        self.cache.put_text(category::GENE, gene_code, &name).await;
        name
    }

    /// Resolve a drug code to its display name, or [`UNKNOWN_NAME`].
    ///
    /// Drug records carry the name on the second line of the flat file.
    pub async fn drug_name(&self, drug_code: &str) -> String {
        if let Some(cached) = self.cache.get_text(category::DRUG_NAME, drug_code).await {
            return cached;
        }

        let url = format!("{}/get/{drug_code}", self.base_url);
        let text = self.fetch(&url).await;
        if text.is_empty() {
            return UNKNOWN_NAME.to_string();
        }

        let name = match text.trim().lines().nth(1) {
            Some(name_line) => self.names.drug_name(after_tab(name_line)),
            None => UNKNOWN_NAME.to_string(),
        };

        self.cache
            .put_text(category::DRUG_NAME, drug_code, &name)
            .await;
        name
    }

    // -----------------------------------------------------------------------
    // Link endpoints
    // -----------------------------------------------------------------------

    /// Pathway codes linked to a gene.
    pub async fn pathway_codes(&self, gene_code: &str) -> Vec<String> {
        let cache_key = format!("pathway_{gene_code}");
        if let Some(cached) = self.cache.get_json(category::PATH, &cache_key).await {
            return cached;
        }

        let url = format!("{}/link/pathway/{gene_code}", self.base_url);
        let codes = parse_link_lines(&self.fetch(&url).await);
        if codes.is_empty() {
            return codes;
        }

        self.cache.put_json(category::PATH, &cache_key, &codes).await;
        codes
    }

    /// Drug codes linked to a gene.
    pub async fn drug_codes(&self, gene_code: &str) -> Vec<String> {
        let cache_key = format!("drugs_{gene_code}");
        if let Some(cached) = self.cache.get_json(category::DRUG, &cache_key).await {
            return cached;
        }

        let url = format!("{}/link/drug/{gene_code}", self.base_url);
        let codes = parse_link_lines(&self.fetch(&url).await);
        if codes.is_empty() {
            return codes;
        }

        self.cache.put_json(category::DRUG, &cache_key, &codes).await;
        codes
    }
}

// ---------------------------------------------------------------------------
// Flat-file helpers
// ---------------------------------------------------------------------------

/// The text after the first tab of a line, or the whole line if untabbed.
fn after_tab(line: &str) -> &str {
    match line.split_once('\t') {
        Some((_, rest)) => rest,
        None => line,
    }
}

/// Parse `source<TAB>target` link lines into the target column.
fn parse_link_lines(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .filter_map(|line| {
            let (_, target) = line.split_once('\t')?;
            Some(target.trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> KeggClient {
        KeggClient::new(
            base_url,
            Duration::from_secs(5),
            Arc::new(CacheStore::memory_only()),
        )
        .expect("build client")
    }

    #[test]
    fn after_tab_splits_on_first_tab() {
        assert_eq!(after_tab("NAME\tPTK2B\tmore"), "PTK2B\tmore");
        assert_eq!(after_tab("no tabs here"), "no tabs here");
    }

    #[test]
    fn link_lines_take_second_column() {
        let text = "hsa:5747\tpath:hsa04510\nhsa:5747\tpath:hsa04810\nmalformed line\n";
        assert_eq!(
            parse_link_lines(text),
            vec!["path:hsa04510".to_string(), "path:hsa04810".to_string()]
        );
    }

    #[test]
    fn kgml_url_strips_code_prefix() {
        let client = test_client("http://localhost:1");
        assert_eq!(
            client.pathway_kgml_url("path:hsa04510"),
            "http://localhost:1/get/path:hsa04510/kgml"
        );
        assert_eq!(
            client.pathway_kgml_url("hsa04510"),
            "http://localhost:1/get/path:hsa04510/kgml"
        );
    }

    #[tokio::test]
    async fn fetch_caches_successful_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get/hsa:5747"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ENTRY hsa:5747"))
            .expect(1) // the second fetch must hit the cache
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let url = format!("{}/get/hsa:5747", server.uri());

        assert_eq!(client.fetch(&url).await, "ENTRY hsa:5747");
        assert_eq!(client.fetch(&url).await, "ENTRY hsa:5747");
    }

    #[tokio::test]
    async fn fetch_failure_is_empty_and_uncached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get/hsa:404"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2) // failures are retried, never cached
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let url = format!("{}/get/hsa:404", server.uri());

        assert_eq!(client.fetch(&url).await, "");
        assert_eq!(client.fetch(&url).await, "");
    }

    #[tokio::test]
    async fn gene_name_parses_name_line() {
        let server = MockServer::start().await;
        let record = "ENTRY       5747  CDS  T01001\nNAME (RefSeq)\tPTK2, FADK, FAK\nORTHOLOGY   K05725\n";
        Mock::given(method("GET"))
            .and(path("/get/hsa:5747"))
            .respond_with(ResponseTemplate::new(200).set_body_string(record))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.gene_name("hsa:5747").await, "PTK2, FADK, FAK");
    }

    #[tokio::test]
    async fn gene_name_unknown_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get/hsa:0"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.gene_name("hsa:0").await, UNKNOWN_NAME);
    }

    #[tokio::test]
    async fn drug_name_uses_second_line() {
        let server = MockServer::start().await;
        let record = "ENTRY       D00107  Drug\nNAME\tLeflunomide (JAN/USP/INN)\nFORMULA     C12H9F3N2O2\n";
        Mock::given(method("GET"))
            .and(path("/get/D00107"))
            .respond_with(ResponseTemplate::new(200).set_body_string(record))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.drug_name("D00107").await, "Leflunomide (JAN/USP/INN)");
    }

    #[tokio::test]
    async fn pathway_codes_parse_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/link/pathway/hsa:5747"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("hsa:5747\tpath:hsa04510\nhsa:5747\tpath:hsa04810\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let codes = client.pathway_codes("hsa:5747").await;
        assert_eq!(codes, vec!["path:hsa04510", "path:hsa04810"]);

        // Second call must come from the whole-result cache.
        let codes = client.pathway_codes("hsa:5747").await;
        assert_eq!(codes.len(), 2);
    }

    #[tokio::test]
    async fn empty_drug_links_resolve_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/link/drug/hsa:200"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.drug_codes("hsa:200").await.is_empty());
    }
}
