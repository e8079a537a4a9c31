use std::future::Future;

use eyre::{Result, WrapErr, eyre};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::debug;

use crate::models::TransactionRecord;

pub const DEFAULT_API_URL: &str = "https://safe-transaction-mainnet.safe.global";

/// Anything that can hand back the full transaction history of one safe.
pub trait TransactionSource {
    fn fetch_all(&self, safe: &str) -> impl Future<Output = Result<Vec<TransactionRecord>>> + Send;
}

/// One page of the Safe Transaction Service listing.
#[derive(Debug, Deserialize)]
pub struct Page {
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<TransactionRecord>,
}

/// Safe Transaction Service client. Pages are followed through `next` until exhausted.
pub struct SafeTxService {
    client: Client,
    api_url: String,
    page_size: u32,
}

impl SafeTxService {
    pub fn new(api_url: &str, api_key: Option<&str>, page_size: u32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .wrap_err("API key is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    pub fn first_page_url(&self, safe: &str) -> String {
        format!(
            "{}/api/v1/safes/{}/all-transactions/?limit={}",
            self.api_url, safe, self.page_size
        )
    }

    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(eyre!("HTTP {} from {}: {}", status, url, body));
        }
        let page = resp
            .json::<Page>()
            .await
            .wrap_err_with(|| format!("decoding page {url}"))?;
        Ok(page)
    }
}

impl TransactionSource for SafeTxService {
    async fn fetch_all(&self, safe: &str) -> Result<Vec<TransactionRecord>> {
        let mut out = Vec::new();
        let mut next = Some(self.first_page_url(safe));
        while let Some(url) = next {
            let page = self.fetch_page(&url).await?;
            debug!(%url, results = page.results.len(), "Fetched page");
            out.extend(page.results);
            next = page.next;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Wei;

    #[test]
    fn builds_listing_url() {
        let svc = SafeTxService::new("https://safe.example/", None, 50).unwrap();
        assert_eq!(
            svc.first_page_url("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            "https://safe.example/api/v1/safes/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed/all-transactions/?limit=50"
        );
    }

    #[test]
    fn rejects_unprintable_api_key() {
        assert!(SafeTxService::new(DEFAULT_API_URL, Some("bad\nkey"), 100).is_err());
        assert!(SafeTxService::new(DEFAULT_API_URL, Some(""), 100).is_ok());
    }

    #[test]
    fn decodes_mixed_page() {
        let page: Page = serde_json::from_str(
            r#"{
                "count": 3,
                "next": "https://safe.example/api/v1/safes/0xS/all-transactions/?limit=2&offset=2",
                "previous": null,
                "results": [
                    {"txType": "MULTISIG_TRANSACTION", "nonce": 4, "transactionHash": "0xH1",
                     "executor": "0xE1", "fee": "21000000000000", "executionDate": "2024-01-01T00:00:00Z"},
                    {"txType": "ETHEREUM_TRANSACTION", "txHash": "0xH2", "executionDate": "2024-01-02T00:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        assert!(page.next.is_some());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].fee, Some(Wei::Text("21000000000000".into())));
        assert_eq!(page.results[1].nonce, None);
        assert_eq!(page.results[1].executor, None);
    }

    #[test]
    fn last_page_has_no_next() {
        let page: Page = serde_json::from_str(r#"{"count": 0, "next": null, "results": []}"#).unwrap();
        assert!(page.next.is_none());
        assert!(page.results.is_empty());
    }

    /// Serves canned `(path, status, body)` responses, one connection per request.
    async fn serve(listener: tokio::net::TcpListener, routes: Vec<(String, u16, String)>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&request);
            let target = request.split_whitespace().nth(1).unwrap_or_default();
            let (status, body) = routes
                .iter()
                .find(|(path, _, _)| path == target)
                .map(|(_, status, body)| (*status, body.clone()))
                .unwrap_or((404, String::new()));
            let reason = match status {
                200 => "OK",
                500 => "Internal Server Error",
                _ => "Not Found",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        }
    }

    #[tokio::test]
    async fn follows_next_across_pages() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = vec![
            (
                "/api/v1/safes/0xS/all-transactions/?limit=2".to_string(),
                200,
                format!(
                    r#"{{"count": 3, "next": "{base}/api/v1/safes/0xS/all-transactions/?limit=2&offset=2",
                        "results": [{{"nonce": 2, "transactionHash": "0xH2"}}, {{"nonce": 1, "transactionHash": "0xH1"}}]}}"#
                ),
            ),
            (
                "/api/v1/safes/0xS/all-transactions/?limit=2&offset=2".to_string(),
                200,
                r#"{"count": 3, "next": null, "results": [{"nonce": "0", "transactionHash": "0xH0"}]}"#.to_string(),
            ),
        ];
        tokio::spawn(serve(listener, routes));

        let svc = SafeTxService::new(&base, Some("secret"), 2).unwrap();
        let txs = svc.fetch_all("0xS").await.unwrap();
        let hashes: Vec<_> = txs.iter().map(|t| t.transaction_hash.clone().unwrap()).collect();
        assert_eq!(hashes, vec!["0xH2", "0xH1", "0xH0"]);
    }

    #[tokio::test]
    async fn error_status_fails_with_body() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = vec![(
            "/api/v1/safes/0xS/all-transactions/?limit=100".to_string(),
            500,
            "indexer unavailable".to_string(),
        )];
        tokio::spawn(serve(listener, routes));

        let svc = SafeTxService::new(&base, None, 100).unwrap();
        let err = svc.fetch_all("0xS").await.err().unwrap().to_string();
        assert!(err.contains("500"), "{err}");
        assert!(err.contains("indexer unavailable"), "{err}");
    }
}
