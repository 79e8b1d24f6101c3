pub mod extract;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::DictionaryConfig;
use crate::dictionary::extract::Extractor;

/// Anything that can turn a word into a user-facing definition.
/// Implementations never fail: a miss becomes the not-found message.
#[async_trait]
pub trait Dictionary: Send + Sync {
    async fn define(&self, term: &str) -> String;
}

/// sjp.pl lookup over HTTP.
pub struct DictionaryClient {
    client: reqwest::Client,
    config: DictionaryConfig,
    extractor: Extractor,
}

impl DictionaryClient {
    pub fn new(config: DictionaryConfig) -> Self {
        let extractor = Extractor::new(config.match_policy);
        Self {
            client: reqwest::Client::new(),
            config,
            extractor,
        }
    }

    /// Page URL for a term. The term is percent-encoded so words with
    /// reserved characters still address a single page.
    pub fn url_for(&self, term: &str) -> String {
        format!("{}{}", self.config.base_url, urlencoding::encode(term))
    }

    /// Fetch the page for `term` and extract its definition paragraphs.
    /// Non-2xx responses are parsed like any other page.
    pub async fn fetch(&self, term: &str) -> Result<Vec<String>> {
        let url = self.url_for(term);
        debug!("Fetching dictionary page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Dictionary page {} returned {}", url, status);
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Ok(self.extractor.extract(&body))
    }

    fn format_answer(&self, paragraphs: &[String]) -> String {
        let mut result = String::new();
        for paragraph in paragraphs {
            result.push_str(paragraph);
            result.push('\n');
        }

        let result = result.trim_matches(|c| matches!(c, ' ' | '\t' | '\n'));
        if result.is_empty() {
            self.config.not_found_message.clone()
        } else {
            result.to_string()
        }
    }
}

#[async_trait]
impl Dictionary for DictionaryClient {
    async fn define(&self, term: &str) -> String {
        let paragraphs = match self.fetch(term).await {
            Ok(paragraphs) => paragraphs,
            Err(e) => {
                warn!("Dictionary lookup for '{}' failed: {:#}", term, e);
                Vec::new()
            }
        };
        self.format_answer(&paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchPolicy;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OPEN: &str =
        r#"<p style="margin: .5em 0; font: medium/1.4 sans-serif; max-width: 32em; ">"#;

    fn config(base_url: &str, policy: MatchPolicy) -> DictionaryConfig {
        DictionaryConfig {
            base_url: base_url.to_string(),
            match_policy: policy,
            not_found_message: "Nie występuje w słowniku".to_string(),
        }
    }

    async fn serve(route: &str, status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_url_is_percent_encoded() {
        let client = DictionaryClient::new(config("https://sjp.pl/", MatchPolicy::Greedy));
        assert_eq!(client.url_for("kot"), "https://sjp.pl/kot");
        assert_eq!(client.url_for("a/b?c"), "https://sjp.pl/a%2Fb%3Fc");
        assert_eq!(client.url_for("żółw"), "https://sjp.pl/%C5%BC%C3%B3%C5%82w");
    }

    #[test]
    fn test_format_answer_joins_and_trims() {
        let client = DictionaryClient::new(config("https://sjp.pl/", MatchPolicy::Greedy));
        let answer = client.format_answer(&["  pierwszy".to_string(), "drugi\n".to_string()]);
        assert_eq!(answer, "pierwszy\ndrugi");
    }

    #[test]
    fn test_format_answer_blank_is_not_found() {
        let client = DictionaryClient::new(config("https://sjp.pl/", MatchPolicy::Greedy));
        assert_eq!(client.format_answer(&[]), "Nie występuje w słowniku");
        assert_eq!(
            client.format_answer(&[" \t".to_string(), "\n".to_string()]),
            "Nie występuje w słowniku"
        );
    }

    #[tokio::test]
    async fn test_define_returns_definition() {
        let body = format!(
            "<html>\n{}1. zwierzę domowe<br />2. samiec &amp; samica</p>\n{}3. pot. sprawa</p>\n</html>",
            OPEN, OPEN
        );
        let server = serve("/kot", 200, &body).await;
        let client = DictionaryClient::new(config(
            &format!("{}/", server.uri()),
            MatchPolicy::Greedy,
        ));

        let answer = client.define("kot").await;
        assert_eq!(answer, "1. zwierzę domowe\n2. samiec & samica\n3. pot. sprawa");
    }

    #[tokio::test]
    async fn test_define_without_markers_is_not_found() {
        let server = serve("/xyz", 200, "<html><p>brak wyników</p></html>").await;
        let client = DictionaryClient::new(config(
            &format!("{}/", server.uri()),
            MatchPolicy::Greedy,
        ));

        assert_eq!(client.define("xyz").await, "Nie występuje w słowniku");
    }

    #[tokio::test]
    async fn test_error_status_body_is_still_parsed() {
        let body = format!("{}znaczenie</p>", OPEN);
        let server = serve("/kot", 404, &body).await;
        let client = DictionaryClient::new(config(
            &format!("{}/", server.uri()),
            MatchPolicy::Paragraph,
        ));

        assert_eq!(client.define("kot").await, "znaczenie");
    }

    #[tokio::test]
    async fn test_encoded_term_reaches_server() {
        let body = format!("{}powolny gad</p>", OPEN);
        let server = serve("/%C5%BC%C3%B3%C5%82w", 200, &body).await;
        let client = DictionaryClient::new(config(
            &format!("{}/", server.uri()),
            MatchPolicy::Greedy,
        ));

        assert_eq!(client.define("żółw").await, "powolny gad");
    }

    #[tokio::test]
    async fn test_fetch_reports_transport_error() {
        // Nothing listens on port 9 on the loopback interface.
        let client = DictionaryClient::new(config("http://127.0.0.1:9/", MatchPolicy::Greedy));
        assert!(client.fetch("kot").await.is_err());
    }

    #[tokio::test]
    async fn test_define_swallows_transport_error() {
        let client = DictionaryClient::new(config("http://127.0.0.1:9/", MatchPolicy::Greedy));
        assert_eq!(client.define("kot").await, "Nie występuje w słowniku");
    }
}
