// # HTTP WAN Address Resolver
//
// This crate resolves the host's public address by asking WAN-IP echo
// services over HTTPS (ident.me style: the response body is the caller's
// address as plain text).
//
// ## Behavior
//
// - Separate endpoints per address family; the v4 endpoint must answer with
//   an IPv4 literal and the v6 endpoint with an IPv6 literal, anything else
//   is an error.
// - One request per call, no retry: a failed lookup degrades that family to
//   "unavailable" for the cycle, and the next scheduled tick asks again.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;

use zonesync_core::traits::AddressResolver;
use zonesync_core::{Error, Result};

/// Default IPv4 echo endpoint
const DEFAULT_V4_ENDPOINT: &str = "https://v4.ident.me";

/// Default IPv6 echo endpoint
const DEFAULT_V6_ENDPOINT: &str = "https://v6.ident.me";

/// HTTP timeout per lookup
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// WAN address resolver backed by HTTP echo services
pub struct HttpResolver {
    v4_endpoint: String,
    v6_endpoint: String,
    client: reqwest::Client,
}

impl HttpResolver {
    /// Create a resolver using the default ident.me endpoints
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_V4_ENDPOINT, DEFAULT_V6_ENDPOINT)
    }

    /// Create a resolver with custom per-family endpoints
    pub fn with_endpoints(v4_endpoint: impl Into<String>, v6_endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(concat!("zonesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            v4_endpoint: v4_endpoint.into(),
            v6_endpoint: v6_endpoint.into(),
            client,
        }
    }

    /// Fetch one echo response body, trimmed
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::resolver(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::resolver(format!(
                "{url} answered with HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolver(format!("failed to read response from {url}: {e}")))?;

        Ok(body.trim().to_string())
    }

    async fn fetch_parsed<T: FromStr>(&self, url: &str, family: &str) -> Result<T> {
        let body = self.fetch(url).await?;
        body.parse().map_err(|_| {
            Error::resolver(format!("{url} did not return a valid {family} address: {body}"))
        })
    }
}

impl Default for HttpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AddressResolver for HttpResolver {
    async fn resolve_v4(&self) -> Result<Ipv4Addr> {
        let ip = self.fetch_parsed(&self.v4_endpoint, "IPv4").await?;
        tracing::debug!("resolved WAN IPv4: {}", ip);
        Ok(ip)
    }

    async fn resolve_v6(&self) -> Result<Ipv6Addr> {
        let ip = self.fetch_parsed(&self.v6_endpoint, "IPv6").await?;
        tracing::debug!("resolved WAN IPv6: {}", ip);
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn echo_server(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn resolves_ipv4_from_echo_body() {
        let server = echo_server("203.0.113.9\n").await;
        let resolver = HttpResolver::with_endpoints(server.uri(), server.uri());

        let ip = resolver.resolve_v4().await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(203, 0, 113, 9));
    }

    #[tokio::test]
    async fn resolves_ipv6_from_echo_body() {
        let server = echo_server("2001:db8::1").await;
        let resolver = HttpResolver::with_endpoints(server.uri(), server.uri());

        let ip = resolver.resolve_v6().await.unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<Ipv6Addr>().unwrap());
    }

    #[tokio::test]
    async fn rejects_wrong_address_family() {
        // A v4 endpoint answering with a v6 literal is an error, not a value.
        let server = echo_server("2001:db8::1").await;
        let resolver = HttpResolver::with_endpoints(server.uri(), server.uri());

        assert!(resolver.resolve_v4().await.is_err());
    }

    #[tokio::test]
    async fn http_error_status_fails_the_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let resolver = HttpResolver::with_endpoints(server.uri(), server.uri());

        let err = resolver.resolve_v4().await.unwrap_err();
        assert!(matches!(err, Error::Resolver(_)));
    }

    #[tokio::test]
    async fn garbage_body_fails_the_lookup() {
        let server = echo_server("<html>not an ip</html>").await;
        let resolver = HttpResolver::with_endpoints(server.uri(), server.uri());

        assert!(resolver.resolve_v4().await.is_err());
    }
}
