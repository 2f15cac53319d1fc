//! Canonical-URL resolution: manual redirect following, meta-refresh sniffing,
//! and rejection of private/loopback/link-local targets (spec §4.1).
use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Result, bail};
use reqwest::{Client, Method, StatusCode, Url, redirect::Policy};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("blank or invalid URL")]
    InvalidUrl,
    #[error("URL resolves to a private, loopback, or link-local address")]
    PrivateAddress,
    #[error("exceeded {0} redirects")]
    TooManyRedirects(u8),
    #[error("non-http(s) scheme: {0}")]
    UnsupportedScheme(String),
}

#[derive(Clone)]
pub struct UrlResolver {
    client: Client,
    max_redirects: u8,
    meta_refresh_sniff_bytes: usize,
}

impl UrlResolver {
    pub fn new(hop_timeout: Duration, max_redirects: u8, meta_refresh_sniff_bytes: usize) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(hop_timeout)
            .user_agent("Mozilla/5.0 (compatible; diario-ingest/1.0)")
            .build()?;
        Ok(Self {
            client,
            max_redirects,
            meta_refresh_sniff_bytes,
        })
    }

    /// Resolve `raw_url` to its canonical form, following up to `max_redirects`
    /// HTTP hops and one meta-refresh jump.
    pub async fn resolve(&self, raw_url: &str) -> Result<String> {
        if raw_url.trim().is_empty() {
            bail!(ResolveError::InvalidUrl);
        }

        let mut current = Url::parse(raw_url).map_err(|_| ResolveError::InvalidUrl)?;
        reject_non_http(&current)?;
        reject_private_host(&current)?;

        let mut hops: u8 = 0;
        loop {
            if hops > self.max_redirects {
                bail!(ResolveError::TooManyRedirects(self.max_redirects));
            }

            let head = self
                .client
                .request(Method::HEAD, current.clone())
                .send()
                .await?;

            let response = if matches!(
                head.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) {
                self.client
                    .request(Method::GET, current.clone())
                    .header("Range", "bytes=0-0")
                    .send()
                    .await?
            } else {
                head
            };

            if response.status().is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                else {
                    break;
                };
                current = current.join(location).map_err(|_| ResolveError::InvalidUrl)?;
                reject_non_http(&current)?;
                reject_private_host(&current)?;
                hops += 1;
                continue;
            }

            if let Some(target) = sniff_meta_refresh(&self.client, &current, self.meta_refresh_sniff_bytes).await? {
                current = current.join(&target).map_err(|_| ResolveError::InvalidUrl)?;
                reject_non_http(&current)?;
                reject_private_host(&current)?;
                hops += 1;
                continue;
            }

            break;
        }

        Ok(current.to_string())
    }
}

fn reject_non_http(url: &Url) -> Result<()> {
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!(ResolveError::UnsupportedScheme(url.scheme().to_string()));
    }
    Ok(())
}

fn reject_private_host(url: &Url) -> Result<()> {
    let Some(host) = url.host_str() else {
        bail!(ResolveError::InvalidUrl);
    };

    if host.eq_ignore_ascii_case("localhost") {
        bail!(ResolveError::PrivateAddress);
    }

    if let Ok(ip) = host.parse::<IpAddr>()
        && is_disallowed(ip)
    {
        bail!(ResolveError::PrivateAddress);
    }

    Ok(())
}

fn is_disallowed(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback() || ((v6.segments()[0] & 0xffc0) == 0xfe80)
        }
    }
}

/// Streams at most `limit` bytes of the body looking for `<meta http-equiv="refresh">`.
async fn sniff_meta_refresh(client: &Client, url: &Url, limit: usize) -> Result<Option<String>> {
    let mut response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }

    let mut buf = Vec::with_capacity(limit);
    while let Some(chunk) = response.chunk().await? {
        buf.extend_from_slice(&chunk);
        if buf.len() >= limit {
            break;
        }
    }
    buf.truncate(limit);

    let text = String::from_utf8_lossy(&buf);
    Ok(extract_meta_refresh_target(&text))
}

fn extract_meta_refresh_target(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let meta_pos = lower.find("http-equiv=\"refresh\"").or_else(|| lower.find("http-equiv='refresh'"))?;
    let tail = &html[meta_pos..];
    let content_pos = tail.to_ascii_lowercase().find("content=")?;
    let after = &tail[content_pos + "content=".len()..];
    let quote = after.chars().next()?;
    let (quote_char, rest) = if quote == '"' || quote == '\'' {
        (quote, &after[1..])
    } else {
        (' ', after)
    };
    let end = if quote_char == ' ' {
        rest.find(['>', ' ']).unwrap_or(rest.len())
    } else {
        rest.find(quote_char).unwrap_or(rest.len())
    };
    let content = &rest[..end];
    let url_part = content.split(';').find(|s| s.to_ascii_lowercase().trim_start().starts_with("url="))?;
    let target = url_part.trim().trim_start_matches(|c: char| c.eq_ignore_ascii_case(&'u') || c == 'r' || c == 'l' || c == '=');
    let target = target.trim().trim_matches(['"', '\'']);
    if target.is_empty() { None } else { Some(target.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_loopback_and_private() {
        assert!(is_disallowed("127.0.0.1".parse().unwrap()));
        assert!(is_disallowed("10.0.0.5".parse().unwrap()));
        assert!(is_disallowed("192.168.1.1".parse().unwrap()));
        assert!(is_disallowed("169.254.0.1".parse().unwrap()));
        assert!(is_disallowed("fe80::1".parse().unwrap()));
        assert!(!is_disallowed("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn extracts_meta_refresh_target() {
        let html = r#"<html><head><meta http-equiv="refresh" content="0; url=https://example.com/real.pdf"></head></html>"#;
        assert_eq!(
            extract_meta_refresh_target(html),
            Some("https://example.com/real.pdf".to_string())
        );
    }

    #[test]
    fn no_meta_refresh_returns_none() {
        let html = "<html><body>hello</body></html>";
        assert_eq!(extract_meta_refresh_target(html), None);
    }
}
