use crate::transport::WireRequest;
use crate::types::LoadRequest;
use crate::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RANGE};
use url::Url;

/// Query parameter added to defeat caching of partial responses
pub const CACHE_BUST_PARAM: &str = "someRandomSeed";

/// Turn a logical load into the request that goes on the wire.
///
/// Range requests against a host matching one of `cache_bust_hosts` get a
/// random query parameter, since those hosts' caches serve stale partial
/// responses otherwise.
pub fn build(request: &LoadRequest, cache_bust_hosts: &[String]) -> Result<WireRequest> {
    let mut url = Url::parse(&request.url)?;

    if request.range.is_some() && needs_cache_bust(&url, cache_bust_hosts) {
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &random_seed());
    }

    let mut headers = HeaderMap::new();
    if let Some(range) = request.range {
        headers.insert(RANGE, header_value(&range.header_value())?);
    }
    if let Some(content_type) = &request.content_type {
        headers.insert(CONTENT_TYPE, header_value(content_type)?);
    }
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("invalid header name {}: {}", name, e)))?;
        headers.insert(name, header_value(value)?);
    }

    Ok(WireRequest {
        method: request.method.clone(),
        url,
        headers,
        body: request.body.clone(),
        with_credentials: request.with_credentials,
    })
}

fn needs_cache_bust(url: &Url, hosts: &[String]) -> bool {
    url.host_str()
        .is_some_and(|host| hosts.iter().any(|pattern| host.contains(pattern.as_str())))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidRequest(format!("invalid header value {}: {}", value, e)))
}

fn random_seed() -> String {
    let mut n: u64 = rand::random();
    let mut digits = Vec::new();
    loop {
        digits.push(std::char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}
