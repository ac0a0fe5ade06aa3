use crate::config::LoaderConfig;
use crate::types::LoadRequest;
use bytes::Bytes;
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Rewrite a load that failed at the network level so it goes through the
/// configured proxy.
///
/// Returns `None` unless the URL is cross-origin, a proxy is configured, the
/// proxy is not the URL that just failed, and the request has not been
/// retried already. The returned request is marked as retried, so the
/// fallback fires at most once per logical load.
pub fn maybe_retry(request: &LoadRequest, config: &LoaderConfig) -> Option<LoadRequest> {
    let proxy = config.proxy.as_deref()?;

    if request.cross_origin_retried
        || request.url.is_empty()
        || request.url == proxy
        || !is_cross_origin(&request.url, config.origin.as_deref())
    {
        return None;
    }

    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", &request.url)
        .finish();

    Some(LoadRequest {
        url: proxy.to_string(),
        method: reqwest::Method::POST,
        body: Some(Bytes::from(body)),
        content_type: request
            .content_type
            .clone()
            .or_else(|| Some(FORM_CONTENT_TYPE.to_string())),
        cross_origin_retried: true,
        ..request.clone()
    })
}

/// Whether `url` lies outside `origin`. With no origin, everything does.
pub fn is_cross_origin(url: &str, origin: Option<&str>) -> bool {
    let Some(origin) = origin else {
        return true;
    };

    match (Url::parse(url), Url::parse(origin)) {
        (Ok(url), Ok(origin)) => url.origin() != origin.origin(),
        _ => !url.starts_with(origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoadOptions;

    fn config(proxy: Option<&str>, origin: Option<&str>) -> LoaderConfig {
        LoaderConfig {
            proxy: proxy.map(String::from),
            origin: origin.map(String::from),
            ..LoaderConfig::default()
        }
    }

    fn request(url: &str) -> LoadRequest {
        LoadRequest::new(url, &LoadOptions::default().with_range(0, Some(1024)))
    }

    #[test]
    fn test_retry_through_proxy() {
        let config = config(Some("https://igv.org/proxy"), Some("https://igv.org"));
        let original = request("https://data.example.com/a b.bam");

        let retry = maybe_retry(&original, &config).unwrap();
        assert_eq!(retry.url, "https://igv.org/proxy");
        assert_eq!(retry.method, reqwest::Method::POST);
        assert_eq!(
            retry.body.as_deref(),
            Some(&b"url=https%3A%2F%2Fdata.example.com%2Fa+b.bam"[..])
        );
        assert_eq!(retry.content_type.as_deref(), Some(FORM_CONTENT_TYPE));
        assert!(retry.cross_origin_retried);
        // everything else carries over
        assert_eq!(retry.range, original.range);
    }

    #[test]
    fn test_at_most_one_hop() {
        let config = config(Some("https://igv.org/proxy"), None);
        let retry = maybe_retry(&request("https://data.example.com/a.bam"), &config).unwrap();

        let mut again = retry.clone();
        again.url = "https://other.example.com/b.bam".to_string();
        assert!(maybe_retry(&again, &config).is_none());
    }

    #[test]
    fn test_no_proxy_no_retry() {
        let config = config(None, None);
        assert!(maybe_retry(&request("https://data.example.com/a.bam"), &config).is_none());
    }

    #[test]
    fn test_same_origin_no_retry() {
        let config = config(Some("https://igv.org/proxy"), Some("https://igv.org"));
        assert!(maybe_retry(&request("https://igv.org/data/a.bam"), &config).is_none());
    }

    #[test]
    fn test_failed_proxy_not_retried() {
        let config = config(Some("https://igv.org/proxy"), Some("https://app.example.com"));
        assert!(maybe_retry(&request("https://igv.org/proxy"), &config).is_none());
    }

    #[test]
    fn test_is_cross_origin() {
        assert!(is_cross_origin("https://a.com/x", None));
        assert!(is_cross_origin("https://a.com/x", Some("https://b.com")));
        assert!(is_cross_origin("http://a.com/x", Some("https://a.com")));
        assert!(is_cross_origin("https://a.com:8443/x", Some("https://a.com")));
        assert!(!is_cross_origin("https://a.com/x", Some("https://a.com")));
        assert!(!is_cross_origin("https://a.com:443/x", Some("https://a.com/")));
    }
}
