//! Canonical request fingerprints used as cache keys.

use url::Url;
use url::form_urlencoded;

/// Which kind of upstream a cached response came from.
///
/// The namespace prefixes every fingerprint, so an HTML page and an API
/// response can share one cache file without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Raw HTML fetched with a plain GET.
    Page,
    /// Decoded JSON from an authenticated API call.
    Api,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Page, Namespace::Api];

    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Page => "page",
            Namespace::Api => "api",
        }
    }

    /// Namespace a fingerprint belongs to, if it carries a known prefix.
    pub fn of(fingerprint: &str) -> Option<Namespace> {
        let (prefix, _) = fingerprint.split_once(':')?;
        Namespace::ALL.into_iter().find(|ns| ns.prefix() == prefix)
    }
}

/// Compute the fingerprint for an endpoint and parameter set.
///
/// The endpoint is normalized (lowercase host, no fragment). Any query
/// string already on the endpoint is folded into the parameter set, and
/// parameters are sorted by key then value before being form-encoded, so
/// the result does not depend on parameter order.
pub fn fingerprint<I, K, V>(namespace: Namespace, endpoint: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();

    let base = match Url::parse(endpoint.trim()) {
        Ok(mut url) => {
            pairs.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => endpoint.trim().to_string(),
    };

    pairs.sort();

    if pairs.is_empty() {
        return format!("{}:{}", namespace.prefix(), base);
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();

    format!("{}:{}?{}", namespace.prefix(), base, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = "https://api.yelp.com/v3/businesses/search";

    #[test]
    fn test_fingerprint_order_independent() {
        let ab = fingerprint(Namespace::Api, SEARCH, [("a", "1"), ("b", "2")]);
        let ba = fingerprint(Namespace::Api, SEARCH, [("b", "2"), ("a", "1")]);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_fingerprint_format() {
        let key = fingerprint(Namespace::Api, SEARCH, [("location", "New York"), ("term", "food"), ("limit", "50")]);
        assert_eq!(key, "api:https://api.yelp.com/v3/businesses/search?limit=50&location=New+York&term=food");
    }

    #[test]
    fn test_fingerprint_without_params() {
        let key = fingerprint(Namespace::Page, "https://EN.wikipedia.org/wiki/List#top", Vec::<(&str, &str)>::new());
        assert_eq!(key, "page:https://en.wikipedia.org/wiki/List");
    }

    #[test]
    fn test_fingerprint_folds_endpoint_query() {
        let inline = fingerprint(Namespace::Api, "https://example.com/s?b=2&a=1", Vec::<(&str, &str)>::new());
        let split = fingerprint(Namespace::Api, "https://example.com/s", [("a", "1"), ("b", "2")]);
        assert_eq!(inline, split);
    }

    #[test]
    fn test_fingerprint_namespaces_do_not_collide() {
        let page = fingerprint(Namespace::Page, SEARCH, Vec::<(&str, &str)>::new());
        let api = fingerprint(Namespace::Api, SEARCH, Vec::<(&str, &str)>::new());
        assert_ne!(page, api);
        assert_eq!(Namespace::of(&page), Some(Namespace::Page));
        assert_eq!(Namespace::of(&api), Some(Namespace::Api));
    }

    #[test]
    fn test_fingerprint_values_are_encoded() {
        let amp = fingerprint(Namespace::Api, SEARCH, [("location", "a&b=c")]);
        let split = fingerprint(Namespace::Api, SEARCH, [("location", "a"), ("b", "c")]);
        assert_ne!(amp, split);
    }

    #[test]
    fn test_namespace_of_unknown_prefix() {
        assert_eq!(Namespace::of("https://example.com"), None);
        assert_eq!(Namespace::of("legacy-key"), None);
    }
}
