// Router module - classifies every intercepted call
//
// Non-GET while offline      -> QueueOffline (durable queue + 202 ack)
// Non-GET while online       -> PassThrough  (straight to network)
// GET on the API surface     -> NetworkFirst
// Any other GET              -> CacheFirst   (static assets, documents)

use regex::Regex;
use std::sync::Arc;

use crate::http::{Connectivity, Request};

/// Strategy chosen for an intercepted call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PassThrough,
    QueueOffline,
    NetworkFirst,
    CacheFirst,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::PassThrough => "pass_through",
            Route::QueueOffline => "queue_offline",
            Route::NetworkFirst => "network_first",
            Route::CacheFirst => "cache_first",
        }
    }
}

/// Ordered set of path rules designating the cacheable API surface
#[derive(Debug, Clone)]
pub struct ApiMatcher {
    rules: Vec<Regex>,
}

impl ApiMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First rule matching the path, if any
    pub fn find(&self, path: &str) -> Option<&Regex> {
        self.rules.iter().find(|rule| rule.is_match(path))
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub struct Router {
    matcher: Arc<ApiMatcher>,
    connectivity: Arc<dyn Connectivity>,
}

impl Router {
    pub fn new(matcher: Arc<ApiMatcher>, connectivity: Arc<dyn Connectivity>) -> Self {
        Router {
            matcher,
            connectivity,
        }
    }

    pub fn matcher(&self) -> &Arc<ApiMatcher> {
        &self.matcher
    }

    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_get() {
            return if self.connectivity.is_online() {
                Route::PassThrough
            } else {
                Route::QueueOffline
            };
        }

        if self.matcher.is_match(&request.path()) {
            Route::NetworkFirst
        } else {
            Route::CacheFirst
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_API_PATTERNS;
    use crate::http::ConnectivityFlag;
    use http::Method;
    use rstest::rstest;

    fn router(online: bool) -> Router {
        let matcher = Arc::new(ApiMatcher::new(DEFAULT_API_PATTERNS).unwrap());
        Router::new(matcher, Arc::new(ConnectivityFlag::new(online)))
    }

    #[rstest]
    #[case("/api/v1/patients/", Route::NetworkFirst)]
    #[case("/api/v1/patients/?page=3", Route::NetworkFirst)]
    #[case("https://ehr.example.org/api/v1/observations/", Route::NetworkFirst)]
    #[case("/api/v1/patients/42/", Route::CacheFirst)]
    #[case("/api/v2/patients/", Route::CacheFirst)]
    #[case("/static/js/main.js", Route::CacheFirst)]
    #[case("/", Route::CacheFirst)]
    fn test_get_classification(#[case] url: &str, #[case] expected: Route) {
        assert_eq!(router(true).classify(&Request::get(url)), expected);
        // Connectivity does not affect reads
        assert_eq!(router(false).classify(&Request::get(url)), expected);
    }

    #[rstest]
    #[case(Method::POST)]
    #[case(Method::PUT)]
    #[case(Method::PATCH)]
    #[case(Method::DELETE)]
    fn test_writes_pass_through_when_online(#[case] method: Method) {
        let request = Request::new(method, "/api/v1/observations/");
        assert_eq!(router(true).classify(&request), Route::PassThrough);
    }

    #[rstest]
    #[case(Method::POST)]
    #[case(Method::PUT)]
    #[case(Method::DELETE)]
    fn test_writes_queue_when_offline(#[case] method: Method) {
        let request = Request::new(method, "/api/v1/observations/");
        assert_eq!(router(false).classify(&request), Route::QueueOffline);
    }

    #[test]
    fn test_classification_follows_connectivity_changes() {
        let flag = Arc::new(ConnectivityFlag::new(true));
        let matcher = Arc::new(ApiMatcher::new(DEFAULT_API_PATTERNS).unwrap());
        let router = Router::new(matcher, flag.clone());
        let request = Request::new(Method::POST, "/api/v1/conditions/");

        assert_eq!(router.classify(&request), Route::PassThrough);
        flag.set_online(false);
        assert_eq!(router.classify(&request), Route::QueueOffline);
    }

    #[test]
    fn test_matcher_is_injectable() {
        let matcher = Arc::new(ApiMatcher::new(&[r"^/fhir/"]).unwrap());
        let router = Router::new(matcher, Arc::new(ConnectivityFlag::default()));
        assert_eq!(
            router.classify(&Request::get("/fhir/Patient")),
            Route::NetworkFirst
        );
        assert_eq!(
            router.classify(&Request::get("/api/v1/patients/")),
            Route::CacheFirst
        );
    }

    #[test]
    fn test_matcher_rejects_invalid_pattern() {
        assert!(ApiMatcher::new(&["(unclosed"]).is_err());
    }

    #[test]
    fn test_matcher_reports_first_matching_rule() {
        let matcher = ApiMatcher::new(&[r"^/api/", r"^/api/v1/"]).unwrap();
        assert_eq!(matcher.find("/api/v1/x").unwrap().as_str(), r"^/api/");
        assert_eq!(matcher.len(), 2);
        assert!(!matcher.is_empty());
    }
}
