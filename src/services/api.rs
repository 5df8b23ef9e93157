use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;

use crate::models::display::{build_display_records, DisplayRecord};
use crate::models::video::{ChannelListResponse, ChannelStatistics, VideoItem, VideoListResponse};
use crate::services::cache::TtlCache;
use crate::services::logger::{log_error, log_info};

const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const CHANNELS_URL: &str = "https://www.googleapis.com/youtube/v3/channels";

/// Upstream ceiling for both maxResults and a batched channel-id query.
const MAX_BATCH: usize = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Failures of an upstream call, kept apart so the UI can word them.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request exceeded the fixed timeout bound
    Timeout,
    /// Non-2xx status; message is the upstream error body when parseable
    Http { status: u16, message: String },
    /// Connection-level failure (DNS, TLS, refused...)
    Transport(String),
    /// 2xx response whose body did not match the expected shape
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Http { status, message } => {
                write!(f, "API request failed: HTTP {} ({})", status, message)
            }
            ApiError::Transport(msg) => write!(f, "network error: {}", msg),
            ApiError::Parse(msg) => write!(f, "unexpected API response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error body the API attaches to non-2xx responses.
#[derive(Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

impl ApiError {
    fn from_status(status: u16, body: &str) -> ApiError {
        let message = serde_json::from_str::<UpstreamError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| "upstream error".to_string());
        ApiError::Http { status, message }
    }
}

/// HTTP seam of the pipeline. The real implementation wraps reqwest; tests
/// swap in a transport that serves canned bodies and counts calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> HttpTransport {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

/// Fetches the popular-video listing and channel statistics, caching both
/// responses for five minutes keyed by their call arguments.
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    listing_cache: TtlCache<Vec<VideoItem>>,
    stats_cache: TtlCache<HashMap<String, ChannelStatistics>>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Pipeline {
        Pipeline {
            transport,
            listing_cache: TtlCache::new(),
            stats_cache: TtlCache::new(),
        }
    }

    pub fn with_http() -> Pipeline {
        Pipeline::new(Arc::new(HttpTransport::new()))
    }

    /// Fetches the region's current popular videos, in upstream order.
    pub async fn fetch_popular(
        &self,
        api_key: &str,
        region_code: &str,
        max_results: u8,
    ) -> Result<Vec<VideoItem>, ApiError> {
        let max_results = (max_results as usize).min(MAX_BATCH);
        let cache_key = format!("{}|{}|{}", api_key, region_code, max_results);
        if let Some(items) = self.listing_cache.get(&cache_key) {
            return Ok(items);
        }

        let query = [
            ("part", "snippet,statistics".to_string()),
            ("chart", "mostPopular".to_string()),
            ("regionCode", region_code.to_string()),
            ("maxResults", max_results.to_string()),
            ("key", api_key.to_string()),
        ];
        let body = self.transport.get_text(VIDEOS_URL, &query).await?;
        let parsed: VideoListResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;

        let _ = log_info(
            "Listing",
            &format!("{}: {} videos", region_code, parsed.items.len()),
        );
        self.listing_cache
            .set(cache_key, parsed.items.clone(), CACHE_TTL);
        Ok(parsed.items)
    }

    /// Batched subscriber-count lookup for up to 50 channels. Empty input
    /// (after dropping empty ids) returns an empty map without a request.
    pub async fn fetch_channel_stats(
        &self,
        api_key: &str,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStatistics>, ApiError> {
        // Deduplicate preserving first-seen order, then cap at the batch limit
        let unique: Vec<&str> = channel_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .unique()
            .take(MAX_BATCH)
            .collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let mut sorted = unique.clone();
        sorted.sort_unstable();
        let cache_key = format!("{}|{}", api_key, sorted.iter().join(","));
        if let Some(stats) = self.stats_cache.get(&cache_key) {
            return Ok(stats);
        }

        let query = [
            ("part", "statistics".to_string()),
            ("id", unique.iter().join(",")),
            ("key", api_key.to_string()),
        ];
        let body = self.transport.get_text(CHANNELS_URL, &query).await?;
        let parsed: ChannelListResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;

        let stats: HashMap<String, ChannelStatistics> = parsed
            .items
            .into_iter()
            .map(|item| (item.id, item.statistics))
            .collect();
        self.stats_cache.set(cache_key, stats.clone(), CACHE_TTL);
        Ok(stats)
    }

    /// Full render-cycle fetch: listing, then channel statistics for the
    /// channels it mentions, merged into display records. A failed statistics
    /// call degrades to an empty map so the listing still renders.
    pub async fn get_display_records(
        &self,
        api_key: &str,
        region_code: &str,
        max_results: u8,
    ) -> Result<Vec<DisplayRecord>, ApiError> {
        let items = self.fetch_popular(api_key, region_code, max_results).await?;

        let channel_ids: Vec<String> = items
            .iter()
            .map(|item| item.snippet.channel_id.clone())
            .collect();
        let channel_stats = match self.fetch_channel_stats(api_key, &channel_ids).await {
            Ok(stats) => stats,
            Err(e) => {
                let _ = log_error("Channel Stats", &e.to_string());
                HashMap::new()
            }
        };

        Ok(build_display_records(&items, &channel_stats))
    }

    /// Synchronously empties both response caches; the next fetch is
    /// guaranteed to hit upstream. Wired to the refresh and logout actions.
    pub fn clear_cache(&self) {
        self.listing_cache.clear();
        self.stats_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves canned bodies per URL and records every request issued.
    struct MockTransport {
        videos_body: String,
        channels_body: String,
        error: Option<ApiError>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        fn new(videos_body: &str, channels_body: &str) -> MockTransport {
            MockTransport {
                videos_body: videos_body.to_string(),
                channels_body: channels_body.to_string(),
                error: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: ApiError) -> MockTransport {
            MockTransport {
                error: Some(error),
                ..MockTransport::new("{}", "{}")
            }
        }

        fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            if url == VIDEOS_URL {
                Ok(self.videos_body.clone())
            } else {
                Ok(self.channels_body.clone())
            }
        }
    }

    fn videos_body(ids: &[&str]) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id":"{id}","snippet":{{"title":"t-{id}","channelTitle":"c","channelId":"UC-{id}","thumbnails":{{}}}},"statistics":{{"viewCount":"100"}}}}"#
                )
            })
            .collect();
        format!(r#"{{"items":[{}]}}"#, items.join(","))
    }

    fn pipeline(transport: Arc<MockTransport>) -> Pipeline {
        Pipeline::new(transport)
    }

    #[tokio::test]
    async fn listing_preserves_upstream_order() {
        let transport = Arc::new(MockTransport::new(&videos_body(&["z", "a", "m"]), "{}"));
        let items = pipeline(Arc::clone(&transport))
            .fetch_popular("k", "KR", 30)
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn identical_listing_calls_within_ttl_hit_the_cache() {
        let transport = Arc::new(MockTransport::new(&videos_body(&["a"]), "{}"));
        let pipeline = pipeline(Arc::clone(&transport));
        pipeline.fetch_popular("k", "KR", 30).await.unwrap();
        pipeline.fetch_popular("k", "KR", 30).await.unwrap();
        assert_eq!(transport.calls().len(), 1);

        // different arguments miss
        pipeline.fetch_popular("k", "US", 30).await.unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn cache_clear_forces_a_fresh_upstream_call() {
        let transport = Arc::new(MockTransport::new(&videos_body(&["a"]), "{}"));
        let pipeline = pipeline(Arc::clone(&transport));
        pipeline.fetch_popular("k", "KR", 30).await.unwrap();
        pipeline.clear_cache();
        pipeline.fetch_popular("k", "KR", 30).await.unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_channel_ids_short_circuit_without_a_request() {
        let transport = Arc::new(MockTransport::new("{}", "{}"));
        let pipeline = pipeline(Arc::clone(&transport));
        let stats = pipeline
            .fetch_channel_stats("k", &["".to_string(), "".to_string()])
            .await
            .unwrap();
        assert!(stats.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn channel_ids_are_deduped_in_order_and_capped_at_fifty() {
        let transport = Arc::new(MockTransport::new("{}", r#"{"items":[]}"#));
        let pipeline = pipeline(Arc::clone(&transport));

        // 60 unique ids with one duplicate up front
        let mut ids = vec!["UC-0".to_string(), "UC-0".to_string()];
        ids.extend((1..60).map(|i| format!("UC-{}", i)));
        pipeline.fetch_channel_stats("k", &ids).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let id_param = calls[0]
            .1
            .iter()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.clone())
            .unwrap();
        let sent: Vec<&str> = id_param.split(',').collect();
        assert_eq!(sent.len(), 50);
        assert_eq!(sent[0], "UC-0");
        assert_eq!(sent[49], "UC-49");
    }

    #[tokio::test]
    async fn stats_failure_degrades_to_not_disclosed_but_listing_renders() {
        use crate::models::display::NOT_DISCLOSED;

        // videos succeed, channels request errors
        struct HalfBroken(MockTransport);
        #[async_trait]
        impl Transport for HalfBroken {
            async fn get_text(
                &self,
                url: &str,
                query: &[(&str, String)],
            ) -> Result<String, ApiError> {
                if url == CHANNELS_URL {
                    return Err(ApiError::Http {
                        status: 403,
                        message: "quota exceeded".to_string(),
                    });
                }
                self.0.get_text(url, query).await
            }
        }

        let transport = Arc::new(HalfBroken(MockTransport::new(&videos_body(&["a", "b"]), "{}")));
        let records = Pipeline::new(transport)
            .get_display_records("k", "KR", 30)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.subscribers == NOT_DISCLOSED));
    }

    #[tokio::test]
    async fn display_records_join_subscriber_counts() {
        let channels = r#"{"items":[{"id":"UC-a","statistics":{"subscriberCount":"1730000"}}]}"#;
        let transport = Arc::new(MockTransport::new(&videos_body(&["a", "b"]), channels));
        let records = pipeline(transport)
            .get_display_records("k", "KR", 30)
            .await
            .unwrap();
        assert_eq!(records[0].subscribers, "173만명");
        assert_eq!(records[1].subscribers, crate::models::display::NOT_DISCLOSED);
        assert_eq!(records[0].views, "100회");
    }

    #[tokio::test]
    async fn transport_errors_surface_from_the_listing_fetch() {
        let transport = Arc::new(MockTransport::failing(ApiError::Timeout));
        let err = pipeline(Arc::clone(&transport))
            .fetch_popular("k", "KR", 30)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }

    #[tokio::test]
    async fn malformed_listing_body_is_a_parse_error() {
        let transport = Arc::new(MockTransport::new("not json", "{}"));
        let err = pipeline(transport)
            .fetch_popular("k", "KR", 30)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn upstream_error_bodies_yield_their_message() {
        let body = r#"{"error":{"code":403,"message":"API key not valid"}}"#;
        assert_eq!(
            ApiError::from_status(403, body),
            ApiError::Http {
                status: 403,
                message: "API key not valid".to_string()
            }
        );
        // unparseable body falls back to a generic message
        assert_eq!(
            ApiError::from_status(500, "<html>"),
            ApiError::Http {
                status: 500,
                message: "upstream error".to_string()
            }
        );
    }
}
