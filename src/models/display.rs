use std::collections::HashMap;

use crate::models::video::{ChannelStatistics, VideoItem};
use crate::utils::formatters::{format_count, format_subscribers, format_views};

/// Shown wherever the upstream API withholds a count (likes, comments,
/// subscribers). Distinct from a real zero, which formats as "0개" etc.
pub const NOT_DISCLOSED: &str = "비공개";

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// One display-ready listing row: a video joined with its channel statistics,
/// every count already run through the compact formatter.
#[derive(Debug, Clone)]
pub struct DisplayRecord {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub thumbnail_url: Option<String>,
    pub views: String,
    pub likes: String,
    pub comments: String,
    pub subscribers: String,
    pub permalink: String,
}

/// Merges listing items with the channel statistics map into display records.
/// Pure projection: no I/O, and the output order is exactly the input order.
pub fn build_display_records(
    items: &[VideoItem],
    channel_stats: &HashMap<String, ChannelStatistics>,
) -> Vec<DisplayRecord> {
    items
        .iter()
        .map(|item| build_record(item, channel_stats))
        .collect()
}

fn build_record(
    item: &VideoItem,
    channel_stats: &HashMap<String, ChannelStatistics>,
) -> DisplayRecord {
    let snippet = &item.snippet;
    let stats = &item.statistics;

    // Thumbnail preference: medium, then high, then default; none is fine
    let thumbnail_url = snippet
        .thumbnails
        .medium
        .as_ref()
        .or(snippet.thumbnails.high.as_ref())
        .or(snippet.thumbnails.default.as_ref())
        .map(|t| t.url.clone());

    let subscribers = channel_stats
        .get(&snippet.channel_id)
        .and_then(|ch| ch.subscriber_count.as_deref())
        .map(format_subscribers)
        .unwrap_or_else(|| NOT_DISCLOSED.to_string());

    DisplayRecord {
        id: item.id.clone(),
        title: snippet.title.clone(),
        channel_title: snippet.channel_title.clone(),
        channel_id: snippet.channel_id.clone(),
        thumbnail_url,
        views: format_views(stats.view_count.as_deref().unwrap_or("0")),
        likes: count_or_not_disclosed(stats.like_count.as_deref()),
        comments: count_or_not_disclosed(stats.comment_count.as_deref()),
        subscribers,
        permalink: format!("{}{}", WATCH_URL_BASE, item.id),
    }
}

fn count_or_not_disclosed(count: Option<&str>) -> String {
    count
        .map(format_count)
        .unwrap_or_else(|| NOT_DISCLOSED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::video::{Snippet, Thumbnail, Thumbnails, VideoStatistics};

    fn item(id: &str, channel_id: &str) -> VideoItem {
        VideoItem {
            id: id.to_string(),
            snippet: Snippet {
                title: format!("title-{}", id),
                channel_title: format!("channel-{}", channel_id),
                channel_id: channel_id.to_string(),
                thumbnails: Thumbnails::default(),
            },
            statistics: VideoStatistics {
                view_count: Some("1730000".to_string()),
                like_count: None,
                comment_count: Some("0".to_string()),
            },
        }
    }

    fn stats_map(entries: &[(&str, Option<&str>)]) -> HashMap<String, ChannelStatistics> {
        entries
            .iter()
            .map(|(id, subs)| {
                (
                    id.to_string(),
                    ChannelStatistics {
                        subscriber_count: subs.map(str::to_string),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn record_order_matches_item_order() {
        let items = vec![item("c", "UC3"), item("a", "UC1"), item("b", "UC2")];
        let records = build_display_records(&items, &HashMap::new());
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn counts_run_through_the_formatter() {
        let items = vec![item("v", "UC1")];
        let stats = stats_map(&[("UC1", Some("27700000"))]);
        let records = build_display_records(&items, &stats);
        assert_eq!(records[0].views, "173만회");
        assert_eq!(records[0].subscribers, "2770만명");
        // the channel identity carries through for the detail pane
        assert_eq!(records[0].channel_id, "UC1");
        assert_eq!(records[0].channel_title, "channel-UC1");
    }

    #[test]
    fn missing_channel_or_hidden_subscribers_show_the_sentinel() {
        let items = vec![item("v1", "UC-unknown"), item("v2", "UC-hidden")];
        // UC-hidden is present in the map but withholds its count
        let stats = stats_map(&[("UC-hidden", None)]);
        let records = build_display_records(&items, &stats);
        assert_eq!(records[0].subscribers, NOT_DISCLOSED);
        assert_eq!(records[1].subscribers, NOT_DISCLOSED);
    }

    #[test]
    fn absent_likes_are_not_disclosed_but_zero_comments_format() {
        let records = build_display_records(&[item("v", "UC1")], &HashMap::new());
        assert_eq!(records[0].likes, NOT_DISCLOSED);
        assert_eq!(records[0].comments, "0개");
    }

    #[test]
    fn thumbnail_prefers_medium_then_high_then_default() {
        let mut it = item("v", "UC1");
        it.snippet.thumbnails = Thumbnails {
            default: Some(Thumbnail { url: "d".to_string() }),
            medium: None,
            high: Some(Thumbnail { url: "h".to_string() }),
        };
        let records = build_display_records(&[it.clone()], &HashMap::new());
        assert_eq!(records[0].thumbnail_url.as_deref(), Some("h"));

        it.snippet.thumbnails.medium = Some(Thumbnail { url: "m".to_string() });
        let records = build_display_records(&[it.clone()], &HashMap::new());
        assert_eq!(records[0].thumbnail_url.as_deref(), Some("m"));

        it.snippet.thumbnails = Thumbnails::default();
        let records = build_display_records(&[it], &HashMap::new());
        assert_eq!(records[0].thumbnail_url, None);
    }

    #[test]
    fn permalink_appends_the_video_id() {
        let records = build_display_records(&[item("dQw4w9WgXcQ", "UC1")], &HashMap::new());
        assert_eq!(
            records[0].permalink,
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
