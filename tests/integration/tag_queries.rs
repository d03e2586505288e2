//! Integration: tag-level queries over a live hub.
//!
//! Exercises the aggregator against a hub whose membership and
//! reachability change between queries.

use rill_integration_tests::{key_at, key_with, MemoryHub};
use rill_types::{ChannelContentKey, Direction, DirectionQuery, TimeQuery, TimeUnit};

fn entry(channel: &str, minutes: u64) -> ChannelContentKey {
    ChannelContentKey::new(channel, key_at(minutes))
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_tag_reads_interleave_channels_by_time() {
    let hub = MemoryHub::new();
    hub.add_channel("flights-us", ["flights".to_string()]);
    hub.add_channel("flights-eu", ["flights".to_string()]);
    for minute in [0, 2, 8] {
        hub.ingest("flights-us", key_at(minute));
    }
    for minute in [1, 5] {
        hub.ingest("flights-eu", key_at(minute));
    }
    let agg = hub.aggregator();

    let bucket = agg
        .query_by_time("flights", &TimeQuery::new(0, TimeUnit::Hour))
        .await
        .unwrap();
    let ordered: Vec<_> = bucket.into_iter().collect();
    assert_eq!(
        ordered,
        vec![
            entry("flights-us", 0),
            entry("flights-eu", 1),
            entry("flights-us", 2),
            entry("flights-eu", 5),
            entry("flights-us", 8),
        ]
    );

    // Walking backwards from the end of the hour returns the globally
    // newest keys first, regardless of channel.
    let previous = agg
        .get_keys(
            "flights",
            &DirectionQuery::new(key_at(60), Direction::Previous, 3),
        )
        .await
        .unwrap();
    assert_eq!(
        previous,
        vec![
            entry("flights-us", 8),
            entry("flights-eu", 5),
            entry("flights-us", 2),
        ]
    );
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_membership_changes_show_up_in_next_query() {
    let hub = MemoryHub::new();
    hub.add_channel("flights-us", ["flights".to_string()]);
    hub.ingest("flights-us", key_at(1));
    let agg = hub.aggregator();

    let query = DirectionQuery::new(key_at(60), Direction::Previous, 10);
    assert_eq!(agg.get_keys("flights", &query).await.unwrap().len(), 1);

    // A channel tagged after the aggregator was built joins the very next
    // query; membership is re-enumerated every time.
    hub.add_channel("flights-asia", ["flights".to_string()]);
    hub.ingest("flights-asia", key_at(2));
    assert_eq!(agg.get_keys("flights", &query).await.unwrap().len(), 2);
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_latest_and_earliest_span_the_tag() {
    let hub = MemoryHub::new();
    hub.add_channel("a", ["t".to_string()]);
    hub.add_channel("b", ["t".to_string()]);
    hub.ingest("a", key_at(3));
    hub.ingest("a", key_at(40));
    hub.ingest("b", key_at(7));
    hub.ingest("b", key_at(55));
    let agg = hub.aggregator();

    let query = DirectionQuery::new(key_at(60), Direction::Previous, 2);
    assert_eq!(
        agg.get_latest("t", &query).await.unwrap(),
        Some(entry("b", 55))
    );

    let earliest = agg.get_earliest("t", &query).await.unwrap();
    let ordered: Vec<_> = earliest.into_iter().collect();
    assert_eq!(ordered, vec![entry("a", 3), entry("b", 7)]);
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_unreachable_member_degrades_gracefully() {
    let hub = MemoryHub::new();
    hub.add_channel("steady", ["t".to_string()]);
    hub.add_channel("flaky", ["t".to_string()]);
    hub.ingest("steady", key_at(1));
    hub.ingest("flaky", key_at(2));
    let agg = hub.aggregator();

    hub.set_down("flaky", true);
    let bucket = agg
        .query_by_time("t", &TimeQuery::new(0, TimeUnit::Hour))
        .await
        .unwrap();
    assert_eq!(bucket.into_iter().collect::<Vec<_>>(), vec![entry("steady", 1)]);

    // Recovery restores the full merge.
    hub.set_down("flaky", false);
    let bucket = agg
        .query_by_time("t", &TimeQuery::new(0, TimeUnit::Hour))
        .await
        .unwrap();
    assert_eq!(bucket.len(), 2);
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_value_lookup_probes_members() {
    let hub = MemoryHub::new();
    hub.add_channel("a", ["t".to_string()]);
    hub.add_channel("b", ["t".to_string()]);
    hub.ingest("b", key_with(4, "9f"));
    let agg = hub.aggregator();

    let content = agg
        .get_value("t", &key_with(4, "9f"))
        .await
        .unwrap()
        .expect("value should be found on channel b");
    assert!(content.data.starts_with(b"b:"));

    assert!(agg
        .get_value("t", &key_with(4, "00"))
        .await
        .unwrap()
        .is_none());
}
