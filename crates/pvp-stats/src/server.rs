//! Canonical server merge.
//!
//! Some shards were merged after launch but still log under their old ids.
//! Aggregates group by the representative id of each cluster.

/// Shard clusters and their representative id.
const SERVER_CLUSTERS: &[(&[i64], i64)] = &[(&[8001, 8002, 8004], 8001), (&[8024, 8027], 8024)];

/// Representative id for `server`; ids outside any cluster map to themselves.
pub fn canonical_server(server: i64) -> i64 {
    SERVER_CLUSTERS
        .iter()
        .find(|(members, _)| members.contains(&server))
        .map_or(server, |(_, representative)| *representative)
}
