// Elasticsearch test helpers
//
// Two modes: a live test cluster that must already be running
// (`ElasticsearchTestCluster`), and a stubbed search endpoint serving a
// synthetic hits payload (`StubbedElasticsearch`).

use serde_json::{json, Value};

mod cluster;
mod stub;

pub use cluster::{ClusterOptions, ElasticsearchTestCluster, IndexDocument};
pub use stub::{
    with_stubbed_elasticsearch, with_stubbed_elasticsearch_config, StubOptions,
    StubbedElasticsearch,
};

/// `{"hits": {"hits": [{"_source": doc}, ...], "total": N}}`; `total`
/// defaults to the number of hits
pub fn search_payload(hits: &[Value], total: Option<u64>) -> Value {
    let total = total.unwrap_or(hits.len() as u64);
    let hits: Vec<Value> = hits.iter().map(|doc| json!({ "_source": doc })).collect();

    json!({
        "hits": {
            "hits": hits,
            "total": total,
        }
    })
}
