//! Well-known names.

/// External dependencies probed by default.
pub mod dependencies {
    pub const GRAPH_INDEXER: &str = "graph-indexer";
    pub const BLOCK_EXPLORER: &str = "block-explorer";
    pub const GOVERNANCE_API: &str = "governance-api";
    pub const AI_COMPUTE: &str = "ai-compute";
    pub const ON_CHAIN_CONTRACTS: &str = "on-chain-contracts";

    pub const ALL: [&str; 5] = [
        GRAPH_INDEXER,
        BLOCK_EXPLORER,
        GOVERNANCE_API,
        AI_COMPUTE,
        ON_CHAIN_CONTRACTS,
    ];
}

/// Step names of the reputation pipeline, in execution order.
pub mod steps {
    pub const VALIDATE_ADDRESS: &str = "validate_address";
    pub const FETCH_SOURCE_A: &str = "fetch_source_a";
    pub const FETCH_SOURCE_B: &str = "fetch_source_b";
    pub const FETCH_SOURCE_C: &str = "fetch_source_c";
    pub const AGGREGATE: &str = "aggregate";
    pub const COMPUTE_SCORE: &str = "compute_score";
    pub const EXPLAIN: &str = "explain";
    pub const FORMAT_RESPONSE: &str = "format_response";
}
