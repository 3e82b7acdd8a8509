/// Hard caps applied by the parameter resolver.
///
/// Every request parameter is clamped into these bounds once,
/// downstream pipeline stages trust the resolved values as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_total_bytes: u64,
    pub max_ttfb_ms: u64,
    pub max_jitter_ms: u64,
    /// Lowest non-zero pacing rate, in bytes per second.
    pub min_bytes_per_second: u64,
    pub max_chunk_size: u64,
    pub max_header_fill_kb: u64,
    pub max_cookie_count: u64,
    pub max_cookie_value_bytes: u64,
    pub min_cookie_ttl_secs: u64,
    pub max_cpu_ms: u64,
    pub max_memory_mb: u64,
}

pub const MIB: u64 = 1024 * 1024;

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_total_bytes: 50 * MIB,
            max_ttfb_ms: 10_000,
            max_jitter_ms: 2_000,
            min_bytes_per_second: 1024,
            max_chunk_size: 65_536,
            max_header_fill_kb: 256,
            max_cookie_count: 20,
            max_cookie_value_bytes: 2048,
            min_cookie_ttl_secs: 1,
            max_cpu_ms: 10_000,
            max_memory_mb: 256,
        }
    }
}
