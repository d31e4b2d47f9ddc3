//! Database and cache metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Cache outcome recorded by the cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Hit,
    Miss,
    Invalidation,
    Error,
}

impl CacheEvent {
    fn metric_name(&self) -> &'static str {
        match self {
            CacheEvent::Hit => "settings_cache_hits_total",
            CacheEvent::Miss => "settings_cache_misses_total",
            CacheEvent::Invalidation => "settings_cache_invalidations_total",
            CacheEvent::Error => "settings_cache_errors_total",
        }
    }
}

/// Record a cache event, labelled by the kind of cached subject.
pub fn record_cache_event(event: CacheEvent, subject: &'static str) {
    counter!(event.metric_name(), "subject" => subject).increment(1);
}

/// Times a database operation and records it under `query_name`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_config_override");
/// let result = sqlx::query_as::<_, ConfigOverrideEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(self.query_name, duration);
    }
}
