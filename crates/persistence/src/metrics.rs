//! Document store metrics.
//!
//! Query timings are labelled by operation, collection and outcome, so the
//! guest-facing `invitation_codes` reads show up apart from `responses` writes.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

pub const QUERY_DURATION_SECONDS: &str = "database_query_duration_seconds";
pub const QUERY_ERRORS_TOTAL: &str = "database_query_errors_total";

/// Collection label for statements that touch no collection.
pub const NO_COLLECTION: &str = "none";

pub fn record_query_duration(
    operation: &'static str,
    collection: &str,
    outcome: &'static str,
    duration_secs: f64,
) {
    histogram!(
        QUERY_DURATION_SECONDS,
        "operation" => operation,
        "collection" => collection.to_string(),
        "outcome" => outcome
    )
    .record(duration_secs);
}

/// Connection usage of the pool at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    pub size: u32,
    pub idle: u32,
}

impl PoolUsage {
    pub fn of(pool: &PgPool) -> Self {
        let size = pool.size();
        Self {
            size,
            idle: (pool.num_idle() as u32).min(size),
        }
    }

    pub fn active(&self) -> u32 {
        self.size - self.idle
    }
}

/// Publishes pool gauges; called from the health probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let usage = PoolUsage::of(pool);
    gauge!("database_connections_active").set(f64::from(usage.active()));
    gauge!("database_connections_idle").set(f64::from(usage.idle));
    gauge!("database_connections_total").set(f64::from(usage.size));
}

fn outcome<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::PoolTimedOut) => "pool_timeout",
        Err(_) => "error",
    }
}

/// Times one statement against a collection.
///
/// ```ignore
/// QueryTimer::new("list", collection)
///     .finish(sqlx::query_as(...).fetch_all(&pool).await)
/// ```
pub struct QueryTimer {
    operation: &'static str,
    collection: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(operation: &'static str, collection: &str) -> Self {
        Self {
            operation,
            collection: collection.to_string(),
            start: Instant::now(),
        }
    }

    /// Records the elapsed time with the result's outcome and hands the
    /// result back.
    pub fn finish<T>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        let outcome = outcome(&result);
        if result.is_err() {
            counter!(
                QUERY_ERRORS_TOTAL,
                "operation" => self.operation,
                "collection" => self.collection.clone()
            )
            .increment(1);
        }
        record_query_duration(
            self.operation,
            &self.collection,
            outcome,
            self.start.elapsed().as_secs_f64(),
        );
        result
    }
}
