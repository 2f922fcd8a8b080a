use chrono::{DateTime, Utc};

/// Source of "now". Read once per request, never cached.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
