use std::sync::OnceLock;
use uuid::Uuid;

static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Process-wide request identifier.
///
/// Generated once, on first call, and reused by every enricher constructed
/// afterwards in the same process. The value is a hex timestamp prefix
/// (seconds plus microseconds of the first call) and a random v4 UUID
/// suffix, so a restarted process always produces a new identifier.
pub fn process_request_id() -> &'static str {
    REQUEST_ID.get_or_init(generate)
}

fn generate() -> String {
    let now = chrono::Utc::now();
    let seconds = now.timestamp().max(0) as u64;
    let micros = now.timestamp_subsec_micros();
    format!("{:08x}{:05x}-{}", seconds, micros, Uuid::new_v4())
}
