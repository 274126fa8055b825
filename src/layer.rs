use crate::enrich::Enricher;
use crate::record::{ContextValue, LogRecord, Severity};
use crate::request::{ProcessSnapshot, RequestSnapshot};
use crate::serializer::{JsonSerializer, RecordSerializer};
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Source of the ambient HTTP request snapshot, queried once per event.
/// Returns `None` when no request is in flight.
pub type RequestSource = Arc<dyn Fn() -> Option<RequestSnapshot> + Send + Sync>;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s,
/// enriches them into the Cloud Logging shape and writes one JSON line per
/// event to the configured writer.
///
/// Formatting happens synchronously on the emitting thread; there is no
/// buffering, batching or retry in this layer.
pub struct CloudFormatLayer {
    enricher: Enricher,
    serializer: Box<dyn RecordSerializer>,
    process: Option<ProcessSnapshot>,
    request_source: Option<RequestSource>,
    writer: Mutex<Box<dyn Write + Send>>,
    /// Events successfully formatted and written.
    pub formatted_events: Arc<AtomicU64>,
    /// Events dropped because serialization or the write failed.
    pub failed_events: Arc<AtomicU64>,
}

impl CloudFormatLayer {
    /// Create a layer writing to the provided writer with the default
    /// JSON serializer and no ambient snapshots.
    pub fn new(enricher: Enricher, writer: Box<dyn Write + Send>) -> Self {
        CloudFormatLayer {
            enricher,
            serializer: Box::new(JsonSerializer),
            process: None,
            request_source: None,
            writer: Mutex::new(writer),
            formatted_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach a command-line process snapshot; every record formatted by
    /// this layer will carry `scriptCommand` / `scriptFileName`.
    pub fn with_process_snapshot(mut self, process: ProcessSnapshot) -> Self {
        self.process = Some(process);
        self
    }

    /// Attach a per-event source for the ambient HTTP request snapshot.
    pub fn with_request_source(mut self, source: RequestSource) -> Self {
        self.request_source = Some(source);
        self
    }

    /// Replace the default JSON serializer.
    pub fn with_serializer(mut self, serializer: Box<dyn RecordSerializer>) -> Self {
        self.serializer = serializer;
        self
    }
}

impl<S> Layer<S> for CloudFormatLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let mut context = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { context: &mut context, message: &mut message };
        event.record(&mut visitor);

        let meta = event.metadata();
        let severity = Severity::from_tracing(meta.level());
        let record = LogRecord {
            timestamp: Utc::now(),
            severity,
            level_name: severity.as_str().to_string(),
            message: message.unwrap_or_default(),
            channel: Some(meta.target().to_string()),
            context,
            extra: BTreeMap::new(),
        };

        let request = self.request_source.as_ref().and_then(|source| source());
        let enriched = self.enricher.enrich(&record, request.as_ref(), self.process.as_ref());

        match self.serializer.serialize(&enriched, &self.enricher.config().flags) {
            Ok(line) => {
                let mut writer = match self.writer.lock() {
                    Ok(writer) => writer,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if writer.write_all(line.as_bytes()).is_ok() {
                    self.formatted_events.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.failed_events.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("failed to format log record: {}", e);
            }
        }
    }
}

struct FieldVisitor<'a> {
    context: &'a mut BTreeMap<String, ContextValue>,
    message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.context.insert(
                field.name().to_string(),
                ContextValue::Data(serde_json::Value::String(value.to_string())),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.context
            .insert(field.name().to_string(), ContextValue::Data(serde_json::Value::from(value)));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.context
            .insert(field.name().to_string(), ContextValue::Data(serde_json::Value::from(value)));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.context
            .insert(field.name().to_string(), ContextValue::Data(serde_json::Value::from(value)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.context.insert(
                field.name().to_string(),
                ContextValue::Data(serde_json::Value::String(format!("{:?}", value))),
            );
        }
    }
}
