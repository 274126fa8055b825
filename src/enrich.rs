use crate::record::{ContextValue, ExceptionInfo, LogRecord, Severity};
use crate::request::{ProcessSnapshot, RequestSnapshot};
use crate::request_id::process_request_id;
use crate::serializer::SerializeFlags;
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

/// Discriminator marking a record as a reportable error event for the
/// Error Reporting ingestion pipeline.
pub const ERROR_EVENT_TYPE: &str =
    "type.googleapis.com/google.devtools.clouderrorreporting.v1beta1.ReportedErrorEvent";

/// Flat output mapping handed to the generic serializer.
pub type EnrichedRecord = Map<String, Value>;

/// Per-enricher configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Severity at or above which error-reporting enrichment activates.
    pub error_reporting_level: Severity,
    /// Service name for `serviceContext`; empty disables the field together
    /// with an empty `version`.
    pub service: String,
    /// Service version for `serviceContext`.
    pub version: String,
    /// Generic serialization flags, passed through to the serializer.
    pub flags: SerializeFlags,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            error_reporting_level: Severity::Error,
            service: String::new(),
            version: String::new(),
            flags: SerializeFlags::default(),
        }
    }
}

/// Rewrites [`LogRecord`]s into the Cloud Logging JSON shape.
///
/// Construction captures the process-wide request identifier, so every
/// enricher in a process stamps the same `requestId` onto its output.
pub struct Enricher {
    config: Config,
    request_id: String,
}

impl Enricher {
    pub fn new(config: Config) -> Self {
        Enricher {
            request_id: process_request_id().to_string(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transform one record into the enriched output mapping.
    ///
    /// Runs the fixed step sequence: severity/time remap, context
    /// flattening, request metadata, process metadata, error-report
    /// construction, pruning. Never fails; absent ambient data only omits
    /// the corresponding optional fields.
    pub fn enrich(
        &self,
        record: &LogRecord,
        request: Option<&RequestSnapshot>,
        process: Option<&ProcessSnapshot>,
    ) -> EnrichedRecord {
        let mut out = EnrichedRecord::new();

        out.insert("message".to_string(), Value::String(record.message.clone()));
        if let Some(channel) = &record.channel {
            out.insert("channel".to_string(), Value::String(channel.clone()));
        }
        for (key, value) in &record.extra {
            out.insert(key.clone(), value.clone());
        }

        // Step 1: severity + time remap.
        out.insert("severity".to_string(), Value::String(record.level_name.clone()));
        out.insert(
            "time".to_string(),
            Value::String(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        // Step 2: flatten context onto the top level, context wins.
        for (key, value) in &record.context {
            let rendered = match value {
                ContextValue::Data(data) => data.clone(),
                ContextValue::Exception(exception) => {
                    exception.to_value(self.config.flags.include_stacktraces)
                }
            };
            out.insert(key.clone(), rendered);
        }

        // Step 3: request metadata. requestId is stamped unconditionally.
        let http_request = request.and_then(build_http_request);
        if let Some(http) = &http_request {
            out.insert("httpRequest".to_string(), http.clone());
        }
        out.insert("requestId".to_string(), Value::String(self.request_id.clone()));

        // Step 4: process metadata.
        if let Some(process) = process {
            if let Some(command) = process.command_line() {
                out.insert("scriptCommand".to_string(), Value::String(command));
            }
            if let Some(path) = &process.script_path {
                out.insert("scriptFileName".to_string(), Value::String(path.clone()));
            }
        }

        // Step 5: error-report block.
        if record.severity >= self.config.error_reporting_level {
            self.add_error_report(record, http_request, &mut out);
        }

        // Step 6: prune source-schema keys, wherever they came from.
        for key in ["level", "level_name", "datetime", "channel"] {
            out.remove(key);
        }

        out
    }

    fn add_error_report(
        &self,
        record: &LogRecord,
        http_request: Option<Value>,
        out: &mut EnrichedRecord,
    ) {
        let exception = match record.context.get("exception") {
            Some(ContextValue::Exception(exception)) => exception.clone(),
            _ => ExceptionInfo::from_message(record.message.clone()),
        };

        let mut error_context = Map::new();
        if let Some(http) = http_request {
            error_context.insert("httpRequest".to_string(), http);
        }
        error_context.insert(
            "reportLocation".to_string(),
            json!({
                "filePath": exception.file,
                "functionName": exception.calling_function(),
                "lineNumber": exception.line,
            }),
        );
        out.insert("context".to_string(), Value::Object(error_context));

        if !self.config.service.is_empty() || !self.config.version.is_empty() {
            out.insert(
                "serviceContext".to_string(),
                json!({
                    "service": self.config.service,
                    "version": self.config.version,
                }),
            );
        }

        out.insert("@type".to_string(), Value::String(ERROR_EVENT_TYPE.to_string()));
    }
}

/// Build the `httpRequest` block from an ambient request snapshot.
///
/// Requires method and URI; everything else is optional. `requestUrl` is
/// only assembled when both scheme and host are known, otherwise the field
/// is omitted rather than emitting a partial URL.
fn build_http_request(request: &RequestSnapshot) -> Option<Value> {
    let method = request.method.as_deref()?;
    let uri = request.uri.as_deref()?;

    let mut http = Map::new();
    http.insert("requestMethod".to_string(), Value::String(method.to_string()));

    if let (Some(scheme), Some(host)) = (request.scheme.as_deref(), request.host.as_deref()) {
        http.insert(
            "requestUrl".to_string(),
            Value::String(format!("{}://{}{}", scheme, host, uri)),
        );
    }
    if let Some(referer) = &request.referer {
        http.insert("referer".to_string(), Value::String(referer.clone()));
    }
    if let Some(ip) = request.resolve_client_ip() {
        http.insert("remoteIp".to_string(), Value::String(ip));
    }
    if let Some(agent) = &request.user_agent {
        http.insert("userAgent".to_string(), Value::String(agent.clone()));
    }
    if let Some(protocol) = &request.protocol {
        http.insert("protocol".to_string(), Value::String(protocol.clone()));
    }

    Some(Value::Object(http))
}
