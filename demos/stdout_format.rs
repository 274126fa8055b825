use gcloud_log_format::enrich::Config;
use gcloud_log_format::init::init;
use gcloud_log_format::record::Severity;
use tracing::{error, info};

fn main() {
    let config = Config {
        error_reporting_level: Severity::Error,
        service: "demo-service".to_string(),
        version: "0.1.0".to_string(),
        ..Default::default()
    };
    init(config);

    info!(user = "alice", "user signed in");
    error!(order_id = 1042u64, "payment capture failed");
}
