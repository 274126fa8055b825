use crate::enrich::{Config, Enricher};
use crate::layer::CloudFormatLayer;
use crate::request::ProcessSnapshot;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for installing the formatting layer as the global subscriber.
///
/// **Fields**
/// - `formatter`: [`Config`] for the enricher (threshold, service, version,
///   serialization flags).
/// - `capture_process_info`: capture the current argv so every record
///   carries `scriptCommand` / `scriptFileName`.
/// - `enable_fmt_stdout`: additionally install a human-readable
///   `tracing_subscriber::fmt` layer next to the JSON one.
#[derive(Clone, Debug)]
pub struct InitConfig {
    pub formatter: Config,
    pub capture_process_info: bool,
    pub enable_fmt_stdout: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            formatter: Config::default(),
            capture_process_info: true,
            enable_fmt_stdout: false,
        }
    }
}

/// Install the Cloud Logging formatter as the global `tracing` subscriber,
/// writing one JSON line per event to stdout.
///
/// The layer is always attached; when `enable_fmt_stdout` is set a `fmt`
/// layer is added on top so events stay readable during development. The
/// subscriber is assembled in two variants for type compatibility.
pub fn init_with_config(config: InitConfig) {
    let mut layer = CloudFormatLayer::new(
        Enricher::new(config.formatter),
        Box::new(std::io::stdout()),
    );
    if config.capture_process_info {
        layer = layer.with_process_snapshot(ProcessSnapshot::capture());
    }

    if config.enable_fmt_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }
}

/// Install the formatter with default options.
///
/// Equivalent to [`init_with_config`] with [`InitConfig::default`] carrying
/// the provided formatter [`Config`]. This is the recommended entrypoint
/// for typical services.
pub fn init(formatter: Config) {
    init_with_config(InitConfig { formatter, ..Default::default() });
}
