use crate::cli::TracingFormat;

/// Configure and install the global tracing subscriber.
///
/// `debug` raises this crate's own target to `debug` regardless of
/// `RUST_LOG`; everything else still defaults to `warn` so a noisy
/// dependency never drowns out the scheduler's own events.
pub fn setup_logging(tracing_format: TracingFormat, debug: bool) {
    let base_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("warn,preempt_lifecycle={base_level}"))
    });

    let subscriber = tracing_subscriber::fmt().with_target(true).with_env_filter(filter);

    match tracing_format {
        TracingFormat::Pretty => subscriber.pretty().init(),
        TracingFormat::Json => subscriber.json().init(),
    }
}
