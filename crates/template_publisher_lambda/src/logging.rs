use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Builds the JSON log dispatch the runtime installs around each invocation.
pub fn build_dispatch(log_level: &str) -> Result<Dispatch, String> {
    build_dispatch_with_writer(log_level, std::io::stderr)
}

pub fn build_dispatch_with_writer<W>(log_level: &str, writer: W) -> Result<Dispatch, String>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(log_level)
        .map_err(|error| format!("invalid log level '{log_level}': {error}"))?;

    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();

    Ok(Dispatch::new(subscriber))
}
