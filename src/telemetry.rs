use configuration::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, FmtSubscriber};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `logging.filter`. With `logging.directory` set, events
/// also go to a daily rolling file; the returned guard flushes that file and
/// must live until the process exits.
pub fn init(logging: &Logging) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.filter)?,
    };

    let Some(directory) = &logging.directory else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(None);
    };

    let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    Ok(Some(guard))
}
