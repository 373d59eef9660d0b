//! File logging for the runtime.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::runtime::constants::envs;
use crate::runtime::layout::HomeLayout;

/// Install the global file logger for a runtime home.
///
/// Events go to a daily-rolled `boxhive.log` under the home's logs
/// directory, filtered by the `BOXHIVE_LOG` environment variable (`info`
/// when unset). The returned guard must stay alive for buffered events to
/// reach the file. Returns `None` when a global subscriber is already
/// installed; embedders that configured their own keep it.
pub(crate) fn init_for(layout: &HomeLayout) -> Option<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(layout.logs_dir(), "boxhive.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_env(envs::BOXHIVE_LOG).unwrap_or_else(|_| EnvFilter::new("info"));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false),
        )
        .try_init();

    match initialized {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}
