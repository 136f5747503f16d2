//! Logging Infrastructure
//!
//! Features:
//! - Console output, pretty in development and JSON in production
//! - Daily rotating application logs under `<log_dir>/app` (pruned by age)
//! - Daily order journal under `<log_dir>/orders` for the `orders` target (never pruned)

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Target used by the order ledger for its journal entries
pub const ORDERS_TARGET: &str = "orders";

/// Application logs older than this are deleted by the periodic cleanup
const APP_LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console-only logger at `info` (or `RUST_LOG`)
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_with_file("info", false, None)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug"); `RUST_LOG` overrides it
/// * `json_format` - JSON lines instead of human readable output
/// * `log_dir` - Optional directory for file logging (e.g., Some("./work_dir/logs"))
///
/// # Examples
/// ```no_run
/// // Development setup (console only)
/// hawker_edge::init_logger_with_file("debug", false, None)?;
///
/// // Production setup (console + files)
/// hawker_edge::init_logger_with_file("info", true, Some("./work_dir/logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(level_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(level_filter(level))
            .boxed()
    };
    layers.push(console);

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        let app_log_dir = log_dir.join("app");
        let orders_log_dir = log_dir.join("orders");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&orders_log_dir)?;

        // Everything except the order journal
        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        layers.push(
            file_layer(app_log, json_format)
                .with_filter(level_filter(level))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != ORDERS_TARGET
                }))
                .boxed(),
        );

        // Order journal only
        let orders_log = RollingFileAppender::new(Rotation::DAILY, orders_log_dir, "orders");
        layers.push(
            file_layer(orders_log, json_format)
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == ORDERS_TARGET
                }))
                .boxed(),
        );

        // Cleanup needs a runtime; plain sync callers skip it
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(periodic_cleanup(log_dir.to_path_buf()));
        }
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn file_layer(writer: RollingFileAppender, json_format: bool) -> BoxedLayer {
    let writer = std::sync::Mutex::new(writer);
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    }
}

/// Delete `app.YYYY-MM-DD` files older than `keep_days`; returns how many went
///
/// The order journal directory is never touched.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: i64) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(keep_days);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // tracing-appender names daily files `<prefix>.YYYY-MM-DD`
        if let Some(date_part) = name.strip_prefix("app.")
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(removed)
}

/// Periodic cleanup task - runs every hour
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;
        if let Err(e) = cleanup_old_logs(&log_dir, APP_LOG_RETENTION_DAYS) {
            tracing::warn!(error = %e, "Log cleanup failed");
        }
    }
}
