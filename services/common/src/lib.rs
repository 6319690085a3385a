use std::{
    env, fs, io,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    thread,
    time::{Duration, SystemTime},
};
use tokio::net::TcpListener;
use tracing::Subscriber;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    EnvFilter, Layer, Registry,
};

/// Keeps the non-blocking file writer alive; dropping it flushes pending lines.
pub struct TracingGuards {
    _file_guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

pub struct LogConfig {
    pub service_name: String,
    pub format: LogFormat,
    pub log_root: PathBuf,
    pub retention_days: u64,
    pub cleanup_interval_minutes: u64,
}

impl LogConfig {
    pub fn from_env(service_name: &str) -> Self {
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "/var/log/cms-relay".to_string());
        Self {
            service_name: service_name.to_string(),
            format: env_or("LOG_FORMAT", LogFormat::Text),
            log_root: PathBuf::from(log_dir).join(service_name),
            retention_days: env_or("LOG_RETENTION_DAYS", 14u64),
            cleanup_interval_minutes: env_or("LOG_CLEANUP_INTERVAL_MINUTES", 360u64),
        }
    }
}

pub fn init_tracing(service_name: &str) -> TracingGuards {
    init_tracing_with(LogConfig::from_env(service_name))
}

pub fn init_tracing_with(config: LogConfig) -> TracingGuards {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = format_layer(config.format, std::io::stdout, true);

    // File output is best effort: read-only or missing log roots fall back to stdout only.
    let mut file_guard: Option<WorkerGuard> = None;
    let mut file_layer = None;
    match open_appender(&config) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_layer = Some(format_layer(config.format, writer, false));
            file_guard = Some(guard);
        }
        Err(err) => {
            eprintln!(
                "file logging disabled for {}: {err}",
                config.log_root.display()
            );
        }
    }

    let subscriber = Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    if file_guard.is_some() {
        spawn_log_cleanup(
            config.log_root,
            config.retention_days,
            config.cleanup_interval_minutes,
        );
    }

    TracingGuards {
        _file_guard: file_guard,
    }
}

fn open_appender(config: &LogConfig) -> Result<RollingFileAppender, String> {
    fs::create_dir_all(&config.log_root).map_err(|err| err.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.service_name.as_str())
        .filename_suffix("log")
        .build(&config.log_root)
        .map_err(|err| err.to_string())
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Text => fmt::layer().with_ansi(ansi).with_writer(writer).boxed(),
    }
}

/// Parse typed environment values, falling back to `default` when unset or malformed.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn spawn_log_cleanup(log_root: PathBuf, retention_days: u64, cleanup_interval_minutes: u64) {
    if retention_days == 0 || cleanup_interval_minutes == 0 {
        return;
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let interval = Duration::from_secs(cleanup_interval_minutes * 60);

    thread::spawn(move || loop {
        if let Some(cutoff) = SystemTime::now().checked_sub(retention) {
            let removed = cleanup_old_logs(&log_root, cutoff);
            if removed > 0 {
                tracing::debug!(removed, root = %log_root.display(), "expired log files removed");
            }
        }
        thread::sleep(interval);
    });
}

/// Removes files under `root` last modified before `cutoff`; returns how many went.
fn cleanup_old_logs(root: &Path, cutoff: SystemTime) -> usize {
    let Ok(entries) = fs::read_dir(root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            removed += cleanup_old_logs(&path, cutoff);
            continue;
        }
        let modified = fs::metadata(&path).and_then(|metadata| metadata.modified());
        match modified {
            Ok(modified) if modified < cutoff => {
                if fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            }
            _ => {}
        }
    }
    removed
}

pub async fn bind_listener(port: u16) -> io::Result<TcpListener> {
    // All interfaces, so the relay is reachable from inside a container.
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr).await
}

/// Resolves on ctrl-c or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset_or_malformed() {
        assert_eq!(env_or("RELAY_COMMON_TEST_UNSET_KEY", 5000u16), 5000);

        env::set_var("RELAY_COMMON_TEST_BAD_PORT", "not-a-port");
        assert_eq!(env_or("RELAY_COMMON_TEST_BAD_PORT", 5000u16), 5000);

        env::set_var("RELAY_COMMON_TEST_GOOD_PORT", "8081");
        assert_eq!(env_or("RELAY_COMMON_TEST_GOOD_PORT", 5000u16), 8081);
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn cleanup_removes_files_older_than_cutoff_recursively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("relay-service");
        fs::create_dir_all(&nested).expect("nested dir");
        fs::write(dir.path().join("a.log"), b"old").expect("write a");
        fs::write(nested.join("b.log"), b"old").expect("write b");

        // Everything on disk predates a cutoff in the future.
        let cutoff = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(cleanup_old_logs(dir.path(), cutoff), 2);
        assert!(!dir.path().join("a.log").exists());
        assert!(!nested.join("b.log").exists());
        assert!(nested.exists());
    }

    #[test]
    fn cleanup_keeps_recent_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("fresh.log"), b"new").expect("write");

        let cutoff = SystemTime::now() - Duration::from_secs(3600);
        assert_eq!(cleanup_old_logs(dir.path(), cutoff), 0);
        assert!(dir.path().join("fresh.log").exists());
    }

    #[test]
    fn cleanup_of_missing_root_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");
        assert_eq!(cleanup_old_logs(&missing, SystemTime::now()), 0);
    }

    #[tokio::test]
    async fn bind_listener_binds_an_ephemeral_port() {
        let listener = bind_listener(0).await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        assert_ne!(addr.port(), 0);
    }
}
