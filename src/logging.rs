//! Structured logging, initialized once at process start.

use tracing_subscriber::EnvFilter;

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("task_runtime=info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();
}
