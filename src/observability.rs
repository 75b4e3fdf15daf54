use tracing_subscriber::EnvFilter;

use crate::context::RunContext;

/// Install the stdout fmt subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_tracing(ctx: &RunContext) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(ctx.log_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}
