use anyhow::Result;
use clap::Parser;
use eesetup::{SetupArgs, SetupEnv};

fn main() -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
    let args = SetupArgs::parse();
    tracing_log::LogTracer::init().ok();
    let default = if args.verbose { "info" } else { "error" };
    let env = std::env::var("EE_SETUP_LOG").unwrap_or_else(|_| default.into());
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_span_events(FmtSpan::ACTIVE | FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::new(env))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log_panics::init();
    let env = SetupEnv::new(args)?;
    eesetup::setup(&env)
}
