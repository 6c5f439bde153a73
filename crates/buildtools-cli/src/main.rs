mod commands;

use std::io::IsTerminal;

use anyhow::Context;
use buildtools_core::BuildContext;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = std::env::args().collect();

    let default_level = if commands::wants_verbose(&argv) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let working_dir = std::env::current_dir().context("failed to determine working directory")?;
    let mut ctx = BuildContext::new(working_dir);
    if let Some(home) = dirs::home_dir() {
        ctx = ctx.with_home(home);
    }
    ctx.env = std::env::vars().collect();

    let exit_code = commands::promote(&ctx, &argv).await;
    std::process::exit(exit_code)
}
