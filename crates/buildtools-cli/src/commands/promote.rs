use std::path::PathBuf;

use buildtools_core::BuildContext;
use buildtools_git::GitClient;
use clap::Parser;

use super::promote_pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "promote",
    about = "Promote deployment descriptors to a GitOps repository",
    version
)]
pub(crate) struct PromoteArgs {
    /// The target in the .buildtools.yaml
    pub target: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print parsed config and exit
    #[arg(long)]
    pub config: bool,

    /// Override the namespace for the default deployment target
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Override the tag to promote instead of the CI or VCS commit
    #[arg(long)]
    pub tag: Option<String>,

    /// Override the URL of the Git repository receiving the files
    #[arg(long)]
    pub url: Option<String>,

    /// Override the path in the Git repository receiving the files
    #[arg(long)]
    pub path: Option<String>,

    /// Username for Git access (default: git)
    #[arg(long)]
    pub user: Option<String>,

    /// Private key for Git access (default: ~/.ssh/id_rsa)
    #[arg(long)]
    pub key: Option<String>,

    /// Password for the private key
    #[arg(long)]
    pub password: Option<String>,

    /// Write the rendered files to this directory instead of committing and pushing
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Run a promotion against the real git CLI, printing usage text to stdout.
pub async fn promote(ctx: &BuildContext, argv: &[String]) -> i32 {
    let client = GitClient::new();
    let mut stdout = std::io::stdout();
    let result = promote_pipeline::run(ctx, &client, argv, &mut stdout).await;
    tracing::debug!(
        exit_code = result.exit_code,
        lines = result.log.len(),
        "promotion finished"
    );
    result.exit_code
}

/// Whether `-v`/`--verbose` appears before a `--` separator.
///
/// Logging is configured before argument parsing, so this looks at raw argv.
pub fn wants_verbose(argv: &[String]) -> bool {
    argv.iter()
        .skip(1)
        .take_while(|a| a.as_str() != "--")
        .any(|a| a == "-v" || a == "--verbose")
}
