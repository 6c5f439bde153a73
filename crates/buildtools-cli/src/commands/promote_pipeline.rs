use std::io::Write;
use std::path::Path;

use buildtools_core::{BuildContext, BuildIdentity, BuildToolsConfig, CiMetadata};
use buildtools_files::{DescriptorSet, find_files_for_target};
use buildtools_git::{
    AuthorIdentity, CredentialOverrides, GitClient, GitCredentials, GitExecutor, PromoteRequest,
    destination_path,
};
use clap::Parser;

use super::promote::PromoteArgs;
use super::promotion_error::PromotionError;

/// Directory, relative to the working directory, holding deployment descriptors.
const DESCRIPTOR_DIR: &str = "k8s";

/// Terminal value of one promotion.
#[derive(Debug)]
pub(crate) struct PromotionResult {
    pub exit_code: i32,
    /// `"<level>: <message>"` lines in emission order
    pub log: Vec<String>,
}

/// User-facing log lines, mirrored to `tracing`.
pub(crate) struct PromotionLog {
    verbose: bool,
    lines: Vec<String>,
}

impl PromotionLog {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            lines: Vec::new(),
        }
    }

    fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.lines.push(format!("info: {message}"));
    }

    fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.lines.push(format!("error: {message}"));
    }

    fn debug(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        if self.verbose {
            self.lines.push(format!("debug: {message}"));
        }
    }
}

/// Run the promotion pipeline: parse → config → target → identity →
/// descriptors → promote (or write locally).
///
/// Help, version and `--config` output go to `out`; everything else is logged.
pub(crate) async fn run<E: GitExecutor>(
    ctx: &BuildContext,
    client: &GitClient<E>,
    argv: &[String],
    out: &mut impl Write,
) -> PromotionResult {
    let args = match PromoteArgs::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => return parse_failure(&e, out),
    };

    let mut log = PromotionLog::new(args.verbose);
    let exit_code = match execute(ctx, client, &args, out, &mut log).await {
        Ok(()) => 0,
        Err(err) => {
            let code = err.kind().exit_code();
            log.error(err.message());
            code
        }
    };
    PromotionResult {
        exit_code,
        log: log.lines,
    }
}

fn parse_failure(err: &clap::Error, out: &mut impl Write) -> PromotionResult {
    use clap::error::ErrorKind as ClapKind;

    if matches!(err.kind(), ClapKind::DisplayHelp | ClapKind::DisplayVersion) {
        let mut log = PromotionLog::new(false);
        let exit_code = match write!(out, "{err}") {
            Ok(()) => 0,
            Err(e) => {
                let err = PromotionError::Output { source: e };
                let code = err.kind().exit_code();
                log.error(err.message());
                code
            }
        };
        return PromotionResult {
            exit_code,
            log: log.lines,
        };
    }

    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    let message = first.strip_prefix("error: ").unwrap_or(first).to_owned();

    let err = PromotionError::Argument(message);
    let mut log = PromotionLog::new(false);
    let exit_code = err.kind().exit_code();
    log.error(err.message());
    PromotionResult {
        exit_code,
        log: log.lines,
    }
}

async fn execute<E: GitExecutor>(
    ctx: &BuildContext,
    client: &GitClient<E>,
    args: &PromoteArgs,
    out: &mut impl Write,
    log: &mut PromotionLog,
) -> Result<(), PromotionError> {
    if let Some(namespace) = args.namespace.as_deref() {
        log.debug(format!("namespace override '{namespace}' has no effect on promotion"));
    }

    let target = match (args.target.as_deref(), args.config) {
        (Some(target), _) => Some(target),
        (None, true) => None,
        (None, false) => {
            return Err(PromotionError::Argument(
                "expected argument <TARGET>".to_owned(),
            ));
        }
    };

    // Load configuration
    let config = BuildToolsConfig::load(ctx.working_dir())?;
    if args.config {
        let yaml = config.to_yaml()?;
        out.write_all(yaml.as_bytes())
            .map_err(|e| PromotionError::Output { source: e })?;
        return Ok(());
    }
    let Some(target) = target else {
        return Ok(());
    };

    // Resolve target
    let endpoint = config
        .gitops_target(target)
        .ok_or_else(|| PromotionError::TargetNotFound {
            target: target.to_owned(),
        })?;
    let url = override_or(args.url.as_deref(), &endpoint.url);
    let path = override_or(args.path.as_deref(), &endpoint.path);

    // Verify build identity
    let vcs = client.identify(ctx.working_dir()).await;
    let metadata = CiMetadata::detect(ctx, config.ci.selected, &vcs);
    log.debug(format!("using {} build metadata", metadata.kind.name()));
    let identity =
        BuildIdentity::from_metadata(&metadata).ok_or(PromotionError::UnidentifiedBuild)?;

    let artifact_ref = match (args.tag.as_deref(), endpoint.tag.as_deref()) {
        (Some(tag), _) if !tag.is_empty() => {
            log.info(format!("Using passed tag {tag} to promote"));
            tag
        }
        (_, Some(tag)) if !tag.is_empty() => {
            log.info(format!("Using configured tag {tag} to promote"));
            tag
        }
        _ => identity.commit.as_str(),
    };

    // Resolve descriptors
    let descriptor_dir = ctx.working_dir().join(DESCRIPTOR_DIR);
    let files = if descriptor_dir.is_dir() {
        find_files_for_target(&descriptor_dir, target)?
    } else {
        Vec::new()
    };
    if files.is_empty() {
        return Err(PromotionError::DescriptorNotFound);
    }
    let descriptors = DescriptorSet::load(&files)?.render(artifact_ref);
    log.debug(format!("descriptors: {}", descriptors.names().join(", ")));

    log.info("generating...");
    let destination = destination_path(path, &identity.build_name)?;

    if let Some(out_dir) = args.out.as_deref() {
        return write_local(&descriptors, out_dir, &destination, log);
    }

    let overrides = CredentialOverrides {
        user: args.user.clone(),
        key: args.key.clone(),
        password: args.password.clone(),
    };
    let request = PromoteRequest {
        url: url.to_owned(),
        credentials: GitCredentials::resolve(&overrides, &config.git, ctx),
        descriptors,
        destination,
        author: AuthorIdentity::from_config(&config.git),
        message: format!(
            "ci: promoting {} commit {} to {target}",
            identity.build_name, identity.commit
        ),
    };

    let outcome = client
        .promote(&request, |line| log.info(line.to_owned()))
        .await?;
    if !outcome.attempted {
        log.info(format!(
            "nothing to promote, {} is up to date",
            request.destination
        ));
    }
    Ok(())
}

fn write_local(
    descriptors: &DescriptorSet,
    out_dir: &Path,
    destination: &str,
    log: &mut PromotionLog,
) -> Result<(), PromotionError> {
    let dir = out_dir.join(destination);
    let written = descriptors.write_to(&dir)?;
    log.info(format!(
        "wrote {} descriptor(s) to {}",
        written.len(),
        dir.display()
    ));
    Ok(())
}

fn override_or<'a>(flag: Option<&'a str>, configured: &'a str) -> &'a str {
    flag.filter(|v| !v.is_empty()).unwrap_or(configured)
}
