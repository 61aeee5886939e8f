//! IAM Self Permission CLI
//!
//! Answers questions about the AWS identity the configured credentials belong to.
//!
//! # Usage
//!
//! ```bash
//! # Who am I?
//! iam-self-permission --profile dev whoami
//!
//! # Everything the current identity may do, as an action -> resources map
//! iam-self-permission effective-permissions --mode discriminate
//!
//! # Simulate a single call; the exit code is 0 (allowed), 1 (denied) or 2 (failed)
//! iam-self-permission check-access --identity arn:aws:iam::123456789012:role/Deploy \
//!     --action s3:GetObject --resource 'arn:aws:s3:::bucket/*'
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use iam_self_permission_engine::{
    AccessOutcome, CredentialSpec, KeyspaceMode, SelfPermissionService,
};
use log::{debug, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for any failure that is not an access outcome
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "iam-self-permission")]
#[command(version)]
#[command(about = "Inspect the identity, policies and effective permissions of the current AWS credentials")]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Report simulation failures as errors instead of exit code 2
    #[arg(long, global = true)]
    debug: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Credential settings. Flags override values loaded from `--settings`.
#[derive(Args, Debug)]
struct CredentialArgs {
    /// JSON settings file with the credential fields
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// AWS region to run against
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Named credentials profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    #[arg(long, global = true, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Use the role assigned to this machine (instance profile, task role, ...)
    #[arg(long, global = true)]
    machine_role: bool,

    /// Send requests to this endpoint instead of the regional default
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,
}

impl CredentialArgs {
    fn to_spec(&self) -> Result<CredentialSpec> {
        let mut spec = match &self.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings file {}", path.display()))?;
                CredentialSpec::from_json_str(&json)
                    .with_context(|| format!("Failed to load settings from {}", path.display()))?
            }
            None => CredentialSpec::default(),
        };

        if let Some(region) = &self.region {
            spec.region = region.clone();
        }
        if self.profile.is_some() {
            spec.profile_name = self.profile.clone();
        }
        if self.access_key_id.is_some() {
            spec.access_key_id = self.access_key_id.clone();
        }
        if self.secret_access_key.is_some() {
            spec.secret_access_key = self.secret_access_key.clone();
        }
        if self.session_token.is_some() {
            spec.session_token = self.session_token.clone();
        }
        if self.endpoint_url.is_some() {
            spec.endpoint_override = self.endpoint_url.clone();
        }
        spec.machine_role_assigned |= self.machine_role;
        Ok(spec)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KeyspaceArg {
    /// Action and NotAction tokens share one map
    Conflate,
    /// NotAction tokens are reported separately
    Discriminate,
}

impl From<KeyspaceArg> for KeyspaceMode {
    fn from(arg: KeyspaceArg) -> Self {
        match arg {
            KeyspaceArg::Conflate => Self::Conflate,
            KeyspaceArg::Discriminate => Self::Discriminate,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the user name of the current identity
    Whoami,

    /// Print the AWS account id
    AccountId,

    /// Print the full caller identity
    Identity,

    /// Print the ARN resource type of the current identity
    IdentityType,

    /// List the managed policies attached to the current identity
    Policies,

    /// List the IAM groups of the current user
    Groups,

    /// Report whether the current user has an MFA device
    Mfa,

    /// Print the trust policy of the current role
    TrustPolicy,

    /// Print IAM usage statistics for the account
    AccountSummary,

    /// Aggregate every inline and attached policy into an action -> resources map
    EffectivePermissions {
        #[arg(long, value_enum, default_value_t = KeyspaceArg::Conflate)]
        mode: KeyspaceArg,

        /// Inspect this user or role instead of the current identity
        #[arg(long)]
        arn: Option<String>,
    },

    /// Simulate whether one user or role may perform an action
    CheckAccess {
        /// User, role or assumed-role ARN
        #[arg(long)]
        identity: String,

        #[arg(long)]
        action: String,

        /// Resource ARN (defaults to *)
        #[arg(long)]
        resource: Option<String>,
    },

    /// Find every user and role that may perform an action
    SearchAccess {
        #[arg(long)]
        action: String,

        /// Resource ARN (defaults to *)
        #[arg(long)]
        resource: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_access(outcome: &AccessOutcome) -> Result<ExitCode> {
    println!("{}", outcome.to_markdown()?);
    // Outcome codes are 0, 1 or 2
    Ok(ExitCode::from(u8::try_from(outcome.code.code()).unwrap_or(EXIT_FAILURE)))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let spec = cli.credentials.to_spec()?;
    debug!("Credential settings: {spec:?}");

    let service = SelfPermissionService::new(&spec)
        .await
        .context("Failed to initialize service")?
        .with_debug(cli.debug);

    match cli.command {
        Commands::Whoami => println!("{}", service.identity_name().await?),
        Commands::AccountId => println!("{}", service.account_id().await?),
        Commands::Identity => println!("{}", service.caller_details().await?),
        Commands::IdentityType => println!("{}", service.identity_type().await?),
        Commands::Policies => println!("{}", service.attached_policies().await?),
        Commands::Groups => println!("{}", service.groups().await?),
        Commands::Mfa => println!("{}", service.mfa_status().await?),
        Commands::TrustPolicy => println!("{}", service.trust_policy().await?),
        Commands::AccountSummary => println!("{}", service.account_summary().await?),
        Commands::EffectivePermissions { mode, arn: None } => {
            println!("{}", service.effective_permissions(mode.into()).await?);
        }
        Commands::EffectivePermissions {
            mode,
            arn: Some(arn),
        } => {
            let summary = service
                .effective_permissions_for(&arn, mode.into())
                .await
                .with_context(|| format!("Failed to aggregate permissions of {arn}"))?;
            println!("{summary}");
        }
        Commands::CheckAccess {
            identity,
            action,
            resource,
        } => {
            let outcome = service
                .check_access(&identity, &action, resource.as_deref())
                .await?;
            return print_access(&outcome);
        }
        Commands::SearchAccess { action, resource } => {
            let outcome = service.search_access(&action, resource.as_deref()).await?;
            return print_access(&outcome);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
