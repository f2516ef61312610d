use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::info;

use license_core::{
    config::{LicenseToolConfig, LoggingConfig},
    error::{ErrorCode, LicenseError},
    hardware, issuer, keys,
    signing::{Ed25519Signer, Signer as _},
    util, validator, LicensePayload,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cclicense",
    version = util::VERSION,
    about = "CipherCore license token generator and validator (offline)"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, env = "CCLICENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Read the private key passphrase from this environment variable.
    #[arg(long, global = true, default_value = "CCLICENSE_KEY_PASSPHRASE")]
    passphrase_env: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(clap::Args, Debug)]
struct TokenArgs {
    /// Validity in days from today (UTC); 0 = valid through today.
    #[arg(long, allow_negative_numbers = true)]
    days: Option<i64>,
    /// Product edition written into the token.
    #[arg(long)]
    license_version: Option<String>,
    /// Bind the token to this hardware id.
    #[arg(long, conflicts_with = "bind_this_machine")]
    hardware_id: Option<String>,
    /// Bind the token to the fingerprint of the current machine.
    #[arg(long)]
    bind_this_machine: bool,
    /// Also write the token to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a key pair, write both PEM files and print a sample token.
    Generate {
        #[arg(long)]
        private_key: Option<PathBuf>,
        #[arg(long)]
        public_key: Option<PathBuf>,
        /// Encrypt the private key file with the passphrase from `--passphrase-env`.
        #[arg(long)]
        encrypt: bool,
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Issue a token with an existing private key.
    Issue {
        #[arg(long)]
        private_key: Option<PathBuf>,
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Print PEM encodings of a key pair with a passphrase-protected private key.
    ///
    /// Uses `--private-key` when given, otherwise a freshly generated pair.
    Export {
        #[arg(long)]
        private_key: Option<PathBuf>,
    },

    /// Validate a license token against a public key.
    Validate {
        /// Token string.
        #[arg(long, conflicts_with = "token_file", required_unless_present = "token_file")]
        token: Option<String>,
        /// File containing the token.
        #[arg(long)]
        token_file: Option<PathBuf>,
        #[arg(long)]
        public_key: Option<PathBuf>,
        /// Expected product edition.
        #[arg(long)]
        license_version: Option<String>,
        /// Require the token to be bound to this hardware id.
        #[arg(long, conflicts_with = "bind_this_machine")]
        hardware_id: Option<String>,
        /// Require the token to be bound to the current machine.
        #[arg(long)]
        bind_this_machine: bool,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the machine fingerprint used for hardware binding.
    MachineFingerprint,

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        let code = e
            .downcast_ref::<LicenseError>()
            .map(|le| ErrorCode::from(le) as i32)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = LicenseToolConfig::load(cli.config.as_deref()).context("load config")?;
    cfg.apply_env();

    init_logging(&cfg.logging)?;

    let passphrase = std::env::var(&cli.passphrase_env)
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::new(s.into()));

    match cli.cmd {
        Commands::Generate {
            private_key,
            public_key,
            encrypt,
            token,
        } => {
            let private_path = private_key.unwrap_or(cfg.keys.private_key.clone());
            let public_path = public_key.unwrap_or(cfg.keys.public_key.clone());
            util::validate_path(&private_path, "private key")?;
            util::validate_path(&public_path, "public key")?;

            let file_passphrase = if encrypt {
                Some(passphrase.as_ref().with_context(|| {
                    format!("--encrypt needs a passphrase in ${}", cli.passphrase_env)
                })?)
            } else {
                None
            };

            let pair = keys::generate_keypair();
            keys::save_private_key(&private_path, pair.private_key(), file_passphrase)
                .context("write private key")?;
            keys::save_public_key(&public_path, &pair.public_key())
                .context("write public key")?;

            println!("Key pair generated:");
            println!("- private key: {}", private_path.display());
            println!("- public key:  {}", public_path.display());

            let signer = Ed25519Signer::new(pair.private_key().clone(), "ed25519/generated");
            let token = issue_token(&signer, &cfg, &token)?;
            println!("\nLicense token:");
            println!("{token}");
        }

        Commands::Issue { private_key, token } => {
            let private_path = private_key.unwrap_or(cfg.keys.private_key.clone());
            let private_path = util::canonicalize_if_exists(&private_path, "private key")?;
            let signer = Ed25519Signer::from_key_pem(&private_path, passphrase.as_ref())
                .context("load signer")?;
            let token = issue_token(&signer, &cfg, &token)?;
            println!("{token}");
        }

        Commands::Export { private_key } => {
            let pass = passphrase.as_ref().with_context(|| {
                format!("export needs a passphrase in ${}", cli.passphrase_env)
            })?;
            let signing_key = match private_key {
                Some(path) => keys::load_private_key(&path, Some(pass)).context("load private key")?,
                None => keys::generate_keypair().private_key().clone(),
            };

            let private_pem = keys::export_private(&signing_key, Some(pass))
                .context("export private key")?;
            let public_pem = keys::export_public(&signing_key.verifying_key())
                .context("export public key")?;

            println!("Private key (PKCS#8 PEM, encrypted):");
            println!("{}", private_pem.expose_secret());
            println!("Public key (SubjectPublicKeyInfo PEM):");
            println!("{public_pem}");
        }

        Commands::Validate {
            token,
            token_file,
            public_key,
            license_version,
            hardware_id,
            bind_this_machine,
            json,
        } => {
            let public_path = public_key.unwrap_or(cfg.keys.public_key.clone());
            let public_key = keys::load_public_key(&public_path).context("load public key")?;
            let expected_version = license_version.unwrap_or(cfg.issue.version.clone());
            let hardware_id = resolve_hardware_id(hardware_id, bind_this_machine)?;

            let outcome = match (token, token_file) {
                (Some(token), _) => validator::validate(
                    &public_key,
                    token.trim(),
                    &expected_version,
                    hardware_id.as_deref(),
                ),
                (None, Some(path)) => {
                    match validator::check_license(
                        &path,
                        &public_key,
                        &expected_version,
                        hardware_id.as_deref(),
                    )
                    .context("check license file")?
                    {
                        validator::LicenseStatus::Valid(p) => Ok(p),
                        validator::LicenseStatus::Rejected(e) => Err(e),
                        validator::LicenseStatus::Missing => {
                            anyhow::bail!("license file {} not found", path.display())
                        }
                    }
                }
                (None, None) => anyhow::bail!("one of --token or --token-file is required"),
            };

            report_outcome(&outcome, json)?;
            if let Err(e) = outcome {
                std::process::exit(ErrorCode::from(&e) as i32);
            }
        }

        Commands::MachineFingerprint => {
            let fp = hardware::machine_fingerprint().context("compute machine fingerprint")?;
            println!("{fp}");
        }

        Commands::Version => {
            println!("{}", util::version_string());
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue_token(signer: &Ed25519Signer, cfg: &LicenseToolConfig, args: &TokenArgs) -> Result<String> {
    let version = args
        .license_version
        .clone()
        .unwrap_or(cfg.issue.version.clone());
    let days = args.days.unwrap_or(cfg.issue.validity_days);
    let hardware_id = resolve_hardware_id(args.hardware_id.clone(), args.bind_this_machine)?;

    let token = issuer::issue_on(
        signer,
        util::today_utc(),
        &version,
        days,
        hardware_id.as_deref(),
    )
    .context("issue token")?;

    if let Some(out) = &args.out {
        std::fs::write(out, format!("{token}\n"))
            .with_context(|| format!("write {}", out.display()))?;
        info!(out = %out.display(), key_id = %signer.descriptor().key_id, "token written");
    }
    Ok(token)
}

/// `--hardware-id ""` means "no binding", same as leaving the flag out.
fn resolve_hardware_id(explicit: Option<String>, this_machine: bool) -> Result<Option<String>> {
    if this_machine {
        let fp = hardware::machine_fingerprint().context("compute machine fingerprint")?;
        return Ok(Some(fp));
    }
    Ok(explicit.filter(|id| !id.is_empty()))
}

fn report_outcome(
    outcome: &std::result::Result<LicensePayload, LicenseError>,
    json: bool,
) -> Result<()> {
    if json {
        let payload = match outcome {
            Ok(p) => Some(p),
            Err(e) => e.expired_payload(),
        };
        let payload = payload.map(LicensePayload::to_json_value).transpose()?;
        let doc = serde_json::json!({
            "valid": outcome.is_ok(),
            "reason": outcome.as_ref().err().map(|e| e.to_string()),
            "code": outcome.as_ref().err().map_or(ErrorCode::Ok as i32, |e| ErrorCode::from(e) as i32),
            "payload": payload,
        });
        println!("{}", serde_json::to_string_pretty(&doc).context("render outcome")?);
        return Ok(());
    }

    match outcome {
        Ok(p) => {
            println!("License token is VALID.");
            println!("Payload:");
            println!("{}", p.to_pretty_json()?);
        }
        Err(e) => {
            println!("License token is INVALID: {e}");
            if let Some(p) = e.expired_payload() {
                println!("Payload:");
                println!("{}", p.to_pretty_json()?);
            }
        }
    }
    Ok(())
}

fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.level));

    let registry = tracing_subscriber::registry().with(filter);

    if cfg.json_stdout {
        // JSON output to stdout for container pipelines.
        let json_layer = tracing_subscriber::fmt::layer().json();
        registry.with(json_layer).init();
    } else if !cfg.json_log_file.is_empty() {
        // JSON-lines output to file.
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.json_log_file)
            .with_context(|| format!("open json log file {}", cfg.json_log_file))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::sync::Mutex::new(log_file));
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(file_layer).with(console_layer).init();
    } else {
        // Default: human-readable output to stderr, keeping stdout for tokens.
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(console_layer).init();
    }
    Ok(())
}
