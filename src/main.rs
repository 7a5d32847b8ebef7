//! sealnote - Password-based message encryption
//!
//! Usage:
//!   sealnote init                 - Write default config and an instance id
//!   sealnote encrypt [TEXT]       - Encrypt a message
//!   sealnote decrypt [BLOB]       - Decrypt a message
//!   sealnote strength             - Rate a password
//!   sealnote key <command>        - Manage saved keys

use clap::{Args, Parser, Subcommand};
use sealnote::{
    config::Config,
    passphrase::{self, Strength, MIN_PASSWORD_LENGTH},
    store,
    vault::{SessionKeyVault, VaultContext},
    Error, MessageCipher, Result,
};
use std::future::Future;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "sealnote")]
#[command(author = "sealnote Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Password-based message encryption")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/sealnote/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and generate the instance id
    Init {
        /// Overwrite an existing configuration and replace the instance id
        #[arg(long)]
        force: bool,
    },

    /// Encrypt a message (read from stdin when TEXT is omitted)
    Encrypt {
        /// Message to encrypt
        text: Option<String>,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Decrypt a message (read from stdin when BLOB is omitted)
    Decrypt {
        /// Encrypted message
        blob: Option<String>,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Rate the strength of a password
    Strength {
        /// Read the password from file
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Saved key management
    #[command(subcommand)]
    Key(KeyCommands),
}

#[derive(Args)]
struct PasswordArgs {
    /// Read the password from file
    #[arg(long, conflicts_with = "key")]
    password_file: Option<PathBuf>,

    /// Use a saved key instead of a password
    #[arg(long)]
    key: Option<String>,
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Save a key under a name
    Save {
        /// Key name
        name: String,

        /// Read the key from file
        #[arg(long)]
        secret_file: Option<PathBuf>,
    },

    /// List saved key names
    List,

    /// Remove every saved key
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show a saved key's salt
    Show {
        /// Key name
        name: String,

        /// Also print the derived key
        #[arg(long)]
        reveal: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Expand ~ in config path
    let config_path = expand_tilde(&cli.config);
    let config = Config::load_or_default(&config_path);

    let level = config
        .as_ref()
        .map(|c| c.logging.level.as_str())
        .unwrap_or("info");
    init_logging(cli.verbose, level);

    let result = config.and_then(|config| run_command(cli.command, &config_path, &config));
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e.user_message());
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: failed to install log subscriber");
    }
}

fn run_command(command: Commands, config_path: &Path, config: &Config) -> Result<()> {
    match command {
        Commands::Init { force } => cmd_init(config_path, config, force),

        Commands::Encrypt { text, password } => cmd_encrypt(config, text, password),

        Commands::Decrypt { blob, password } => cmd_decrypt(config, blob, password),

        Commands::Strength { password_file } => cmd_strength(password_file),

        Commands::Key(key_cmd) => run_key_command(key_cmd, config),
    }
}

fn run_key_command(command: KeyCommands, config: &Config) -> Result<()> {
    match command {
        KeyCommands::Save { name, secret_file } => cmd_key_save(config, &name, secret_file),
        KeyCommands::List => cmd_key_list(config),
        KeyCommands::Clear { yes } => cmd_key_clear(config, yes),
        KeyCommands::Show { name, reveal } => cmd_key_show(config, &name, reveal),
    }
}

fn cmd_init(config_path: &Path, config: &Config, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "{:?} already exists, use --force to overwrite",
            config_path
        )));
    }

    Config::default().save(config_path)?;
    info!("Configuration saved to {:?}", config_path);

    if force {
        if config.instance.id_file.exists() {
            warn!("Replacing instance id; keys saved under the old id can no longer be read");
        }
        config.write_new_instance_id()?;
        if config.instance.id.is_some() {
            warn!("An instance id override is set and takes precedence over the id file");
        }
    } else {
        config.ensure_instance_id()?;
    }

    println!("Initialized sealnote");
    println!("  config:      {}", config_path.display());
    println!("  instance id: {}", config.instance.id_file.display());
    println!("  store:       {}", config.store.path.display());

    Ok(())
}

fn cmd_encrypt(config: &Config, text: Option<String>, args: PasswordArgs) -> Result<()> {
    let text = read_input(text)?;
    let password = resolve_password(config, &args)?;
    let cipher = MessageCipher::new(config.kdf.params()?);

    let blob = cipher.encrypt(&text, &password)?;
    println!("{}", blob);
    Ok(())
}

fn cmd_decrypt(config: &Config, blob: Option<String>, args: PasswordArgs) -> Result<()> {
    let blob = read_input(blob)?;
    let password = resolve_password(config, &args)?;
    let cipher = MessageCipher::new(config.kdf.params()?);

    let message = Zeroizing::new(cipher.decrypt(&blob, &password)?);
    println!("{}", message.as_str());
    Ok(())
}

fn cmd_strength(password_file: Option<PathBuf>) -> Result<()> {
    let password = read_secret(password_file.as_deref(), "Enter encryption key: ")?;
    let score = passphrase::strength_score(&password);

    println!("{} ({}/6)", Strength::of(&password), score);
    Ok(())
}

fn cmd_key_save(config: &Config, name: &str, secret_file: Option<PathBuf>) -> Result<()> {
    let secret = read_secret(secret_file.as_deref(), "Enter key to save: ")?;

    block_on(async {
        let vault = open_vault(config).await?;
        vault.save(name, &secret).await?;
        println!("Key '{}' saved successfully!", name.trim());
        Ok::<_, Error>(())
    })
}

fn cmd_key_list(config: &Config) -> Result<()> {
    block_on(async {
        let vault = open_vault(config).await?;
        let names = vault.list_names().await?;

        if names.is_empty() {
            println!("No saved keys");
        }
        for name in names {
            println!("{}", name);
        }
        Ok::<_, Error>(())
    })
}

fn cmd_key_clear(config: &Config, yes: bool) -> Result<()> {
    if !yes && !confirm("Are you sure you want to clear all stored keys? [y/N] ")? {
        println!("Aborted");
        return Ok(());
    }

    block_on(async {
        let vault = open_vault(config).await?;
        vault.clear_all().await?;
        println!("All stored keys have been cleared.");
        Ok::<_, Error>(())
    })
}

fn cmd_key_show(config: &Config, name: &str, reveal: bool) -> Result<()> {
    block_on(async {
        let vault = open_vault(config).await?;
        let key = vault
            .load(name)
            .await?
            .ok_or_else(|| missing_key(name))?;

        println!("Name: {}", name.trim());
        println!("Salt: {}", hex::encode(key.salt()));
        if reveal {
            println!("Key:  {}", key.derived_key_hex());
        } else {
            println!("Key:  [hidden, use --reveal to print]");
        }
        Ok::<_, Error>(())
    })
}

/// Open the vault and drop store entries that are not vault records
async fn open_vault(config: &Config) -> Result<SessionKeyVault> {
    let ctx = VaultContext::from_config(config)?;
    let store = store::open(&config.store)?;
    let vault = SessionKeyVault::new(store, Arc::new(ctx));

    let purged = vault.purge_non_vault_entries().await?;
    if purged > 0 {
        info!("Purged {} stale store entries", purged);
    }

    Ok(vault)
}

/// Password from a saved key, a file, or an interactive prompt
fn resolve_password(config: &Config, args: &PasswordArgs) -> Result<Zeroizing<String>> {
    if let Some(name) = &args.key {
        return block_on(async {
            let vault = open_vault(config).await?;
            let key = vault
                .load(name)
                .await?
                .ok_or_else(|| missing_key(name))?;
            Ok::<_, Error>(Zeroizing::new(key.derived_key_hex().to_string()))
        });
    }

    let password = read_secret(args.password_file.as_deref(), "Enter encryption key: ")?;
    passphrase::validate_password(&password, MIN_PASSWORD_LENGTH)?;

    let strength = Strength::of(&password);
    if strength == Strength::Weak {
        warn!("{}", strength);
    }

    Ok(password)
}

fn missing_key(name: &str) -> Error {
    Error::Vault(sealnote::error::VaultError::PreconditionViolation(format!(
        "Selected key '{}' not found",
        name.trim()
    )))
}

/// Read a secret from file or prompt. File contents lose one trailing line
/// ending; the prompt already strips it.
fn read_secret(path: Option<&Path>, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(path) = path {
        let raw = Zeroizing::new(
            std::fs::read_to_string(path)
                .map_err(|e| Error::Internal(format!("Failed to read password file: {}", e)))?,
        );
        return Ok(Zeroizing::new(strip_line_ending(&raw).to_string()));
    }

    Ok(Zeroizing::new(
        rpassword::prompt_password(prompt).map_err(|e| Error::Internal(e.to_string()))?,
    ))
}

/// Argument verbatim if given, otherwise stdin minus its final line ending
fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(strip_line_ending(&buf).to_string())
        }
    }
}

fn strip_line_ending(s: &str) -> &str {
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.strip_suffix('\r').unwrap_or(s)
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{}", prompt);
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn block_on<F: Future<Output = Result<T>>, T>(future: F) -> Result<T> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;
    runtime.block_on(future)
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
