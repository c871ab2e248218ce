use anyhow::Context;
use clap::{Parser, Subcommand};
use l10n_patcher::{
    patch_mod, patcher_for, translate_csv, AliyunTranslator, AppConfig, PatchStrategy,
    PlaceholderTranslator,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(version, about = "Patch mod translation XML from CSV and machine-translate CSV text")]
struct Cli {
    /// TOML configuration file; missing file means defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replace text of existing DefInjected/Keyed entries in place.
    Patch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        mod_root: PathBuf,
        /// `strict` or `preserve`.
        #[arg(long)]
        strategy: Option<PatchStrategy>,
        /// Folder under `Languages/`.
        #[arg(long)]
        language: Option<String>,
    },
    /// Fill a `translated` column through Alibaba Cloud MT.
    Translate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Pause after each row.
        #[arg(long)]
        sleep_ms: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(Some(cli.config.as_path()))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("l10n_patcher={}", config.logging.level).parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Patch {
            csv,
            mod_root,
            strategy,
            language,
        } => {
            let strategy = strategy.unwrap_or(config.patch.strategy);
            let language = language.unwrap_or(config.patch.language);
            let patcher = patcher_for(strategy);

            let report = patch_mod(&csv, &mod_root, &language, patcher.as_ref())?;
            println!(
                "Patched {} of {} files ({} failed)",
                report.files_changed, report.files_scanned, report.files_failed
            );
        }
        Command::Translate {
            input,
            output,
            sleep_ms,
        } => {
            if !config.api.has_credentials() {
                tracing::error!("Alibaba Cloud credentials are not configured");
                anyhow::bail!(
                    "set api.access_key_id/api.access_key_secret or the ALIBABA_CLOUD_ACCESS_KEY_* variables"
                );
            }

            let delay = sleep_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.translation.delay());
            let client = AliyunTranslator::new(&config.api)?;
            let translator = PlaceholderTranslator::with_languages(
                client,
                config.translation.source_lang.as_str(),
                config.translation.target_lang.as_str(),
            );
            tracing::info!(region_id = %config.api.region_id, "Using Alibaba Cloud MT");

            translate_csv(&input, &output, &translator, delay)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Translation run aborted"))?;
            println!("Translation finished, saved to {}", output.display());
        }
    }

    Ok(())
}
