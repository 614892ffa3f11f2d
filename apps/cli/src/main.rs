use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use describo_core_sdk::prelude::*;

const DEFAULT_INSTRUCTION: &str = "You are an accessibility assistant for blind and low-vision \
users. Describe the image clearly and concretely: the main subject, people and their expressions, \
setting, colours, any visible text, and anything important for safety or navigation. Answer \
follow-up questions about the image directly and concisely.";

/**
 * \brief Describo command line: run the HTTP service or analyze a single image.
 */
#[derive(Parser, Debug)]
#[command(name = "describo", version, about = "Accessible image descriptions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /**
     * \brief Start the local HTTP service (API + static client).
     */
    Serve {
        #[arg(long, default_value = "127.0.0.1:5173")]
        addr: String,
    },

    /**
     * \brief Describe one image through the configured providers.
     */
    Analyze {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "Describe this image.")]
        prompt: String,
        #[arg(long, default_value = "English")]
        language: String,
        #[arg(long)]
        instruction: Option<String>,
    },

    /**
     * \brief Print the configured providers in priority order.
     */
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ProviderConfig::from_env();
    telemetry::set_enabled(config.telemetry_enabled);
    let router = RequestRouter::from_config(&config);

    match cli.command {
        Commands::Serve { addr } => {
            if !router.is_configured() {
                eprintln!("warning: {}", AnalyzeError::NotConfigured);
            }
            server::run(&addr, router, config.ui_dir()).await?;
        }
        Commands::Analyze {
            image,
            prompt,
            language,
            instruction,
        } => {
            let payload = ImagePayload::from_file(&image).context("load image failed")?;
            let message = Message::user(vec![Part::image(payload), Part::text(prompt)]).stamped();

            telemetry::log_event(
                "cli.analyze",
                &format!("image={} language={}", image.display(), language),
            );

            let instruction = instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION);
            let text = router
                .analyze(&[message], instruction, &language)
                .await
                .context("analysis failed")?;
            println!("{}", text);
        }
        Commands::Providers => {
            let providers = router.providers();
            if providers.is_empty() {
                println!("{}", AnalyzeError::NotConfigured);
            }
            for (rank, kind) in providers.iter().enumerate() {
                println!("{}. {}", rank + 1, kind);
            }
            if router.fallback_on_error() {
                println!("fallback on error: enabled");
            }
        }
    }

    Ok(())
}
