use sticker_exporter::config::Config;
use sticker_exporter::logging::init_logging;
use sticker_exporter::pipeline::{ExportPipeline, PipelineSettings};
use sticker_exporter::telegram::{Bot, BotApi};
use sticker_exporter::tool::{CliToolRunner, ToolCapabilities};
use sticker_exporter::{Error, run_with_shutdown};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            if let Error::Config { key: Some(key), .. } = &e {
                eprintln!("  (check the {key} environment variable)");
            }
            process::exit(2);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sticker-exporter starting");

    let runner = CliToolRunner::resolve(config.tools.sticker_convert_path.as_deref());
    tracing::info!(binary = %runner.binary_path().display(), "using sticker-convert");
    let capabilities = ToolCapabilities::probe(&runner, config.tools.command_timeout).await;

    let pipeline = ExportPipeline::new(
        Arc::new(runner),
        capabilities,
        PipelineSettings::from_config(&config),
    );

    let api = match BotApi::new(&config.bot.api_url, &config.bot.token, config.retry.clone()) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "failed to build Bot API client");
            process::exit(1);
        }
    };
    match api.get_me().await {
        Ok(me) => tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or("-"),
            "authenticated with Bot API"
        ),
        Err(e) => {
            tracing::error!(error = %e, "could not reach the Bot API; is BOT_TOKEN valid?");
            process::exit(1);
        }
    }

    let bot = Bot::new(Arc::new(api), Arc::new(pipeline), config.bot.poll_timeout);
    run_with_shutdown(bot).await;
}
