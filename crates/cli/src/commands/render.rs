use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use cotiza_core::config::{AppConfig, ConfigOverrides};
use cotiza_core::naming::document_file_name;
use cotiza_core::{AmountBasis, QuoteId, QuoteLogRecord, QuoteParser, QuoteSession};
use cotiza_render::{Brand, QuoteRenderer, RenderJob};
use serde_json::json;

use crate::commands::{load_config, read_input, CommandResult};

const COMMAND: &str = "render";

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config_path: Option<PathBuf>,
    pub brand: Brand,
    pub basis: AmountBasis,
    pub identifier: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub input: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> CommandResult {
    let overrides = ConfigOverrides {
        output_dir: args.output_dir.clone(),
        assets_dir: args.assets_dir.clone(),
        ..ConfigOverrides::default()
    };
    let config = match load_config(COMMAND, args.config_path.clone(), overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let raw = match read_input(args.input.as_deref()) {
        Ok(raw) => raw,
        Err(error) => return CommandResult::failure(COMMAND, "input", format!("{error:#}"), 3),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(render_text(&config, &args, &raw)) {
        Ok(outcome) => outcome,
        Err(error) => CommandResult::failure(COMMAND, "render", format!("{error:#}"), 5),
    }
}

async fn render_text(
    config: &AppConfig,
    args: &RenderArgs,
    raw: &str,
) -> anyhow::Result<CommandResult> {
    let offset = config.utc_offset();
    let quote = QuoteParser::new(args.basis).with_offset(offset).parse(raw);
    let session = QuoteSession::from_quote(&quote);
    let job = RenderJob::for_brand(args.brand, &config.render.assets_dir);
    let renderer = QuoteRenderer::from_config(config);

    let now = Utc::now();
    let identifier = args.identifier.clone().unwrap_or_else(|| QuoteId::at(now).0);
    let path = renderer
        .render_session(&identifier, &session, &job)
        .await
        .with_context(|| format!("could not render quote `{identifier}`"))?;

    let record = QuoteLogRecord::from_quote(&quote, args.brand.tag(), now.with_timezone(&offset));
    let data = json!({
        "path": path.display().to_string(),
        "file_name": document_file_name(args.brand.tag(), quote.client_name(), quote.description()),
        "record": record,
        "summary": quote.summary(),
    });

    tracing::info!(
        event_name = "cli.render.completed",
        quote_id = %identifier,
        brand = args.brand.tag(),
        item_count = quote.items().len(),
        "quote rendered"
    );

    Ok(CommandResult::success_with(
        COMMAND,
        format!("rendered {}", path.display()),
        Some(data),
    ))
}
