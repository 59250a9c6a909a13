use std::io;
use std::process::ExitCode;

use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voyage_embed::{
    CancellationToken, EmbedCall, EmbedError, EmbeddingModel, VOYAGE_CONTEXT_3, VoyageConfig,
    VoyageEmbeddingOptions, VoyageProvider, env_string,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "voyage-embed failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), EmbedError> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|e| EmbedError::Config(format!("failed to read stdin: {e}")))?;
    let values: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(EmbedError::Config(
            "no input text on stdin; expected one text per line".to_string(),
        ));
    }

    let options = options_from_env()?;
    let model_id = env_string("VOYAGE_MODEL").unwrap_or_else(|| VOYAGE_CONTEXT_3.to_string());
    let provider = VoyageProvider::new(VoyageConfig::from_env())?;
    let model = provider.contextualized_embedding_model(model_id);

    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    info!(values = values.len(), model = model.model_id(), "embedding stdin");
    let result = model
        .embed(
            EmbedCall::new(values)
                .with_provider_options(options.to_provider_options())
                .with_abort_signal(token),
        )
        .await?;

    let out = serde_json::json!({
        "embeddings": result.embeddings,
        "usage": result.usage,
    });
    let mut line = out.to_string();
    line.push('\n');
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(line.as_bytes())
        .await
        .map_err(|e| EmbedError::Config(format!("failed to write output: {e}")))?;
    stdout
        .flush()
        .await
        .map_err(|e| EmbedError::Config(format!("failed to write output: {e}")))?;
    Ok(())
}

/// Options come from env as strings and go through the same validation as any
/// provider options bag.
fn options_from_env() -> Result<VoyageEmbeddingOptions, EmbedError> {
    let mut raw = Map::new();
    if let Some(v) = env_string("VOYAGE_INPUT_TYPE") {
        raw.insert("inputType".to_string(), Value::String(v));
    }
    if let Some(v) = env_string("VOYAGE_OUTPUT_DIMENSION") {
        let value = v
            .parse::<u64>()
            .map_or(Value::String(v), |d| Value::Number(d.into()));
        raw.insert("outputDimension".to_string(), value);
    }
    if let Some(v) = env_string("VOYAGE_OUTPUT_DTYPE") {
        raw.insert("outputDtype".to_string(), Value::String(v));
    }
    if let Some(v) = env_string("VOYAGE_TRUNCATION") {
        let value = v.parse::<bool>().map_or(Value::String(v), Value::Bool);
        raw.insert("truncation".to_string(), value);
    }
    VoyageEmbeddingOptions::validate(Some(&Value::Object(raw))).map_err(EmbedError::from)
}
