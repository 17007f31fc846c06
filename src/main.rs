use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use creative_engine::output::{self, OutputFormat};
use creative_engine::reference_examples::reference_examples_for_style;
use creative_engine::{CreativeEngine, CreativityConfig, ContentType, ProductContext, artifacts};

/// Generate a short-form video ad script from an extracted product context,
/// with optional LLM-as-judge creativity assessment.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON file holding the product context
    /// (name, target_audience, pain_point, key_benefit, optional offer/platform)
    context: PathBuf,

    /// Model name; the provider is selected from its prefix
    #[arg(short, long, default_value = "gpt-4o")]
    model: String,

    /// Creativity level, 0.0 (conventional) to 1.0 (maximum divergence)
    #[arg(short, long, default_value_t = 0.7)]
    creativity: f64,

    /// Concepts scoring below this threshold are filtered during selection
    #[arg(long, default_value_t = 0.75)]
    quality_threshold: f64,

    /// Content type to generate
    #[arg(long, value_enum, default_value = "video-script")]
    content_type: ContentType,

    /// Target platform, used when the context file does not set one
    #[arg(long, default_value = "tiktok")]
    platform: String,

    /// Steer ideation with built-in reference examples (varun, austin, mixed)
    #[arg(long)]
    reference_style: Option<String>,

    /// Run the phase 3 creativity assessment after drafting
    #[arg(short, long)]
    evaluate: bool,

    /// Directory to persist generation/evaluation artifacts into
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    output: OutputFormat,

    /// Explicit API key; falls back to the provider's environment variable
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let raw_context = fs::read_to_string(&args.context)
        .with_context(|| format!("failed to read context file: {}", args.context.display()))?;
    let mut product_context: ProductContext = serde_json::from_str(&raw_context)
        .with_context(|| format!("failed to parse context file: {}", args.context.display()))?;
    if product_context.platform.is_none() {
        product_context.platform = Some(args.platform.clone());
    }

    let reference_examples = args
        .reference_style
        .as_deref()
        .map(reference_examples_for_style)
        .transpose()?;

    let config = CreativityConfig::new(args.creativity, args.quality_threshold)?;
    let engine = CreativeEngine::from_model(config, &args.model, args.api_key.clone())?;

    info!(
        "initialized engine: model={}, creativity={}, quality_threshold={}",
        args.model, args.creativity, args.quality_threshold
    );

    let result = engine
        .generate(
            &product_context,
            args.content_type,
            reference_examples.as_deref(),
            args.evaluate,
        )
        .await?;

    output::print_result(&result, args.output);

    if let Some(directory) = &args.artifacts_dir {
        artifacts::save_generation(&result.generation, directory)?;
        if let Some(assessment) = &result.evaluation {
            artifacts::save_assessment(
                assessment,
                result.generation_id(),
                &result.generation.selected_concept.title,
                directory,
            )?;
        }
    }

    Ok(())
}
