//! CLI for GenForm - upload images and a prompt, get a generated image back.

use clap::{Args, Parser, Subcommand, ValueEnum};
use genform::session::Session;
use genform::{
    FormController, HttpImageService, ImageService, OutputQuality, OutputSize, ServiceConfig,
    MAX_IMAGES,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "genform")]
#[command(about = "Generate or edit images through an image generation service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Service base URL (default: $GENFORM_SERVICE_URL or http://localhost:5000)
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Request timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit the form once and save the result
    Generate(GenerateArgs),

    /// Fill in the form interactively
    Form(FormArgs),

    /// Check that the service is reachable
    Health,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt
    prompt: String,

    /// Image to attach (repeat up to 4 times; any image switches to the edit route)
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Output size
    #[arg(short, long, value_enum, default_value = "1024x1024")]
    size: SizeArg,

    /// Output quality
    #[arg(short, long, value_enum, default_value = "medium")]
    quality: QualityArg,

    /// Output file or directory
    #[arg(short, long, default_value = "generated-image.png")]
    output: PathBuf,
}

#[derive(Args)]
struct FormArgs {
    /// Directory `save` writes into when no path is given
    #[arg(long, default_value = ".")]
    download_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    #[value(name = "1024x1024")]
    Square,
    #[value(name = "1536x1024")]
    Landscape,
    #[value(name = "1024x1536")]
    Portrait,
    Auto,
}

impl From<SizeArg> for OutputSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::Square => OutputSize::Square,
            SizeArg::Landscape => OutputSize::Landscape,
            SizeArg::Portrait => OutputSize::Portrait,
            SizeArg::Auto => OutputSize::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Low,
    Medium,
    High,
    Auto,
}

impl From<QualityArg> for OutputQuality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => OutputQuality::Low,
            QualityArg::Medium => OutputQuality::Medium,
            QualityArg::High => OutputQuality::High,
            QualityArg::Auto => OutputQuality::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let service = build_service(&cli)?;

    match cli.command {
        Commands::Generate(args) => {
            generate(service, args, cli.json).await?;
        }
        Commands::Form(args) => {
            let mut session = Session::new(FormController::new(service), args.download_dir);
            session.run().await?;
        }
        Commands::Health => {
            health(service, cli.json).await?;
        }
    }

    Ok(())
}

fn build_service(cli: &Cli) -> anyhow::Result<HttpImageService> {
    let mut config = ServiceConfig::builder();
    if let Some(url) = &cli.service_url {
        config = config.base_url(url);
    }
    if let Some(secs) = cli.timeout {
        config = config.timeout(Duration::from_secs(secs));
    }
    Ok(HttpImageService::builder().config(config.build()?).build()?)
}

async fn generate(
    service: HttpImageService,
    args: GenerateArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    if args.images.len() > MAX_IMAGES {
        anyhow::bail!(
            "at most {} images can be attached ({} given)",
            MAX_IMAGES,
            args.images.len()
        );
    }

    let mut form = FormController::new(service);
    for (index, path) in args.images.iter().enumerate() {
        form.select_image_path(index, path).await?;
    }
    form.set_prompt(args.prompt);
    form.set_size(args.size.into());
    form.set_quality(args.quality.into());

    let route = form.state().route();
    let url = form.service().config().route_url(route).to_string();
    form.submit().await?;
    let output = form.save_result(&args.output).await?;

    let Some(image) = form.state().result() else {
        anyhow::bail!("service returned no image");
    };

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "route": route,
            "endpoint": url,
            "output": output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.extension(),
            "images_attached": form.state().image_count(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({} bytes) via {}",
            output.display(),
            image.size(),
            url
        );
    }

    Ok(())
}

async fn health(service: HttpImageService, json_output: bool) -> anyhow::Result<()> {
    let url = service.config().health_url().to_string();
    let outcome = service.health_check().await;

    if json_output {
        let result = serde_json::json!({
            "endpoint": url,
            "healthy": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &outcome {
            Ok(()) => println!("✓ {url} is healthy"),
            Err(e) => println!("✗ {url}: {e}"),
        }
    }

    outcome.map_err(Into::into)
}
