use anyhow::{Context, Result};
use docstitch_config::TemplateConfig;
use docstitch_dom::markup;
use docstitch_engine::{ScopeValue, TemplateHandler, TemplateOptions};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <template> <data.json> [output]", args[0]);
        process::exit(1);
    }
    let template_path = PathBuf::from(&args[1]);
    let data_path = PathBuf::from(&args[2]);
    let output_path = args.get(3).map(PathBuf::from);

    let config = match TemplateConfig::load() {
        Ok(Some(config)) => {
            log::info!("Using config from {}", TemplateConfig::config_path().display());
            config
        }
        Ok(None) => TemplateConfig::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = render(config, &template_path, &data_path, output_path.as_deref()).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
    Ok(())
}

async fn render(
    config: TemplateConfig,
    template_path: &Path,
    data_path: &Path,
    output_path: Option<&Path>,
) -> Result<()> {
    let template = fs::read_to_string(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    let mut doc = markup::parse(&template)
        .with_context(|| format!("Failed to parse template {}", template_path.display()))?;

    let data = fs::read_to_string(data_path)
        .with_context(|| format!("Failed to read data {}", data_path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse data {}", data_path.display()))?;

    let handler = TemplateHandler::new(TemplateOptions {
        config,
        ..TemplateOptions::default()
    })?;
    handler.process(&mut doc, ScopeValue::from(data)).await?;
    log::info!("Rendered {}", template_path.display());

    let rendered = markup::to_markup(&doc, doc.root())?;
    match output_path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
