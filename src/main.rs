use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tryon_studio_core::imaging::{load_image_path, save_png};
use tryon_studio_core::settings::{load_studio_settings, StudioSettingsOverlay};
use tryon_studio_core::studio::{BackgroundRemovalOutcome, TryOnSource, TryOnStudio};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> CliResult<()> {
    init_tracing();

    let cli_args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = cli_args.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };
    let rest = cli_args.iter().skip(1).cloned().collect::<Vec<_>>();
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_usage();
        return Ok(());
    }

    match command {
        "try-on" => run_try_on_cli(parse_cli_args(rest.as_slice())?),
        "generate-item" => run_generate_item_cli(parse_cli_args(rest.as_slice())?),
        "refine-item" => run_refine_item_cli(parse_cli_args(rest.as_slice())?),
        "remove-bg" => run_remove_bg_cli(parse_cli_args(rest.as_slice())?),
        "recommend" => run_recommend_cli(parse_cli_args(rest.as_slice())?),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        unknown => Err(std::io::Error::other(format!(
            "Unknown command: {unknown}\n\nUse --help for usage."
        ))
        .into()),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StudioCliArgs {
    app_root: Option<PathBuf>,
    settings_path: Option<String>,
    out: Option<PathBuf>,
    person: Option<PathBuf>,
    clothing: Vec<PathBuf>,
    image: Option<PathBuf>,
    prompt: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    context: Option<String>,
    context_file: Option<PathBuf>,
    model: Option<String>,
}

fn parse_cli_args(args: &[String]) -> CliResult<StudioCliArgs> {
    let mut parsed = StudioCliArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        let needs_value = |idx: usize| -> CliResult<String> {
            let Some(value) = args.get(idx + 1) else {
                return Err(std::io::Error::other(format!("Missing value for {flag}")).into());
            };
            Ok(value.clone())
        };

        match flag {
            "--app-root" => parsed.app_root = Some(PathBuf::from(needs_value(i)?)),
            "--settings" => parsed.settings_path = Some(needs_value(i)?),
            "--out" => parsed.out = Some(PathBuf::from(needs_value(i)?)),
            "--person" => parsed.person = Some(PathBuf::from(needs_value(i)?)),
            "--clothing" => parsed.clothing.push(PathBuf::from(needs_value(i)?)),
            "--image" => parsed.image = Some(PathBuf::from(needs_value(i)?)),
            "--prompt" => parsed.prompt = Some(needs_value(i)?),
            "--description" => parsed.description = Some(needs_value(i)?),
            "--instruction" => parsed.instruction = Some(needs_value(i)?),
            "--context" => parsed.context = Some(needs_value(i)?),
            "--context-file" => parsed.context_file = Some(PathBuf::from(needs_value(i)?)),
            "--model" => parsed.model = Some(needs_value(i)?),
            unknown => {
                return Err(std::io::Error::other(format!(
                    "Unknown argument: {unknown}\n\nUse --help for usage."
                ))
                .into());
            }
        }
        i += 2;
    }
    Ok(parsed)
}

fn required<T: Clone>(value: &Option<T>, flag: &str) -> CliResult<T> {
    value
        .clone()
        .ok_or_else(|| std::io::Error::other(format!("Missing required {flag}")).into())
}

fn resolve_app_root(args: &StudioCliArgs) -> CliResult<PathBuf> {
    match args.app_root.as_ref() {
        Some(root) => Ok(root.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_studio(args: &StudioCliArgs) -> CliResult<(TryOnStudio, PathBuf)> {
    let app_root = resolve_app_root(args)?;
    let overrides = StudioSettingsOverlay {
        image_model: args.model.clone(),
        ..StudioSettingsOverlay::default()
    };
    let settings = load_studio_settings(
        app_root.as_path(),
        args.settings_path.as_deref(),
        &overrides,
    )?;
    Ok((TryOnStudio::from_settings(&settings)?, app_root))
}

fn output_path(args: &StudioCliArgs, app_root: &Path, operation: &str) -> PathBuf {
    match args.out.as_ref() {
        Some(out) if out.is_absolute() => out.clone(),
        Some(out) => app_root.join(out),
        None => app_root
            .join("var/outputs")
            .join(format!("{operation}_{}.png", uuid::Uuid::new_v4())),
    }
}

fn write_output(image: &DynamicImage, path: &Path) -> CliResult<()> {
    save_png(image, path)?;
    tracing::info!(path = %path.display(), "wrote output image");
    Ok(())
}

fn run_try_on_cli(args: StudioCliArgs) -> CliResult<()> {
    let person = required(&args.person, "--person")?;
    if args.clothing.is_empty() {
        return Err(std::io::Error::other("Missing required --clothing (repeatable)").into());
    }
    let (studio, app_root) = open_studio(&args)?;
    let outcome = studio.virtual_try_on_paths(
        person.as_path(),
        args.clothing.as_slice(),
        args.prompt.as_deref(),
    )?;
    let out = output_path(&args, app_root.as_path(), "tryon");
    write_output(&outcome.image, out.as_path())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ok": true,
            "operation": "try_on",
            "output": out.display().to_string(),
            "fallback_preview": outcome.source == TryOnSource::Preview,
            "width": outcome.image.width(),
            "height": outcome.image.height(),
            "analysis": outcome.analysis
        }))?
    );
    Ok(())
}

fn run_generate_item_cli(args: StudioCliArgs) -> CliResult<()> {
    let description = required(&args.description, "--description")?;
    let (studio, app_root) = open_studio(&args)?;
    let outcome = studio.generate_clothing_image(description.as_str())?;
    print_removal_summary(&args, app_root.as_path(), "text_to_image", outcome)
}

fn run_refine_item_cli(args: StudioCliArgs) -> CliResult<()> {
    let image_path = required(&args.image, "--image")?;
    let instruction = required(&args.instruction, "--instruction")?;
    let (studio, app_root) = open_studio(&args)?;
    let prior = load_image_path(image_path.as_path())?;
    let outcome = studio.refine_clothing_image(&prior, instruction.as_str())?;
    print_removal_summary(&args, app_root.as_path(), "refine", outcome)
}

fn run_remove_bg_cli(args: StudioCliArgs) -> CliResult<()> {
    let image_path = required(&args.image, "--image")?;
    let (studio, app_root) = open_studio(&args)?;
    let source = load_image_path(image_path.as_path())?;
    let outcome = studio.remove_background(source)?;
    print_removal_summary(&args, app_root.as_path(), "background_removal", outcome)
}

fn print_removal_summary(
    args: &StudioCliArgs,
    app_root: &Path,
    operation: &str,
    outcome: BackgroundRemovalOutcome,
) -> CliResult<()> {
    let remote = format!("{:?}", outcome.remote);
    let image = outcome.into_dynamic();
    let out = output_path(args, app_root, operation);
    write_output(&image, out.as_path())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ok": true,
            "operation": operation,
            "output": out.display().to_string(),
            "remote_strip": remote,
            "width": image.width(),
            "height": image.height()
        }))?
    );
    Ok(())
}

fn run_recommend_cli(args: StudioCliArgs) -> CliResult<()> {
    let context = match (args.context.as_ref(), args.context_file.as_ref()) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            return Err(
                std::io::Error::other("Missing required --context or --context-file").into(),
            )
        }
    };
    let (studio, _) = open_studio(&args)?;
    let recommendations = studio.recommend_outfits(context.as_str())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ok": true,
            "operation": "recommendation",
            "recommendations": recommendations
        }))?
    );
    Ok(())
}

fn print_usage() {
    eprintln!(concat!(
        "Usage:\n",
        "  tryon-studio try-on --person PATH --clothing PATH [--clothing PATH ...] [--prompt TEXT] [--out PATH]\n",
        "  tryon-studio generate-item --description TEXT [--out PATH]\n",
        "  tryon-studio refine-item --image PATH --instruction TEXT [--out PATH]\n",
        "  tryon-studio remove-bg --image PATH [--out PATH]\n",
        "  tryon-studio recommend (--context TEXT | --context-file PATH)\n\n",
        "Common options:\n",
        "  --app-root PATH   root for .env, config/studio.settings.toml and var/outputs (default: cwd)\n",
        "  --settings PATH   explicit .toml or .json settings file\n",
        "  --model NAME      override the image model\n"
    ));
}
