use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{info, warn};

use profile_optimizer::backends::{load_models, ModelSelection};
use profile_optimizer::config::{Config, DEFAULT_CONFIG_FILE};
use profile_optimizer::models::{
    DatingProfileData, ParsedExportBundle, PhotoAnalysis, ProfileStyle, UserInfo,
};
use profile_optimizer::parser::{ExportParser, ImportProgress};
use profile_optimizer::pipeline::{BatchProgress, ModelManager};
use profile_optimizer::{aggregate, dashboard, logging, report, scoring};

#[derive(Parser)]
#[command(name = "profile-optimizer", version, about = "Build a dating profile from your social data export")]
struct Cli {
    /// Path to the config TOML.
    #[arg(long, global = true, env = "PROFILE_OPTIMIZER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an export (.zip or .json) and summarise what was found.
    Import {
        path: PathBuf,

        /// Write the aggregated profile and summary counts as JSON.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Caption, classify and rank photos.
    Analyze {
        images: Vec<PathBuf>,

        /// Also analyze the photos found in this export.
        #[arg(long)]
        from_export: Option<PathBuf>,

        /// Override the analysis log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Generate a profile description.
    Generate(GenerateArgs),

    /// Browse logged photo analyses.
    Dashboard {
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    occupation: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    interests: Option<String>,
    #[arg(long)]
    personality: Option<String>,
    #[arg(long)]
    looking_for: Option<String>,
    #[arg(long, value_enum)]
    style: Option<ProfileStyle>,

    /// Photo caption to mention (repeatable; the first three are used).
    #[arg(long = "caption")]
    captions: Vec<String>,

    /// Pre-fill age, occupation, location and interests from this export.
    #[arg(long)]
    from_export: Option<PathBuf>,

    /// Also write the description to the export directory.
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    // the subscriber only exists once the config has been read, so report on it afterwards
    logging::init(&config.logging)?;
    if cli.config.exists() {
        info!(path = %cli.config.display(), "configuration loaded");
    } else {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command {
        Commands::Import { path, export } => {
            let (bundle, profile) = import(&config, path).await?;
            print_summary(&profile);
            if let Some(out) = export {
                report::export_profile(&out, &bundle, &profile)?;
                println!("\nExported profile data to {}", out.display());
            }
        }
        Commands::Analyze {
            images,
            from_export,
            log,
        } => analyze(config, images, from_export, log).await?,
        Commands::Generate(args) => generate(config, args).await?,
        Commands::Dashboard { log } => {
            let log = log.unwrap_or_else(|| config.output.analysis_log.clone());
            println!("Launching dashboard...");
            task::spawn_blocking(move || dashboard::run_dashboard(&log)).await??;
        }
    }

    Ok(())
}

/// Parses and aggregates on a blocking task while the foreground prints progress.
async fn import(config: &Config, path: PathBuf) -> anyhow::Result<(ParsedExportBundle, DatingProfileData)> {
    let extraction_dir = config.import.extraction_dir.clone();
    let (tx, mut rx) = mpsc::unbounded_channel::<ImportProgress>();

    let worker = task::spawn_blocking(move || {
        let parser = ExportParser::new(extraction_dir);
        let bundle = parser.parse_with_progress(&path, |p| {
            let _ = tx.send(p);
        })?;
        let profile = aggregate(&bundle);
        Ok::<_, profile_optimizer::ProfileError>((bundle, profile))
    });

    while let Some(p) = rx.recv().await {
        if p.visited == p.total || p.visited % 25 == 0 {
            println!("Processed {}/{} export files", p.visited, p.total);
        }
    }

    let result = worker.await?.context("import failed")?;
    Ok(result)
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        "Not specified"
    } else {
        value
    }
}

fn print_summary(profile: &DatingProfileData) {
    println!("\n=== Imported profile ===");
    println!("Name:        {}", or_unspecified(&profile.name));
    match profile.age {
        Some(age) => println!("Age:         {age}"),
        None => println!("Age:         Not specified"),
    }
    println!("Location:    {}", or_unspecified(&profile.location));
    println!("Hometown:    {}", or_unspecified(&profile.hometown));
    println!("Occupation:  {}", profile.occupation.as_deref().unwrap_or("Not specified"));
    println!("Education:   {}", profile.education.as_deref().unwrap_or("Not specified"));
    println!("Status:      {}", or_unspecified(&profile.relationship_status));
    println!("Bio:         {}", or_unspecified(&profile.bio));
    println!("Interests:   {}", or_unspecified(&profile.interests));
    println!(
        "\nPhotos: {} found, {} available for analysis",
        profile.total_photos_found, profile.available_photos_count
    );
    println!("Posts analyzed: {}", profile.posts_analyzed);
    println!("Interests found: {}", profile.interests_found);
}

async fn analyze(
    config: Config,
    mut images: Vec<PathBuf>,
    from_export: Option<PathBuf>,
    log: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(export) = from_export {
        let (_, profile) = import(&config, export).await?;
        images.extend(profile.photos.into_iter().filter_map(|p| p.resolved_local_path));
    }
    if images.is_empty() {
        bail!("no images to analyze; pass image paths or --from-export");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let log_path = log.unwrap_or_else(|| config.output.analysis_log.clone());
    let export_dir = config.output.export_dir.clone();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let worker = task::spawn_blocking(move || {
        let mut manager = ModelManager::new();
        load_models(&mut manager, &config, ModelSelection::ANALYSIS, |message, percent| {
            info!(percent, "{message}");
        })?;
        Ok::<_, profile_optimizer::ProfileError>(manager.analyze_batch(&images, &tx, &cancel))
    });

    while let Some(event) = rx.recv().await {
        match event {
            BatchProgress::Started { total } => println!("Analyzing {total} photos..."),
            BatchProgress::Item {
                index,
                total,
                percent,
                path,
            } => println!("[{percent:>3}%] {}/{} {}", index + 1, total, path.display()),
            BatchProgress::Finished { analyzed } => println!("Analyzed {analyzed} photos."),
            BatchProgress::Cancelled { analyzed } => {
                println!("Cancelled after {analyzed} photos.")
            }
        }
    }

    let mut analyses = worker.await??;
    if analyses.is_empty() {
        return Ok(());
    }
    scoring::rank(&mut analyses);
    print_ranking(&analyses);

    report::append_analysis_log(&log_path, &analyses)?;
    let recommendations = report::write_recommendations(&export_dir, &analyses)?;
    println!("\nLogged to {}", log_path.display());
    println!("Top photos written to {}", recommendations.display());
    Ok(())
}

fn print_ranking(analyses: &[PhotoAnalysis]) {
    println!("\n=== Photo ranking ===");
    for (i, a) in analyses.iter().enumerate() {
        let marker = if i < scoring::DEFAULT_TOP_PHOTOS { "*" } else { " " };
        println!(
            "{marker} {:>2}. {:.2}  {:<8} {}",
            i + 1,
            a.attractiveness_score,
            a.sentiment.label,
            display_name(&a.image_path)
        );
        println!("       {}", a.caption);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn generate(config: Config, args: GenerateArgs) -> anyhow::Result<()> {
    let mut user_info = match &args.from_export {
        Some(export) => {
            let (_, profile) = import(&config, export.clone()).await?;
            UserInfo::from_profile(&profile)
        }
        None => UserInfo::default(),
    };

    if args.age.is_some() {
        user_info.age = args.age;
    }
    let overrides = [
        (&mut user_info.occupation, args.occupation),
        (&mut user_info.location, args.location),
        (&mut user_info.interests, args.interests),
        (&mut user_info.personality, args.personality),
        (&mut user_info.looking_for, args.looking_for),
    ];
    for (slot, value) in overrides {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if args.style.is_some() {
        user_info.style = args.style;
    }
    user_info.validate()?;

    let captions = args.captions;
    let export_dir = config.output.export_dir.clone();
    let description = task::spawn_blocking(move || {
        let mut manager = ModelManager::new();
        load_models(&mut manager, &config, ModelSelection::GENERATION, |message, percent| {
            info!(percent, "{message}");
        })?;
        manager.generate_description(&user_info, &captions)
    })
    .await??;

    println!("\n=== Profile description ===\n{description}");
    if args.save {
        let path = report::write_description(&export_dir, &description)?;
        println!("\nSaved to {}", path.display());
    }
    Ok(())
}
