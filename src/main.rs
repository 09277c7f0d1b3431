//! `iiif-view` command line front-end.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};

    use clap::{Parser, Subcommand};
    use serde::Serialize;

    use iiif_view::iiif_resource::{Manifest, Point, ResourceNode};
    use iiif_view::{
        AnnotationLayers, AnnotationList, CanvasWorld, HitTester, LogLevel, SizeConstraints, ViewerConfig,
        ViewerError,
    };

    #[derive(Debug, Parser)]
    #[command(name = "iiif-view", version, about = "IIIF deep-zoom viewer core tools")]
    struct Cli {
        /// Configuration file (defaults to the platform config directory)
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        /// Log level: error, warn, info, debug or trace
        #[arg(long, global = true)]
        log_level: Option<String>,

        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Debug, Subcommand)]
    enum Commands {
        /// Resolve the preview image of a resource
        Thumbnail {
            resource: PathBuf,
            #[arg(long)]
            max_width: Option<u32>,
            #[arg(long)]
            max_height: Option<u32>,
        },
        /// Report the annotations at a world point of a manifest
        Hit {
            manifest: PathBuf,
            annotations: PathBuf,
            #[arg(long, allow_negative_numbers = true)]
            x: f64,
            #[arg(long, allow_negative_numbers = true)]
            y: f64,
        },
    }

    #[derive(Debug, Serialize)]
    struct HitReport {
        canvas: Option<String>,
        hits: Vec<String>,
        selected: Option<String>,
    }

    fn read(path: &Path) -> Result<String, ViewerError> {
        if !path.exists() {
            return Err(ViewerError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn load_config(path: Option<&Path>) -> Result<ViewerConfig, ViewerError> {
        match path {
            Some(path) => Ok(ViewerConfig::load(path)?),
            None => Ok(ViewerConfig::load_from_default_path().unwrap_or_default()),
        }
    }

    fn init_logging(config: &ViewerConfig, override_level: Option<&str>) {
        let level = match override_level {
            Some(name) => LogLevel::from_name(name).unwrap_or_else(|| {
                eprintln!("Unknown log level '{}', using {:?}", name, config.log_level);
                config.log_level
            }),
            None => config.log_level,
        };
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .init();
    }

    fn print_json<T: Serialize>(value: &T) -> Result<(), ViewerError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn run() -> Result<(), ViewerError> {
        let cli = Cli::parse();
        let config = load_config(cli.config.as_deref())?;
        init_logging(&config, cli.log_level.as_deref());

        match cli.command {
            Commands::Thumbnail {
                resource,
                max_width,
                max_height,
            } => {
                let node = ResourceNode::from_json(&read(&resource)?)?;
                let constraints = SizeConstraints::new(max_width, max_height);
                match config.thumbnail_resolver().resolve(&node, constraints) {
                    Some(thumbnail) => print_json(&thumbnail)?,
                    None => println!("no preview"),
                }
            }
            Commands::Hit {
                manifest,
                annotations,
                x,
                y,
            } => {
                let manifest: Manifest = serde_json::from_str(&read(&manifest)?)?;
                let list = AnnotationList::from_json(&read(&annotations)?)?;
                let world = CanvasWorld::from_manifest(&manifest);
                let layers = AnnotationLayers::new(vec![list], Vec::new());
                let options = config.hit_test_options();
                let tester = HitTester::new(&world, &layers, &options);

                let point = Point::new(x, y);
                let canvas = world.canvas_at_point(point);
                let report = HitReport {
                    canvas: canvas.map(|canvas| canvas.id.clone()),
                    hits: canvas
                        .map(|canvas| tester.hit_test(canvas, point))
                        .unwrap_or_default()
                        .into_iter()
                        .map(|annotation| annotation.id.clone())
                        .collect(),
                    selected: tester.select_at(point).map(|(_, annotation)| annotation.id.clone()),
                };
                print_json(&report)?;
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
