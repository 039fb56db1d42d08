use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use styllo_skin::cli::Args;
use styllo_skin::face::{FaceDetector, FullFrameDetector, ModelHandle, StaticDetector};
use styllo_skin::pipeline::detect::load_image;
use styllo_skin::tui::{self, TuiApp};
use styllo_skin::{DetectionError, DetectionResult, DetectorConfig, SkinToneDetector};

type BoxedDetector = Box<dyn FaceDetector + Send + Sync>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let config = build_config(&args)?;
    let detector = SkinToneDetector::new(config);

    let image = match load_image(&args.image) {
        Ok(image) => image,
        Err(e) => return Ok(report_failure(&e)),
    };

    let model: ModelHandle<BoxedDetector> = ModelHandle::new();
    let face_path = args.face.clone();
    let outcome = detector
        .analyze_with_model(&image, &model, || async move {
            let loaded: BoxedDetector = match face_path {
                Some(path) => {
                    let text = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read face geometry: {}", path.display()))?;
                    Box::new(StaticDetector::from_json(&text)?)
                }
                None => {
                    log::warn!("no face geometry given, treating the whole image as the face");
                    Box::new(FullFrameDetector)
                }
            };
            Ok::<_, anyhow::Error>(loaded)
        })
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => return Ok(report_failure(&e)),
    };

    if args.tui {
        tui::run(TuiApp {
            result,
            image_path: args.image,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &result).context("failed to write JSON")?;
        writeln!(stdout)?;
    } else {
        write_summary(&mut stdout, &result)?;
    }
    if args.preview {
        tui::print_preview(&mut stdout, &result)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn report_failure(err: &DetectionError) -> ExitCode {
    log::error!("{err}");
    eprintln!("{}", err.user_message());
    ExitCode::FAILURE
}

/// Config file values, then command-line overrides.
fn build_config(args: &Args) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_path(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(k) = args.clusters {
        config.clustering.k = k;
    }
    if args.seed.is_some() {
        config.clustering.seed = args.seed;
    }
    if let Some(min) = args.min_pixels {
        config.min_pixels = min;
    }
    config.detailed |= args.detailed;
    Ok(config)
}

fn write_summary(out: &mut impl Write, result: &DetectionResult) -> std::io::Result<()> {
    writeln!(out, "tone:        {}", result.tone)?;
    if let Some(undertone) = result.undertone {
        writeln!(out, "undertone:   {undertone}")?;
    }
    writeln!(out, "confidence:  {:.2}", result.confidence)?;
    writeln!(
        out,
        "lab:         L {:.1}  a {:.1}  b {:.1}",
        result.lab.l, result.lab.a, result.lab.b
    )?;
    writeln!(out, "rgb:         {}", result.rgb)?;
    writeln!(out, "pixels:      {}", result.pixel_count)?;
    Ok(())
}
