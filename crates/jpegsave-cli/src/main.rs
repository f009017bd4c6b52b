//! `jpegsave` - save an image as JPEG to a file, or as a MIME response on stdout.

mod logger;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use jpegsave_core::sink::has_jpeg_suffix;
use jpegsave_core::{
    load_image, save_to_buffer, save_to_file, save_to_stream, ProfileDirective, Quality,
    SaveOptions,
};
use tracing::{error, info, warn};

/// Save an image as JPEG
#[derive(Parser, Debug)]
#[command(name = "jpegsave")]
#[command(version, about, long_about = None)]
struct Args {
    /// Image to convert
    input: PathBuf,

    /// JPEG file to write; without it a MIME response is written to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Quality factor (1 to 100)
    #[arg(short = 'Q', long, default_value_t = i32::from(Quality::DEFAULT.get()), allow_negative_numbers = true)]
    quality: i32,

    /// ICC profile to embed, or "none" to embed no profile
    #[arg(long)]
    profile: Option<String>,

    /// Encode to memory and report the size instead of writing anything
    #[arg(long, conflicts_with = "output")]
    measure: bool,
}

impl Args {
    fn save_options(&self) -> SaveOptions {
        SaveOptions::builder()
            .quality(self.quality)
            .profile_directive(ProfileDirective::from_option(self.profile.as_deref()))
            .build()
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let image = load_image(&args.input)?;
    let options = args.save_options();

    info!(
        input = %args.input.display(),
        width = image.width(),
        height = image.height(),
        bands = image.bands(),
        quality = options.quality,
        profile = %options.profile,
        "Saving image as JPEG"
    );

    if args.measure {
        let jpeg = save_to_buffer(&image, &options)?;
        info!(bytes = jpeg.len(), "Encoded size");
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            warn_on_suffix(path);
            save_to_file(&image, path, &options)?;
        }
        None => save_to_stream(&image, &options)?,
    }

    Ok(())
}

fn warn_on_suffix(path: &Path) {
    if !has_jpeg_suffix(path) {
        warn!(output = %path.display(), "Output name doesn't end in .jpg, .jpeg or .jpe");
    }
}

fn main() -> ExitCode {
    logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("jpegsave failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
