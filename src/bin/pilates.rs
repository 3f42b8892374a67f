//! pilates CLI - PNG inspection and pixel transforms
//!
//! Decodes a PNG, applies the requested transforms in a fixed order and
//! writes the result back out as PNG.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{debug, info};

use pilates::{
    AddAlpha, FilterStrategy, Grayscale, Image, Invert, PngOptions, RemoveAlpha, Resize,
    SortPixels, Transform, Truecolour,
};

/// Decode, transform and re-encode PNG images.
#[derive(Parser, Debug)]
#[command(name = "pilates")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PNG file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (defaults to INPUT with a `.out.png` extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print the header and text attributes, then exit
    #[arg(long)]
    info: bool,

    /// Convert truecolour to grayscale
    #[arg(long, conflicts_with = "truecolour")]
    grayscale: bool,

    /// Convert grayscale to truecolour
    #[arg(long)]
    truecolour: bool,

    /// Add an opaque alpha channel
    #[arg(long, conflicts_with = "remove_alpha")]
    add_alpha: bool,

    /// Drop the alpha channel
    #[arg(long)]
    remove_alpha: bool,

    /// Invert colour samples
    #[arg(long)]
    invert: bool,

    /// Resize to WIDTHxHEIGHT with bilinear sampling
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Sort pixels by brightness
    #[arg(long)]
    sort: bool,

    /// Sort in descending order (with --sort)
    #[arg(long, requires = "sort")]
    reverse: bool,

    /// PNG compression level (1-9, higher = smaller file)
    #[arg(short = 'c', long, default_value = "6", value_parser = clap::value_parser!(u8).range(1..=9))]
    compression: u8,

    /// PNG filter strategy
    #[arg(long, value_enum, default_value = "none")]
    filter: FilterArg,

    /// PNG preset (overrides compression/filter when set)
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Do not write tEXt chunks
    #[arg(long)]
    no_text: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    /// No filter (fastest)
    None,
    /// Sub filter
    Sub,
    /// Up filter
    Up,
    /// Average filter
    Average,
    /// Paeth filter
    Paeth,
    /// Adaptive filter selection (best compression)
    Adaptive,
}

impl From<FilterArg> for FilterStrategy {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::None => FilterStrategy::None,
            FilterArg::Sub => FilterStrategy::Sub,
            FilterArg::Up => FilterStrategy::Up,
            FilterArg::Average => FilterStrategy::Average,
            FilterArg::Paeth => FilterStrategy::Paeth,
            FilterArg::Adaptive => FilterStrategy::Adaptive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Level 1, no filtering
    Fast,
    /// Level 9, adaptive filtering
    Max,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut img = Image::open(&args.input)?;
    debug!("Loaded {:?} in {:.2?}", args.input, start.elapsed());

    if args.info {
        print_info(&img);
        return Ok(());
    }

    for transform in transforms(&args) {
        transform.apply(&mut img)?;
    }

    let options = match args.preset {
        Some(PresetArg::Fast) => PngOptions::fast(),
        Some(PresetArg::Max) => PngOptions::max_compression(),
        None => PngOptions {
            compression_level: args.compression,
            filter_strategy: args.filter.into(),
            write_text: true,
        },
    };
    let options = PngOptions {
        write_text: !args.no_text,
        ..options
    };

    let encode_start = Instant::now();
    let output_data = img.encode_with_options(&options)?;
    let output_path = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    fs::write(&output_path, &output_data)?;

    let input_size = fs::metadata(&args.input)?.len();
    info!(
        "{:?}: {}x{}, {} -> {} in {:.2?}",
        output_path,
        img.width(),
        img.height(),
        format_size(input_size),
        format_size(output_data.len() as u64),
        encode_start.elapsed()
    );
    Ok(())
}

/// Transforms in the order they are applied.
fn transforms(args: &Args) -> Vec<Box<dyn Transform>> {
    let mut list: Vec<Box<dyn Transform>> = Vec::new();
    if args.grayscale {
        list.push(Box::new(Grayscale));
    }
    if args.truecolour {
        list.push(Box::new(Truecolour));
    }
    if args.add_alpha {
        list.push(Box::new(AddAlpha));
    }
    if args.remove_alpha {
        list.push(Box::new(RemoveAlpha));
    }
    if args.invert {
        list.push(Box::new(Invert));
    }
    if let Some((width, height)) = args.resize {
        list.push(Box::new(Resize::new(width, height)));
    }
    if args.sort {
        list.push(Box::new(SortPixels {
            reverse: args.reverse,
        }));
    }
    list
}

fn print_info(img: &Image) {
    println!("Dimensions: {}x{}", img.width(), img.height());
    println!("Color type: {:?}", img.color_type());
    println!("Bit depth: {}", img.bit_depth());
    if !img.palette().is_empty() {
        println!("Palette entries: {}", img.palette().len());
    }
    let mut text: Vec<_> = img.text_attributes().iter().collect();
    text.sort();
    for (keyword, value) in text {
        println!("{keyword}: {value}");
    }
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("out.png")
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
