use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fretsense_core::io::image_io::{load_channel, save_image};
use fretsense_core::ratio::{partition_by_mask, ratio};

#[derive(Args)]
pub struct RatioArgs {
    /// Numerator image
    pub numerator: PathBuf,

    /// Denominator image
    pub denominator: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = "ratio.tif")]
    pub output: PathBuf,
}

pub fn run_ratio(args: &RatioArgs) -> Result<()> {
    let a = load_channel(&args.numerator)
        .with_context(|| format!("Failed to load {}", args.numerator.display()))?;
    let b = load_channel(&args.denominator)
        .with_context(|| format!("Failed to load {}", args.denominator.display()))?;

    let result = ratio(&a.data, &b.data)?;
    save_image(&result, &args.output)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}

#[derive(Args)]
pub struct PartitionArgs {
    /// Image to split
    pub image: PathBuf,

    /// Mask image; NaN pixels are background
    pub mask: PathBuf,

    /// Output for pixels inside the mask
    #[arg(long, default_value = "in_mask.tif")]
    pub inside: PathBuf,

    /// Output for pixels outside the mask
    #[arg(long, default_value = "out_of_mask.tif")]
    pub outside: PathBuf,
}

pub fn run_partition(args: &PartitionArgs) -> Result<()> {
    let image = load_channel(&args.image)
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    let mask = load_channel(&args.mask)
        .with_context(|| format!("Failed to load {}", args.mask.display()))?;

    let (inside, outside) = partition_by_mask(&image.data, &mask.data)?;
    save_image(&inside, &args.inside)?;
    save_image(&outside, &args.outside)?;
    println!(
        "Saved {} and {}",
        args.inside.display(),
        args.outside.display()
    );
    Ok(())
}
