use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fretsense_core::channel::Roi;
use fretsense_core::io::image_io::load_channel_stack;
use fretsense_core::stats::{image_statistics, mean_intensity};

use super::parse_rect;

#[derive(Args)]
pub struct InfoArgs {
    /// Channel image (TIFF, PNG or BMP)
    pub file: PathBuf,

    /// Also report the mean intensity inside "x,y,width,height"
    #[arg(long)]
    pub roi: Option<String>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let stack = load_channel_stack(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let roi = args
        .roi
        .as_deref()
        .map(parse_rect)
        .transpose()?
        .map(|rect| Roi::rectangle(&rect, stack.width(), stack.height()))
        .transpose()?;

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", stack.width(), stack.height());
    println!("Slices:      {}", stack.len());

    for (i, slice) in stack.slices.iter().enumerate() {
        let stats = image_statistics(&slice.data, None);
        println!(
            "Slice {:<4}  valid {}/{}  mean {:.3}  min {:.3}  max {:.3}",
            i + 1,
            stats.valid_count,
            stats.pixel_count,
            stats.mean,
            stats.min,
            stats.max
        );
        if let Some(ref roi) = roi {
            println!("            ROI mean {:.3}", mean_intensity(&slice.data, Some(roi)));
        }
    }

    Ok(())
}
