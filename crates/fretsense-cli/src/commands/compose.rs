use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fretsense_core::calibration::{parse_constant, CalibrationConstants, ChannelRole};
use fretsense_core::channel::Roi;
use fretsense_core::correction::BackgroundSettings;
use fretsense_core::io::image_io::{load_channel_stack, save_float_tiff_stack, save_preview_png};
use fretsense_core::pipeline::FretSession;
use fretsense_core::results::ResultsTable;

use super::{parse_range, parse_rect, read_constants};
use crate::summary::print_results;

#[derive(Args)]
pub struct ComposeArgs {
    /// Donor channel image
    #[arg(long)]
    pub donor: PathBuf,

    /// Transfer channel image
    #[arg(long)]
    pub transfer: PathBuf,

    /// Acceptor channel image
    #[arg(long)]
    pub acceptor: PathBuf,

    /// Constants file (TOML) written by `calibrate` / `alpha`
    #[arg(long)]
    pub constants: Option<PathBuf>,

    /// Override S1
    #[arg(long)]
    pub s1: Option<String>,

    /// Override S2
    #[arg(long)]
    pub s2: Option<String>,

    /// Override S3
    #[arg(long)]
    pub s3: Option<String>,

    /// Override S4
    #[arg(long)]
    pub s4: Option<String>,

    /// Override alpha
    #[arg(long)]
    pub alpha: Option<String>,

    /// Background ROI applied to every channel: "x,y,width,height"
    #[arg(long)]
    pub background_roi: Option<String>,

    /// Constant added to the ROI background, or subtracted alone
    #[arg(long, default_value = "0")]
    pub background_constant: f32,

    /// Gaussian blur sigma applied to every channel
    #[arg(long)]
    pub blur: Option<f32>,

    /// Keep only channel pixels in "min,max"
    #[arg(long)]
    pub threshold: Option<String>,

    /// Mask FRET efficiencies outside "min,max"
    #[arg(long)]
    pub fret_threshold: Option<String>,

    /// Restrict statistics to "x,y,width,height"
    #[arg(long)]
    pub measure_roi: Option<String>,

    /// Output file path (32-bit float TIFF)
    #[arg(short, long, default_value = "fret.tif")]
    pub output: PathBuf,

    /// Also write an 8-bit PNG preview next to the output
    #[arg(long)]
    pub preview: bool,
}

fn constants_from_args(args: &ComposeArgs) -> Result<CalibrationConstants> {
    let mut constants = match args.constants {
        Some(ref path) => read_constants(path)?,
        None => CalibrationConstants::default(),
    };
    let overrides = [
        ("S1", &args.s1, &mut constants.s1),
        ("S2", &args.s2, &mut constants.s2),
        ("S3", &args.s3, &mut constants.s3),
        ("S4", &args.s4, &mut constants.s4),
        ("alpha", &args.alpha, &mut constants.alpha),
    ];
    for (name, text, slot) in overrides {
        if let Some(text) = text {
            if let Some(value) = parse_constant(name, text)? {
                *slot = Some(value);
            }
        }
    }
    Ok(constants)
}

pub fn run(args: &ComposeArgs) -> Result<()> {
    let constants = constants_from_args(args)?;
    let mut session = FretSession::new(constants);

    let background = BackgroundSettings {
        roi: args.background_roi.as_deref().map(parse_rect).transpose()?,
        constant: args.background_constant,
    };
    let range = args.threshold.as_deref().map(parse_range).transpose()?;
    let fret_range = args.fret_threshold.as_deref().map(parse_range).transpose()?;

    let inputs = [
        (ChannelRole::Donor, &args.donor),
        (ChannelRole::Transfer, &args.transfer),
        (ChannelRole::Acceptor, &args.acceptor),
    ];
    for (role, path) in inputs {
        let stack = load_channel_stack(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        session.set_channel(role, stack)?;
        if background.is_enabled() {
            let levels = session.subtract_background(role, &background)?;
            println!("Background {role}: {levels:.3?}");
        }
        if args.blur.is_some() || range.is_some() {
            session.smooth_and_threshold(role, args.blur, range)?;
        }
    }

    let (width, height) = session
        .channel(ChannelRole::Donor)
        .map(|s| (s.width(), s.height()))
        .unwrap_or_default();
    session.compose(fret_range)?;

    let roi = args
        .measure_roi
        .as_deref()
        .map(parse_rect)
        .transpose()?
        .map(|rect| Roi::rectangle(&rect, width, height))
        .transpose()?;
    let statistics = session.measure(roi.as_ref())?;

    let mut table = ResultsTable::new();
    let stacked = statistics.len() > 1;
    for (i, stats) in statistics.into_iter().enumerate() {
        let label = if stacked {
            format!("FRET:{}", i + 1)
        } else {
            "FRET".to_string()
        };
        table.push(None, label, stats);
    }
    print_results(&table);

    let images = session.output().unwrap_or_default();
    save_float_tiff_stack(&images.iter().collect::<Vec<_>>(), &args.output)?;
    println!("Saved to {}", args.output.display());

    if args.preview {
        if let Some(first) = images.first() {
            let path = args.output.with_extension("png");
            save_preview_png(first, &path)?;
            println!("Preview saved to {}", path.display());
        }
    }
    Ok(())
}
