use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fretsense_core::calibration::{CalibrationScheme, CalibrationSession, ChannelRole};
use fretsense_core::channel::Roi;
use fretsense_core::io::image_io::{load_channel, save_float_tiff};

use super::{parse_range, parse_rect, read_constants, write_constants};
use crate::summary::print_calibration_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    /// Donor-only control: S1, S3
    S1s3,
    /// Acceptor-only control: S2, S4
    S2s4,
    /// Donor-only control with autofluorescence: S1, S3, S5
    S1s3s5,
    /// Acceptor-only control with autofluorescence: S2, S4, S6
    S2s4s6,
    /// Unlabeled control: B1, B2, B3
    B1b2b3,
}

impl From<SchemeArg> for CalibrationScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::S1s3 => CalibrationScheme::S1S3,
            SchemeArg::S2s4 => CalibrationScheme::S2S4,
            SchemeArg::S1s3s5 => CalibrationScheme::S1S3S5,
            SchemeArg::S2s4s6 => CalibrationScheme::S2S4S6,
            SchemeArg::B1b2b3 => CalibrationScheme::B1B2B3,
        }
    }
}

#[derive(Args)]
pub struct CalibrateArgs {
    /// Calibration factors to compute
    #[arg(long, value_enum)]
    pub scheme: SchemeArg,

    /// Donor channel image of the control sample
    #[arg(long)]
    pub donor: PathBuf,

    /// Transfer channel image of the control sample
    #[arg(long)]
    pub transfer: PathBuf,

    /// Acceptor channel image of the control sample
    #[arg(long)]
    pub acceptor: PathBuf,

    /// Autofluorescence channel image (four-channel schemes)
    #[arg(long)]
    pub autofluorescence: Option<PathBuf>,

    /// Background ROI applied to every channel: "x,y,width,height"
    #[arg(long)]
    pub background_roi: Option<String>,

    /// Constant added to the ROI background, or subtracted alone
    #[arg(long, default_value = "0")]
    pub background_constant: f32,

    /// Gaussian blur sigma applied to every channel
    #[arg(long)]
    pub blur: Option<f32>,

    /// Keep only pixels in "min,max" in every channel
    #[arg(long)]
    pub threshold: Option<String>,

    /// Directory for per-pixel ratio images
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,

    /// Constants file (TOML) updated with the computed factors
    #[arg(long)]
    pub constants: Option<PathBuf>,
}

pub fn run(args: &CalibrateArgs) -> Result<()> {
    let scheme = CalibrationScheme::from(args.scheme);
    let mut session = CalibrationSession::new(scheme);

    let mut inputs = vec![
        (ChannelRole::Donor, &args.donor),
        (ChannelRole::Transfer, &args.transfer),
        (ChannelRole::Acceptor, &args.acceptor),
    ];
    if let Some(ref af) = args.autofluorescence {
        inputs.push((ChannelRole::Autofluorescence, af));
    }

    let rect = args.background_roi.as_deref().map(parse_rect).transpose()?;
    let range = args.threshold.as_deref().map(parse_range).transpose()?;

    for (role, path) in inputs {
        let image =
            load_channel(path).with_context(|| format!("Failed to load {}", path.display()))?;
        let (w, h) = (image.width(), image.height());
        session.set_channel(role, image);

        if rect.is_some() || args.background_constant != 0.0 {
            let mut roi = rect.as_ref().map(|r| Roi::rectangle(r, w, h)).transpose()?;
            let level = session.subtract_background(role, &mut roi, args.background_constant)?;
            println!("Background {role}: {level:.3}");
        }
        if args.blur.is_some() || range.is_some() {
            fretsense_core::filters::smooth_and_threshold(
                session.channel_mut(role)?,
                args.blur,
                range,
            )?;
        }
    }

    let result = session.compute(args.diagnostics.is_some())?;
    print_calibration_summary(&result);

    if let Some(ref dir) = args.diagnostics {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for estimate in &result.estimates {
            if let Some(ref image) = estimate.image {
                let path = dir.join(format!("{}.tif", estimate.factor));
                save_float_tiff(image, &path)?;
                println!("Saved {}", path.display());
            }
        }
    }

    if let Some(ref path) = args.constants {
        let mut constants = read_constants(path)?;
        result.apply_to(&mut constants);
        write_constants(&constants, path)?;
        println!("Constants saved to {}", path.display());
    }

    Ok(())
}
