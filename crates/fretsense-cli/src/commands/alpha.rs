use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use fretsense_core::calibration::{
    calibrate_alpha, AlphaInputs, BleachingMeasurements, EpsRatioSource,
};

use super::{read_constants, write_constants};

#[derive(Args)]
pub struct AlphaArgs {
    /// Average intensity of the donor-only sample (I1)
    #[arg(long)]
    pub i1: f64,

    /// Average intensity of the acceptor-only sample (I2)
    #[arg(long)]
    pub i2: f64,

    /// Labels per donor antibody (Ld)
    #[arg(long)]
    pub ld: f64,

    /// Labels per acceptor antibody (La)
    #[arg(long)]
    pub la: f64,

    /// Donor receptors per cell (Nd)
    #[arg(long)]
    pub nd: f64,

    /// Acceptor receptors per cell (Na)
    #[arg(long)]
    pub na: f64,

    /// Known molar absorption coefficient ratio εd/εa
    #[arg(long)]
    pub eps_ratio: Option<f64>,

    /// Photobleaching averages "d_before,d_after,dd,dt,aa"
    #[arg(long)]
    pub bleaching: Option<String>,

    /// Known bleaching FRET efficiency, skipping its computation
    #[arg(long)]
    pub ebl: Option<f64>,

    /// Constants file (TOML) supplying S1/S2/S4 and receiving alpha
    #[arg(long)]
    pub constants: Option<PathBuf>,
}

pub fn run(args: &AlphaArgs) -> Result<()> {
    let source = match (args.eps_ratio, args.bleaching.as_deref()) {
        (Some(eps), None) => EpsRatioSource::Manual(eps),
        (None, Some(text)) => {
            let values: Vec<f64> = text
                .split(',')
                .map(|s| s.trim().parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| anyhow::anyhow!("Invalid bleaching averages: {text:?}"))?;
            if values.len() != 5 {
                bail!("Bleaching requires exactly 5 values: d_before,d_after,dd,dt,aa");
            }
            EpsRatioSource::Bleaching {
                measurements: BleachingMeasurements {
                    d_before: values[0],
                    d_after: values[1],
                    dd: values[2],
                    dt: values[3],
                    aa: values[4],
                },
                ebl: args.ebl,
            }
        }
        (Some(_), Some(_)) => bail!("Give either --eps-ratio or --bleaching, not both"),
        (None, None) => bail!("Either --eps-ratio or --bleaching is required"),
    };

    let mut constants = match args.constants {
        Some(ref path) => read_constants(path)?,
        None => Default::default(),
    };

    let inputs = AlphaInputs {
        i1: args.i1,
        i2: args.i2,
        ld: args.ld,
        la: args.la,
        nd: args.nd,
        na: args.na,
    };
    let alpha = calibrate_alpha(&inputs, &source, &mut constants)?;

    if let Some(ebl) = constants.ebl {
        println!("Ebl:        {ebl:.6}");
    }
    if let Some(eps) = constants.eps_ratio {
        println!("εd/εa:      {eps:.6}");
    }
    println!("alpha:      {alpha:.6}");

    if let Some(ref path) = args.constants {
        write_constants(&constants, path)?;
        println!("Constants saved to {}", path.display());
    }
    Ok(())
}
