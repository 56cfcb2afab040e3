use std::path::PathBuf;
use std::sync::Arc;

use ndarray::Array2;
use tracing::info;

use crate::channel::{ensure_matching_stacks, ChannelStack, Roi};
use crate::error::{FretError, Result};
use crate::io::image_io::{load_channel_stack, save_float_tiff_stack};
use crate::results::ResultsTable;
use crate::stats::ImageStatistics;

use super::config::{SampleSet, SessionConfig, FRET_ROLES};
use super::session::FretSession;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// FRET images and statistics of one sample.
#[derive(Clone, Debug)]
pub struct SampleOutput {
    pub label: String,
    /// One FRET image per slice.
    pub images: Vec<Array2<f32>>,
    pub statistics: Vec<ImageStatistics>,
    pub written: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct SessionOutput {
    pub results: ResultsTable,
    pub samples: Vec<SampleOutput>,
}

fn sample_label(sample: &SampleSet) -> String {
    sample.label.clone().unwrap_or_else(|| {
        sample
            .donor
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".into())
    })
}

fn load_sample(sample: &SampleSet, reporter: &dyn ProgressReporter) -> Result<Vec<ChannelStack>> {
    reporter.begin_stage(PipelineStage::Loading, Some(FRET_ROLES.len()));
    let mut stacks = Vec::with_capacity(FRET_ROLES.len());
    for (i, role) in FRET_ROLES.into_iter().enumerate() {
        let path = sample
            .path(role)
            .ok_or_else(|| FretError::MissingImage(role.to_string()))?;
        stacks.push(load_channel_stack(path)?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    ensure_matching_stacks(&stacks.iter().collect::<Vec<_>>())?;
    Ok(stacks)
}

/// Run the session's steps on one sample.
pub fn run_sample(
    config: &SessionConfig,
    sample: &SampleSet,
    reporter: &dyn ProgressReporter,
) -> Result<SampleOutput> {
    let label = sample_label(sample);
    let stacks = load_sample(sample, reporter)?;
    let (width, height) = (stacks[0].width(), stacks[0].height());

    let mut session = FretSession::new(config.constants.clone());
    for (role, stack) in FRET_ROLES.into_iter().zip(stacks) {
        session.set_channel(role, stack)?;
    }
    session.run_steps(&config.steps(), reporter)?;

    let roi = config
        .fret
        .measure_roi
        .as_ref()
        .map(|rect| Roi::rectangle(rect, width, height))
        .transpose()?;
    let statistics = session.measure(roi.as_ref())?;
    let images = session.output().map(|o| o.to_vec()).unwrap_or_default();

    let written = match config.output_dir {
        Some(ref dir) => {
            reporter.begin_stage(PipelineStage::Writing, None);
            std::fs::create_dir_all(dir)?;
            let path = dir.join(format!("{label}_fret.tif"));
            save_float_tiff_stack(&images.iter().collect::<Vec<_>>(), &path)?;
            reporter.finish_stage();
            info!(path = %path.display(), "FRET image written");
            Some(path)
        }
        None => None,
    };

    Ok(SampleOutput {
        label,
        images,
        statistics,
        written,
    })
}

/// Run every sample of the session with a progress reporter.
///
/// With more than one sample, result rows carry the sample label in the
/// "File" column.
pub fn run_session_reported(
    config: &SessionConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<SessionOutput> {
    let batch = config.samples.len() > 1;
    let mut output = SessionOutput::default();

    for sample in &config.samples {
        let result = run_sample(config, sample, reporter.as_ref())?;
        let stacked = result.statistics.len() > 1;
        for (i, stats) in result.statistics.iter().enumerate() {
            let label = if stacked {
                format!("FRET:{}", i + 1)
            } else {
                "FRET".to_string()
            };
            let file = batch.then(|| result.label.clone());
            output.results.push(file, label, stats.clone());
        }
        info!(sample = %result.label, "Sample processed");
        output.samples.push(result);
    }
    Ok(output)
}

/// Run every sample of the session.
pub fn run_session(config: &SessionConfig) -> Result<SessionOutput> {
    run_session_reported(config, Arc::new(NoOpReporter))
}
