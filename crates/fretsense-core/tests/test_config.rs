use std::path::PathBuf;

use fretsense_core::calibration::ChannelRole;
use fretsense_core::channel::RoiRect;
use fretsense_core::filters::ThresholdRange;
use fretsense_core::pipeline::config::SessionConfig;
use fretsense_core::pipeline::{PipelineStage, PipelineStep};

#[test]
fn test_default_config_roundtrip() {
    let config = SessionConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: SessionConfig = toml::from_str(&text).unwrap();

    assert_eq!(parsed.output_dir, Some(PathBuf::from("fret")));
    assert_eq!(parsed.samples.len(), 1);
    assert_eq!(parsed.samples[0].donor, PathBuf::from("donor.tif"));
    assert_eq!(parsed.smoothing.map(|s| s.sigma), Some(2.0));
    assert_eq!(
        parsed.fret.auto_threshold,
        Some(ThresholdRange { min: 0.0, max: 1.0 })
    );
    assert!(parsed.constants.s1.is_none());
}

#[test]
fn test_default_steps() {
    let steps = SessionConfig::default().steps();
    assert_eq!(steps.len(), 4);
    assert!(matches!(
        steps[0],
        PipelineStep::SmoothAndThreshold {
            role: ChannelRole::Donor,
            sigma: Some(_),
            range: None
        }
    ));
    assert!(matches!(
        steps[3],
        PipelineStep::Compose {
            threshold: Some(_)
        }
    ));
}

#[test]
fn test_steps_follow_correction_order() {
    let config: SessionConfig = toml::from_str(
        r#"
        [background.acceptor]
        roi = { x = 0, y = 0, width = 4, height = 4 }
        constant = 1.5

        [threshold]
        donor = { min = 10.0, max = 4000.0 }

        [fret]

        [[samples]]
        donor = "d.tif"
        transfer = "t.tif"
        acceptor = "a.tif"
        "#,
    )
    .unwrap();

    assert!(config.output_dir.is_none());
    assert!(config.fret.auto_threshold.is_none());
    let steps = config.steps();
    assert_eq!(steps.len(), 3);
    match &steps[0] {
        PipelineStep::SubtractBackground { role, settings } => {
            assert_eq!(*role, ChannelRole::Acceptor);
            assert_eq!(settings.constant, 1.5);
            assert_eq!(
                settings.roi,
                Some(RoiRect {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4
                })
            );
        }
        other => panic!("unexpected first step {other:?}"),
    }
    assert_eq!(
        steps[1],
        PipelineStep::SmoothAndThreshold {
            role: ChannelRole::Donor,
            sigma: None,
            range: Some(ThresholdRange {
                min: 10.0,
                max: 4000.0
            }),
        }
    );
    assert_eq!(steps[2], PipelineStep::Compose { threshold: None });
}

#[test]
fn test_constants_parse_from_config() {
    let config: SessionConfig = toml::from_str(
        r#"
        [constants]
        s1 = 0.5
        alpha = 1.2

        [[samples]]
        label = "cell"
        donor = "d.tif"
        transfer = "t.tif"
        acceptor = "a.tif"
        "#,
    )
    .unwrap();
    assert_eq!(config.constants.s1, Some(0.5));
    assert_eq!(config.constants.alpha, Some(1.2));
    assert!(config.constants.s2.is_none());
    assert_eq!(config.samples[0].label.as_deref(), Some("cell"));
}

#[test]
fn test_reversed_threshold_rejected_on_load() {
    let text = r#"
        [threshold]
        acceptor = { min = 5.0, max = 1.0 }

        [[samples]]
        donor = "d.tif"
        transfer = "t.tif"
        acceptor = "a.tif"
        "#;
    let err = toml::from_str::<SessionConfig>(text).unwrap_err();
    assert!(err.to_string().contains("Invalid threshold range"));

    let auto = r#"
        [fret]
        auto_threshold = { min = 1.0, max = 0.0 }

        [[samples]]
        donor = "d.tif"
        transfer = "t.tif"
        acceptor = "a.tif"
        "#;
    assert!(toml::from_str::<SessionConfig>(auto).is_err());
}

#[test]
fn test_stage_display() {
    assert_eq!(PipelineStage::Composing.to_string(), "Composing FRET image");
    assert_eq!(PipelineStage::Background.to_string(), "Subtracting background");
}
