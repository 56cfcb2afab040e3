use console::Style;
use fretsense_core::calibration::{CalibrationConstants, CalibrationResult};
use fretsense_core::pipeline::config::SessionConfig;
use fretsense_core::results::ResultsTable;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    warning: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            warning: Style::new().yellow().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_calibration_summary(result: &CalibrationResult) {
    let s = Styles::new();
    print_title(&s, "Calibration");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Scheme"),
        s.value.apply_to(result.scheme)
    );
    println!();

    for estimate in &result.estimates {
        let value = if estimate.value.is_finite() {
            s.value.apply_to(format!("{:.6}", estimate.value))
        } else {
            s.warning.apply_to(format!("{}", estimate.value))
        };
        println!(
            "    {:<12}{}  {}",
            s.label.apply_to(estimate.factor),
            value,
            s.label
                .apply_to(format!("({} pixels)", estimate.valid_count))
        );
    }
    println!();
}

fn print_constants(s: &Styles, constants: &CalibrationConstants) {
    let entries = [
        ("S1", constants.s1),
        ("S2", constants.s2),
        ("S3", constants.s3),
        ("S4", constants.s4),
        ("alpha", constants.alpha),
    ];
    for (name, value) in entries {
        match value {
            Some(v) if v > 0.0 => {
                println!("    {:<12}{}", s.label.apply_to(name), s.value.apply_to(v))
            }
            Some(v) => println!("    {:<12}{}", s.label.apply_to(name), s.warning.apply_to(v)),
            None => println!(
                "    {:<12}{}",
                s.label.apply_to(name),
                s.disabled.apply_to("unset")
            ),
        }
    }
}

pub fn print_session_summary(config: &SessionConfig) {
    let s = Styles::new();
    print_title(&s, "FRET Session");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Samples"),
        s.value.apply_to(config.samples.len())
    );
    match config.output_dir {
        Some(ref dir) => println!(
            "  {:<14}{}",
            s.label.apply_to("Output"),
            s.path.apply_to(dir.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Output"),
            s.disabled.apply_to("not written")
        ),
    }
    match config.smoothing {
        Some(ref smoothing) => println!(
            "  {:<14}{}",
            s.label.apply_to("Blur sigma"),
            s.value.apply_to(smoothing.sigma)
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Blur"),
            s.disabled.apply_to("disabled")
        ),
    }
    if let Some(range) = config.fret.auto_threshold {
        println!(
            "  {:<14}{}",
            s.label.apply_to("FRET range"),
            s.value.apply_to(format!("[{}, {}]", range.min, range.max))
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Constants"));
    print_constants(&s, &config.constants);
    println!();
}

pub fn print_results(table: &ResultsTable) {
    print!("{}", table.to_tsv());
}
