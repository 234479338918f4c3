use std::fs;

use relsentry::{export, ConfigOverrides, Relsentry, SentryConfig};

fn parse_arg(flag: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = parse_arg("--config");
    let overrides = ConfigOverrides {
        data_dir: parse_arg("--data-dir").map(Into::into),
        definitions_path: parse_arg("--definitions").map(Into::into),
        report: None,
    };
    let mut config = SentryConfig::load(config_path.as_deref(), overrides)?;
    if let Some(out) = parse_arg("--out") {
        config.report.reports_dir = out.into();
    }

    let mut sentry = Relsentry::open(config)?;

    let data_dir = sentry.config().data_dir.clone();
    let summary = sentry.import_dir(&data_dir)?;
    for (kind, count) in &summary.counts {
        println!("Imported {} {} records", count, kind);
    }

    let report = sentry.run_alerts();
    let statistics = sentry.statistics(&report.findings);

    let reports_dir = sentry.config().report.reports_dir.clone();
    fs::create_dir_all(&reports_dir)?;
    fs::write(
        reports_dir.join("alerts.csv"),
        export::findings_to_csv(&report.findings)?,
    )?;
    fs::write(
        reports_dir.join("report.md"),
        export::render_report(&statistics, &report.findings),
    )?;

    println!(
        "Evaluated {} rules ({} failed): {} findings across {} accounts",
        report.rules_evaluated + report.rules_failed,
        report.rules_failed,
        statistics.totals.total_findings,
        statistics.totals.accounts_with_findings,
    );
    println!("Report artifacts written to {}", reports_dir.display());

    Ok(())
}
