use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::future::join_all;

use roster_ingest::ingest::ExtractionReport;
use roster_ingest::{
    from_manual_text, missing, recall, AppConfig, EngineConfig, Ingestor, NameCandidate, NoisePolicy,
    OcrEngine, SerializedEngine, TesseractEngine,
};

use super::output::{print_names, print_recall, print_rejected};
use crate::OutputFormat;

pub struct ImageOptions {
    pub lang: Option<String>,
    pub psm: Option<u8>,
    pub handwriting: bool,
    pub expect: Option<String>,
    pub min_recall: Option<usize>,
    pub show_rejected: bool,
}

pub async fn cmd_image(
    paths: &[PathBuf],
    options: &ImageOptions,
    config: AppConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut settings = config.engine;
    if let Some(lang) = &options.lang {
        settings.language.clone_from(lang);
    }
    if let Some(psm) = options.psm {
        settings.psm = psm;
    }
    let engine_config = settings.engine_config();
    engine_config.validate()?;

    let mut policy = config.noise;
    if options.handwriting {
        policy.min_alphabetic_ratio = policy
            .min_alphabetic_ratio
            .min(NoisePolicy::handwriting().min_alphabetic_ratio);
    }

    let engine = SerializedEngine::with_workers(TesseractEngine::new(), settings.workers);
    let ingest = Ingestor::with_policy(engine, policy);
    let timeout = settings.timeout();

    let jobs = paths
        .iter()
        .map(|path| read_roster(&ingest, path, &engine_config, timeout));
    let mut names: Vec<NameCandidate> = Vec::new();

    for (path, report) in paths.iter().zip(join_all(jobs).await) {
        let report = report?;
        eprintln!("📷 {}: {} names", path.display(), report.names.len());
        if options.show_rejected {
            print_rejected(&report.rejected);
        }
        names.extend(report.names);
    }

    print_names(&names, format)?;

    if let Some(expect) = &options.expect {
        let expected = from_manual_text(expect);
        let found = recall(&names, &expected);
        print_recall(found, expected.len(), &missing(&names, &expected));

        if let Some(min) = options.min_recall {
            if found < min {
                bail!("recall {found} is below the required {min}");
            }
        }
    }

    Ok(())
}

async fn read_roster<E: OcrEngine>(
    ingest: &Ingestor<E>,
    path: &Path,
    config: &EngineConfig,
    timeout: std::time::Duration,
) -> Result<ExtractionReport> {
    let image = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    match tokio::time::timeout(timeout, ingest.from_image_with_report(&image, config)).await {
        Ok(report) => report.with_context(|| format!("could not read names from {}", path.display())),
        Err(_) => bail!(
            "recognition of {} timed out after {}s",
            path.display(),
            timeout.as_secs()
        ),
    }
}
