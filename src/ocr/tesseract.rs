//! Tesseract worker process engine
//!
//! Streams the image to `tesseract stdin stdout ... tsv` and rebuilds text
//! lines from the word-level TSV rows.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{EngineConfig, OcrEngine, OcrError, RawOcrLine, Result};

/// TSV `level` value for word rows.
const WORD_LEVEL: u32 = 5;
/// Columns in a tesseract TSV row; `text` is last.
const TSV_COLUMNS: usize = 12;

/// Recognizes text by running a tesseract worker per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TesseractEngine;

impl TesseractEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check that the configured worker starts and answers `--version`.
    pub async fn is_available(config: &EngineConfig) -> bool {
        Command::new(resolve_worker(&config.worker))
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Engine arguments for one invocation, excluding the worker itself.
    pub fn build_args(config: &EngineConfig) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            config.language.clone(),
            "--psm".to_string(),
            config.psm.to_string(),
        ];

        if let Some(dir) = &config.data_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }

        args.extend(config.extra_args.iter().cloned());
        args.push("tsv".to_string());
        args
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8], config: &EngineConfig) -> Result<Vec<RawOcrLine>> {
        config.validate()?;

        let worker = resolve_worker(&config.worker);
        let args = Self::build_args(config);
        debug!("tesseract command: {} {:?}", worker.display(), args);

        let start = Instant::now();
        let mut child = Command::new(&worker)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                worker: worker.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Output("worker stdin was not captured".to_string()))?;

        let feed = async move {
            stdin.write_all(image).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("tesseract failed with {}: {stderr}", output.status);
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr,
            });
        }
        // A worker that exits cleanly without draining stdin still has to be reported.
        fed?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Output(format!("TSV is not valid UTF-8: {e}")))?;
        let lines = parse_tsv(&stdout)?;

        info!(
            "tesseract recognized {} lines in {:.0}ms",
            lines.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(lines)
    }
}

/// Find the worker in `PATH`, falling back to the configured value.
fn resolve_worker(worker: &Path) -> PathBuf {
    which::which(worker).unwrap_or_else(|_| worker.to_path_buf())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineKey {
    page: u32,
    block: u32,
    paragraph: u32,
    line: u32,
}

#[derive(Debug)]
struct LineAccumulator {
    key: LineKey,
    words: Vec<String>,
    confidences: Vec<f32>,
}

impl LineAccumulator {
    fn into_line(self) -> RawOcrLine {
        let confidence = if self.confidences.is_empty() {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = self.confidences.len() as f32;
            Some(self.confidences.iter().sum::<f32>() / count)
        };

        RawOcrLine {
            text: self.words.join(" "),
            confidence,
        }
    }
}

/// Rebuild text lines from tesseract TSV output, in engine order.
///
/// Word rows sharing `(page, block, paragraph, line)` form one line; its
/// confidence is the mean of the word confidences the engine reported.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RawOcrLine>> {
    let mut rows = tsv.lines();

    match rows.next() {
        Some(header) if header.starts_with("level") => {}
        Some(other) => {
            let preview: String = other.chars().take(80).collect();
            return Err(OcrError::Output(format!("missing TSV header, got: {preview}")));
        }
        None => return Err(OcrError::Output("empty TSV output".to_string())),
    }

    let mut lines: Vec<LineAccumulator> = Vec::new();

    for (index, row) in rows.enumerate() {
        if row.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = row.splitn(TSV_COLUMNS, '\t').collect();
        if cols.len() < TSV_COLUMNS - 1 {
            return Err(OcrError::Output(format!(
                "TSV row {} has {} columns",
                index + 2,
                cols.len()
            )));
        }

        let number = |i: usize| -> Result<u32> {
            cols[i].trim().parse().map_err(|_| {
                OcrError::Output(format!("TSV row {} column {i} is not a number", index + 2))
            })
        };

        if number(0)? != WORD_LEVEL {
            continue;
        }

        let text = cols.get(11).map_or("", |t| t.trim());
        if text.is_empty() {
            continue;
        }

        let key = LineKey {
            page: number(1)?,
            block: number(2)?,
            paragraph: number(3)?,
            line: number(4)?,
        };
        let confidence = cols[10].trim().parse::<f32>().ok().filter(|c| *c >= 0.0);

        let slot = match lines.iter().rposition(|l| l.key == key) {
            Some(slot) => slot,
            None => {
                lines.push(LineAccumulator {
                    key,
                    words: Vec::new(),
                    confidences: Vec::new(),
                });
                lines.len() - 1
            }
        };

        let current = &mut lines[slot];
        current.words.push(text.to_string());
        current.confidences.extend(confidence);
    }

    Ok(lines.into_iter().map(LineAccumulator::into_line).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn groups_words_into_lines() {
        let input = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t10\t200\t30\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t80\t30\t96.0\tJohn",
            "5\t1\t1\t1\t1\t2\t95\t10\t90\t30\t90.0\tDoe",
            "5\t1\t1\t1\t2\t1\t10\t50\t80\t30\t88.5\tJane",
            "5\t1\t1\t1\t2\t2\t95\t50\t90\t30\t87.5\tSmith",
        ]);

        let lines = parse_tsv(&input).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "John Doe");
        assert_eq!(lines[0].confidence, Some(93.0));
        assert_eq!(lines[1].text, "Jane Smith");
        assert_eq!(lines[1].confidence, Some(88.0));
    }

    #[test]
    fn keeps_engine_order_across_blocks() {
        let input = tsv(&[
            "5\t1\t2\t1\t1\t1\t0\t0\t1\t1\t80\tZed",
            "5\t1\t1\t1\t1\t1\t0\t0\t1\t1\t80\tAmy",
        ]);
        let lines = parse_tsv(&input).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["Zed", "Amy"]);
    }

    #[test]
    fn skips_blank_words_and_negative_confidence() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t0\t0\t1\t1\t95\t ",
            "5\t1\t1\t1\t1\t2\t0\t0\t1\t1\t-1\tMike",
        ]);
        let lines = parse_tsv(&input).unwrap();
        assert_eq!(lines, vec![RawOcrLine::new("Mike")]);
    }

    #[test]
    fn header_only_means_no_lines() {
        assert!(parse_tsv(HEADER).unwrap().is_empty());
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(matches!(parse_tsv(""), Err(OcrError::Output(_))));
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(parse_tsv("Error opening data file").is_err());
        assert!(parse_tsv(&tsv(&["5\t1\tx"])).is_err());
        assert!(parse_tsv(&tsv(&["5\tone\t1\t1\t1\t1\t0\t0\t1\t1\t90\tName"])).is_err());
    }

    #[test]
    fn builds_arguments_from_config() {
        let config = EngineConfig {
            language: "eng+fra".to_string(),
            psm: 4,
            data_dir: Some(PathBuf::from("/opt/tessdata")),
            extra_args: vec!["-c".to_string(), "preserve_interword_spaces=1".to_string()],
            ..EngineConfig::default()
        };
        let args = TesseractEngine::build_args(&config);
        assert_eq!(
            args,
            [
                "stdin",
                "stdout",
                "-l",
                "eng+fra",
                "--psm",
                "4",
                "--tessdata-dir",
                "/opt/tessdata",
                "-c",
                "preserve_interword_spaces=1",
                "tsv"
            ]
        );
    }

    #[tokio::test]
    async fn missing_worker_is_a_spawn_error() {
        let config = EngineConfig {
            worker: PathBuf::from("/nonexistent/roster-ingest/tesseract"),
            ..EngineConfig::default()
        };
        let result = TesseractEngine::new().recognize(b"not an image", &config).await;
        assert!(matches!(result, Err(OcrError::Spawn { .. })));
        assert!(!TesseractEngine::is_available(&config).await);
    }

    /// Write an executable shell script standing in for tesseract.
    #[cfg(unix)]
    fn script_worker(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn worker_output_becomes_lines() {
        let dir = tempfile::tempdir().unwrap();
        // Echoes the language argument and the number of image bytes read from stdin
        let worker = script_worker(
            &dir,
            r#"size=$(wc -c | tr -d ' ')
printf 'level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n'
printf '5\t1\t1\t1\t1\t1\t10\t10\t80\t30\t96\tJohn\n'
printf '5\t1\t1\t1\t1\t2\t95\t10\t90\t30\t90\tDoe\n'
printf '5\t1\t1\t1\t2\t1\t10\t50\t80\t30\t80\t%s\n' "$4"
printf '5\t1\t1\t1\t3\t1\t10\t90\t80\t30\t70\t%s\n' "$size""#,
        );
        let config = EngineConfig {
            worker,
            language: "deu".to_string(),
            ..EngineConfig::default()
        };

        let lines = TesseractEngine::new().recognize(b"fake png", &config).await.unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["John Doe", "deu", "8"]);
        assert_eq!(lines[0].confidence, Some(93.0));
        assert!(TesseractEngine::is_available(&config).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_worker_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let worker = script_worker(
            &dir,
            "cat > /dev/null\necho 'Error in pixReadMem: Unknown format' >&2\nexit 1",
        );
        let config = EngineConfig {
            worker,
            ..EngineConfig::default()
        };

        let err = TesseractEngine::new().recognize(b"not an image", &config).await.unwrap_err();
        match err {
            OcrError::EngineFailed { status, stderr } => {
                assert!(status.contains('1'));
                assert_eq!(stderr, "Error in pixReadMem: Unknown format");
            }
            other => panic!("expected EngineFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn worker_exiting_without_output_is_engine_failure() {
        let config = EngineConfig {
            worker: PathBuf::from("false"),
            ..EngineConfig::default()
        };
        let result = TesseractEngine::new().recognize(b"png", &config).await;
        assert!(matches!(result, Err(OcrError::EngineFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn worker_ignoring_stdin_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let worker = script_worker(&dir, "exit 0");
        let config = EngineConfig {
            worker,
            ..EngineConfig::default()
        };

        // Larger than a pipe buffer, so the write fails once the worker is gone
        let image = vec![0_u8; 4 * 1024 * 1024];
        let result = TesseractEngine::new().recognize(&image, &config).await;
        assert!(matches!(result, Err(OcrError::Io(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn invalid_config_fails_before_spawning() {
        let config = EngineConfig {
            psm: 99,
            ..EngineConfig::default()
        };
        let result = TesseractEngine::new().recognize(b"", &config).await;
        assert!(matches!(result, Err(OcrError::InvalidConfig(_))));
    }
}
