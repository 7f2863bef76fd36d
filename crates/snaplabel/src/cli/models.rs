//! The `snaplabel models` command for fetching and inspecting the model.

use clap::{Args, Subcommand};
use futures_util::{Stream, StreamExt};
use snaplabel_core::checksum::{self, Verification};
use snaplabel_core::inference::onnx::{LABELS_FILENAME, MODEL_FILENAME};
use snaplabel_core::Config;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the configured model and its label file
    Download,

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// Where a known model name is published.
struct ModelSource {
    name: &'static str,
    model_url: &'static str,
    labels_url: &'static str,
}

const IMAGENET_LABELS_URL: &str =
    "https://raw.githubusercontent.com/onnx/models/main/validated/vision/classification/synset.txt";

const SOURCES: &[ModelSource] = &[ModelSource {
    name: "mobilenetv2-12",
    model_url: "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx",
    labels_url: IMAGENET_LABELS_URL,
}];

/// Which files of the configured model are on disk.
pub struct InstalledModel {
    pub model: bool,
    pub labels: bool,
}

impl InstalledModel {
    /// Labels are optional; the classifier falls back to `class_N` names.
    pub fn can_classify(&self) -> bool {
        self.model
    }
}

/// Check which files of the configured model are installed.
pub fn check_installed(config: &Config) -> InstalledModel {
    let dir = config.model_variant_dir();
    InstalledModel {
        model: dir.join(MODEL_FILENAME).exists(),
        labels: dir.join(LABELS_FILENAME).exists(),
    }
}

/// Download the configured model and labels. Skips files already present.
pub async fn download(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    let name = config.model.name.as_str();
    let Some(source) = SOURCES.iter().find(|s| s.name == name) else {
        anyhow::bail!(
            "No download source known for model '{name}'.\n  \
             Place {MODEL_FILENAME} (and optionally {LABELS_FILENAME}) in {} by hand.",
            config.model_variant_dir().display()
        );
    };

    let dir = config.model_variant_dir();
    std::fs::create_dir_all(&dir)?;

    let model_dest = dir.join(MODEL_FILENAME);
    if model_dest.exists() {
        tracing::info!("Model already exists at {:?}", model_dest);
    } else {
        tracing::info!("Downloading {}...", source.name);
        tracing::info!("  Source: {}", source.model_url);
        tracing::info!("  Destination: {:?}", model_dest);
        download_file(client, source.model_url, &model_dest, config.model.blake3.as_deref())
            .await?;
        let file_size = std::fs::metadata(&model_dest)?.len();
        tracing::info!(
            "  Model complete ({:.1} MB)",
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    let labels_dest = dir.join(LABELS_FILENAME);
    if labels_dest.exists() {
        tracing::info!("Labels already exist at {:?}", labels_dest);
    } else {
        tracing::info!("Downloading labels...");
        tracing::info!("  Source: {}", source.labels_url);
        download_file(client, source.labels_url, &labels_dest, None).await?;
        tracing::info!("  Labels complete");
    }

    Ok(())
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download => {
            let client = reqwest::Client::new();
            download(config, &client).await?;
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `snaplabel models download` to download the model.");
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            let mut names: Vec<String> = SOURCES.iter().map(|s| s.name.to_string()).collect();
            if !names.contains(&config.model.name) {
                names.push(config.model.name.clone());
            }

            for name in names {
                let dir = model_dir.join(&name);
                let status = match (
                    dir.join(MODEL_FILENAME).exists(),
                    dir.join(LABELS_FILENAME).exists(),
                ) {
                    (true, true) => "ready",
                    (true, false) => "ready (no labels)",
                    _ => "not installed",
                };
                let default_marker = if name == config.model.name {
                    "  (configured)"
                } else {
                    ""
                };
                println!("  - {:30} {:18}{}", name, status, default_marker);
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_variant_dir().display());
        }
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Bytes land in `<dest>.part` and are renamed into place only once the
/// stream completes (and, if `expected_blake3` is given, the hash matches).
/// Any failure removes the partial file, so `dest` never holds a truncated
/// download.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    save_stream(response.bytes_stream(), total_size, dest, expected_blake3).await
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn save_stream<S, B, E>(
    stream: S,
    total_size: Option<u64>,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let part = part_path(dest);
    let result = write_part(stream, total_size, &part, expected_blake3).await;
    match result {
        Ok(()) => {
            tokio::fs::rename(&part, dest).await?;
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

async fn write_part<S, B, E>(
    stream: S,
    total_size: Option<u64>,
    part: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    futures_util::pin_mut!(stream);
    let mut file = tokio::fs::File::create(part).await?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        file.write_all(chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (4 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);

    if let Some(expected) = expected_blake3 {
        verify_blake3(part, expected)?;
    }

    Ok(())
}

/// Check a downloaded file against its pinned BLAKE3 hash.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let verification = checksum::verify(path, expected)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    match verification {
        Verification::Match => {
            tracing::debug!("  Checksum verified");
            Ok(())
        }
        Verification::Mismatch { actual } => {
            let _ = std::fs::remove_file(path);
            anyhow::bail!(
                "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
                 Corrupt file removed, try downloading again.",
                path.display(),
                expected,
                actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_blake3_correct_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello snaplabel").unwrap();
        let expected = checksum::file_hash(&path).unwrap();

        assert!(verify_blake3(&path, &expected).is_ok());
        assert!(path.exists(), "file should survive a successful verify");
    }

    #[test]
    fn verify_blake3_wrong_hash_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello snaplabel").unwrap();

        let err = verify_blake3(&path, &"0".repeat(64)).unwrap_err().to_string();

        assert!(err.contains("Checksum mismatch"), "{err}");
        assert!(err.contains("Corrupt file removed"), "{err}");
        assert!(!path.exists(), "corrupt file should be deleted");
    }

    #[test]
    fn verify_blake3_missing_file() {
        assert!(verify_blake3(Path::new("/nonexistent/model.onnx"), &"0".repeat(64)).is_err());
    }

    fn chunks(
        items: Vec<Result<Vec<u8>, std::io::Error>>,
    ) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
        futures_util::stream::iter(items)
    }

    #[tokio::test]
    async fn completed_stream_lands_at_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");

        save_stream(chunks(vec![Ok(b"on".to_vec()), Ok(b"nx".to_vec())]), Some(4), &dest, None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"onnx");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn interrupted_stream_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let stream = chunks(vec![
            Ok(b"partial".to_vec()),
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset)),
        ]);

        assert!(save_stream(stream, Some(1 << 20), &dest, None).await.is_err());

        assert!(!dest.exists(), "truncated download must not look installed");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn pinned_hash_mismatch_keeps_dest_absent() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");

        let err = save_stream(chunks(vec![Ok(b"onnx".to_vec())]), None, &dest, Some(&"0".repeat(64)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Checksum mismatch"));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/m/model.onnx")),
            PathBuf::from("/m/model.onnx.part")
        );
    }

    #[test]
    fn check_installed_reads_variant_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();

        assert!(!check_installed(&config).can_classify());

        let variant = config.model_variant_dir();
        std::fs::create_dir_all(&variant).unwrap();
        std::fs::write(variant.join(MODEL_FILENAME), b"onnx").unwrap();

        let installed = check_installed(&config);
        assert!(installed.can_classify());
        assert!(!installed.labels);
    }

    #[tokio::test]
    async fn download_unknown_model_explains_manual_install() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();
        config.model.name = "my-resnet".into();

        let err = download(&config, &reqwest::Client::new())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("my-resnet"));
        assert!(err.contains(MODEL_FILENAME));
    }
}
