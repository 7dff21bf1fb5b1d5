//! Default model acquisition.
//!
//! A fresh download stays under `<file>.part` until the classifier has
//! loaded it, so a file that is not a usable model never becomes the cached
//! default.

use std::path::{Path, PathBuf};

use anyhow::Context;
use litton7_core::model::verify_checksum;
use litton7_core::Config;

/// The default model file, and whether it is already trusted.
#[derive(Debug, PartialEq)]
pub enum DefaultModel {
    /// Found in the model directory from an earlier run
    Cached(PathBuf),
    /// Fetched this run and not yet moved into place
    Downloaded { staged: PathBuf, dest: PathBuf },
}

impl DefaultModel {
    /// The file to load.
    pub fn path(&self) -> &Path {
        match self {
            DefaultModel::Cached(path) => path,
            DefaultModel::Downloaded { staged, .. } => staged,
        }
    }

    /// Keep a model that loaded, moving a fresh download into place.
    pub fn commit(self) {
        if let DefaultModel::Downloaded { staged, dest } = self {
            match std::fs::rename(&staged, &dest) {
                Ok(()) => tracing::info!("Model cached at {:?}", dest),
                Err(e) => tracing::warn!("Could not cache model at {:?}: {}", dest, e),
            }
        }
    }

    /// Delete a model that failed to load so the next run fetches it again.
    pub fn discard(self) {
        let path = match self {
            DefaultModel::Cached(path) => path,
            DefaultModel::Downloaded { staged, .. } => staged,
        };
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::warn!("Removed unusable model {:?}", path),
            Err(e) => tracing::warn!("Could not remove unusable model {:?}: {}", path, e),
        }
    }
}

/// The default model, downloading it first if it is not on disk.
pub async fn ensure_default_model(config: &Config) -> anyhow::Result<DefaultModel> {
    fetch_default_model(&reqwest::Client::new(), config).await
}

async fn fetch_default_model(
    client: &reqwest::Client,
    config: &Config,
) -> anyhow::Result<DefaultModel> {
    let dest = config.default_model_path();
    if dest.is_file() {
        tracing::debug!("Using cached model at {:?}", dest);
        return Ok(DefaultModel::Cached(dest));
    }

    let model_dir = config.model_dir();
    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("creating model directory {}", model_dir.display()))?;

    println!("Downloading model to {}...", dest.display());
    tracing::info!("Downloading model from {}", config.model.download_url);

    let expected = config.model.blake3.as_deref();
    if expected.is_none() {
        tracing::warn!("No model.blake3 digest configured, the download is kept only if it loads");
    }

    let staged = partial_path(&dest);
    download_file(client, &config.model.download_url, &staged, expected)
        .await
        .with_context(|| format!("downloading {}", config.model.download_url))?;

    let file_size = std::fs::metadata(&staged)?.len();
    tracing::info!(
        "Model download complete ({:.1} MB)",
        file_size as f64 / (1024.0 * 1024.0)
    );
    Ok(DefaultModel::Downloaded { staged, dest })
}

/// Stream `url` into `path`, verifying the BLAKE3 digest when one is given.
///
/// Nothing is left at `path` if the transfer or the check fails.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    let result = stream_to_file(client, url, path).await.and_then(|()| {
        expected_blake3.map_or(Ok(()), |expected| verify_blake3(path, expected))
    });
    if result.is_err() && path.exists() {
        let _ = std::fs::remove_file(path);
    }
    result
}

async fn stream_to_file(client: &reqwest::Client, url: &str, path: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

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

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Verify a downloaded file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let matches = verify_checksum(path, expected)
        .with_context(|| format!("Checksum computation failed for {}", path.display()))?;

    if !matches {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}, expected {}. Corrupt file removed, run again to re-download.",
            path.display(),
            expected
        );
    }

    tracing::debug!("  Checksum verified: {}", expected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use litton7_core::model::content_hash;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Answer a single GET with `body` and return the URL to fetch.
    async fn serve_once(body: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/model.onnx")
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    fn config_in(dir: &Path, url: String, blake3: Option<String>) -> Config {
        let mut config = Config::default();
        config.general.model_dir = dir.to_path_buf();
        config.model.download_url = url;
        config.model.blake3 = blake3;
        config
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_partial_path_keeps_directory() {
        let dest = Path::new("/models/litton.onnx");
        assert_eq!(partial_path(dest), PathBuf::from("/models/litton.onnx.part"));
    }

    #[test]
    fn test_checksum_mismatch_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx.part");
        std::fs::write(&path, b"truncated").unwrap();

        assert!(verify_blake3(&path, "deadbeef").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_checksum_match_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx.part");
        std::fs::write(&path, b"weights").unwrap();
        let digest = content_hash(&path).unwrap();

        assert!(verify_blake3(&path, &digest.to_uppercase()).is_ok());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_cached_model_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "http://127.0.0.1:9/unreachable".into(), None);
        std::fs::write(dir.path().join(&config.model.file_name), b"onnx").unwrap();

        let model = ensure_default_model(&config).await.unwrap();
        assert_eq!(
            model,
            DefaultModel::Cached(dir.path().join(&config.model.file_name))
        );
    }

    #[tokio::test]
    async fn test_mismatching_download_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"<html>confirm download</html>").await;
        let config = config_in(dir.path(), url, Some("00".repeat(32)));

        let err = fetch_default_model(&client(), &config).await.unwrap_err();

        assert!(format!("{err:#}").contains("Checksum mismatch"));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unverified_download_is_staged_until_committed() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"weights").await;
        let config = config_in(dir.path(), url, None);
        let dest = config.default_model_path();

        let model = fetch_default_model(&client(), &config).await.unwrap();

        assert_eq!(model.path(), partial_path(&dest));
        assert!(!dest.exists());
        model.commit();
        assert_eq!(std::fs::read(&dest).unwrap(), b"weights");
        assert_eq!(files_in(dir.path()), vec![dest]);
    }

    #[tokio::test]
    async fn test_download_that_fails_to_load_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"not an onnx graph").await;
        let config = config_in(dir.path(), url, None);

        let model = fetch_default_model(&client(), &config).await.unwrap();
        model.discard();

        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_discarding_cached_model_deletes_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"pickle").unwrap();

        DefaultModel::Cached(path.clone()).discard();
        assert!(!path.exists());
    }
}
