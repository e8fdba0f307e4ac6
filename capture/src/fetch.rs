use std::time::Duration;

use bytes::BytesMut;
use frame_sieve_common::config::FetchConfig;
use frame_sieve_common::storage::{secure_filename, FrameStore};
use futures_util::StreamExt;
use reqwest::Url;
use tracing::info;

use crate::error::TransferError;

const FALLBACK_NAME: &str = "remote.gif";

/// Downloads GIFs over HTTP into the raw-gif area.
#[derive(Debug, Clone)]
pub struct GifFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl GifFetcher {
    pub fn new(config: &FetchConfig, max_bytes: usize) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, max_bytes })
    }

    /// GET `url` and store the body in the store's gif directory.
    ///
    /// Any non-2xx status is an error. The body is streamed and abandoned as
    /// soon as it passes `max_bytes`; nothing is written in that case.
    pub async fn fetch_into(
        &self,
        url: &str,
        store: &FrameStore,
    ) -> Result<std::path::PathBuf, TransferError> {
        let parsed = Url::parse(url).map_err(|_| TransferError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransferError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(parsed.clone()).send().await?;
        if !response.status().is_success() {
            return Err(TransferError::Status(response.status().as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(TransferError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(TransferError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let name = download_name(&parsed);
        let path = store.save_gif(&name, &body).map_err(TransferError::Store)?;
        info!(url, bytes = body.len(), path = %path.display(), "downloaded gif");
        Ok(path)
    }
}

/// Local name for a downloaded GIF: the sanitized last path segment, with
/// `.gif` appended when missing.
fn download_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match secure_filename(segment) {
        Some(name) if name.to_ascii_lowercase().ends_with(".gif") => name,
        Some(name) => format!("{name}.gif"),
        None => FALLBACK_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a loopback port.
    async fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nContent-Type: image/gif\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn fixture() -> (tempfile::TempDir, FrameStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FrameStore::new(dir.path().join("images"), dir.path().join("gifs"));
        (dir, store)
    }

    #[tokio::test]
    async fn success_is_stored_under_url_name() {
        let (_dir, store) = fixture();
        let base = serve_once("200 OK", b"GIF89a-not-really".to_vec()).await;
        let fetcher = GifFetcher::new(&FetchConfig::default(), 1024).unwrap();

        let path = fetcher
            .fetch_into(&format!("{base}/media/party%20parrot.gif"), &store)
            .await
            .unwrap();

        assert_eq!(path, store.gifs_dir().join("party20parrot.gif"));
        assert_eq!(std::fs::read(&path).unwrap(), b"GIF89a-not-really");
    }

    #[tokio::test]
    async fn non_success_status_is_transfer_error() {
        let (_dir, store) = fixture();
        let base = serve_once("404 Not Found", Vec::new()).await;
        let fetcher = GifFetcher::new(&FetchConfig::default(), 1024).unwrap();

        let err = fetcher
            .fetch_into(&format!("{base}/missing.gif"), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Status(404)));
        assert!(!store.gifs_dir().exists());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (_dir, store) = fixture();
        let base = serve_once("200 OK", vec![0u8; 64]).await;
        let fetcher = GifFetcher::new(&FetchConfig::default(), 16).unwrap();

        let err = fetcher
            .fetch_into(&format!("{base}/big.gif"), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::TooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let (_dir, store) = fixture();
        let fetcher = GifFetcher::new(&FetchConfig::default(), 16).unwrap();
        let err = fetcher
            .fetch_into("ftp://example.test/a.gif", &store)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidUrl(_)));
    }

    #[test]
    fn download_names() {
        let name = |u: &str| download_name(&Url::parse(u).unwrap());
        assert_eq!(name("https://x.test/a/b/cat.gif"), "cat.gif");
        assert_eq!(name("https://x.test/a/b/cat.GIF?size=large"), "cat.GIF");
        assert_eq!(name("https://x.test/render/42"), "42.gif");
        assert_eq!(name("https://x.test/"), "remote.gif");
    }
}
