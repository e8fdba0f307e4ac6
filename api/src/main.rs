mod form;
mod page;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use frame_sieve_capture::gif::{extract_frames, resolve_gif_path};
use frame_sieve_capture::{capture_animation, Error as CoreError, GifFetcher, SamplerOptions, WebDriverLauncher};
use frame_sieve_common::config::{Config, SamplerConfig};
use frame_sieve_common::storage::FrameStore;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use form::{FormError, FormFields, FrontEndRequest};

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

struct AppState {
    store: FrameStore,
    sampler: SamplerConfig,
    allowed_extensions: Vec<String>,
    launcher: WebDriverLauncher,
    fetcher: GifFetcher,
    /// Serializes everything that writes to or wipes the shared directories.
    jobs: Mutex<()>,
}

impl AppState {
    fn new(config: &Config) -> Result<Self, CoreError> {
        Ok(Self {
            store: FrameStore::from_config(&config.storage),
            sampler: config.sampler.clone(),
            allowed_extensions: config.storage.allowed_extensions.clone(),
            launcher: WebDriverLauncher::new(config.browser.clone()),
            fetcher: GifFetcher::new(&config.fetch, config.storage.max_upload_bytes)?,
            jobs: Mutex::new(()),
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Anything the user's input caused is reported as a client error.
            AppError::Core(_) | AppError::Form(_) => {
                warn!(error = %self, "request failed");
                (StatusCode::BAD_REQUEST, format!("An error occurred: {self}")).into_response()
            }
            AppError::Storage(_) | AppError::Join(_) => {
                error!(error = %self, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operations (one per request shape)
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Outcome {
    /// Show the page with the current listing.
    Listing,
    /// Go back to the empty form.
    Redirect,
}

async fn dispatch(state: &AppState, request: FrontEndRequest) -> Result<Outcome, AppError> {
    if request == FrontEndRequest::ShowPage {
        return Ok(Outcome::Listing);
    }

    let _guard = state.jobs.lock().await;
    match request {
        FrontEndRequest::Animate {
            url,
            frames,
            interval_ms,
            browser,
        } => {
            let mut options = SamplerOptions::from_config(&state.sampler);
            if let Some(frames) = frames {
                options.frames = frames;
            }
            if let Some(ms) = interval_ms {
                options.interval = Duration::from_millis(ms);
            }
            let engine = browser.unwrap_or_else(|| state.sampler.default_browser.clone());
            let report = capture_animation(
                &state.launcher,
                &engine,
                &url,
                &options,
                state.store.frames_dir(),
            )
            .await?;
            info!(url, kept = ?report.kept, skipped = report.skipped.len(), "capture complete");
        }
        FrontEndRequest::LocalGif { path } => {
            decode(state, resolve_gif_path(&path)).await?;
        }
        FrontEndRequest::Clear => {
            let store = state.store.clone();
            tokio::task::spawn_blocking(move || store.clear()).await??;
            return Ok(Outcome::Redirect);
        }
        FrontEndRequest::RemoteGif { url } => {
            let path = state
                .fetcher
                .fetch_into(&url, &state.store)
                .await
                .map_err(CoreError::from)?;
            decode(state, path).await?;
        }
        FrontEndRequest::Upload { file_name, data } => {
            let store = state.store.clone();
            let path =
                tokio::task::spawn_blocking(move || store.save_gif(&file_name, &data)).await??;
            decode(state, path).await?;
        }
        FrontEndRequest::ShowPage => {}
    }
    Ok(Outcome::Listing)
}

async fn decode(state: &AppState, gif_path: PathBuf) -> Result<(), AppError> {
    let output_dir = state.store.frames_dir().to_path_buf();
    tokio::task::spawn_blocking(move || extract_frames(&gif_path, &output_dir))
        .await?
        .map_err(CoreError::from)?;
    Ok(())
}

async fn current_listing(store: &FrameStore) -> Result<Vec<String>, AppError> {
    let store = store.clone();
    Ok(tokio::task::spawn_blocking(move || store.list_frames()).await??)
}

fn content_type_for(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET / — forms plus whatever is currently in the frame directory
async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let images = current_listing(&state.store).await?;
    Ok(Html(page::render_index(
        &images,
        &state.sampler.default_browser,
        state.sampler.frames,
    )))
}

/// POST / — multipart form; see `form::FormFields::into_request` for dispatch
async fn submit(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let request = FormFields::from_multipart(multipart)
        .await?
        .into_request(&state.allowed_extensions)?;

    match dispatch(&state, request).await? {
        Outcome::Redirect => Ok(Redirect::to("/").into_response()),
        Outcome::Listing => {
            let images = current_listing(&state.store).await?;
            Ok(Html(page::render_index(
                &images,
                &state.sampler.default_browser,
                state.sampler.frames,
            ))
            .into_response())
        }
    }
}

/// GET /images/:filename — a single saved frame
async fn serve_image(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Response {
    let Some(path) = state.store.frame_path(&filename) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(&filename))], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, path = %path.display(), "failed to read frame");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameListing {
    frames: Vec<String>,
}

/// GET /api/frames — the same listing as JSON
async fn list_frames(State(state): State<Arc<AppState>>) -> Result<Json<FrameListing>, AppError> {
    let frames = current_listing(&state.store).await?;
    Ok(Json(FrameListing { frames }))
}

fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/images/:filename", get(serve_image))
        .route("/api/frames", get(list_frames))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let state = match AppState::new(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };
    if let Err(e) = state.store.ensure() {
        error!(error = %e, "failed to create storage directories");
        std::process::exit(1);
    }

    info!(
        frames_dir = %config.storage.frames_dir.display(),
        gifs_dir = %config.storage.gifs_dir.display(),
        default_browser = config.sampler.default_browser,
        hash = ?config.sampler.hash_algorithm,
        "storage ready"
    );

    let app = router(state, config.storage.max_upload_bytes);

    let addr = config.bind_addr();
    info!(addr, "frame-sieve server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to bind to {addr}: {e}");
        std::process::exit(1);
    });
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_sieve_capture::{ConfigurationError, TransferError};
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};

    fn test_state(dir: &Path) -> Arc<AppState> {
        let mut config = Config::default();
        config.storage.frames_dir = dir.join("images");
        config.storage.gifs_dir = dir.join("gifs");
        let state = AppState::new(&config).unwrap();
        state.store.ensure().unwrap();
        Arc::new(state)
    }

    fn write_two_frame_gif(path: &Path) {
        let frames = [[0u8, 0, 0, 255], [255, 255, 255, 255]].map(|color| {
            Frame::from_parts(
                RgbaImage::from_pixel(4, 4, Rgba(color)),
                0,
                0,
                Delay::from_numer_denom_ms(50, 1),
            )
        });
        let mut encoder = GifEncoder::new(std::fs::File::create(path).unwrap());
        encoder.encode_frames(frames).unwrap();
    }

    #[tokio::test]
    async fn local_gif_is_decoded_into_listing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let gif = dir.path().join("two.gif");
        write_two_frame_gif(&gif);

        let outcome = dispatch(
            &state,
            FrontEndRequest::LocalGif {
                path: format!("file://{}", gif.display()),
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Listing));
        assert_eq!(
            current_listing(&state.store).await.unwrap(),
            vec!["frame_0.png", "frame_1.png"]
        );
    }

    #[tokio::test]
    async fn upload_is_stored_then_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let src = dir.path().join("src.gif");
        write_two_frame_gif(&src);

        dispatch(
            &state,
            FrontEndRequest::Upload {
                file_name: "dance.gif".into(),
                data: std::fs::read(&src).unwrap(),
            },
        )
        .await
        .unwrap();

        assert!(state.store.gifs_dir().join("dance.gif").exists());
        assert_eq!(current_listing(&state.store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clear_redirects_and_empties_both_areas() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        std::fs::write(state.store.frames_dir().join("frame_1.png"), b"x").unwrap();
        state.store.save_gif("a.gif", b"x").unwrap();

        let outcome = dispatch(&state, FrontEndRequest::Clear).await.unwrap();

        assert!(matches!(outcome, Outcome::Redirect));
        assert!(current_listing(&state.store).await.unwrap().is_empty());
        assert!(!state.store.gifs_dir().join("a.gif").exists());
    }

    #[tokio::test]
    async fn bad_browser_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let err = dispatch(
            &state,
            FrontEndRequest::Animate {
                url: "https://example.test".into(),
                frames: Some(2),
                interval_ms: Some(0),
                browser: Some("netscape".into()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::Core(CoreError::Configuration(ConfigurationError::UnsupportedEngine(_)))
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_gif_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let err = dispatch(
            &state,
            FrontEndRequest::LocalGif {
                path: dir.path().join("nope.gif").display().to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    /// Answer one HTTP request with a fixed status and body.
    async fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
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

    #[tokio::test]
    async fn remote_gif_is_fetched_and_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let src = dir.path().join("src.gif");
        write_two_frame_gif(&src);
        let base = serve_once("200 OK", std::fs::read(&src).unwrap()).await;

        let outcome = dispatch(
            &state,
            FrontEndRequest::RemoteGif {
                url: format!("{base}/loops/spin.gif"),
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Listing));
        assert!(state.store.gifs_dir().join("spin.gif").exists());
        assert_eq!(
            current_listing(&state.store).await.unwrap(),
            vec!["frame_0.png", "frame_1.png"]
        );
    }

    #[tokio::test]
    async fn remote_gif_not_found_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let base = serve_once("404 Not Found", Vec::new()).await;

        let err = dispatch(
            &state,
            FrontEndRequest::RemoteGif {
                url: format!("{base}/gone.gif"),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::Core(CoreError::Transfer(TransferError::Status(404)))
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).starts_with("An error occurred: "));
        assert!(current_listing(&state.store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_route_serves_frames_and_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        std::fs::write(state.store.frames_dir().join("frame_1.png"), b"png").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let ok = serve_image(State(Arc::clone(&state)), AxumPath("frame_1.png".into())).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[header::CONTENT_TYPE], "image/png");

        let missing = serve_image(State(Arc::clone(&state)), AxumPath("frame_9.png".into())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let escape = serve_image(State(state), AxumPath("../secret.txt".into())).await;
        assert_eq!(escape.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("frame_1.png"), "image/png");
        assert_eq!(content_type_for("a.GIF"), "image/gif");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }
}
