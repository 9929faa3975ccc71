//! Localhost capture endpoint.
//!
//! The popup has no way to ask the browser for its active tab, so the flow is
//! inverted: a companion hotkey in the browser posts the current page here,
//! and receiving a capture is what opens the popup. The companion scans the
//! port range below for whichever port the endpoint managed to bind.

use crate::Result;
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use url::Url;

const PORT_RANGE: RangeInclusive<u16> = 7480..=7490;

/// A page waiting to be bookmarked: the active tab's title and URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabCapture {
    pub title: String,
    pub url: String,
}

#[derive(Clone)]
struct CaptureState {
    on_capture: Arc<dyn Fn(TabCapture) + Send + Sync>,
}

#[derive(Deserialize)]
struct CaptureRequest {
    #[serde(default)]
    title: String,
    url: String,
}

#[derive(Serialize)]
struct CaptureResponse {
    message: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "message": self.message }));
        (self.status, body).into_response()
    }
}

async fn handle_capture(
    State(state): State<CaptureState>,
    Json(request): Json<CaptureRequest>,
) -> std::result::Result<Json<CaptureResponse>, ApiError> {
    let tab = normalize_capture(&request.title, &request.url).map_err(|message| ApiError {
        status: StatusCode::BAD_REQUEST,
        message,
    })?;

    info!("capture received: {}", tab.url);
    (state.on_capture)(tab);

    Ok(Json(CaptureResponse {
        message: "Capture received.".to_string(),
    }))
}

/// Validates a posted page. The URL must parse as absolute; a blank title
/// falls back to the URL itself, matching how tabs without titles behave.
fn normalize_capture(title: &str, url: &str) -> std::result::Result<TabCapture, String> {
    let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid url: {}", e))?;
    let title = title.trim();
    let title = if title.is_empty() {
        parsed.as_str().to_string()
    } else {
        title.to_string()
    };
    Ok(TabCapture { title, url: parsed.into() })
}

/// Runs the capture endpoint until the process exits. `on_capture` is called
/// once per valid capture, from the server's worker threads.
pub async fn serve(on_capture: impl Fn(TabCapture) + Send + Sync + 'static) -> Result<()> {
    // Find an available port in the companion's scan range.
    let mut port = None;
    for p in PORT_RANGE {
        match TcpListener::bind(format!("127.0.0.1:{}", p)).await {
            Ok(_) => {
                port = Some(p);
                break;
            }
            Err(_) => continue,
        }
    }
    let port = port.ok_or_else(|| {
        format!(
            "no available ports in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        )
    })?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let state = CaptureState {
        on_capture: Arc::new(on_capture),
    };

    let app = Router::new()
        .route("/capture", post(handle_capture))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("capture endpoint listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_capture_passes_through() {
        let tab = normalize_capture("Rust Blog", "https://blog.rust-lang.org/").unwrap();
        assert_eq!(tab.title, "Rust Blog");
        assert_eq!(tab.url, "https://blog.rust-lang.org/");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let tab = normalize_capture("  Rust Blog \n", " https://blog.rust-lang.org/ ").unwrap();
        assert_eq!(tab.title, "Rust Blog");
        assert_eq!(tab.url, "https://blog.rust-lang.org/");
    }

    #[test]
    fn blank_title_falls_back_to_the_url() {
        let tab = normalize_capture("   ", "https://example.com/page").unwrap();
        assert_eq!(tab.title, "https://example.com/page");
    }

    #[test]
    fn relative_urls_are_rejected() {
        assert!(normalize_capture("Example", "example.com/page").is_err());
    }

    #[test]
    fn garbage_urls_are_rejected() {
        assert!(normalize_capture("Example", "not a url at all").is_err());
    }
}
