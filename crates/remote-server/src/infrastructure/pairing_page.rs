//! Pairing page: a tiny HTTP site that shows the pairing QR code.
//!
//! | Route           | Content                                              |
//! |-----------------|------------------------------------------------------|
//! | `/`             | HTML page with the code, the UDP port and the QR SVG |
//! | `/qr.svg`       | the QR code alone                                    |
//! | `/pairing.json` | the [`PairingPayload`] as JSON                       |
//!
//! The QR code encodes exactly the JSON served at `/pairing.json`, so a
//! phone that scans it learns the code, the host IP and the UDP port in one
//! step.
//!
//! The page is optional: if its port cannot be bound the server logs the
//! problem and keeps running, since the code is also printed to the log.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use qrcode::render::svg;
use qrcode::QrCode;
use remote_core::PairingPayload;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Error type for the pairing page.
#[derive(Debug, Error)]
pub enum PairingPageError {
    #[error("failed to serialise pairing payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("failed to render QR code: {0}")]
    Qr(String),

    #[error("failed to bind pairing page on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("pairing page stopped with an error: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(Clone)]
struct PageState {
    payload: Arc<PairingPayload>,
    qr_svg: Arc<str>,
}

/// A bound, not yet serving, pairing page.
pub struct PairingPage {
    listener: TcpListener,
    state: PageState,
}

impl PairingPage {
    /// Renders the QR code and binds the listener.
    ///
    /// # Errors
    ///
    /// [`PairingPageError::Bind`] if the port is taken; rendering errors are
    /// practically impossible for payloads this small.
    pub async fn bind(addr: SocketAddr, payload: PairingPayload) -> Result<Self, PairingPageError> {
        let qr_svg = render_qr_svg(&payload.to_json()?)?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| PairingPageError::Bind { addr, source })?;
        Ok(Self {
            listener,
            state: PageState {
                payload: Arc::new(payload),
                qr_svg: qr_svg.into(),
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, PairingPageError> {
        self.listener.local_addr().map_err(PairingPageError::Serve)
    }

    /// Serves requests until `running` is set to `false`.
    ///
    /// # Errors
    ///
    /// [`PairingPageError::Serve`] if the listener fails.
    pub async fn serve(self, running: Arc<AtomicBool>) -> Result<(), PairingPageError> {
        let addr = self.local_addr()?;
        info!("pairing page available at http://{addr}/");

        let app = router(self.state);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                while running.load(Ordering::Relaxed) {
                    tokio::time::sleep(SHUTDOWN_POLL).await;
                }
            })
            .await
            .map_err(PairingPageError::Serve)
    }
}

/// Renders `data` as an SVG QR code.
///
/// # Errors
///
/// [`PairingPageError::Qr`] if `data` is too long for any QR version.
pub fn render_qr_svg(data: &str) -> Result<String, PairingPageError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| PairingPageError::Qr(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .quiet_zone(true)
        .build())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

fn router(state: PageState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/qr.svg", get(qr_svg))
        .route("/pairing.json", get(pairing_json))
        .with_state(state)
}

async fn index(State(state): State<PageState>) -> Html<String> {
    let PairingPayload { code, port, ip } = state.payload.as_ref();
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Remote control pairing</title>
<style>
body {{ font-family: sans-serif; text-align: center; margin: 2em; }}
.code {{ font-size: 2.5em; letter-spacing: 0.2em; font-family: monospace; }}
</style>
</head>
<body>
<h1>Scan to connect</h1>
{svg}
<p>Connection code</p>
<p class="code">{code}</p>
<p>Host {ip}, UDP port {port}</p>
</body>
</html>
"#,
        svg = state.qr_svg,
    ))
}

async fn qr_svg(State(state): State<PageState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        state.qr_svg.to_string(),
    )
}

async fn pairing_json(State(state): State<PageState>) -> Json<PairingPayload> {
    Json(state.payload.as_ref().clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use remote_core::PairingSecret;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn payload() -> PairingPayload {
        let secret = PairingSecret::new("K7Q2ZP").unwrap();
        PairingPayload::new(&secret, 8080, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)))
    }

    async fn get_path(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_render_qr_svg_produces_svg_document() {
        let svg = render_qr_svg(r#"{"code":"K7Q2ZP","port":8080,"ip":"192.168.1.20"}"#).unwrap();

        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_page_serves_code_json_and_qr() {
        // Arrange
        let page = PairingPage::bind(SocketAddr::from(([127, 0, 0, 1], 0)), payload())
            .await
            .unwrap();
        let addr = page.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let server = tokio::spawn(page.serve(Arc::clone(&running)));

        // Act
        let index = get_path(addr, "/").await;
        let json = get_path(addr, "/pairing.json").await;
        let svg = get_path(addr, "/qr.svg").await;

        // Assert
        assert!(index.starts_with("HTTP/1.1 200"));
        assert!(index.contains("K7Q2ZP"));
        assert!(json.contains(r#""code":"K7Q2ZP""#));
        assert!(json.contains(r#""port":8080"#));
        assert!(svg.contains("image/svg+xml"));

        running.store(false, Ordering::Relaxed);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_on_taken_port_is_reported() {
        let first = PairingPage::bind(SocketAddr::from(([127, 0, 0, 1], 0)), payload())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let err = PairingPage::bind(taken, payload()).await.err().unwrap();

        assert!(matches!(err, PairingPageError::Bind { .. }));
    }
}
