#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{StatusCode, Uri, header};
use axum::routing::{get, post};
use clap::Parser;
use rust_embed::Embed;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::SizeAbove;
use tower_http::cors::CorsLayer;
use tracing::info;

mod handlers;

// ============================================================
// Embedded static assets
// ============================================================

#[derive(Embed)]
#[folder = "static"]
struct StaticAssets;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(name = "pgforge-web", about = "pgforge tuning API server", version = pgforge_core::VERSION)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8080", env = "PGFORGE_LISTEN")]
    listen: String,
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgforge_web=info".parse().unwrap()),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async_main(args));
}

async fn async_main(args: Args) {
    let app = Router::new()
        .route("/tune", post(handlers::handle_tune))
        .route("/healthz", get(handlers::handle_healthz))
        .route("/static/{*path}", get(serve_static))
        .route("/", get(serve_index));

    // Compression: zstd preferred over gzip by client q-values; tiny bodies
    // are not worth a frame header.
    let app = app
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new().compress_when(SizeAbove::new(1024)));

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = args.listen.parse().expect("invalid listen address");
    info!(version = pgforge_core::VERSION, %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server error");
}

// ============================================================
// Static files
// ============================================================

async fn serve_static(uri: Uri) -> axum::response::Response<Body> {
    let path = uri.path().trim_start_matches("/static/");
    match StaticAssets::get(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            axum::response::Response::builder()
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(file.data.to_vec()))
                .unwrap()
        }
        None => axum::response::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("not found"))
            .unwrap(),
    }
}

async fn serve_index() -> axum::response::Response<Body> {
    match StaticAssets::get("index.html") {
        Some(index) => axum::response::Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .body(Body::from(index.data.to_vec()))
            .unwrap(),
        None => axum::response::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("not found"))
            .unwrap(),
    }
}

// ============================================================
// Access log layer (tower Layer + Service)
// ============================================================

#[derive(Clone)]
struct AccessLogLayer;

impl<S> tower::Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Clone)]
struct AccessLogService<S> {
    inner: S,
}

impl<S> tower::Service<Request> for AccessLogService<S>
where
    S: tower::Service<Request, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let client = req
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "-".to_owned());
        let t0 = Instant::now();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(req).await?;
            let latency_ms = t0.elapsed().as_millis() as u64;
            let status = response.status().as_u16();
            if !path.starts_with("/static/") {
                info!(client, status, latency_ms, "{method} {path}");
            }
            Ok(response)
        })
    }
}
