use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use linear_cut_optimizer::solver::{Mode, Solver};
use linear_cut_optimizer::{CutResult, LengthSpec, SearchConfig};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeRequest {
    stock: Vec<LengthSpec>,
    orders: Vec<LengthSpec>,
    #[serde(default)]
    kerf: f64,
    #[serde(default)]
    mode: Mode,
    #[serde(flatten)]
    search: SearchConfig,
}

fn validate(specs: &[LengthSpec], what: &str) -> Result<(), String> {
    for spec in specs {
        if !spec.length.is_finite() || spec.length <= 0.0 {
            return Err(format!("{what} lengths must be positive, got {}", spec.length));
        }
    }
    Ok(())
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<CutResult>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    if !req.kerf.is_finite() || req.kerf < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "kerf must be a non-negative number".to_string(),
        ));
    }
    validate(&req.stock, "stock")
        .and_then(|_| validate(&req.orders, "order"))
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let mode = req.mode;
    let search = req.search;
    let solver = Solver::new(req.stock, req.kerf, req.orders);

    // The exact search is CPU bound and may run for its whole time budget.
    let result = tokio::task::spawn_blocking(move || solver.solve(mode, &search))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "solver task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "solver task failed".to_string())
        })?;

    tracing::info!(
        mode = ?mode,
        bars = result.summary.total_stock_used,
        waste = result.summary.total_waste,
        fulfilled = result.summary.is_order_fulfilled,
        "optimized"
    );
    Ok(Json(result))
}

fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
