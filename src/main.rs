mod frame;
mod insights;
mod routes;
mod services;
mod state;

use std::time::Duration;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = env_parse("PORT", 3000);
    let delay_ms: u64 = env_parse(
        "RESPONSE_DELAY_MS",
        u64::try_from(services::conversation::RESPONSE_DELAY.as_millis()).unwrap_or(2000),
    );

    let state = state::AppState::new(Duration::from_millis(delay_ms));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, delay_ms, "insightboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
