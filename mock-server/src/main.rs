use tokio::net::TcpListener;

use mailman_mock::{AppState, Db, API_ROOT};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8001".to_string());
    let username = std::env::var("MAILMAN_USER").unwrap_or_else(|_| "restadmin".to_string());
    let password = std::env::var("MAILMAN_PASS").unwrap_or_else(|_| "restpass".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}{API_ROOT}");
    mailman_mock::run_with_state(listener, AppState::new(Db::seeded(), &username, &password)).await
}
