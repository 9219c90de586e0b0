use mock_server::Credentials;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let user_login = std::env::var("MOCK_USER").unwrap_or_else(|_| "admin@example.com".to_string());
    let api_key = std::env::var("MOCK_API_KEY").unwrap_or_else(|_| "secret".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on {addr} as {user_login}");
    mock_server::run(listener, Credentials::new(user_login, api_key)).await
}
