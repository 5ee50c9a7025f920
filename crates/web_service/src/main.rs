use web_service::server::{run, DEFAULT_BIND_ADDR};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let bind_addr =
        std::env::var("PLAYGROUND_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    run(&bind_addr)
        .await
        .map_err(std::io::Error::other)
}
