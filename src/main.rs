#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use oblio_relay::{
    handlers::{authenticate, health, proxy},
    settings::RelaySettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = RelaySettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    start_server(settings).await
}

/// Start the relay server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: RelaySettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "Content-Type",
                "Accept",
                "x-encrypted-token",
                "x-oblio-endpoint",
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Relay endpoints
        .route("/api/oblio/authenticate", web::post().to(authenticate))
        .service(
            web::resource("/api/oblio/proxy")
                .route(web::get().to(proxy))
                .route(web::post().to(proxy))
                .route(web::put().to(proxy))
                .route(web::delete().to(proxy)),
        )
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &RelaySettings) {
    println!("Starting Oblio relay on http://{bind_address}");
    println!();
    println!("Relay endpoints:");
    println!("  POST /api/oblio/authenticate - Exchange credentials for a bearer token");
    println!("  GET|POST|PUT|DELETE /api/oblio/proxy - Forward a request to the upstream API");
    println!("                                  Upstream URL: {}", settings.upstream.base_url);
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
