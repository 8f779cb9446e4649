use std::sync::Arc;

use actix_cors::Cors;
use actix_web::web::{self, ServiceConfig};
use actix_web::{get, HttpResponse, Responder};
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::{CustomError, SecretStore};
use sqlx::PgPool;

use sage::error::ApiError;
use sage::middleware::auth::Authentication;
use sage::{routes, AppConfig, AppState};

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut ServiceConfig) + Send + Clone + 'static> {
    let config = AppConfig::new(&secrets)?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .map_err(CustomError::new)?;
    sqlx::migrate!().run(&pool).await.map_err(CustomError::new)?;

    let app_config = Arc::new(config.clone());
    let app_state = Arc::new(AppState::new(pool, config));

    let service_config = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(app_state.clone()));
        // Malformed bodies come back as the same {"error": …} envelope as
        // everything else.
        cfg.app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
        );
        cfg.service(health);
        cfg.service(
            web::scope("/api")
                .wrap(Authentication {
                    app_config: app_config.clone(),
                })
                .wrap(Cors::permissive())
                .service(
                    web::scope("/chat")
                        .service(routes::chat::stream_chat)
                        .service(routes::chat::list_conversations)
                        .service(routes::chat::get_conversation),
                )
                .service(
                    web::scope("/progress")
                        .service(routes::progress::complete_lesson)
                        .service(routes::progress::progress_stats)
                        .service(routes::progress::list_progress),
                ),
        );
    };

    Ok(service_config.into())
}
