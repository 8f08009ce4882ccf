#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for precinct incident reporting.
//!
//! Serves the incident, user, and geography endpoints from one process.
//! Users, boundaries, and incidents are stored in a local `SQLite`
//! database. Identity lookups and point validation are answered locally
//! unless `USER_SERVICE_URL` / `GEO_SERVICE_URL` point at another
//! deployment, in which case they go over HTTP with a timeout and retry.

pub mod caller;
pub mod config;
pub mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use precinct_access::AccessError;
use precinct_access::collaborators::{
    IdentityDirectory, LocalValidator, LocationValidator, StoreDirectory,
};
use precinct_access::incidents::IncidentService;
use precinct_access::store::{BoundaryStore, IncidentStore, UserStore};
use precinct_access::users::UserService;
use precinct_client::{ClientError, HttpIdentityDirectory, HttpLocationValidator};
use precinct_database::{DbError, SqliteStore};
use precinct_server_models::ApiError;
use thiserror::Error;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Incident operations.
    pub incidents: IncidentService,
    /// User and boundary operations.
    pub users: UserService,
}

impl AppState {
    /// State with every collaborator answered from `store`.
    #[must_use]
    pub fn local<S>(store: Arc<S>) -> Self
    where
        S: UserStore + BoundaryStore + IncidentStore + 'static,
    {
        Self {
            incidents: IncidentService::new(
                store.clone(),
                Arc::new(StoreDirectory::new(store.clone())),
                Arc::new(LocalValidator::new(store.clone())),
            ),
            users: UserService::new(store.clone(), store),
        }
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The database could not be opened.
    #[error(transparent)]
    Database(#[from] DbError),

    /// A collaborator client could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Seeding failed.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Opens the store, wires the collaborators selected by `config`, and
/// seeds the initial super user into an empty database.
///
/// # Errors
///
/// Returns [`StartupError`] if any of those steps fail.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, StartupError> {
    let store = Arc::new(SqliteStore::open(&config.db_path).await?);

    let directory: Arc<dyn IdentityDirectory> = match &config.user_service_url {
        Some(url) => {
            log::info!("Identity lookups go to {url}");
            Arc::new(HttpIdentityDirectory::new(url.clone(), config.upstream)?)
        }
        None => Arc::new(StoreDirectory::new(store.clone())),
    };
    let validator: Arc<dyn LocationValidator> = match &config.geo_service_url {
        Some(url) => {
            log::info!("Point validation goes to {url}");
            Arc::new(HttpLocationValidator::new(url.clone(), config.upstream)?)
        }
        None => Arc::new(LocalValidator::new(store.clone())),
    };

    let state = AppState {
        incidents: IncidentService::new(store.clone(), directory, validator),
        users: UserService::new(store.clone(), store),
    };

    if let Some(admin) = state.users.seed_super_user().await? {
        log::warn!(
            "Empty database: seeded super user '{}' (id {})",
            admin.profile.username,
            admin.id
        );
    }

    Ok(state)
}

fn invalid_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "INVALID_REQUEST".to_string(),
        message,
    })
}

/// Registers the `/api` routes and the body and path error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = invalid_request(err.to_string());
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = invalid_request(err.to_string());
        InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/incidents", web::get().to(handlers::list_incidents))
            .route("/incidents", web::post().to(handlers::create_incident))
            .route("/incidents/{id}", web::get().to(handlers::get_incident))
            .route("/incidents/{id}", web::put().to(handlers::update_incident))
            .route("/incidents/{id}", web::delete().to(handlers::delete_incident))
            .route("/users", web::get().to(handlers::list_users))
            .route("/users", web::post().to(handlers::create_user))
            .route(
                "/users/station/{id}/officers",
                web::get().to(handlers::station_officers),
            )
            .route("/users/{id}", web::get().to(handlers::get_user))
            .route("/users/{id}", web::put().to(handlers::update_user))
            .route("/users/{id}", web::delete().to(handlers::delete_user))
            .route("/geo/boundary/{id}", web::get().to(handlers::get_boundary))
            .route("/geo/boundary/{id}", web::put().to(handlers::set_boundary))
            .route("/geo/validate-point", web::post().to(handlers::validate_point)),
    );
}

/// Starts the precinct API server.
///
/// Reads [`ServerConfig`] from the environment, builds the application
/// state, and runs the Actix-Web HTTP server. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if startup fails, the server fails
/// to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    log::info!("Opening database at {}...", config.db_path.display());
    let state = web::Data::new(build_state(&config).await.map_err(std::io::Error::other)?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
