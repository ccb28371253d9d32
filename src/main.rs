mod api;
mod dao;
mod model;
mod service;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::from_fn, web};
use clap::Parser;
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;

use crate::api::endpoints::{meetings, members, packages, powerteams, referrals, taxonomy};
use crate::api::middleware::timing_middleware;
use crate::api::security::JwtSecurityService;
use crate::api::state::AppState;
use crate::dao::{
    meetings::MeetingDao, members::MemberDao, packages::PackageDao, powerteams::PowerTeamDao, referrals::ReferralDao, taxonomy::TaxonomyDao,
};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, LoggingConfig};
use crate::service::cache::ListCache;
use crate::service::{
    meetings::MeetingService, members::MemberService, packages::PackageService, powerteams::PowerTeamService, referrals::ReferralService,
    taxonomy::TaxonomyService,
};

/**
 * Main entry point for the chapter administration API.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging);

    let connection_pool: Pool<Postgres> = match config.clone().database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, idle_timeout, max_lifetime } => {
            pool::PoolOptions::new()
                .max_connections(max_connections)
                .min_connections(min_connections)
                .acquire_timeout(std::time::Duration::from_millis(acquire_timeout))
                .idle_timeout(std::time::Duration::from_millis(idle_timeout))
                .max_lifetime(std::time::Duration::from_millis(max_lifetime))
                .connect(connection_string.as_str())
                .await
                .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?
        }
    };

    let jwt_service = get_jwt_service(&config)?;

    let cache = Arc::new(ListCache::new());

    let taxonomy_service = TaxonomyService::new(TaxonomyDao::new(), Some(connection_pool.clone()), cache.clone());
    let member_service = MemberService::new(MemberDao::new(), Some(connection_pool.clone()), cache.clone());
    let meeting_service = MeetingService::new(MeetingDao::new(), Some(connection_pool.clone()), cache.clone());
    let package_service = PackageService::new(PackageDao::new(), Some(connection_pool.clone()), cache.clone());
    let powerteam_service = PowerTeamService::new(PowerTeamDao::new(), Some(connection_pool.clone()), cache.clone());
    let referral_service = ReferralService::new(ReferralDao::new(), MemberDao::new(), Some(connection_pool), cache);

    let state = web::Data::new(AppState::new(jwt_service, taxonomy_service, member_service, meeting_service, package_service, powerteam_service, referral_service));

    let server_init = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .service(taxonomy::category_list)
            .service(taxonomy::category_get)
            .service(taxonomy::category_add)
            .service(taxonomy::category_update)
            .service(taxonomy::category_delete)
            .service(taxonomy::subcategory_list)
            .service(taxonomy::subcategory_get)
            .service(taxonomy::subcategory_add)
            .service(taxonomy::subcategory_update)
            .service(taxonomy::subcategory_delete)
            .service(taxonomy::state_list)
            .service(taxonomy::state_get)
            .service(taxonomy::state_add)
            .service(taxonomy::state_update)
            .service(taxonomy::state_delete)
            .service(members::member_list)
            .service(members::member_get)
            .service(members::member_add)
            .service(members::member_update)
            .service(members::member_status_update)
            .service(members::member_delete)
            .service(meetings::meeting_list)
            .service(meetings::meeting_get)
            .service(meetings::meeting_add)
            .service(meetings::meeting_update)
            .service(meetings::meeting_delete)
            .service(meetings::training_list)
            .service(meetings::training_get)
            .service(meetings::training_add)
            .service(meetings::training_update)
            .service(meetings::training_delete)
            .service(packages::package_list)
            .service(packages::package_get)
            .service(packages::package_add)
            .service(packages::package_update)
            .service(packages::package_delete)
            .service(powerteams::powerteam_list)
            .service(powerteams::powerteam_get)
            .service(powerteams::powerteam_add)
            .service(powerteams::powerteam_update)
            .service(powerteams::powerteam_delete)
            // The given/received views must be registered before the id route
            // so the literal segments win.
            .service(referrals::reference_given_list)
            .service(referrals::reference_received_list)
            .service(referrals::reference_list)
            .service(referrals::reference_get)
            .service(referrals::reference_add)
            .service(referrals::reference_update)
            .service(referrals::reference_status_update)
            .service(referrals::reference_delete)
            .service(referrals::slip_list)
            .service(referrals::slip_get)
            .service(referrals::slip_add)
            .service(referrals::slip_update)
            .service(referrals::slip_delete)
            .service(referrals::requirement_list)
            .service(referrals::requirement_get)
            .service(referrals::requirement_add)
            .service(referrals::requirement_update)
            .service(referrals::requirement_delete)
    });

    server_init.bind(("127.0.0.1", config.server.http_port))?.workers(config.server.workers).run().await
}

/**
 * Initializes log output from the logging configuration.
 *
 * #Arguments
 * `logging`: The logging configuration.
 */
fn init_tracing(logging: &LoggingConfig) {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in &logging.directives {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_line_number(logging.line_number)
        .with_ansi(logging.ansi)
        .with_env_filter(env_filter)
        .init();
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

/**
 * Initializes the JWT security service from the configured key file.
 *
 * #Arguments
 * `config`: The application configuration.
 *
 * #Returns
 * A `Result` containing the initialized `JwtSecurityService` or an `std::io::Error` if initialization fails.
 */
fn get_jwt_service(config: &Config) -> Result<JwtSecurityService, std::io::Error> {
    let jwt_key = std::fs::read_to_string(&config.security.jwt_key_file).map_err(|err| std::io::Error::other(format!("Failed to read JWT key file: {err}")))?;
    JwtSecurityService::new(&jwt_key, &config.security.jwt_algorithm).map_err(|err| std::io::Error::other(format!("Failed to initialize JWT service: {err}")))
}
