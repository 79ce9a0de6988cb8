use std::env;
use std::io::Write;
use std::sync::Arc;

use actix_multipart::form::MultipartFormConfig;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::middleware::TrailingSlash;
use actix_web::{web::Data, web::FormConfig, App, HttpServer};
use anyhow::Context;
use peacepet_cms::category::{CategoryRepository, SqliteCategoryRepository};
use peacepet_cms::control::{admin, site};
use peacepet_cms::db;
use peacepet_cms::feedback::{FeedbackRepository, SqliteFeedbackRepository};
use peacepet_cms::order::{InquiryRepository, SqliteInquiryRepository};
use peacepet_cms::product::{ProductRepository, SqliteProductRepository};
use peacepet_cms::settings::{self, SettingsRepository, SqliteSettingsRepository};
use peacepet_cms::uploader::UPLOAD_DIR;
use rand::{distributions, Rng};
use tokio_rusqlite::Connection;

const DB_PATH: &str = "storage/cms.db";

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }

    std::fs::create_dir_all("storage")?;
    std::fs::create_dir_all(UPLOAD_DIR)?;

    // Note: each repository needs its own Connection due to ownership requirements.
    // SQLite supports multiple connections to the same database file safely.
    let conn = Connection::open(DB_PATH).await?;
    db::migrate(&conn).await?;
    let settings_repository: Arc<dyn SettingsRepository> =
        Arc::new(SqliteSettingsRepository::new(conn));
    settings::seed_defaults(settings_repository.as_ref()).await?;

    let conn = Connection::open(DB_PATH).await?;
    let category_repository: Arc<dyn CategoryRepository> =
        Arc::new(SqliteCategoryRepository::new(conn));
    let conn = Connection::open(DB_PATH).await?;
    let product_repository: Arc<dyn ProductRepository> =
        Arc::new(SqliteProductRepository::new(conn));
    let conn = Connection::open(DB_PATH).await?;
    let feedback_repository: Arc<dyn FeedbackRepository> =
        Arc::new(SqliteFeedbackRepository::new(conn));
    let conn = Connection::open(DB_PATH).await?;
    let inquiry_repository: Arc<dyn InquiryRepository> =
        Arc::new(SqliteInquiryRepository::new(conn));

    if envmnt::get_or("ADMIN_API_KEY", "").trim().is_empty() {
        log::warn!("ADMIN_API_KEY is not set, the admin console is disabled");
    }

    let secret_key = match envmnt::get_parse("SESSION_KEY") {
        Ok(v) => v,
        Err(envmnt::errors::EnvmntError::Missing(_)) => {
            let key = rand::thread_rng()
                .sample_iter(distributions::Alphanumeric)
                .take(64)
                .map(char::from)
                .collect::<String>();
            let mut f = std::fs::File::options().append(true).open(".env")?;
            f.write_all(format!("SESSION_KEY={key}").as_bytes())?;
            key
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to read secret key: {err}"));
        }
    };
    // Secret key is intentionally not logged
    let secret_key = Key::from(secret_key.as_bytes());

    HttpServer::new(move || {
        App::new()
            .app_data(FormConfig::default().limit(256 * 1024))
            .app_data(MultipartFormConfig::default().total_limit(20 * 1024 * 1024))
            .wrap(actix_web::middleware::Compress::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .wrap(actix_web::middleware::NormalizePath::new(
                TrailingSlash::Trim,
            ))
            .app_data(Data::new(settings_repository.clone()))
            .app_data(Data::new(category_repository.clone()))
            .app_data(Data::new(product_repository.clone()))
            .app_data(Data::new(feedback_repository.clone()))
            .app_data(Data::new(inquiry_repository.clone()))
            .service(actix_files::Files::new("/static", "static"))
            .service(site::home)
            .service(site::about)
            .service(site::catalog)
            .service(site::deals)
            .service(site::new_arrivals)
            .service(site::category_page)
            .service(site::product_page)
            .service(site::submit_order)
            .service(site::switch_lang)
            .service(admin::admin_dashboard)
            .service(admin::admin_dispatch)
            .service(admin::edit_product_page)
            .service(admin::edit_product)
            .service(admin::edit_category_page)
            .service(admin::edit_category)
            .service(admin::delete_product)
            .service(admin::delete_category)
    })
    .bind(("0.0.0.0", 8080))
    .context("Failed to bind server to 0.0.0.0:8080. Is the port already in use?")?
    .run()
    .await?;
    Ok(())
}
