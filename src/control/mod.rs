use std::collections::HashMap;
use std::future::{ready, Ready};

use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::web::{Form, Json};
use actix_web::{Either, FromRequest, HttpRequest, HttpResponse};
use derive_more::{Display, Error};
use serde::Serialize;

use crate::category::{Category, CategoryRepository, CategoryWriteError};
use crate::product::ProductWriteError;
use crate::settings::SettingsRepository;
use crate::uploader::UploadError;

pub mod admin;
pub mod site;

pub type Response = Result<HttpResponse, ControllerError>;
pub type InputData<T> = Either<Form<T>, Json<T>>;

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    NotFound,
    Forbidden,
    #[error(ignore)]
    #[display("Conflict: {_0}")]
    Conflict(String),
    #[error(ignore)]
    #[display("Invalid field {field}")]
    InvalidInput {
        field: String,
        msg: String,
    },
    #[error(ignore)]
    InternalServerError(anyhow::Error),
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

impl From<CategoryWriteError> for ControllerError {
    fn from(err: CategoryWriteError) -> Self {
        match err {
            CategoryWriteError::SlugTaken(slug) => {
                Self::Conflict(format!("category slug '{slug}' already exists"))
            }
            CategoryWriteError::NotFound => Self::NotFound,
            CategoryWriteError::Other(err) => Self::InternalServerError(err),
        }
    }
}

impl From<ProductWriteError> for ControllerError {
    fn from(err: ProductWriteError) -> Self {
        match err {
            ProductWriteError::NotFound => Self::NotFound,
            ProductWriteError::Other(err) => Self::InternalServerError(err),
        }
    }
}

impl From<UploadError> for ControllerError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotAnImage => Self::InvalidInput {
                field: "image".to_string(),
                msg: "only image uploads are accepted".to_string(),
            },
            UploadError::Other(err) => Self::InternalServerError(err),
        }
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}\n");
        use ControllerError::*;
        match self {
            NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "not found"
            })),
            Forbidden => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden"
            })),
            Conflict(msg) => HttpResponse::Conflict().json(serde_json::json!({
                "error": "conflict",
                "message": msg
            })),
            InvalidInput { field, msg } => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid input",
                "field": field,
                "message": msg
            })),
            InternalServerError(err) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal server error",
                    "message": err.to_string()
                }))
            }
        }
    }
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .json(())
}

/// Admin requests must carry the key from ADMIN_API_KEY in the
/// `x-admin-key` header. An unset or empty key locks the console.
pub fn ensure_admin_key(req: &HttpRequest) -> Result<(), ControllerError> {
    let expected = std::env::var("ADMIN_API_KEY").map_err(|_| ControllerError::Forbidden)?;
    if expected.trim().is_empty() {
        return Err(ControllerError::Forbidden);
    }
    let provided = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if Some(expected) != provided {
        return Err(ControllerError::Forbidden);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Zh,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "en" => Some(Lang::En),
            "zh" => Some(Lang::Zh),
            _ => None,
        }
    }

    /// Picks the right variant of a bilingual pair, falling back to the
    /// other language when the preferred one is blank.
    pub fn pick<'a>(self, en: &'a str, zh: &'a str) -> &'a str {
        let (preferred, fallback) = match self {
            Lang::En => (en, zh),
            Lang::Zh => (zh, en),
        };
        if preferred.is_empty() {
            fallback
        } else {
            preferred
        }
    }
}

impl FromRequest for Lang {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let lang = req
            .get_session()
            .get::<String>("lang")
            .ok()
            .flatten()
            .and_then(|value| Lang::parse(&value))
            .unwrap_or(Lang::En);
        ready(Ok(lang))
    }
}

/// Everything a public page needs beyond its own data: the visitor's
/// language, the settings map and the nav categories. Built per request,
/// never cached.
#[derive(Debug, Serialize)]
pub struct SiteContext {
    pub lang: Lang,
    pub settings: HashMap<String, String>,
    pub categories: Vec<Category>,
}

impl SiteContext {
    pub async fn load(
        lang: Lang,
        settings: &dyn SettingsRepository,
        categories: &dyn CategoryRepository,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            lang,
            settings: settings.all().await?,
            categories: categories.list().await?,
        })
    }

    pub fn setting(&self, key: &str) -> &str {
        self.settings.get(key).map(String::as_str).unwrap_or("")
    }
}
