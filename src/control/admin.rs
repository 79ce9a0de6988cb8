use std::collections::HashMap;
use std::sync::Arc;

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::category::{slugify, Category, CategoryRepository, NewCategory};
use crate::checkbox_on;
use crate::control::{ensure_admin_key, see_other, ControllerError, Response};
use crate::feedback::{FeedbackRepository, NewFeedback};
use crate::order::InquiryRepository;
use crate::product::{NewProduct, Product, ProductRepository};
use crate::settings::{is_known_key, SettingsRepository, FONT_OPTIONS};
use crate::uploader::{resolve_image, store_upload, UPLOAD_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    UpdateSettings,
    AddProduct,
    AddCategory,
    AddFeedback,
}

impl AdminAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UPDATE_SETTINGS" => Some(Self::UpdateSettings),
            "ADD_PRODUCT" => Some(Self::AddProduct),
            "ADD_CATEGORY" => Some(Self::AddCategory),
            "ADD_FEEDBACK" => Some(Self::AddFeedback),
            _ => None,
        }
    }
}

fn text(slot: Option<Text<String>>) -> String {
    slot.map(|t| t.0).unwrap_or_default()
}

fn flag(slot: &Option<Text<String>>) -> bool {
    slot.as_ref().map(|t| checkbox_on(&t.0)).unwrap_or(false)
}

#[derive(Debug, MultipartForm)]
pub struct ProductForm {
    pub category_id: Option<Text<i64>>,
    pub title_en: Option<Text<String>>,
    pub title_zh: Option<Text<String>>,
    pub price: Option<Text<String>>,
    pub bullet_points_en: Option<Text<String>>,
    pub bullet_points_zh: Option<Text<String>>,
    pub description_en: Option<Text<String>>,
    pub description_zh: Option<Text<String>>,
    pub is_new: Option<Text<String>>,
    pub is_deal: Option<Text<String>>,
    pub is_featured: Option<Text<String>>,
    pub monthly_sales: Option<Text<i64>>,
    pub avg_rating: Option<Text<f64>>,
    pub main_image: Option<TempFile>,
    pub delete_main_image: Option<Text<String>>,
    pub a_plus_images: Vec<TempFile>,
    pub delete_a_plus_images: Option<Text<String>>,
}

impl ProductForm {
    pub fn into_input(self, previous: Option<&Product>) -> Result<NewProduct, ControllerError> {
        let stored_main = match &self.main_image {
            Some(file) => store_upload(file, "main_", UPLOAD_DIR)?,
            None => None,
        };
        let previous_main = previous.map(|p| p.main_image.as_str()).unwrap_or("");
        let main_image = resolve_image(previous_main, flag(&self.delete_main_image), stored_main);

        let mut gallery = Vec::new();
        for file in &self.a_plus_images {
            if let Some(name) = store_upload(file, "aplus_", UPLOAD_DIR)? {
                gallery.push(name);
            }
        }
        let a_plus_images = if flag(&self.delete_a_plus_images) {
            String::new()
        } else if !gallery.is_empty() {
            gallery.join(",")
        } else {
            previous.map(|p| p.a_plus_images.clone()).unwrap_or_default()
        };

        Ok(NewProduct {
            category_id: self.category_id.map(|t| t.0),
            title_en: text(self.title_en),
            title_zh: text(self.title_zh),
            price: text(self.price),
            main_image,
            bullet_points_en: text(self.bullet_points_en),
            bullet_points_zh: text(self.bullet_points_zh),
            description_en: text(self.description_en),
            description_zh: text(self.description_zh),
            a_plus_images,
            is_new: flag(&self.is_new),
            is_deal: flag(&self.is_deal),
            is_featured: flag(&self.is_featured),
            monthly_sales: self.monthly_sales.map(|t| t.0).unwrap_or(0),
            avg_rating: self.avg_rating.map(|t| t.0).unwrap_or(5.0),
        })
    }
}

#[derive(Debug, MultipartForm)]
pub struct CategoryForm {
    pub name_en: Option<Text<String>>,
    pub name_zh: Option<Text<String>>,
    pub slug: Option<Text<String>>,
    pub sort_order: Option<Text<i64>>,
    pub image: Option<TempFile>,
    pub delete_image: Option<Text<String>>,
}

impl CategoryForm {
    pub fn into_input(self, previous: Option<&Category>) -> Result<NewCategory, ControllerError> {
        let name_en = text(self.name_en);
        if name_en.trim().is_empty() {
            return Err(ControllerError::InvalidInput {
                field: "name_en".to_string(),
                msg: "category name is required".to_string(),
            });
        }
        // The public URL stays stable on rename: an explicit slug wins,
        // then the stored one, and only a brand-new category derives it
        // from the English name.
        let submitted_slug = self
            .slug
            .map(|t| t.0)
            .filter(|s| !s.trim().is_empty());
        let slug = match (submitted_slug, previous) {
            (Some(s), _) => slugify(&s),
            (None, Some(prev)) => prev.slug.clone(),
            (None, None) => slugify(&name_en),
        };
        let stored = match &self.image {
            Some(file) => store_upload(file, "cat_", UPLOAD_DIR)?,
            None => None,
        };
        let previous_image = previous.map(|c| c.image.as_str()).unwrap_or("");
        let image = resolve_image(previous_image, flag(&self.delete_image), stored);
        Ok(NewCategory {
            slug,
            name_en,
            name_zh: text(self.name_zh),
            image,
            sort_order: self.sort_order.map(|t| t.0).unwrap_or(0),
        })
    }
}

/// One multipart form for the whole admin console. Every field is optional
/// except the action discriminator; each action reads only its own fields.
/// The named setting slots below are the complete set of writable settings,
/// anything else a client sends is dropped on the floor.
#[derive(Debug, MultipartForm)]
pub struct AdminForm {
    pub admin_action: Text<String>,

    // settings, text slots
    pub contact_email: Option<Text<String>>,
    pub footer_text_en: Option<Text<String>>,
    pub footer_text_zh: Option<Text<String>>,
    pub hero_banner_type: Option<Text<String>>,
    pub hero_banner_url: Option<Text<String>>,
    pub hero_title_en: Option<Text<String>>,
    pub hero_title_zh: Option<Text<String>>,
    pub hero_slogan_en: Option<Text<String>>,
    pub hero_slogan_zh: Option<Text<String>>,
    pub hero_title_size: Option<Text<String>>,
    pub hero_title_font: Option<Text<String>>,
    pub hero_slogan_size: Option<Text<String>>,
    pub hero_slogan_font: Option<Text<String>>,
    pub home_slogan_title_en: Option<Text<String>>,
    pub home_slogan_title_zh: Option<Text<String>>,
    pub home_slogan_body_en: Option<Text<String>>,
    pub home_slogan_body_zh: Option<Text<String>>,
    pub home_slogan_title_size: Option<Text<String>>,
    pub home_slogan_title_font: Option<Text<String>>,
    pub home_slogan_body_size: Option<Text<String>>,
    pub home_slogan_body_font: Option<Text<String>>,
    pub deals_title_en: Option<Text<String>>,
    pub deals_title_zh: Option<Text<String>>,
    pub deals_body_en: Option<Text<String>>,
    pub deals_body_zh: Option<Text<String>>,
    pub deals_banner_link: Option<Text<String>>,
    pub deals_title_font: Option<Text<String>>,
    pub deals_title_size: Option<Text<String>>,
    pub deals_body_font: Option<Text<String>>,
    pub deals_body_size: Option<Text<String>>,
    pub new_title_en: Option<Text<String>>,
    pub new_title_zh: Option<Text<String>>,
    pub new_body_en: Option<Text<String>>,
    pub new_body_zh: Option<Text<String>>,
    pub new_banner_link: Option<Text<String>>,
    pub new_title_font: Option<Text<String>>,
    pub new_title_size: Option<Text<String>>,
    pub new_body_font: Option<Text<String>>,
    pub new_body_size: Option<Text<String>>,
    pub catalog_title_en: Option<Text<String>>,
    pub catalog_title_zh: Option<Text<String>>,
    pub catalog_body_en: Option<Text<String>>,
    pub catalog_body_zh: Option<Text<String>>,
    pub catalog_title_font: Option<Text<String>>,
    pub catalog_title_size: Option<Text<String>>,
    pub catalog_body_font: Option<Text<String>>,
    pub catalog_body_size: Option<Text<String>>,
    pub about_caption_1_en: Option<Text<String>>,
    pub about_caption_1_zh: Option<Text<String>>,
    pub about_caption_2_en: Option<Text<String>>,
    pub about_caption_2_zh: Option<Text<String>>,
    pub about_caption_3_en: Option<Text<String>>,
    pub about_caption_3_zh: Option<Text<String>>,
    pub about_page_title_en: Option<Text<String>>,
    pub about_page_title_zh: Option<Text<String>>,
    pub about_page_body_en: Option<Text<String>>,
    pub about_page_body_zh: Option<Text<String>>,
    pub about_page_title_font: Option<Text<String>>,
    pub about_page_title_size: Option<Text<String>>,
    pub about_page_body_font: Option<Text<String>>,
    pub about_page_body_size: Option<Text<String>>,

    // settings, image slots
    pub site_logo: Option<TempFile>,
    pub delete_site_logo: Option<Text<String>>,
    pub hero_banner: Option<TempFile>,
    pub delete_hero_banner: Option<Text<String>>,
    pub home_slogan_img: Option<TempFile>,
    pub delete_home_slogan_img: Option<Text<String>>,
    pub deals_banner: Option<TempFile>,
    pub delete_deals_banner: Option<Text<String>>,
    pub new_banner: Option<TempFile>,
    pub delete_new_banner: Option<Text<String>>,
    pub about_image_1: Option<TempFile>,
    pub delete_about_image_1: Option<Text<String>>,
    pub about_image_2: Option<TempFile>,
    pub delete_about_image_2: Option<Text<String>>,
    pub about_image_3: Option<TempFile>,
    pub delete_about_image_3: Option<Text<String>>,

    // ADD_PRODUCT
    pub category_id: Option<Text<i64>>,
    pub title_en: Option<Text<String>>,
    pub title_zh: Option<Text<String>>,
    pub price: Option<Text<String>>,
    pub bullet_points_en: Option<Text<String>>,
    pub bullet_points_zh: Option<Text<String>>,
    pub description_en: Option<Text<String>>,
    pub description_zh: Option<Text<String>>,
    pub is_new: Option<Text<String>>,
    pub is_deal: Option<Text<String>>,
    pub is_featured: Option<Text<String>>,
    pub monthly_sales: Option<Text<i64>>,
    pub avg_rating: Option<Text<f64>>,
    pub main_image: Option<TempFile>,
    pub a_plus_images: Vec<TempFile>,

    // ADD_CATEGORY
    pub name_en: Option<Text<String>>,
    pub name_zh: Option<Text<String>>,
    pub slug: Option<Text<String>>,
    pub sort_order: Option<Text<i64>>,
    pub image: Option<TempFile>,

    // ADD_FEEDBACK
    pub feedback_product_id: Option<Text<i64>>,
    pub feedback_rating: Option<Text<f64>>,
    pub feedback_text_en: Option<Text<String>>,
    pub feedback_text_zh: Option<Text<String>>,
    pub feedback_image: Option<TempFile>,
}

impl AdminForm {
    fn setting_text_slots(&self) -> Vec<(&'static str, Option<&str>)> {
        macro_rules! slots {
            ($($field:ident),+ $(,)?) => {
                vec![$((
                    stringify!($field),
                    self.$field.as_ref().map(|t| t.0.as_str()),
                )),+]
            };
        }
        slots![
            contact_email,
            footer_text_en,
            footer_text_zh,
            hero_title_en,
            hero_title_zh,
            hero_slogan_en,
            hero_slogan_zh,
            hero_title_size,
            hero_title_font,
            hero_slogan_size,
            hero_slogan_font,
            home_slogan_title_en,
            home_slogan_title_zh,
            home_slogan_body_en,
            home_slogan_body_zh,
            home_slogan_title_size,
            home_slogan_title_font,
            home_slogan_body_size,
            home_slogan_body_font,
            deals_title_en,
            deals_title_zh,
            deals_body_en,
            deals_body_zh,
            deals_banner_link,
            deals_title_font,
            deals_title_size,
            deals_body_font,
            deals_body_size,
            new_title_en,
            new_title_zh,
            new_body_en,
            new_body_zh,
            new_banner_link,
            new_title_font,
            new_title_size,
            new_body_font,
            new_body_size,
            catalog_title_en,
            catalog_title_zh,
            catalog_body_en,
            catalog_body_zh,
            catalog_title_font,
            catalog_title_size,
            catalog_body_font,
            catalog_body_size,
            about_caption_1_en,
            about_caption_1_zh,
            about_caption_2_en,
            about_caption_2_zh,
            about_caption_3_en,
            about_caption_3_zh,
            about_page_title_en,
            about_page_title_zh,
            about_page_body_en,
            about_page_body_zh,
            about_page_title_font,
            about_page_title_size,
            about_page_body_font,
            about_page_body_size,
        ]
    }

    fn setting_image_slots(
        &self,
    ) -> Vec<(&'static str, &'static str, &Option<TempFile>, bool)> {
        vec![
            ("site_logo", "logo_", &self.site_logo, flag(&self.delete_site_logo)),
            (
                "home_slogan_img",
                "home_slogan_",
                &self.home_slogan_img,
                flag(&self.delete_home_slogan_img),
            ),
            (
                "deals_banner_upload",
                "deals_banner_",
                &self.deals_banner,
                flag(&self.delete_deals_banner),
            ),
            (
                "new_banner_upload",
                "new_banner_",
                &self.new_banner,
                flag(&self.delete_new_banner),
            ),
            (
                "about_image_1",
                "about_1_",
                &self.about_image_1,
                flag(&self.delete_about_image_1),
            ),
            (
                "about_image_2",
                "about_2_",
                &self.about_image_2,
                flag(&self.delete_about_image_2),
            ),
            (
                "about_image_3",
                "about_3_",
                &self.about_image_3,
                flag(&self.delete_about_image_3),
            ),
        ]
    }

    fn into_product_form(self) -> ProductForm {
        ProductForm {
            category_id: self.category_id,
            title_en: self.title_en,
            title_zh: self.title_zh,
            price: self.price,
            bullet_points_en: self.bullet_points_en,
            bullet_points_zh: self.bullet_points_zh,
            description_en: self.description_en,
            description_zh: self.description_zh,
            is_new: self.is_new,
            is_deal: self.is_deal,
            is_featured: self.is_featured,
            monthly_sales: self.monthly_sales,
            avg_rating: self.avg_rating,
            main_image: self.main_image,
            delete_main_image: None,
            a_plus_images: self.a_plus_images,
            delete_a_plus_images: None,
        }
    }

    fn into_category_form(self) -> CategoryForm {
        CategoryForm {
            name_en: self.name_en,
            name_zh: self.name_zh,
            slug: self.slug,
            sort_order: self.sort_order,
            image: self.image,
            delete_image: None,
        }
    }

    fn into_feedback_input(self) -> Result<NewFeedback, ControllerError> {
        let product_id = self
            .feedback_product_id
            .map(|t| t.0)
            .ok_or_else(|| ControllerError::InvalidInput {
                field: "feedback_product_id".to_string(),
                msg: "a product is required".to_string(),
            })?;
        let image = match &self.feedback_image {
            Some(file) => store_upload(file, "fb_", UPLOAD_DIR)?.unwrap_or_default(),
            None => String::new(),
        };
        Ok(NewFeedback {
            product_id,
            rating: self.feedback_rating.map(|t| t.0).unwrap_or(5.0),
            text_en: text(self.feedback_text_en),
            text_zh: text(self.feedback_text_zh),
            image,
        })
    }
}

async fn apply_settings(
    form: AdminForm,
    repo: &dyn SettingsRepository,
) -> Result<(), ControllerError> {
    let current = repo.all().await?;
    for (key, value) in form.setting_text_slots() {
        let Some(value) = value else { continue };
        if !is_known_key(key) {
            log::warn!("Ignoring unknown setting key {key}");
            continue;
        }
        if current.get(key).map(String::as_str) != Some(value) {
            repo.upsert(key, value).await?;
        }
    }
    // The hero banner is either a URL or an upload; the selector decides
    // which of the two keys gets written, the other is left alone.
    match form.hero_banner_type.as_ref().map(|t| t.0.as_str()) {
        Some("url") => {
            if let Some(url) = form.hero_banner_url.as_ref() {
                repo.upsert("hero_banner_url", &url.0).await?;
            }
            repo.upsert("hero_banner_type", "url").await?;
        }
        Some("upload") => {
            let stored = match &form.hero_banner {
                Some(file) => store_upload(file, "hero_banner_", UPLOAD_DIR)?,
                None => None,
            };
            let delete = flag(&form.delete_hero_banner);
            if stored.is_some() || delete {
                let previous = current
                    .get("hero_banner_upload")
                    .map(String::as_str)
                    .unwrap_or("");
                let resolved = resolve_image(previous, delete, stored);
                repo.upsert("hero_banner_upload", &resolved).await?;
            }
            repo.upsert("hero_banner_type", "upload").await?;
        }
        Some(other) => log::warn!("Ignoring unknown hero banner type {other}"),
        None => {}
    }
    for (key, prefix, file, delete) in form.setting_image_slots() {
        let stored = match file {
            Some(file) => store_upload(file, prefix, UPLOAD_DIR)?,
            None => None,
        };
        if stored.is_none() && !delete {
            continue;
        }
        let previous = current.get(key).map(String::as_str).unwrap_or("");
        let resolved = resolve_image(previous, delete, stored);
        repo.upsert(key, &resolved).await?;
    }
    Ok(())
}

#[post("/admin")]
pub async fn admin_dispatch(
    req: HttpRequest,
    form: MultipartForm<AdminForm>,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
    feedback: web::Data<Arc<dyn FeedbackRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let form = form.into_inner();
    let action = AdminAction::parse(&form.admin_action.0).ok_or_else(|| {
        ControllerError::InvalidInput {
            field: "admin_action".to_string(),
            msg: format!("unknown action '{}'", form.admin_action.0),
        }
    })?;
    match action {
        AdminAction::UpdateSettings => {
            apply_settings(form, settings.as_ref().as_ref()).await?;
        }
        AdminAction::AddProduct => {
            let input = form.into_product_form().into_input(None)?;
            products.add(input).await?;
        }
        AdminAction::AddCategory => {
            let input = form.into_category_form().into_input(None)?;
            categories.add(input).await?;
        }
        AdminAction::AddFeedback => {
            let input = form.into_feedback_input()?;
            feedback.add(input).await?;
        }
    }
    Ok(see_other(&format!("/admin?tab={}", landing_tab(action))))
}

/// Console tab shown after a dispatch action completes.
fn landing_tab(action: AdminAction) -> &'static str {
    match action {
        AdminAction::UpdateSettings => "settings",
        AdminAction::AddProduct => "products",
        AdminAction::AddCategory => "categories",
        AdminAction::AddFeedback => "feedback",
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    tab: Option<String>,
}

#[derive(Debug, Serialize)]
struct Dashboard<'a> {
    active_tab: String,
    settings: HashMap<String, String>,
    categories: Vec<Category>,
    products: Vec<crate::product::ProductWithCategory>,
    orders: Vec<crate::order::Inquiry>,
    font_options: &'a [&'a str],
}

#[get("/admin")]
pub async fn admin_dashboard(
    req: HttpRequest,
    query: web::Query<DashboardQuery>,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
    inquiries: web::Data<Arc<dyn InquiryRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let active_tab = query
        .into_inner()
        .tab
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "products".to_string());
    Ok(HttpResponse::Ok().json(Dashboard {
        active_tab,
        settings: settings.all().await?,
        categories: categories.list().await?,
        products: products.list_with_category().await?,
        orders: inquiries.list().await?,
        font_options: FONT_OPTIONS,
    }))
}

#[get("/admin/edit_product/{id}")]
pub async fn edit_product_page(
    req: HttpRequest,
    path: web::Path<i64>,
    products: web::Data<Arc<dyn ProductRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let product = products
        .get(path.into_inner())
        .await?
        .ok_or(ControllerError::NotFound)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "product": product,
        "categories": categories.list().await?,
        "font_options": FONT_OPTIONS,
    })))
}

#[post("/admin/edit_product/{id}")]
pub async fn edit_product(
    req: HttpRequest,
    path: web::Path<i64>,
    form: MultipartForm<ProductForm>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let id = path.into_inner();
    let previous = products.get(id).await?.ok_or(ControllerError::NotFound)?;
    let input = form.into_inner().into_input(Some(&previous))?;
    products.update(id, input).await?;
    Ok(see_other("/admin?tab=products"))
}

#[get("/admin/edit_category/{id}")]
pub async fn edit_category_page(
    req: HttpRequest,
    path: web::Path<i64>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let category = categories
        .get(path.into_inner())
        .await?
        .ok_or(ControllerError::NotFound)?;
    Ok(HttpResponse::Ok().json(category))
}

#[post("/admin/edit_category/{id}")]
pub async fn edit_category(
    req: HttpRequest,
    path: web::Path<i64>,
    form: MultipartForm<CategoryForm>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    let id = path.into_inner();
    let previous = categories
        .get(id)
        .await?
        .ok_or(ControllerError::NotFound)?;
    let input = form.into_inner().into_input(Some(&previous))?;
    categories.update(id, input).await?;
    Ok(see_other("/admin?tab=categories"))
}

#[post("/admin/delete/product/{id}")]
pub async fn delete_product(
    req: HttpRequest,
    path: web::Path<i64>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    products.remove(path.into_inner()).await?;
    Ok(see_other("/admin?tab=products"))
}

#[post("/admin/delete/category/{id}")]
pub async fn delete_category(
    req: HttpRequest,
    path: web::Path<i64>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    ensure_admin_key(&req)?;
    categories.remove(path.into_inner()).await?;
    Ok(see_other("/admin?tab=categories"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::settings::{seed_defaults, SqliteSettingsRepository};
    use tokio_rusqlite::Connection;

    impl AdminForm {
        fn empty(action: &str) -> Self {
            Self {
                admin_action: Text(action.to_string()),
                contact_email: None,
                footer_text_en: None,
                footer_text_zh: None,
                hero_banner_type: None,
                hero_banner_url: None,
                hero_title_en: None,
                hero_title_zh: None,
                hero_slogan_en: None,
                hero_slogan_zh: None,
                hero_title_size: None,
                hero_title_font: None,
                hero_slogan_size: None,
                hero_slogan_font: None,
                home_slogan_title_en: None,
                home_slogan_title_zh: None,
                home_slogan_body_en: None,
                home_slogan_body_zh: None,
                home_slogan_title_size: None,
                home_slogan_title_font: None,
                home_slogan_body_size: None,
                home_slogan_body_font: None,
                deals_title_en: None,
                deals_title_zh: None,
                deals_body_en: None,
                deals_body_zh: None,
                deals_banner_link: None,
                deals_title_font: None,
                deals_title_size: None,
                deals_body_font: None,
                deals_body_size: None,
                new_title_en: None,
                new_title_zh: None,
                new_body_en: None,
                new_body_zh: None,
                new_banner_link: None,
                new_title_font: None,
                new_title_size: None,
                new_body_font: None,
                new_body_size: None,
                catalog_title_en: None,
                catalog_title_zh: None,
                catalog_body_en: None,
                catalog_body_zh: None,
                catalog_title_font: None,
                catalog_title_size: None,
                catalog_body_font: None,
                catalog_body_size: None,
                about_caption_1_en: None,
                about_caption_1_zh: None,
                about_caption_2_en: None,
                about_caption_2_zh: None,
                about_caption_3_en: None,
                about_caption_3_zh: None,
                about_page_title_en: None,
                about_page_title_zh: None,
                about_page_body_en: None,
                about_page_body_zh: None,
                about_page_title_font: None,
                about_page_title_size: None,
                about_page_body_font: None,
                about_page_body_size: None,
                site_logo: None,
                delete_site_logo: None,
                hero_banner: None,
                delete_hero_banner: None,
                home_slogan_img: None,
                delete_home_slogan_img: None,
                deals_banner: None,
                delete_deals_banner: None,
                new_banner: None,
                delete_new_banner: None,
                about_image_1: None,
                delete_about_image_1: None,
                about_image_2: None,
                delete_about_image_2: None,
                about_image_3: None,
                delete_about_image_3: None,
                category_id: None,
                title_en: None,
                title_zh: None,
                price: None,
                bullet_points_en: None,
                bullet_points_zh: None,
                description_en: None,
                description_zh: None,
                is_new: None,
                is_deal: None,
                is_featured: None,
                monthly_sales: None,
                avg_rating: None,
                main_image: None,
                a_plus_images: Vec::new(),
                name_en: None,
                name_zh: None,
                slug: None,
                sort_order: None,
                image: None,
                feedback_product_id: None,
                feedback_rating: None,
                feedback_text_en: None,
                feedback_text_zh: None,
                feedback_image: None,
            }
        }
    }

    #[test]
    fn action_names_match_the_console_forms() {
        assert_eq!(
            AdminAction::parse("UPDATE_SETTINGS"),
            Some(AdminAction::UpdateSettings)
        );
        assert_eq!(AdminAction::parse("ADD_PRODUCT"), Some(AdminAction::AddProduct));
        assert_eq!(AdminAction::parse("ADD_CATEGORY"), Some(AdminAction::AddCategory));
        assert_eq!(AdminAction::parse("ADD_FEEDBACK"), Some(AdminAction::AddFeedback));
        assert_eq!(AdminAction::parse("DROP_TABLES"), None);
        assert_eq!(AdminAction::parse("add_product"), None);
    }

    #[test]
    fn empty_category_name_is_rejected() {
        let form = CategoryForm {
            name_en: Some(Text("   ".to_string())),
            name_zh: None,
            slug: None,
            sort_order: None,
            image: None,
            delete_image: None,
        };
        match form.into_input(None) {
            Err(ControllerError::InvalidInput { field, .. }) => assert_eq!(field, "name_en"),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn category_slug_comes_from_the_english_name() {
        let form = CategoryForm {
            name_en: Some(Text("Spike Collars".to_string())),
            name_zh: Some(Text("尖刺项圈".to_string())),
            slug: None,
            sort_order: Some(Text(3)),
            image: None,
            delete_image: None,
        };
        let input = form.into_input(None).expect("valid");
        assert_eq!(input.slug, "spike-collars");
        assert_eq!(input.sort_order, 3);
        assert_eq!(input.image, "");
    }

    #[test]
    fn category_rename_keeps_the_stored_slug() {
        let previous = Category {
            id: 1,
            name_en: "Collars".to_string(),
            name_zh: String::new(),
            slug: "collars".to_string(),
            image: String::new(),
            sort_order: 0,
        };
        let form = CategoryForm {
            name_en: Some(Text("Protection Collars".to_string())),
            name_zh: None,
            slug: None,
            sort_order: None,
            image: None,
            delete_image: None,
        };
        let input = form.into_input(Some(&previous)).expect("valid");
        assert_eq!(input.slug, "collars");
        assert_eq!(input.name_en, "Protection Collars");
    }

    #[test]
    fn explicit_slug_is_normalized_and_wins() {
        let form = CategoryForm {
            name_en: Some(Text("Collars".to_string())),
            name_zh: None,
            slug: Some(Text("  Spiked Gear ".to_string())),
            sort_order: None,
            image: None,
            delete_image: None,
        };
        let input = form.into_input(None).expect("valid");
        assert_eq!(input.slug, "spiked-gear");
    }

    #[test]
    fn product_form_defaults_and_flags() {
        let form = ProductForm {
            category_id: None,
            title_en: Some(Text("Spike Collar".to_string())),
            title_zh: None,
            price: Some(Text("$59.99".to_string())),
            bullet_points_en: None,
            bullet_points_zh: None,
            description_en: None,
            description_zh: None,
            is_new: Some(Text("on".to_string())),
            is_deal: None,
            is_featured: None,
            monthly_sales: None,
            avg_rating: None,
            main_image: None,
            delete_main_image: None,
            a_plus_images: Vec::new(),
            delete_a_plus_images: None,
        };
        let input = form.into_input(None).expect("valid");
        assert!(input.is_new);
        assert!(!input.is_deal);
        assert_eq!(input.monthly_sales, 0);
        assert_eq!(input.avg_rating, 5.0);
        assert_eq!(input.category_id, None);
        assert_eq!(input.main_image, "");
    }

    #[test]
    fn editing_without_new_images_keeps_the_old_ones() {
        let previous = Product {
            id: 1,
            category_id: None,
            title_en: "Spike Collar".to_string(),
            title_zh: String::new(),
            price: "$59.99".to_string(),
            main_image: "main_old.jpg".to_string(),
            bullet_points_en: String::new(),
            bullet_points_zh: String::new(),
            description_en: String::new(),
            description_zh: String::new(),
            a_plus_images: "aplus_a.jpg,aplus_b.jpg".to_string(),
            is_new: false,
            is_deal: false,
            is_featured: false,
            monthly_sales: 0,
            avg_rating: 5.0,
        };
        let form = ProductForm {
            category_id: None,
            title_en: Some(Text("Spike Collar v2".to_string())),
            title_zh: None,
            price: Some(Text("$64.99".to_string())),
            bullet_points_en: None,
            bullet_points_zh: None,
            description_en: None,
            description_zh: None,
            is_new: None,
            is_deal: None,
            is_featured: None,
            monthly_sales: None,
            avg_rating: None,
            main_image: None,
            delete_main_image: None,
            a_plus_images: Vec::new(),
            delete_a_plus_images: None,
        };
        let input = form.into_input(Some(&previous)).expect("valid");
        assert_eq!(input.main_image, "main_old.jpg");
        assert_eq!(input.a_plus_images, "aplus_a.jpg,aplus_b.jpg");
    }

    #[test]
    fn delete_flags_clear_images_on_edit() {
        let previous = Product {
            id: 1,
            category_id: None,
            title_en: String::new(),
            title_zh: String::new(),
            price: String::new(),
            main_image: "main_old.jpg".to_string(),
            bullet_points_en: String::new(),
            bullet_points_zh: String::new(),
            description_en: String::new(),
            description_zh: String::new(),
            a_plus_images: "aplus_a.jpg".to_string(),
            is_new: false,
            is_deal: false,
            is_featured: false,
            monthly_sales: 0,
            avg_rating: 5.0,
        };
        let form = ProductForm {
            category_id: None,
            title_en: None,
            title_zh: None,
            price: None,
            bullet_points_en: None,
            bullet_points_zh: None,
            description_en: None,
            description_zh: None,
            is_new: None,
            is_deal: None,
            is_featured: None,
            monthly_sales: None,
            avg_rating: None,
            main_image: None,
            delete_main_image: Some(Text("on".to_string())),
            a_plus_images: Vec::new(),
            delete_a_plus_images: Some(Text("on".to_string())),
        };
        let input = form.into_input(Some(&previous)).expect("valid");
        assert_eq!(input.main_image, "");
        assert_eq!(input.a_plus_images, "");
    }

    #[test]
    fn each_action_lands_on_its_own_tab() {
        assert_eq!(landing_tab(AdminAction::UpdateSettings), "settings");
        assert_eq!(landing_tab(AdminAction::AddProduct), "products");
        assert_eq!(landing_tab(AdminAction::AddCategory), "categories");
        assert_eq!(landing_tab(AdminAction::AddFeedback), "feedback");
    }

    #[test]
    fn settings_image_slots_use_distinct_prefixes() {
        let form = AdminForm::empty("UPDATE_SETTINGS");
        let slots = form.setting_image_slots();
        let total = slots.len();
        let mut prefixes: Vec<&str> = slots.iter().map(|(_, prefix, _, _)| *prefix).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), total);
    }

    #[tokio::test]
    async fn hero_banner_selector_gates_the_url_key() {
        let conn = Connection::open_in_memory().await.expect("open");
        db::migrate(&conn).await.expect("migrate");
        let repo = SqliteSettingsRepository::new(conn);
        seed_defaults(&repo).await.expect("seed");
        let default_url = repo
            .all()
            .await
            .expect("all")
            .get("hero_banner_url")
            .cloned()
            .expect("seeded");

        let mut form = AdminForm::empty("UPDATE_SETTINGS");
        form.hero_banner_type = Some(Text("upload".to_string()));
        form.hero_banner_url = Some(Text("https://cdn.example.com/sneaky.jpg".to_string()));
        apply_settings(form, &repo).await.expect("apply");
        let all = repo.all().await.expect("all");
        assert_eq!(
            all.get("hero_banner_type").map(String::as_str),
            Some("upload")
        );
        assert_eq!(
            all.get("hero_banner_url").map(String::as_str),
            Some(default_url.as_str())
        );

        let mut form = AdminForm::empty("UPDATE_SETTINGS");
        form.hero_banner_type = Some(Text("url".to_string()));
        form.hero_banner_url = Some(Text("https://cdn.example.com/banner.jpg".to_string()));
        apply_settings(form, &repo).await.expect("apply");
        let all = repo.all().await.expect("all");
        assert_eq!(
            all.get("hero_banner_type").map(String::as_str),
            Some("url")
        );
        assert_eq!(
            all.get("hero_banner_url").map(String::as_str),
            Some("https://cdn.example.com/banner.jpg")
        );
    }
}
