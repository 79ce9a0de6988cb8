use std::sync::Arc;

use actix_session::Session;
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::category::{Category, CategoryRepository};
use crate::control::{see_other, ControllerError, InputData, Lang, Response, SiteContext};
use crate::feedback::{Feedback, FeedbackRepository};
use crate::order::{InquiryRepository, NewInquiry};
use crate::product::{split_bullets, split_images, Product, ProductFlag, ProductRepository};
use crate::settings::SettingsRepository;

pub const FEATURED_LIMIT: usize = 6;

#[derive(Debug, Serialize)]
struct ProductCard {
    id: i64,
    title: String,
    price: String,
    main_image: String,
    is_new: bool,
    is_deal: bool,
    avg_rating: f64,
    monthly_sales: i64,
}

impl ProductCard {
    fn from_product(product: &Product, lang: Lang) -> Self {
        Self {
            id: product.id,
            title: lang.pick(&product.title_en, &product.title_zh).to_string(),
            price: product.price.clone(),
            main_image: product.main_image.clone(),
            is_new: product.is_new,
            is_deal: product.is_deal,
            avg_rating: product.avg_rating,
            monthly_sales: product.monthly_sales,
        }
    }
}

#[derive(Debug, Serialize)]
struct HomePage {
    #[serde(flatten)]
    context: SiteContext,
    featured: Vec<ProductCard>,
}

#[get("/")]
pub async fn home(
    lang: Lang,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    let context = SiteContext::load(lang, settings.as_ref().as_ref(), categories.as_ref().as_ref())
        .await?;
    let featured = products
        .list_featured(FEATURED_LIMIT)
        .await?
        .iter()
        .map(|p| ProductCard::from_product(p, lang))
        .collect();
    Ok(HttpResponse::Ok().json(HomePage { context, featured }))
}

#[derive(Debug, Serialize)]
struct AboutSlot {
    image: String,
    caption: String,
}

#[derive(Debug, Serialize)]
struct AboutPage {
    #[serde(flatten)]
    context: SiteContext,
    slots: Vec<AboutSlot>,
}

#[get("/about")]
pub async fn about(
    lang: Lang,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    let context = SiteContext::load(lang, settings.as_ref().as_ref(), categories.as_ref().as_ref())
        .await?;
    let slots = (1..=3)
        .map(|n| AboutSlot {
            image: context.setting(&format!("about_image_{n}")).to_string(),
            caption: lang
                .pick(
                    context.setting(&format!("about_caption_{n}_en")),
                    context.setting(&format!("about_caption_{n}_zh")),
                )
                .to_string(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(AboutPage { context, slots }))
}

#[get("/catalog")]
pub async fn catalog(
    lang: Lang,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
) -> Response {
    let context = SiteContext::load(lang, settings.as_ref().as_ref(), categories.as_ref().as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(context))
}

#[derive(Debug, Serialize)]
struct ProductListPage {
    #[serde(flatten)]
    context: SiteContext,
    products: Vec<ProductCard>,
}

async fn flag_page(
    lang: Lang,
    flag: ProductFlag,
    settings: &Arc<dyn SettingsRepository>,
    categories: &Arc<dyn CategoryRepository>,
    products: &Arc<dyn ProductRepository>,
) -> Response {
    let context = SiteContext::load(lang, settings.as_ref(), categories.as_ref()).await?;
    let products = products
        .list_by_flag(flag)
        .await?
        .iter()
        .map(|p| ProductCard::from_product(p, lang))
        .collect();
    Ok(HttpResponse::Ok().json(ProductListPage { context, products }))
}

#[get("/deals")]
pub async fn deals(
    lang: Lang,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    flag_page(lang, ProductFlag::Deal, &settings, &categories, &products).await
}

#[get("/new_arrivals")]
pub async fn new_arrivals(
    lang: Lang,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    flag_page(lang, ProductFlag::New, &settings, &categories, &products).await
}

#[derive(Debug, Serialize)]
struct CategoryPage {
    #[serde(flatten)]
    context: SiteContext,
    category: Category,
    products: Vec<ProductCard>,
}

#[get("/catalog/{slug}")]
pub async fn category_page(
    lang: Lang,
    path: web::Path<String>,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
) -> Response {
    let slug = path.into_inner();
    let category = categories
        .get_by_slug(&slug)
        .await?
        .ok_or(ControllerError::NotFound)?;
    let context = SiteContext::load(lang, settings.as_ref().as_ref(), categories.as_ref().as_ref())
        .await?;
    let products = products
        .list_by_category(category.id)
        .await?
        .iter()
        .map(|p| ProductCard::from_product(p, lang))
        .collect();
    Ok(HttpResponse::Ok().json(CategoryPage {
        context,
        category,
        products,
    }))
}

#[derive(Debug, Serialize)]
struct ProductPage {
    #[serde(flatten)]
    context: SiteContext,
    product: Product,
    title: String,
    description: String,
    bullets: Vec<String>,
    gallery: Vec<String>,
    reviews: Vec<Feedback>,
}

#[get("/product/{id}")]
pub async fn product_page(
    lang: Lang,
    path: web::Path<i64>,
    settings: web::Data<Arc<dyn SettingsRepository>>,
    categories: web::Data<Arc<dyn CategoryRepository>>,
    products: web::Data<Arc<dyn ProductRepository>>,
    feedback: web::Data<Arc<dyn FeedbackRepository>>,
) -> Response {
    let id = path.into_inner();
    let product = products.get(id).await?.ok_or(ControllerError::NotFound)?;
    let context = SiteContext::load(lang, settings.as_ref().as_ref(), categories.as_ref().as_ref())
        .await?;
    let reviews = feedback.list_for_product(product.id).await?;
    let title = lang.pick(&product.title_en, &product.title_zh).to_string();
    let description = lang
        .pick(&product.description_en, &product.description_zh)
        .to_string();
    let bullets = split_bullets(lang.pick(&product.bullet_points_en, &product.bullet_points_zh));
    let gallery = split_images(&product.a_plus_images);
    Ok(HttpResponse::Ok().json(ProductPage {
        context,
        product,
        title,
        description,
        bullets,
        gallery,
        reviews,
    }))
}

#[post("/submit_order")]
pub async fn submit_order(
    data: InputData<NewInquiry>,
    inquiries: web::Data<Arc<dyn InquiryRepository>>,
) -> Response {
    let item = data.into_inner();
    inquiries.add(item).await?;
    Ok(HttpResponse::Ok().body("OK"))
}

#[get("/switch_lang/{lang}")]
pub async fn switch_lang(
    req: HttpRequest,
    path: web::Path<String>,
    session: Session,
) -> Response {
    // Unknown codes are ignored, the visitor keeps their current language.
    if let Some(lang) = Lang::parse(&path.into_inner()) {
        session
            .insert("lang", lang.as_str())
            .map_err(|e| ControllerError::InternalServerError(anyhow::anyhow!(e)))?;
    }
    let back = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string();
    Ok(see_other(&back))
}
