use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tokio_rusqlite::Connection;

use crate::SqlWrapper;

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub title_en: String,
    pub title_zh: String,
    /// Free-text by design: the storefront shows prices like "$59.99 USD".
    pub price: String,
    pub main_image: String,
    pub bullet_points_en: String,
    pub bullet_points_zh: String,
    pub description_en: String,
    pub description_zh: String,
    pub a_plus_images: String,
    pub is_new: bool,
    pub is_deal: bool,
    pub is_featured: bool,
    pub monthly_sales: i64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: Option<i64>,
    pub title_en: String,
    pub title_zh: String,
    pub price: String,
    pub main_image: String,
    pub bullet_points_en: String,
    pub bullet_points_zh: String,
    pub description_en: String,
    pub description_zh: String,
    pub a_plus_images: String,
    pub is_new: bool,
    pub is_deal: bool,
    pub is_featured: bool,
    pub monthly_sales: i64,
    pub avg_rating: f64,
}

/// Product joined with its category names. Both names are `None` when the
/// category was deleted out from under the product (soft FK).
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category_name_en: Option<String>,
    pub category_name_zh: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFlag {
    New,
    Deal,
}

impl ProductFlag {
    fn column(self) -> &'static str {
        match self {
            ProductFlag::New => "is_new",
            ProductFlag::Deal => "is_deal",
        }
    }
}

pub fn split_bullets(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn split_images(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ProductWriteError {
    NotFound,
    Other(anyhow::Error),
}

impl<E: Into<anyhow::Error>> From<E> for ProductWriteError {
    fn from(err: E) -> Self {
        Self::Other(err.into())
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_with_category(&self) -> anyhow::Result<Vec<ProductWithCategory>>;
    async fn get(&self, id: i64) -> anyhow::Result<Option<Product>>;
    async fn add(&self, item: NewProduct) -> anyhow::Result<Product>;
    async fn update(&self, id: i64, item: NewProduct) -> Result<(), ProductWriteError>;
    async fn remove(&self, id: i64) -> anyhow::Result<()>;
    async fn list_featured(&self, limit: usize) -> anyhow::Result<Vec<Product>>;
    async fn list_by_flag(&self, flag: ProductFlag) -> anyhow::Result<Vec<Product>>;
    async fn list_by_category(&self, category_id: i64) -> anyhow::Result<Vec<Product>>;
}

pub struct SqliteProductRepository {
    conn: Connection,
}

impl SqliteProductRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

const PRODUCT_COLUMNS: &str = "id, category_id, title_en, title_zh, price, main_image, \
     bullet_points_en, bullet_points_zh, description_en, description_zh, \
     a_plus_images, is_new, is_deal, is_featured, monthly_sales, avg_rating";

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let is_new: i64 = row.get(11)?;
    let is_deal: i64 = row.get(12)?;
    let is_featured: i64 = row.get(13)?;
    Ok(Product {
        id: row.get(0)?,
        category_id: row.get(1)?,
        title_en: row.get(2)?,
        title_zh: row.get(3)?,
        price: row.get(4)?,
        main_image: row.get(5)?,
        bullet_points_en: row.get(6)?,
        bullet_points_zh: row.get(7)?,
        description_en: row.get(8)?,
        description_zh: row.get(9)?,
        a_plus_images: row.get(10)?,
        is_new: is_new != 0,
        is_deal: is_deal != 0,
        is_featured: is_featured != 0,
        monthly_sales: row.get(14)?,
        avg_rating: row.get(15)?,
    })
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn list_with_category(&self) -> anyhow::Result<Vec<ProductWithCategory>> {
        let SqlWrapper(items) = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.id, p.category_id, p.title_en, p.title_zh, p.price, p.main_image,
                            p.bullet_points_en, p.bullet_points_zh, p.description_en,
                            p.description_zh, p.a_plus_images, p.is_new, p.is_deal,
                            p.is_featured, p.monthly_sales, p.avg_rating,
                            c.name_en, c.name_zh
                     FROM products p
                     LEFT JOIN categories c ON p.category_id = c.id
                     ORDER BY p.id DESC",
                )?;
                let items = stmt
                    .query_map([], |row| {
                        let product = product_from_row(row)?;
                        Ok(ProductWithCategory {
                            product,
                            category_name_en: row.get(16)?,
                            category_name_zh: row.get(17)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<Product>> {
        let SqlWrapper(item) = self
            .conn
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                        params![id],
                        product_from_row,
                    )
                    .optional()?;
                Ok(SqlWrapper(item))
            })
            .await?;
        Ok(item)
    }

    async fn add(&self, item: NewProduct) -> anyhow::Result<Product> {
        let SqlWrapper(out) = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO products (
                        category_id, title_en, title_zh, price, main_image,
                        bullet_points_en, bullet_points_zh, description_en, description_zh,
                        a_plus_images, is_new, is_deal, is_featured, monthly_sales, avg_rating
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        item.category_id,
                        item.title_en,
                        item.title_zh,
                        item.price,
                        item.main_image,
                        item.bullet_points_en,
                        item.bullet_points_zh,
                        item.description_en,
                        item.description_zh,
                        item.a_plus_images,
                        item.is_new as i64,
                        item.is_deal as i64,
                        item.is_featured as i64,
                        item.monthly_sales,
                        item.avg_rating
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(SqlWrapper(Product {
                    id,
                    category_id: item.category_id,
                    title_en: item.title_en,
                    title_zh: item.title_zh,
                    price: item.price,
                    main_image: item.main_image,
                    bullet_points_en: item.bullet_points_en,
                    bullet_points_zh: item.bullet_points_zh,
                    description_en: item.description_en,
                    description_zh: item.description_zh,
                    a_plus_images: item.a_plus_images,
                    is_new: item.is_new,
                    is_deal: item.is_deal,
                    is_featured: item.is_featured,
                    monthly_sales: item.monthly_sales,
                    avg_rating: item.avg_rating,
                }))
            })
            .await?;
        Ok(out)
    }

    async fn update(&self, id: i64, item: NewProduct) -> Result<(), ProductWriteError> {
        let SqlWrapper(changed) = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE products
                     SET category_id = ?1, title_en = ?2, title_zh = ?3, price = ?4,
                         main_image = ?5, bullet_points_en = ?6, bullet_points_zh = ?7,
                         description_en = ?8, description_zh = ?9, a_plus_images = ?10,
                         is_new = ?11, is_deal = ?12, is_featured = ?13,
                         monthly_sales = ?14, avg_rating = ?15
                     WHERE id = ?16",
                    params![
                        item.category_id,
                        item.title_en,
                        item.title_zh,
                        item.price,
                        item.main_image,
                        item.bullet_points_en,
                        item.bullet_points_zh,
                        item.description_en,
                        item.description_zh,
                        item.a_plus_images,
                        item.is_new as i64,
                        item.is_deal as i64,
                        item.is_featured as i64,
                        item.monthly_sales,
                        item.avg_rating,
                        id
                    ],
                )?;
                Ok(SqlWrapper(changed))
            })
            .await?;
        if changed == 0 {
            return Err(ProductWriteError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: i64) -> anyhow::Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn list_featured(&self, limit: usize) -> anyhow::Result<Vec<Product>> {
        let SqlWrapper(items) = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE is_featured = 1 ORDER BY id DESC LIMIT ?1"
                ))?;
                let items = stmt
                    .query_map(params![limit as i64], product_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn list_by_flag(&self, flag: ProductFlag) -> anyhow::Result<Vec<Product>> {
        let SqlWrapper(items) = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE {} = 1 ORDER BY id DESC",
                    flag.column()
                ))?;
                let items = stmt
                    .query_map([], product_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn list_by_category(&self, category_id: i64) -> anyhow::Result<Vec<Product>> {
        let SqlWrapper(items) = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE category_id = ?1 ORDER BY id DESC"
                ))?;
                let items = stmt
                    .query_map(params![category_id], product_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryRepository, NewCategory, SqliteCategoryRepository};
    use crate::db;

    fn spike_collar(category_id: Option<i64>) -> NewProduct {
        NewProduct {
            category_id,
            title_en: "Spike Collar".to_string(),
            title_zh: "尖刺项圈".to_string(),
            price: "$59.99".to_string(),
            main_image: "main_spike.jpg".to_string(),
            bullet_points_en: "Hand stitched\nSolid brass buckle\n".to_string(),
            bullet_points_zh: "手工缝制\n黄铜扣".to_string(),
            description_en: String::new(),
            description_zh: String::new(),
            a_plus_images: "aplus_a.jpg,aplus_b.jpg".to_string(),
            is_new: false,
            is_deal: true,
            is_featured: false,
            monthly_sales: 0,
            avg_rating: 5.0,
        }
    }

    async fn repos() -> (SqliteProductRepository, SqliteCategoryRepository) {
        let conn = Connection::open_in_memory().await.expect("open");
        db::migrate(&conn).await.expect("migrate");
        (
            SqliteProductRepository::new(conn.clone()),
            SqliteCategoryRepository::new(conn),
        )
    }

    #[test]
    fn bullets_split_on_newlines_and_skip_blanks() {
        let bullets = split_bullets("Hand stitched\r\nSolid brass buckle\n\n");
        assert_eq!(bullets, vec!["Hand stitched", "Solid brass buckle"]);
        assert!(split_bullets("").is_empty());
    }

    #[test]
    fn images_split_on_commas() {
        assert_eq!(
            split_images("aplus_a.jpg, aplus_b.jpg,"),
            vec!["aplus_a.jpg", "aplus_b.jpg"]
        );
        assert!(split_images("").is_empty());
    }

    #[tokio::test]
    async fn flags_are_independent() {
        let (products, _) = repos().await;
        let deal_only = products.add(spike_collar(None)).await.expect("add");
        assert!(deal_only.is_deal);
        assert!(!deal_only.is_new);
        assert!(!deal_only.is_featured);

        let deals = products.list_by_flag(ProductFlag::Deal).await.expect("deals");
        assert_eq!(deals.len(), 1);
        assert!(products
            .list_by_flag(ProductFlag::New)
            .await
            .expect("new")
            .is_empty());
        assert!(products.list_featured(6).await.expect("featured").is_empty());
    }

    #[tokio::test]
    async fn featured_listing_is_capped() {
        let (products, _) = repos().await;
        for _ in 0..8 {
            let mut item = spike_collar(None);
            item.is_featured = true;
            products.add(item).await.expect("add");
        }
        let featured = products.list_featured(6).await.expect("featured");
        assert_eq!(featured.len(), 6);
        // newest first
        assert!(featured.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found() {
        let (products, _) = repos().await;
        match products.update(42, spike_collar(None)).await {
            Err(ProductWriteError::NotFound) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn category_delete_leaves_products_and_join_tolerates_it() {
        let (products, categories) = repos().await;
        let category = categories
            .add(NewCategory {
                name_en: "Collars".to_string(),
                name_zh: "项圈".to_string(),
                slug: "collars".to_string(),
                image: String::new(),
                sort_order: 0,
            })
            .await
            .expect("category");
        let product = products
            .add(spike_collar(Some(category.id)))
            .await
            .expect("product");

        categories.remove(category.id).await.expect("remove");

        let still_there = products
            .get(product.id)
            .await
            .expect("get")
            .expect("row survives");
        assert_eq!(still_there.category_id, Some(category.id));

        let listed = products.list_with_category().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert!(listed[0].category_name_en.is_none());
        assert!(listed[0].category_name_zh.is_none());
    }

    #[tokio::test]
    async fn category_scenario_collars_deals_new_arrivals() {
        let (products, categories) = repos().await;
        let collars = categories
            .add(NewCategory {
                name_en: "Collars".to_string(),
                name_zh: String::new(),
                slug: "collars".to_string(),
                image: String::new(),
                sort_order: 0,
            })
            .await
            .expect("category");

        assert!(products
            .list_by_category(collars.id)
            .await
            .expect("empty category")
            .is_empty());

        let product = products
            .add(spike_collar(Some(collars.id)))
            .await
            .expect("product");

        let in_category = products
            .list_by_category(collars.id)
            .await
            .expect("category list");
        assert_eq!(in_category.len(), 1);
        assert_eq!(in_category[0].id, product.id);

        let deals = products.list_by_flag(ProductFlag::Deal).await.expect("deals");
        assert_eq!(deals.len(), 1);
        assert!(products
            .list_by_flag(ProductFlag::New)
            .await
            .expect("new arrivals")
            .is_empty());
    }
}
