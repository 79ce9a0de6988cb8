use async_trait::async_trait;
use rusqlite::params;
use serde::Serialize;
use tokio_rusqlite::Connection;

use crate::SqlWrapper;

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub product_id: i64,
    pub rating: f64,
    pub text_en: String,
    pub text_zh: String,
    pub image: String,
    /// Older rows tied feedback to a category instead of a product.
    /// New rows always write 0 here.
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub product_id: i64,
    pub rating: f64,
    pub text_en: String,
    pub text_zh: String,
    pub image: String,
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn list_for_product(&self, product_id: i64) -> anyhow::Result<Vec<Feedback>>;
    async fn add(&self, item: NewFeedback) -> anyhow::Result<Feedback>;
}

pub struct SqliteFeedbackRepository {
    conn: Connection,
}

impl SqliteFeedbackRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

fn feedback_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        product_id: row.get(1)?,
        rating: row.get(2)?,
        text_en: row.get(3)?,
        text_zh: row.get(4)?,
        image: row.get(5)?,
        category_id: row.get(6)?,
    })
}

#[async_trait]
impl FeedbackRepository for SqliteFeedbackRepository {
    async fn list_for_product(&self, product_id: i64) -> anyhow::Result<Vec<Feedback>> {
        let SqlWrapper(items) = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, product_id, rating, text_en, text_zh, image, category_id
                     FROM feedback WHERE product_id = ?1 ORDER BY id DESC",
                )?;
                let items = stmt
                    .query_map(params![product_id], feedback_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn add(&self, item: NewFeedback) -> anyhow::Result<Feedback> {
        let SqlWrapper(out) = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO feedback (product_id, rating, text_en, text_zh, image, category_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                    params![
                        item.product_id,
                        item.rating,
                        item.text_en,
                        item.text_zh,
                        item.image
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(SqlWrapper(Feedback {
                    id,
                    product_id: item.product_id,
                    rating: item.rating,
                    text_en: item.text_en,
                    text_zh: item.text_zh,
                    image: item.image,
                    category_id: 0,
                }))
            })
            .await?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn repo() -> SqliteFeedbackRepository {
        let conn = Connection::open_in_memory().await.expect("open");
        db::migrate(&conn).await.expect("migrate");
        SqliteFeedbackRepository::new(conn)
    }

    fn review(product_id: i64, rating: f64) -> NewFeedback {
        NewFeedback {
            product_id,
            rating,
            text_en: "My dobermann loves it.".to_string(),
            text_zh: "我的杜宾犬很喜欢。".to_string(),
            image: "fb_dobermann.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_product() {
        let repo = repo().await;
        repo.add(review(1, 5.0)).await.expect("add");
        repo.add(review(2, 4.0)).await.expect("add");
        repo.add(review(1, 4.5)).await.expect("add");

        let for_one = repo.list_for_product(1).await.expect("list");
        assert_eq!(for_one.len(), 2);
        assert!(for_one.iter().all(|f| f.product_id == 1));
        // newest first
        assert!(for_one[0].id > for_one[1].id);

        assert!(repo.list_for_product(9).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn new_rows_have_no_category_link() {
        let repo = repo().await;
        let created = repo.add(review(7, 5.0)).await.expect("add");
        assert_eq!(created.category_id, 0);
        let listed = repo.list_for_product(7).await.expect("list");
        assert_eq!(listed[0].category_id, 0);
        assert_eq!(listed[0].image, "fb_dobermann.jpg");
    }
}
