use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tokio_rusqlite::Connection;

use crate::{is_unique_violation, SqlWrapper};

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name_en: String,
    pub name_zh: String,
    pub slug: String,
    pub image: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name_en: String,
    pub name_zh: String,
    pub slug: String,
    pub image: String,
    pub sort_order: i64,
}

/// Lower-case, whitespace runs collapsed to single hyphens.
pub fn slugify(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug)]
pub enum CategoryWriteError {
    SlugTaken(String),
    NotFound,
    Other(anyhow::Error),
}

impl<E: Into<anyhow::Error>> From<E> for CategoryWriteError {
    fn from(err: E) -> Self {
        Self::Other(err.into())
    }
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Category>>;
    async fn get(&self, id: i64) -> anyhow::Result<Option<Category>>;
    async fn get_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>>;
    async fn add(&self, item: NewCategory) -> Result<Category, CategoryWriteError>;
    async fn update(&self, id: i64, item: NewCategory) -> Result<(), CategoryWriteError>;
    async fn remove(&self, id: i64) -> anyhow::Result<()>;
}

pub struct SqliteCategoryRepository {
    conn: Connection,
}

impl SqliteCategoryRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name_en: row.get(1)?,
        name_zh: row.get(2)?,
        slug: row.get(3)?,
        image: row.get(4)?,
        sort_order: row.get(5)?,
    })
}

const CATEGORY_COLUMNS: &str = "id, name_en, name_zh, slug, image, sort_order";

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn list(&self) -> anyhow::Result<Vec<Category>> {
        let SqlWrapper(items) = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CATEGORY_COLUMNS} FROM categories
                     ORDER BY sort_order DESC, id DESC"
                ))?;
                let items = stmt
                    .query_map([], category_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<Category>> {
        let SqlWrapper(item) = self
            .conn
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                        params![id],
                        category_from_row,
                    )
                    .optional()?;
                Ok(SqlWrapper(item))
            })
            .await?;
        Ok(item)
    }

    async fn get_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>> {
        let slug = slug.to_string();
        let SqlWrapper(item) = self
            .conn
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1"),
                        params![slug],
                        category_from_row,
                    )
                    .optional()?;
                Ok(SqlWrapper(item))
            })
            .await?;
        Ok(item)
    }

    async fn add(&self, item: NewCategory) -> Result<Category, CategoryWriteError> {
        let slug_for_error = item.slug.clone();
        let res = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO categories (name_en, name_zh, slug, image, sort_order)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        item.name_en,
                        item.name_zh,
                        item.slug,
                        item.image,
                        item.sort_order
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(SqlWrapper(Category {
                    id,
                    name_en: item.name_en,
                    name_zh: item.name_zh,
                    slug: item.slug,
                    image: item.image,
                    sort_order: item.sort_order,
                }))
            })
            .await;
        match res {
            Ok(SqlWrapper(out)) => Ok(out),
            Err(err) if is_unique_violation(&err) => {
                Err(CategoryWriteError::SlugTaken(slug_for_error))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, id: i64, item: NewCategory) -> Result<(), CategoryWriteError> {
        let slug_for_error = item.slug.clone();
        let res = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE categories
                     SET name_en = ?1, name_zh = ?2, slug = ?3, image = ?4, sort_order = ?5
                     WHERE id = ?6",
                    params![
                        item.name_en,
                        item.name_zh,
                        item.slug,
                        item.image,
                        item.sort_order,
                        id
                    ],
                )?;
                Ok(SqlWrapper(changed))
            })
            .await;
        match res {
            Ok(SqlWrapper(0)) => Err(CategoryWriteError::NotFound),
            Ok(SqlWrapper(_)) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(CategoryWriteError::SlugTaken(slug_for_error))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn remove(&self, id: i64) -> anyhow::Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn collars() -> NewCategory {
        NewCategory {
            name_en: "Collars".to_string(),
            name_zh: "项圈".to_string(),
            slug: "collars".to_string(),
            image: String::new(),
            sort_order: 0,
        }
    }

    async fn repo() -> SqliteCategoryRepository {
        let conn = Connection::open_in_memory().await.expect("open");
        db::migrate(&conn).await.expect("migrate");
        SqliteCategoryRepository::new(conn)
    }

    #[test]
    fn slugify_lowers_and_hyphenates() {
        assert_eq!(slugify("Spike Collars"), "spike-collars");
        assert_eq!(slugify("  Leather   Leads  "), "leather-leads");
        assert_eq!(slugify("collars"), "collars");
        assert_eq!(slugify(""), "");
    }

    #[tokio::test]
    async fn slug_round_trip() {
        let repo = repo().await;
        let created = repo.add(collars()).await.expect("add");
        let found = repo
            .get_by_slug("collars")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name_en, "Collars");
        assert!(repo.get_by_slug("harnesses").await.expect("query").is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let repo = repo().await;
        repo.add(collars()).await.expect("first");
        match repo.add(collars()).await {
            Err(CategoryWriteError::SlugTaken(slug)) => assert_eq!(slug, "collars"),
            other => panic!("expected slug conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_missing_category_is_not_found() {
        let repo = repo().await;
        match repo.update(99, collars()).await {
            Err(CategoryWriteError::NotFound) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_orders_by_sort_order_then_id() {
        let repo = repo().await;
        let first = repo.add(collars()).await.expect("add");
        let second = repo
            .add(NewCategory {
                slug: "leads".to_string(),
                sort_order: 5,
                ..collars()
            })
            .await
            .expect("add");
        let third = repo
            .add(NewCategory {
                slug: "harnesses".to_string(),
                ..collars()
            })
            .await
            .expect("add");
        let ids: Vec<i64> = repo.list().await.expect("list").iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, third.id, first.id]);
    }
}
