use async_trait::async_trait;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use tokio_rusqlite::Connection;

use crate::SqlWrapper;

/// A customer inquiry. No payment flow; each row is a lead the shop
/// follows up on by hand.
#[derive(Debug, Clone, Serialize)]
pub struct Inquiry {
    pub id: i64,
    pub product_name: String,
    pub customer_name: String,
    pub contact_info: String,
    pub note: String,
    pub date: String,
}

/// Storefront forms historically submit the contact field as `contact`,
/// newer clients send `contact_info`. Everything but the contact is
/// optional.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInquiry {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(alias = "contact")]
    pub contact_info: String,
    #[serde(default)]
    pub note: String,
}

pub fn format_inquiry_date(moment: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    moment
        .format(&format)
        .unwrap_or_else(|_| String::from("unknown"))
}

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Inquiry>>;
    async fn add(&self, item: NewInquiry) -> anyhow::Result<Inquiry>;
}

pub struct SqliteInquiryRepository {
    conn: Connection,
}

impl SqliteInquiryRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

fn inquiry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Inquiry> {
    Ok(Inquiry {
        id: row.get(0)?,
        product_name: row.get(1)?,
        customer_name: row.get(2)?,
        contact_info: row.get(3)?,
        note: row.get(4)?,
        date: row.get(5)?,
    })
}

#[async_trait]
impl InquiryRepository for SqliteInquiryRepository {
    async fn list(&self) -> anyhow::Result<Vec<Inquiry>> {
        let SqlWrapper(items) = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, product_name, customer_name, contact_info, note, date
                     FROM orders ORDER BY id DESC",
                )?;
                let items = stmt
                    .query_map([], inquiry_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn add(&self, item: NewInquiry) -> anyhow::Result<Inquiry> {
        let date = format_inquiry_date(OffsetDateTime::now_utc());
        let SqlWrapper(out) = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO orders (product_name, customer_name, contact_info, note, date)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        item.product_name,
                        item.customer_name,
                        item.contact_info,
                        item.note,
                        date
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(SqlWrapper(Inquiry {
                    id,
                    product_name: item.product_name,
                    customer_name: item.customer_name,
                    contact_info: item.contact_info,
                    note: item.note,
                    date,
                }))
            })
            .await?;
        Ok(out)
    }
}
