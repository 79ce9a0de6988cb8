use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;

use crate::SqlWrapper;

/// Fonts offered by the admin console for every themed text block.
pub const FONT_OPTIONS: &[&str] = &[
    "Playfair Display",
    "Lato",
    "Arial",
    "Helvetica",
    "Georgia",
    "Verdana",
    "Times New Roman",
    "Courier New",
    "Montserrat",
    "Roboto",
    "Open Sans",
    "Garamond",
    "Palatino",
    "Bookman",
    "Trebuchet MS",
];

/// Every setting key the site knows about, with its seed value. This list
/// doubles as the allow-list for admin writes: a key that is not here is
/// never persisted.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("site_logo", ""),
    ("contact_email", "support@peacepet.com"),
    ("footer_text_en", "Designed by professional trainers."),
    ("footer_text_zh", "专业训犬师设计。"),
    // homepage hero banner
    ("hero_banner_type", "url"),
    (
        "hero_banner_url",
        "https://images.unsplash.com/photo-1583511655857-d19b40a7a54e",
    ),
    ("hero_banner_upload", ""),
    ("hero_title_en", "The Art of Protection"),
    ("hero_title_zh", "守护的艺术"),
    ("hero_slogan_en", "PROFESSIONAL GRADE GEAR"),
    ("hero_slogan_zh", "现代爱犬的专业级装备"),
    ("hero_title_size", "3.5"),
    ("hero_title_font", "Playfair Display"),
    ("hero_slogan_size", "1.2"),
    ("hero_slogan_font", "Lato"),
    // homepage mission block
    ("home_slogan_img", ""),
    ("home_slogan_title_en", "Our Mission"),
    ("home_slogan_title_zh", "我们的使命"),
    ("home_slogan_body_en", "We strive to provide premium gear."),
    ("home_slogan_body_zh", "我们致力于提供优质装备。"),
    ("home_slogan_title_size", "2.0"),
    ("home_slogan_title_font", "Playfair Display"),
    ("home_slogan_body_size", "1.1"),
    ("home_slogan_body_font", "Lato"),
    // deals page
    ("deals_title_en", "Exclusive Deals"),
    ("deals_title_zh", "独家优惠"),
    ("deals_body_en", "Limited time offers and discounts!"),
    ("deals_body_zh", "限时优惠和折扣！"),
    ("deals_banner_upload", ""),
    ("deals_banner_link", "/"),
    ("deals_title_font", "Playfair Display"),
    ("deals_title_size", "3.0"),
    ("deals_body_font", "Lato"),
    ("deals_body_size", "1.2"),
    // new arrivals page
    ("new_title_en", "New Arrivals"),
    ("new_title_zh", "新品到货"),
    ("new_body_en", "The latest products have arrived."),
    ("new_body_zh", "最新产品已到货。"),
    ("new_banner_upload", ""),
    ("new_banner_link", "/"),
    ("new_title_font", "Playfair Display"),
    ("new_title_size", "3.0"),
    ("new_body_font", "Lato"),
    ("new_body_size", "1.2"),
    // catalog landing page
    ("catalog_title_en", "Product Collection"),
    ("catalog_title_zh", "产品系列"),
    ("catalog_body_en", "Discover our premium range."),
    ("catalog_body_zh", "探索我们的专业系列。"),
    ("catalog_title_font", "Playfair Display"),
    ("catalog_title_size", "3.0"),
    ("catalog_body_font", "Lato"),
    ("catalog_body_size", "1.2"),
    // about page, three image slots
    ("about_image_1", ""),
    ("about_caption_1_en", ""),
    ("about_caption_1_zh", ""),
    ("about_image_2", ""),
    ("about_caption_2_en", ""),
    ("about_caption_2_zh", ""),
    ("about_image_3", ""),
    ("about_caption_3_en", ""),
    ("about_caption_3_zh", ""),
    ("about_page_title_en", "Our Story"),
    ("about_page_title_zh", "品牌故事"),
    ("about_page_body_en", "PeacePet story..."),
    ("about_page_body_zh", "PeacePet 的故事..."),
    ("about_page_title_font", "Playfair Display"),
    ("about_page_title_size", "2.5"),
    ("about_page_body_font", "Lato"),
    ("about_page_body_size", "1.0"),
];

pub fn is_known_key(key: &str) -> bool {
    DEFAULT_SETTINGS.iter().any(|(k, _)| *k == key)
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn all(&self) -> anyhow::Result<HashMap<String, String>>;
    async fn upsert(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn upsert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

pub struct SqliteSettingsRepository {
    conn: Connection,
}

impl SqliteSettingsRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn all(&self) -> anyhow::Result<HashMap<String, String>> {
        let SqlWrapper(items) = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
                let items = stmt
                    .query_map([], |row| {
                        let key: String = row.get(0)?;
                        let value: String = row.get(1)?;
                        Ok((key, value))
                    })?
                    .collect::<Result<HashMap<_, _>, _>>()?;
                Ok(SqlWrapper(items))
            })
            .await?;
        Ok(items)
    }

    async fn upsert(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn upsert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// Seeds the default keys without clobbering values an admin already set.
pub async fn seed_defaults(repo: &dyn SettingsRepository) -> anyhow::Result<()> {
    for (key, value) in DEFAULT_SETTINGS {
        repo.upsert_if_absent(key, value).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn repo() -> SqliteSettingsRepository {
        let conn = Connection::open_in_memory().await.expect("open");
        db::migrate(&conn).await.expect("migrate");
        SqliteSettingsRepository::new(conn)
    }

    #[test]
    fn default_keys_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (key, _) in DEFAULT_SETTINGS {
            assert!(seen.insert(*key), "duplicate default key {key}");
        }
    }

    #[test]
    fn allow_list_rejects_unknown_keys() {
        assert!(is_known_key("hero_title_en"));
        assert!(is_known_key("about_caption_3_zh"));
        assert!(!is_known_key("hero_title_fr"));
        assert!(!is_known_key("__proto__"));
    }

    #[tokio::test]
    async fn seed_does_not_clobber_existing_values() {
        let repo = repo().await;
        repo.upsert("hero_title_en", "Custom").await.expect("upsert");
        seed_defaults(&repo).await.expect("seed");
        let all = repo.all().await.expect("all");
        assert_eq!(all.get("hero_title_en").map(String::as_str), Some("Custom"));
        assert_eq!(
            all.get("contact_email").map(String::as_str),
            Some("support@peacepet.com")
        );
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let repo = repo().await;
        repo.upsert("footer_text_en", "hello").await.expect("first");
        repo.upsert("footer_text_en", "hello").await.expect("second");
        let all = repo.all().await.expect("all");
        assert_eq!(all.get("footer_text_en").map(String::as_str), Some("hello"));
    }
}
