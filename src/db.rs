use tokio_rusqlite::Connection;

/// Ordered schema history. Each entry is applied exactly once, in order,
/// and the index of the last applied entry is recorded in
/// `PRAGMA user_version`. New schema changes append to this list; entries
/// are never edited or reordered once shipped.
const MIGRATIONS: &[&str] = &[
    // 1: base schema
    "CREATE TABLE settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name_en TEXT NOT NULL DEFAULT '',
        name_zh TEXT NOT NULL DEFAULT '',
        slug TEXT NOT NULL UNIQUE,
        image TEXT NOT NULL DEFAULT '',
        sort_order INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER,
        title_en TEXT NOT NULL DEFAULT '',
        title_zh TEXT NOT NULL DEFAULT '',
        price TEXT NOT NULL DEFAULT '',
        main_image TEXT NOT NULL DEFAULT '',
        bullet_points_en TEXT NOT NULL DEFAULT '',
        bullet_points_zh TEXT NOT NULL DEFAULT '',
        description_en TEXT NOT NULL DEFAULT '',
        description_zh TEXT NOT NULL DEFAULT '',
        a_plus_images TEXT NOT NULL DEFAULT '',
        is_new INTEGER NOT NULL DEFAULT 0,
        is_deal INTEGER NOT NULL DEFAULT 0,
        monthly_sales INTEGER NOT NULL DEFAULT 0,
        avg_rating REAL NOT NULL DEFAULT 5.0
    );
    CREATE TABLE feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL DEFAULT 0,
        rating REAL NOT NULL DEFAULT 5.0,
        text_en TEXT NOT NULL DEFAULT '',
        text_zh TEXT NOT NULL DEFAULT '',
        image TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_name TEXT NOT NULL DEFAULT '',
        customer_name TEXT NOT NULL DEFAULT '',
        contact_info TEXT NOT NULL DEFAULT '',
        note TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL DEFAULT ''
    );",
    // 2: homepage merchandising flag
    "ALTER TABLE products ADD COLUMN is_featured INTEGER NOT NULL DEFAULT 0;",
    // 3: legacy feedback category column, kept for older rows
    "ALTER TABLE feedback ADD COLUMN category_id INTEGER NOT NULL DEFAULT 0;",
];

pub async fn migrate(conn: &Connection) -> anyhow::Result<()> {
    let applied = conn
        .call(|conn| {
            let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            let mut applied = 0u32;
            for (idx, sql) in MIGRATIONS.iter().enumerate() {
                let target = (idx + 1) as i64;
                if version >= target {
                    continue;
                }
                let tx = conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.pragma_update(None, "user_version", target)?;
                tx.commit()?;
                applied += 1;
            }
            Ok(applied)
        })
        .await?;
    if applied > 0 {
        log::info!("Applied {applied} schema migration(s)");
    }
    Ok(())
}

pub async fn schema_version(conn: &Connection) -> anyhow::Result<i64> {
    let version = conn
        .call(|conn| {
            let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            Ok(version)
        })
        .await?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_records_schema_version() {
        let conn = Connection::open_in_memory().await.expect("open");
        migrate(&conn).await.expect("migrate");
        let version = schema_version(&conn).await.expect("version");
        assert_eq!(version, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().await.expect("open");
        migrate(&conn).await.expect("first run");
        migrate(&conn).await.expect("second run");
        let count = conn
            .call(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'products'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .expect("query");
        assert_eq!(count, 1);
    }
}
