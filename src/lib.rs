#![deny(clippy::unwrap_used)]

pub mod category;
pub mod control;
pub mod db;
pub mod feedback;
pub mod order;
pub mod product;
pub mod settings;
pub mod uploader;

#[derive(Debug)]
pub struct SqlWrapper<T>(pub T);

impl<T> SqlWrapper<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// HTML checkbox semantics: browsers submit "on" for a ticked box and omit
/// the field entirely otherwise.
pub fn checkbox_on(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "on" | "true" | "1")
}

pub fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
    matches!(
        err,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::checkbox_on;

    #[test]
    fn checkbox_accepts_browser_values() {
        assert!(checkbox_on("on"));
        assert!(checkbox_on(" ON "));
        assert!(checkbox_on("true"));
        assert!(checkbox_on("1"));
    }

    #[test]
    fn checkbox_rejects_everything_else() {
        assert!(!checkbox_on(""));
        assert!(!checkbox_on("off"));
        assert!(!checkbox_on("0"));
        assert!(!checkbox_on("yes please"));
    }
}
