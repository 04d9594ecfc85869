//! Category Repository

use sqlx::SqlitePool;

use crate::db::Database;
use crate::domain::Category;
use crate::error::{is_unique_violation, PlatformError, Result};

pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    pub async fn insert(&self, name: &str) -> Result<Category> {
        let result = sqlx::query("INSERT INTO categories (category_name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_name_conflict(e, name))?;

        Ok(Category {
            category_id: result.last_insert_rowid(),
            category_name: name.to_string(),
        })
    }

    pub async fn find_by_id(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(sqlx::query_as("SELECT category_id, category_name FROM categories WHERE category_id = ?")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as("SELECT category_id, category_name FROM categories ORDER BY category_id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn exists(&self, category_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM categories WHERE category_id = ?",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn rename(&self, category_id: i64, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET category_name = ? WHERE category_id = ?")
            .bind(name)
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_name_conflict(e, name))?;
        Ok(result.rows_affected() > 0)
    }

    /// Events in the category keep existing without one.
    pub async fn delete(&self, category_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = ?")
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_name_conflict(err: sqlx::Error, name: &str) -> PlatformError {
    if is_unique_violation(&err) {
        PlatformError::duplicate("Category", "category_name", name)
    } else {
        err.into()
    }
}
