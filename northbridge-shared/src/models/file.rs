/// Uploaded files
///
/// Metadata for product images written to the uploads directory. The bytes
/// live on disk; `path` is relative to the uploads root (for example
/// `products/mug-3f0c...e1.png`) and `checksum` is the hex SHA-256 of the
/// content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: Uuid,
    /// Stored file name
    pub name: String,
    /// Size in bytes
    pub size: i64,
    pub mime_type: String,
    pub path: String,
    pub checksum: String,
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFile {
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub path: String,
    pub checksum: String,
}

impl File {
    pub async fn create(executor: impl PgExecutor<'_>, data: CreateFile) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (name, size, mime_type, path, checksum)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.size)
        .bind(data.mime_type)
        .bind(data.path)
        .bind(data.checksum)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_products(
        pool: &PgPool,
        product_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE product_id = ANY($1) ORDER BY created_at",
        )
        .bind(product_ids)
        .fetch_all(pool)
        .await
    }

    /// Points unattached file records at a product
    ///
    /// Files already belonging to another product are left where they are.
    ///
    /// # Returns
    ///
    /// Number of files attached; unknown or foreign ids are ignored
    pub async fn attach_to_product(
        executor: impl PgExecutor<'_>,
        product_id: Uuid,
        file_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if file_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE files
            SET product_id = $1
            WHERE id = ANY($2) AND (product_id IS NULL OR product_id = $1)
            "#,
        )
            .bind(product_id)
            .bind(file_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
