use crate::domain::{models::class_definition::{ClassDefinition, ClassSummary}, ports::ClassRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresClassRepo {
    pool: PgPool,
}

impl PostgresClassRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for PostgresClassRepo {
    async fn create(&self, class: &ClassDefinition) -> Result<ClassDefinition, AppError> {
        sqlx::query_as::<_, ClassDefinition>(
            r#"INSERT INTO classes (id, name, description, duration_min, color, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#
        )
            .bind(&class.id)
            .bind(&class.name)
            .bind(&class.description)
            .bind(class.duration_min)
            .bind(&class.color)
            .bind(class.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClassDefinition>, AppError> {
        sqlx::query_as::<_, ClassDefinition>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<ClassDefinition>, AppError> {
        sqlx::query_as::<_, ClassDefinition>("SELECT * FROM classes ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_with_counts(&self, now: DateTime<Utc>) -> Result<Vec<ClassSummary>, AppError> {
        sqlx::query_as::<_, ClassSummary>(
            r#"SELECT c.id, c.name, c.description, c.duration_min, c.color, c.created_at,
                      COUNT(s.id) AS session_count,
                      COUNT(CASE WHEN s.start_time > $1 THEN 1 END) AS upcoming_sessions
               FROM classes c
               LEFT JOIN sessions s ON s.class_id = c.id
               GROUP BY c.id
               ORDER BY c.name ASC"#
        )
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, class: &ClassDefinition) -> Result<ClassDefinition, AppError> {
        sqlx::query_as::<_, ClassDefinition>(
            r#"UPDATE classes SET name = $1, description = $2, duration_min = $3, color = $4
               WHERE id = $5
               RETURNING *"#
        )
            .bind(&class.name)
            .bind(&class.description)
            .bind(class.duration_min)
            .bind(&class.color)
            .bind(&class.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Class not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Class not found".into()));
        }
        Ok(())
    }
}
