//! Category service (three-level tree)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::identifiers::{dashed_candidate, slugify};
use shared::models::{build_category_tree, validate_category_parent, CategoryLevel, CategoryNode, CategoryTree};
use shared::validation::validate_title;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::access::{check, required};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub order_no: i32,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: Option<String>,
    pub order_no: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub level: Option<i32>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn get(&self, id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    /// Enforce the level/parent rules and per-parent name uniqueness
    async fn check_placement(
        &self,
        name: &str,
        level: CategoryLevel,
        parent_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        let parent_level = match parent_id {
            Some(pid) => {
                let parent = self.get(pid).await.map_err(|_| {
                    AppError::validation("parentId", "Parent category does not exist")
                })?;
                Some(CategoryLevel::new(parent.level).map_err(|m| AppError::Internal(m.to_string()))?)
            }
            None => None,
        };
        check("parentId", validate_category_parent(level, parent_level))?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE LOWER(name) = LOWER($1)
                  AND level = $2
                  AND parent_id IS NOT DISTINCT FROM $3
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(name)
        .bind(level.value())
        .bind(parent_id)
        .bind(exclude)
        .fetch_one(&self.db)
        .await?;
        if duplicate {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        Ok(())
    }

    async fn unique_slug(&self, name: &str, exclude: Option<Uuid>) -> AppResult<String> {
        let base = slugify(name);
        let mut attempt = 0;
        loop {
            let candidate = dashed_candidate(&base, attempt);
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
            )
            .bind(&candidate)
            .bind(exclude)
            .fetch_one(&self.db)
            .await?;
            if !taken {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<Category> {
        let name = required("name", input.name)?;
        check("name", validate_title(&name))?;
        let level = CategoryLevel::new(input.level.unwrap_or(0)).map_err(|m| AppError::validation("level", m))?;

        self.check_placement(&name, level, input.parent_id, None).await?;
        let slug = self.unique_slug(&name, None).await?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, order_no, parent_id, level)
            VALUES ($1, $2, COALESCE($3, 0), $4, $5)
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(slug)
        .bind(input.order_no)
        .bind(input.parent_id)
        .bind(level.value())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Category {} created at level {}", category.slug, category.level);
        Ok(category)
    }

    /// Update a category; the slug follows the name only on rename
    pub async fn update(&self, id: Uuid, input: CategoryInput) -> AppResult<Category> {
        let current = self.get(id).await?;

        let name = match input.name {
            Some(name) => {
                check("name", validate_title(&name))?;
                name.trim().to_string()
            }
            None => current.name.clone(),
        };
        let level = CategoryLevel::new(input.level.unwrap_or(current.level))
            .map_err(|m| AppError::validation("level", m))?;
        let parent_id = match (input.parent_id, level) {
            (_, CategoryLevel::ROOT) => None,
            (Some(pid), _) => Some(pid),
            (None, _) => current.parent_id,
        };
        if parent_id == Some(id) {
            return Err(AppError::validation("parentId", "A category cannot be its own parent"));
        }

        self.check_placement(&name, level, parent_id, Some(id)).await?;

        let slug = if name != current.name {
            self.unique_slug(&name, Some(id)).await?
        } else {
            current.slug
        };

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $2, slug = $3, order_no = COALESCE($4, order_no),
                parent_id = $5, level = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(slug)
        .bind(input.order_no)
        .bind(parent_id)
        .bind(level.value())
        .fetch_one(&self.db)
        .await
        .map_err(AppError::from)
    }

    pub async fn tree(&self) -> AppResult<CategoryTree> {
        let nodes = sqlx::query_as::<_, (Uuid, String, i32, Option<Uuid>)>(
            "SELECT id, name, level, parent_id FROM categories ORDER BY order_no, name",
        )
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(id, name, level, parent_id)| CategoryNode {
            id,
            name,
            level,
            parent_id,
        })
        .collect::<Vec<_>>();

        Ok(build_category_tree(&nodes))
    }
}
