// src/db/menu_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::menu::MenuItem};

// Leitura do cardápio: consumida apenas na criação de pedidos, para o
// snapshot de nome e preço.
#[derive(Clone)]
pub struct MenuRepository {
    pool: PgPool,
}

impl MenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_item_by_id(&self, id: Uuid) -> Result<Option<MenuItem>, AppError> {
        let maybe_item = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, name, price, is_available, created_at, updated_at
            FROM menu_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_item)
    }
}
