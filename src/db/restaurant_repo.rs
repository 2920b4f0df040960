// src/db/restaurant_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::restaurant::Restaurant};

// Leitura de restaurantes: o motor de pedidos só precisa de dono, gerentes
// e do flag de workflow para as checagens de autorização.
#[derive(Clone)]
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        let maybe_restaurant = sqlx::query_as(
            r#"
            SELECT id, name, owner_id, managers, workflow_enabled, created_at, updated_at
            FROM restaurants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_restaurant)
    }
}
