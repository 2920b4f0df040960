// src/models/restaurant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Entidade colaboradora: o motor de pedidos só a consulta para
// autorização (dono/gerentes) e para o flag de workflow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    #[schema(example = "Churrascaria do Zé")]
    pub name: String,
    pub owner_id: Uuid,
    pub managers: Vec<Uuid>,

    // Liga/desliga o fluxo de claim de pedidos pelo staff
    pub workflow_enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// O usuário é gerente declarado deste restaurante?
    pub fn is_manager(&self, user_id: Uuid) -> bool {
        self.managers.contains(&user_id)
    }
}
