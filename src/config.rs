// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{MenuRepository, OrderRepository, RestaurantRepository, UserRepository},
    services::{auth::AuthService, order_service::OrderService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub auth_service: AuthService,
    pub order_service: OrderService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, a
    // aplicação não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let restaurant_repo = RestaurantRepository::new(db_pool.clone());
        let menu_repo = MenuRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret.clone());
        let order_service = OrderService::new(order_repo, restaurant_repo, menu_repo);

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            order_service,
        })
    }
}
