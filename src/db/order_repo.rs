// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
};

// Colunas do pedido, na ordem da struct `Order`. Reutilizado em todas as
// queries para não esquecer campo em RETURNING/SELECT.
const ORDER_COLUMNS: &str = "id, restaurant_id, order_number, customer_name, customer_phone, \
     table_number, notes, status, assigned_staff, staff_type, total_price, \
     created_at, updated_at, completed_at";

// Limites de página que protegem o padrão de acesso de polling
// de scans ilimitados.
pub const RESTAURANT_LIST_LIMIT: i64 = 100;
pub const STAFF_LIST_LIMIT: i64 = 50;

// Escopo de visibilidade da fila do staff (ver OrderService::resolve_staff_scope)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffScope {
    /// Toda a fila do restaurante do usuário (sem filtro de especialização)
    RestaurantQueue,
    /// Apenas pedidos já atribuídos ao próprio usuário
    AssignedOnly,
    /// Pedidos do usuário OU não atribuídos da especialização pedida
    AssignedOrPool(String),
}

// O repositório de pedidos: todas as interações com `orders` e `order_items`
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conta os pedidos do restaurante criados dentro da janela dada.
    /// É a metade "count" do alocador de número de pedido.
    pub async fn count_created_between(
        &self,
        restaurant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE restaurant_id = $1
              AND created_at >= $2
              AND created_at <= $3
            "#,
        )
        .bind(restaurant_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Insere o pedido e seus itens-snapshot numa única transação.
    /// Uma violação do índice único (restaurant_id, order_number) vira
    /// `AllocationConflict`, que o service trata com retry.
    pub async fn create_order(
        &self,
        new_order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO orders (
                restaurant_id, order_number, customer_name, customer_phone,
                table_number, notes, status, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order: Order = sqlx::query_as(&sql)
        .bind(new_order.restaurant_id)
        .bind(&new_order.order_number)
        .bind(new_order.customer_name.as_deref())
        .bind(new_order.customer_phone.as_deref())
        .bind(new_order.table_number.as_deref())
        .bind(new_order.notes.as_deref())
        .bind(new_order.total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("idx_orders_restaurant_order_number")
                {
                    // Duas criações concorrentes calcularam a mesma sequência
                    return AppError::AllocationConflict;
                }
            }
            e.into()
        })?;

        // A posição preserva a ordem dos itens do payload; a PK (v4) não.
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, menu_item_id, position, name, unit_price, quantity, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id)
            .bind(item.menu_item_id)
            .bind(position as i32)
            .bind(&item.name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.notes.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        let maybe_order = sqlx::query_as(&sql)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_order)
    }

    pub async fn find_by_id_in_restaurant(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND restaurant_id = $2");

        let maybe_order = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_order)
    }

    /// Busca pública por número de pedido (acompanhamento do cliente).
    /// O escopo de restaurante é opcional; sem ele vale o número "puro".
    pub async fn find_by_order_number(
        &self,
        restaurant_id: Option<Uuid>,
        order_number: &str,
    ) -> Result<Option<Order>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = "
        ));
        qb.push_bind(order_number);
        if let Some(restaurant_id) = restaurant_id {
            qb.push(" AND restaurant_id = ");
            qb.push_bind(restaurant_id);
        }

        let maybe_order = qb.build_query_as().fetch_optional(&self.pool).await?;

        Ok(maybe_order)
    }

    /// Visão do restaurante (back office / cozinha): sempre escopada ao
    /// restaurante, filtros opcionais, mais recentes primeiro, limitada.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
        staff_type: Option<&str>,
    ) -> Result<Vec<Order>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = "
        ));
        qb.push_bind(restaurant_id);

        if let Some(status) = status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        if let Some(staff_type) = staff_type {
            qb.push(" AND staff_type = ");
            qb.push_bind(staff_type);
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(RESTAURANT_LIST_LIMIT);

        let orders = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(orders)
    }

    /// Fila do staff: pedidos do restaurante do usuário, visíveis segundo
    /// o escopo resolvido. Sem filtro de status explícito, pedidos
    /// `completed` ficam de fora (a fila é "o que ainda precisa de ação").
    pub async fn list_for_staff(
        &self,
        restaurant_id: Uuid,
        staff_id: Uuid,
        scope: &StaffScope,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = "
        ));
        qb.push_bind(restaurant_id);

        match scope {
            // A fila inteira do restaurante já está coberta pelo escopo acima
            StaffScope::RestaurantQueue => {}
            StaffScope::AssignedOnly => {
                qb.push(" AND assigned_staff = ");
                qb.push_bind(staff_id);
            }
            StaffScope::AssignedOrPool(staff_type) => {
                qb.push(" AND (assigned_staff = ");
                qb.push_bind(staff_id);
                qb.push(" OR (assigned_staff IS NULL AND staff_type = ");
                qb.push_bind(staff_type.clone());
                qb.push("))");
            }
        }

        match status {
            Some(status) => {
                qb.push(" AND status = ");
                qb.push_bind(status);
            }
            None => {
                qb.push(" AND status <> 'completed'");
            }
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(STAFF_LIST_LIMIT);

        let orders = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(orders)
    }

    /// Itens de vários pedidos de uma vez (evita N+1 nas listagens),
    /// na ordem em que entraram no pedido.
    pub async fn items_for_orders(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, AppError> {
        let items = sqlx::query_as(
            r#"
            SELECT id, order_id, menu_item_id, position, name, unit_price, quantity, notes
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Transição estrita do caminho do staff, como compare-and-set no
    /// status atual: se outra requisição mudou o status no meio do caminho,
    /// nenhuma linha é afetada e o chamador reavalia.
    pub async fn transition_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $3,
                completed_at = CASE
                    WHEN $3 = 'completed'::order_status THEN NOW()
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let maybe_order = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_order)
    }

    /// Claim atômico: o teste "ainda está sem dono?" e a atribuição são um
    /// único UPDATE condicional. Dois claims concorrentes nunca vencem os
    /// dois; o perdedor recebe zero linhas.
    pub async fn claim(
        &self,
        order_id: Uuid,
        staff_id: Uuid,
        staff_type: Option<&str>,
    ) -> Result<Option<Order>, AppError> {
        let sql = format!(
            r#"
            UPDATE orders
            SET assigned_staff = $2,
                staff_type = COALESCE($3, staff_type),
                status = CASE
                    WHEN status = 'pending' THEN 'preparing'::order_status
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1 AND assigned_staff IS NULL
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let maybe_order = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(staff_id)
        .bind(staff_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_order)
    }

    /// Edição direta do back office (caminho permissivo): status livre,
    /// atribuição e especialização podem ser definidas ou limpas de forma
    /// independente. `completed_at` ainda é carimbado ao fechar.
    pub async fn operator_update(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        status: Option<OrderStatus>,
        assigned_staff: Option<Option<Uuid>>,
        staff_type: Option<Option<String>>,
    ) -> Result<Option<Order>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE orders SET updated_at = NOW()");

        if let Some(status) = status {
            qb.push(", status = ");
            qb.push_bind(status);
            if status == OrderStatus::Completed {
                qb.push(", completed_at = NOW()");
            }
        }
        if let Some(assigned_staff) = assigned_staff {
            qb.push(", assigned_staff = ");
            qb.push_bind(assigned_staff);
        }
        if let Some(staff_type) = staff_type {
            qb.push(", staff_type = ");
            qb.push_bind(staff_type);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(order_id);
        qb.push(" AND restaurant_id = ");
        qb.push_bind(restaurant_id);
        qb.push(format!(" RETURNING {ORDER_COLUMNS}"));

        let maybe_order = qb.build_query_as().fetch_optional(&self.pool).await?;

        Ok(maybe_order)
    }
}
