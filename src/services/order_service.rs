// src/services/order_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        MenuRepository, OrderRepository, RestaurantRepository,
        order_repo::StaffScope,
    },
    models::{
        auth::User,
        order::{
            NewOrder, NewOrderItem, Order, OrderStatus, OrderWithItems, PublicOrder,
            compute_total,
        },
        restaurant::Restaurant,
    },
};

// Quantas vezes refazemos count+insert quando duas criações concorrentes
// calculam a mesma sequência. Esgotou, degrada para falha transitória.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

// Dados de criação já validados pelo handler, em termos de domínio.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItemInput>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

// O motor de pedidos: alocação de número, máquina de estados, claim de
// staff e as visões de listagem que as telas de polling consomem.
#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    restaurants: RestaurantRepository,
    menu: MenuRepository,
}

impl OrderService {
    pub fn new(
        orders: OrderRepository,
        restaurants: RestaurantRepository,
        menu: MenuRepository,
    ) -> Self {
        Self {
            orders,
            restaurants,
            menu,
        }
    }

    // =========================================================================
    //  CRIAÇÃO (ALOCADOR DE NÚMERO + SNAPSHOT DE ITENS)
    // =========================================================================

    pub async fn create_order(
        &self,
        restaurant_id: Uuid,
        actor: &User,
        input: CreateOrderInput,
    ) -> Result<OrderWithItems, AppError> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound)?;

        // Entrada de pedidos é uma operação do back office
        ensure_operator(&restaurant, actor)?;

        // Snapshot de nome/preço de cada item no momento da compra.
        // Referência viva ao cardápio nunca entra no pedido.
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let menu_item = self
                .menu
                .find_item_by_id(item.menu_item_id)
                .await?
                .filter(|m| m.restaurant_id == restaurant_id && m.is_available)
                .ok_or_else(|| AppError::MenuItemNotFound(item.menu_item_id.to_string()))?;

            items.push(NewOrderItem {
                menu_item_id: menu_item.id,
                name: menu_item.name,
                unit_price: menu_item.price,
                quantity: item.quantity,
                notes: item.notes.clone(),
            });
        }

        let total_price = compute_total(&items);

        // count-then-insert não é atômico: o índice único em
        // (restaurant_id, order_number) é o backstop, e a colisão refaz a
        // contagem em vez de virar erro para o usuário.
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let order_number = self.allocate_order_number(restaurant_id).await?;

            let new_order = NewOrder {
                restaurant_id,
                order_number,
                customer_name: input.customer_name.clone(),
                customer_phone: input.customer_phone.clone(),
                table_number: input.table_number.clone(),
                notes: input.notes.clone(),
                total_price,
            };

            match self.orders.create_order(&new_order, &items).await {
                Ok(order) => {
                    tracing::info!(
                        "🧾 Pedido {} criado para o restaurante {}",
                        order.order_number,
                        restaurant_id
                    );
                    return self.with_items(order).await;
                }
                Err(AppError::AllocationConflict) => {
                    tracing::warn!(
                        "Colisão de número de pedido no restaurante {} (tentativa {}/{})",
                        restaurant_id,
                        attempt,
                        MAX_ALLOCATION_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::OrderNumberExhausted)
    }

    /// Conta os pedidos de hoje (dia local do servidor) e formata o
    /// próximo número como YYYYMMDD-NNN.
    async fn allocate_order_number(&self, restaurant_id: Uuid) -> Result<String, AppError> {
        let now = Local::now();
        let (start, end) = day_bounds(now);

        let count = self
            .orders
            .count_created_between(restaurant_id, start, end)
            .await?;

        Ok(format_order_number(now.date_naive(), count + 1))
    }

    // =========================================================================
    //  LEITURA (VISÕES DE POLLING)
    // =========================================================================

    /// Acompanhamento público do cliente. As anotações internas nunca
    /// saem daqui (PublicOrder as omite).
    pub async fn track_by_number(
        &self,
        restaurant_id: Option<Uuid>,
        order_number: &str,
    ) -> Result<PublicOrder, AppError> {
        let order = self
            .orders
            .find_by_order_number(restaurant_id, order_number)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        Ok(self.with_items(order).await?.into())
    }

    pub async fn get_order_for_restaurant(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        actor: &User,
    ) -> Result<OrderWithItems, AppError> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound)?;

        ensure_operator(&restaurant, actor)?;

        let order = self
            .orders
            .find_by_id_in_restaurant(restaurant_id, order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        self.with_items(order).await
    }

    /// Visão do restaurante (cozinha / back office), autorizada para
    /// dono, gerentes ou admin. Limitada a uma página por poll.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        actor: &User,
        status: Option<OrderStatus>,
        staff_type: Option<&str>,
    ) -> Result<Vec<OrderWithItems>, AppError> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound)?;

        ensure_operator(&restaurant, actor)?;

        let orders = self
            .orders
            .list_for_restaurant(restaurant_id, status, staff_type)
            .await?;

        self.attach_items(orders).await
    }

    /// Fila do staff: escopada ao restaurante do usuário. Staff sem
    /// restaurante não vê nada.
    pub async fn list_for_staff(
        &self,
        actor: &User,
        status: Option<OrderStatus>,
        staff_type: Option<&str>,
    ) -> Result<Vec<OrderWithItems>, AppError> {
        let Some(restaurant_id) = actor.restaurant_id else {
            return Ok(Vec::new());
        };

        let scope = resolve_staff_scope(actor, staff_type);

        let orders = self
            .orders
            .list_for_staff(restaurant_id, actor.id, &scope, status)
            .await?;

        self.attach_items(orders).await
    }

    // =========================================================================
    //  MUTAÇÃO (MÁQUINA DE ESTADOS + CLAIM)
    // =========================================================================

    /// Caminho do "chão de loja": claim e/ou transição estrita de status,
    /// na mesma requisição (o claim roda primeiro).
    pub async fn staff_update(
        &self,
        order_id: Uuid,
        actor: &User,
        assign: bool,
        new_status: Option<OrderStatus>,
    ) -> Result<OrderWithItems, AppError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        let restaurant = self
            .restaurants
            .find_by_id(order.restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound)?;

        if assign {
            order = self.claim_order(&order, &restaurant, actor).await?;
        }

        if let Some(new_status) = new_status {
            order = self
                .transition_status(&order, &restaurant, actor, new_status)
                .await?;
        }

        self.with_items(order).await
    }

    /// Claim: elegível se o pedido ainda não tem dono, o staff pertence ao
    /// restaurante do pedido e o workflow está habilitado. A checagem
    /// "ainda está livre?" e a atribuição são um único UPDATE condicional;
    /// quem perder a corrida recebe OrderAlreadyClaimed.
    async fn claim_order(
        &self,
        order: &Order,
        restaurant: &Restaurant,
        actor: &User,
    ) -> Result<Order, AppError> {
        if !restaurant.workflow_enabled {
            return Err(AppError::WorkflowDisabled);
        }

        let belongs_to_restaurant = actor.restaurant_id == Some(order.restaurant_id);
        if !belongs_to_restaurant && ensure_operator(restaurant, actor).is_err() {
            return Err(AppError::Unauthorized);
        }

        self.orders
            .claim(order.id, actor.id, actor.primary_staff_type())
            .await?
            // O pedido existia na leitura acima; zero linhas significa que
            // outro staff venceu a corrida.
            .ok_or(AppError::OrderAlreadyClaimed)
    }

    /// Transição estrita: só o sucessor imediato é aceito, e o UPDATE é um
    /// compare-and-set no status de origem.
    async fn transition_status(
        &self,
        order: &Order,
        restaurant: &Restaurant,
        actor: &User,
        new_status: OrderStatus,
    ) -> Result<Order, AppError> {
        let is_assigned_staff = order.assigned_staff == Some(actor.id);
        if !is_assigned_staff && ensure_operator(restaurant, actor).is_err() {
            return Err(AppError::Unauthorized);
        }

        order.status.validate_transition(new_status)?;

        match self
            .orders
            .transition_status(order.id, order.status, new_status)
            .await?
        {
            Some(updated) => Ok(updated),
            // Zero linhas: alguém mudou o status entre a leitura e o
            // UPDATE. Relê para devolver origem/destino corretos.
            None => {
                let fresh = self
                    .orders
                    .find_by_id(order.id)
                    .await?
                    .ok_or(AppError::OrderNotFound)?;
                Err(AppError::InvalidTransition {
                    from: fresh.status,
                    to: new_status,
                })
            }
        }
    }

    /// Caminho permissivo do back office: status livre (sem tabela
    /// forward-only) e atribuição/especialização editáveis de forma
    /// independente. `completed_at` ainda é carimbado ao fechar.
    pub async fn operator_update(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        actor: &User,
        status: Option<OrderStatus>,
        assigned_staff: Option<Option<Uuid>>,
        staff_type: Option<Option<String>>,
    ) -> Result<OrderWithItems, AppError> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound)?;

        ensure_operator(&restaurant, actor)?;

        let order = self
            .orders
            .operator_update(restaurant_id, order_id, status, assigned_staff, staff_type)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        self.with_items(order).await
    }

    // =========================================================================
    //  HELPERS
    // =========================================================================

    async fn with_items(&self, order: Order) -> Result<OrderWithItems, AppError> {
        let items = self.orders.items_for_orders(&[order.id]).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Junta os itens de uma página de pedidos com duas queries no total.
    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>, AppError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut by_order: HashMap<Uuid, Vec<_>> = HashMap::new();
        for item in self.orders.items_for_orders(&ids).await? {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

// =============================================================================
//  REGRAS PURAS (testáveis sem banco)
// =============================================================================

/// Número de pedido legível: data local + sequência diária por restaurante.
/// Acima de 999 o zero-padding alarga para 4 dígitos em silêncio; é um
/// comportamento de borda aceito, não um erro.
pub(crate) fn format_order_number(date: NaiveDate, sequence: i64) -> String {
    format!("{}-{:03}", date.format("%Y%m%d"), sequence)
}

/// Janela [início, fim] do dia local corrente, em UTC, fechada nas duas
/// pontas (o mesmo recorte que o alocador usa para contar).
pub(crate) fn day_bounds(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(now);

    let start = start_local.with_timezone(&Utc);
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Resolve o que a fila do staff mostra:
/// - com filtro de especialização que o usuário declarou: os pedidos dele
///   mais os não atribuídos daquela especialização;
/// - com filtro que ele NÃO declarou: só os pedidos já atribuídos a ele;
/// - sem filtro: a fila inteira do restaurante dele.
pub(crate) fn resolve_staff_scope(user: &User, requested_type: Option<&str>) -> StaffScope {
    match requested_type {
        Some(t) if user.has_staff_type(t) => StaffScope::AssignedOrPool(t.to_string()),
        Some(_) => StaffScope::AssignedOnly,
        None => StaffScope::RestaurantQueue,
    }
}

/// Autorização consolidada do back office: dono, gerente declarado ou
/// admin do sistema. Usada por todos os endpoints de operador em vez de
/// checagens repetidas por rota.
pub(crate) fn ensure_operator(restaurant: &Restaurant, actor: &User) -> Result<(), AppError> {
    let allowed = restaurant.owner_id == actor.id
        || restaurant.is_manager(actor.id)
        || actor.is_admin();

    if allowed { Ok(()) } else { Err(AppError::Unauthorized) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use chrono::TimeZone;

    fn user(role: UserRole, restaurant_id: Option<Uuid>, types: Option<Vec<&str>>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "u@exemplo.com".into(),
            password_hash: "x".into(),
            name: "U".into(),
            role,
            restaurant_id,
            staff_type: types.map(|t| t.into_iter().map(String::from).collect()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn restaurant(owner_id: Uuid, managers: Vec<Uuid>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: "Churrascaria do Zé".into(),
            owner_id,
            managers,
            workflow_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn primeiro_pedido_do_dia_recebe_sequencia_001() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(format_order_number(date, 1), "20260823-001");
        assert_eq!(format_order_number(date, 2), "20260823-002");
    }

    #[test]
    fn sequencia_acima_de_999_alarga_sem_erro() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(format_order_number(date, 999), "20260823-999");
        assert_eq!(format_order_number(date, 1000), "20260823-1000");
    }

    #[test]
    fn janela_do_dia_cobre_o_instante_atual() {
        let now = Local.with_ymd_and_hms(2026, 8, 23, 15, 30, 0).unwrap();
        let (start, end) = day_bounds(now);
        let now_utc = now.with_timezone(&Utc);
        assert!(start <= now_utc && now_utc <= end);
        // Fechada nas duas pontas: exatamente um dia menos 1ms
        assert_eq!(end - start, Duration::days(1) - Duration::milliseconds(1));
    }

    #[test]
    fn filtro_declarado_abre_o_pool_da_especializacao() {
        let staff = user(UserRole::User, Some(Uuid::new_v4()), Some(vec!["drinks"]));
        assert_eq!(
            resolve_staff_scope(&staff, Some("drinks")),
            StaffScope::AssignedOrPool("drinks".into())
        );
    }

    #[test]
    fn filtro_nao_declarado_restringe_aos_proprios_pedidos() {
        let staff = user(UserRole::User, Some(Uuid::new_v4()), Some(vec!["drinks"]));
        assert_eq!(
            resolve_staff_scope(&staff, Some("grillade")),
            StaffScope::AssignedOnly
        );
    }

    #[test]
    fn sem_filtro_a_fila_e_a_do_restaurante() {
        let staff = user(UserRole::User, Some(Uuid::new_v4()), None);
        assert_eq!(resolve_staff_scope(&staff, None), StaffScope::RestaurantQueue);
    }

    #[test]
    fn dono_gerente_e_admin_passam_na_autorizacao_de_operador() {
        let owner = user(UserRole::User, None, None);
        let manager = user(UserRole::User, None, None);
        let admin = user(UserRole::Admin, None, None);
        let outsider = user(UserRole::User, None, None);

        let r = restaurant(owner.id, vec![manager.id]);

        assert!(ensure_operator(&r, &owner).is_ok());
        assert!(ensure_operator(&r, &manager).is_ok());
        assert!(ensure_operator(&r, &admin).is_ok());
        assert!(matches!(
            ensure_operator(&r, &outsider),
            Err(AppError::Unauthorized)
        ));
    }
}
