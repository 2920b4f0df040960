// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Enums ---

// O ciclo de vida do pedido. A ordem das variantes importa: o caminho do
// staff só anda para frente (pending -> preparing -> ready -> completed).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl OrderStatus {
    /// O único sucessor legal no caminho do staff. `completed` é terminal.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Valida uma transição estrita (caminho do staff). Recusa regressão,
    /// repetição e pulo de etapa, devolvendo origem e destino no erro.
    pub fn validate_transition(self, to: OrderStatus) -> Result<(), AppError> {
        if self.next() == Some(to) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition { from: self, to })
        }
    }

    /// Efeito colateral do claim: um pedido `pending` avança para
    /// `preparing`; qualquer outro status permanece como está.
    pub fn after_claim(self) -> OrderStatus {
        match self {
            OrderStatus::Pending => OrderStatus::Preparing,
            other => other,
        }
    }
}

// --- Structs ---

// Linha de item do pedido: snapshot de nome/preço do cardápio no momento
// da compra. Mudanças de preço posteriores não afetam pedidos históricos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    // Posição de inserção dentro do pedido; é ela (e não a PK aleatória)
    // que define a ordem da sequência de itens
    #[serde(skip_serializing)]
    pub position: i32,
    #[schema(example = "Espetinho de picanha")]
    pub name: String,
    #[schema(example = "10.00")]
    pub unit_price: Decimal,
    #[schema(example = 2)]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    #[schema(example = "20260823-001")]
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub assigned_staff: Option<Uuid>,
    #[schema(example = "grillade")]
    pub staff_type: Option<String>,
    #[schema(example = "25.00")]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// Dados de um pedido ainda não persistido, já com o número alocado e o
// total computado a partir dos snapshots.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub restaurant_id: Uuid,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub total_price: Decimal,
}

// Snapshot de item pronto para inserção.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Total do pedido: soma dos subtotais dos snapshots. Calculado uma única
/// vez na criação; nunca recalculado a partir do cardápio atual.
pub fn compute_total(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum()
}

// Pedido com seus itens embutidos, como as telas consomem.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// Visão pública para o acompanhamento do cliente: nunca expõe as
// anotações internas do pedido.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicOrder {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub table_number: Option<String>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

impl From<OrderWithItems> for PublicOrder {
    fn from(full: OrderWithItems) -> Self {
        let OrderWithItems { order, items } = full;
        PublicOrder {
            id: order.id,
            restaurant_id: order.restaurant_id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            table_number: order.table_number,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
            completed_at: order.completed_at,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caminho_completo_do_staff_e_aceito() {
        assert!(OrderStatus::Pending.validate_transition(OrderStatus::Preparing).is_ok());
        assert!(OrderStatus::Preparing.validate_transition(OrderStatus::Ready).is_ok());
        assert!(OrderStatus::Ready.validate_transition(OrderStatus::Completed).is_ok());
    }

    #[test]
    fn pulo_de_etapa_e_recusado_com_origem_e_destino() {
        // pending -> ready pula 'preparing': deve falhar sem mudar nada
        let err = OrderStatus::Pending
            .validate_transition(OrderStatus::Ready)
            .unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, OrderStatus::Pending);
                assert_eq!(to, OrderStatus::Ready);
            }
            other => panic!("esperava InvalidTransition, veio {:?}", other),
        }
    }

    #[test]
    fn regressao_e_repeticao_sao_recusadas() {
        assert!(OrderStatus::Ready.validate_transition(OrderStatus::Preparing).is_err());
        assert!(OrderStatus::Preparing.validate_transition(OrderStatus::Preparing).is_err());
    }

    #[test]
    fn completed_e_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        for to in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ] {
            assert!(OrderStatus::Completed.validate_transition(to).is_err());
        }
    }

    #[test]
    fn claim_avanca_somente_pedidos_pendentes() {
        assert_eq!(OrderStatus::Pending.after_claim(), OrderStatus::Preparing);
        assert_eq!(OrderStatus::Preparing.after_claim(), OrderStatus::Preparing);
        assert_eq!(OrderStatus::Ready.after_claim(), OrderStatus::Ready);
        assert_eq!(OrderStatus::Completed.after_claim(), OrderStatus::Completed);
    }

    #[test]
    fn total_e_a_soma_dos_subtotais_do_snapshot() {
        // [{price:10, qty:2}, {price:5, qty:1}] => 25
        let items = vec![
            NewOrderItem {
                menu_item_id: Uuid::new_v4(),
                name: "Espetinho".into(),
                unit_price: Decimal::from(10),
                quantity: 2,
                notes: None,
            },
            NewOrderItem {
                menu_item_id: Uuid::new_v4(),
                name: "Refrigerante".into(),
                unit_price: Decimal::from(5),
                quantity: 1,
                notes: None,
            },
        ];
        assert_eq!(compute_total(&items), Decimal::from(25));
    }

    #[test]
    fn total_de_pedido_sem_itens_e_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn visao_publica_omite_as_anotacoes_internas() {
        let order = Order {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            order_number: "20260823-001".into(),
            customer_name: Some("Ana".into()),
            customer_phone: Some("11999990000".into()),
            table_number: Some("7".into()),
            notes: Some("cliente conhecido, cuidado com alergia".into()),
            status: OrderStatus::Pending,
            assigned_staff: None,
            staff_type: None,
            total_price: Decimal::from(25),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };
        let public = PublicOrder::from(OrderWithItems { order, items: vec![] });
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("notes").is_none());
        assert_eq!(json["orderNumber"], "20260823-001");
    }

    #[test]
    fn itens_ordenados_por_posicao_reconstituem_a_sequencia_do_pedido() {
        let order_id = Uuid::new_v4();
        let item = |position: i32, name: &str| OrderItem {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id: Uuid::new_v4(),
            position,
            name: name.into(),
            unit_price: Decimal::from(10),
            quantity: 1,
            notes: None,
        };

        // PKs v4 aleatórias não carregam ordem; a posição sim. Simula uma
        // leitura fora de ordem e aplica o critério das queries de itens.
        let mut items = vec![item(2, "Refrigerante"), item(0, "Espetinho"), item(1, "Farofa")];
        items.sort_by_key(|i| i.position);

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Espetinho", "Farofa", "Refrigerante"]);

        // A posição é detalhe de persistência: não vaza no JSON
        let json = serde_json::to_value(&items[0]).unwrap();
        assert!(json.get("position").is_none());
        assert_eq!(json["name"], "Espetinho");
    }

    #[test]
    fn status_serializa_em_minusculas() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Preparing).unwrap(),
            "\"preparing\""
        );
        let de: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(de, OrderStatus::Completed);
    }

    #[test]
    fn a_ordem_das_variantes_e_crescente() {
        // O caminho do pedido é uma caminhada não-decrescente
        assert!(OrderStatus::Pending < OrderStatus::Preparing);
        assert!(OrderStatus::Preparing < OrderStatus::Ready);
        assert!(OrderStatus::Ready < OrderStatus::Completed);
    }
}
