// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_restaurant_orders,
        handlers::orders::get_restaurant_order,
        handlers::orders::update_restaurant_order,
        handlers::orders::track_order,

        // --- Staff ---
        handlers::staff::list_staff_orders,
        handlers::staff::update_staff_order,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Orders ---
            models::order::OrderStatus,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderWithItems,
            models::order::PublicOrder,

            // --- Colaboradores ---
            models::restaurant::Restaurant,
            models::menu::MenuItem,

            // --- Payloads ---
            handlers::orders::CreateOrderPayload,
            handlers::orders::OrderItemPayload,
            handlers::orders::OperatorUpdatePayload,
            handlers::staff::StaffUpdatePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Orders", description = "Criação, acompanhamento e edição de pedidos"),
        (name = "Staff", description = "Fila, claim e transições de status do staff")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
