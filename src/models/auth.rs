// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    #[schema(example = "Maria Silva")]
    pub name: String,
    pub role: UserRole,

    // Vínculo de staff: restaurante que o usuário atende (se houver)
    pub restaurant_id: Option<Uuid>,

    // Especializações que o staff pode atender (ex: "grillade", "drinks")
    pub staff_type: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Primeira especialização declarada, usada no efeito colateral do
    /// claim (escolha determinística: índice 0).
    pub fn primary_staff_type(&self) -> Option<&str> {
        self.staff_type
            .as_deref()
            .and_then(|types| types.first())
            .map(String::as_str)
    }

    /// O usuário declarou esta especialização?
    pub fn has_staff_type(&self, staff_type: &str) -> bool {
        self.staff_type
            .as_deref()
            .is_some_and(|types| types.iter().any(|t| t == staff_type))
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_user(types: Option<Vec<&str>>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "staff@exemplo.com".into(),
            password_hash: "x".into(),
            name: "Staff".into(),
            role: UserRole::User,
            restaurant_id: Some(Uuid::new_v4()),
            staff_type: types.map(|t| t.into_iter().map(String::from).collect()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn primary_staff_type_pega_o_indice_zero() {
        let user = staff_user(Some(vec!["drinks", "grillade"]));
        assert_eq!(user.primary_staff_type(), Some("drinks"));
    }

    #[test]
    fn sem_especializacao_nao_ha_tipo_primario() {
        assert_eq!(staff_user(None).primary_staff_type(), None);
        assert_eq!(staff_user(Some(vec![])).primary_staff_type(), None);
    }

    #[test]
    fn has_staff_type_confere_declaracoes() {
        let user = staff_user(Some(vec!["drinks"]));
        assert!(user.has_staff_type("drinks"));
        assert!(!user.has_staff_type("grillade"));
    }
}
