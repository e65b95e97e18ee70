use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

/// CPF with or without the usual punctuation (`123.456.789-09` or `12345678909`).
static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.?\d{3}\.?\d{3}-?\d{2}$").expect("CPF pattern compiles"));

fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    if CPF_RE.is_match(cpf) {
        Ok(())
    } else {
        Err(ValidationError::new("cpf").with_message("CPF inválido.".into()))
    }
}

/// Account types referenced by name in queries.
pub const TIPO_ASSOCIADO: &str = "Associado";
pub const TIPOS_FRANQUIA: [&str; 2] = ["Franquia", "Franquia Master"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id_usuario: i64,
    pub nome: String,
    pub email: String,
    pub cpf: Option<String>,
    #[serde(skip_serializing)]
    pub senha: String,
    /// JSON list stored as text.
    pub permissoes_do_usuario: String,
    #[serde(skip_serializing)]
    pub token_reset_senha: Option<String>,
    pub usuario_criador_id: Option<i64>,
    pub nome_fantasia: Option<String>,
    pub razao_social: Option<String>,
    pub nome_contato: Option<String>,
    pub telefone: Option<String>,
    pub estado: Option<String>,
    pub cidade: Option<String>,
    pub bloqueado: bool,
}

impl User {
    /// Stored permission list; unreadable text reads as empty.
    pub fn permissions(&self) -> Vec<String> {
        parse_permissions(&self.permissoes_do_usuario)
    }
}

pub fn parse_permissions(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccount {
    pub id_sub_contas: i64,
    pub nome: String,
    pub email: String,
    pub cpf: Option<String>,
    #[serde(skip_serializing)]
    pub senha: String,
    #[serde(skip_serializing)]
    pub token_reset_senha: Option<String>,
    pub conta_pai_id: Option<i64>,
    pub bloqueado: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id_conta: i64,
    pub usuario_id: i64,
    pub plano_id: Option<i64>,
    pub tipo_da_conta_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountType {
    pub id_tipo_conta: i64,
    pub tipo_da_conta: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres."))]
    pub senha: String,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,
    pub usuario_criador_id: Option<i64>,
    pub nome_fantasia: Option<String>,
    pub razao_social: Option<String>,
    pub nome_contato: Option<String>,
    pub telefone: Option<String>,
    pub estado: Option<String>,
    pub cidade: Option<String>,
    /// When present, an account (`conta`) of this type is opened for the user.
    pub tipo_da_conta: Option<String>,
    pub plano_id: Option<i64>,
}

/// Partial update; absent fields are left untouched. `senha` is re-hashed.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres."))]
    pub senha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario_criador_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razao_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_contato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloqueado: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Informe o e-mail ou CPF."))]
    pub login: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub senha: String,
}

impl LoginRequest {
    /// Identifiers containing `@` are e-mails; anything else is a CPF.
    pub fn lookup_column(&self) -> &'static str {
        if self.login.contains('@') {
            "email"
        } else {
            "cpf"
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionsRequest {
    #[validate(length(min = 1, message = "Informe ao menos uma permissão."))]
    pub permissoes: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    pub email: Option<String>,
    pub cpf: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmRequest {
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres."))]
    pub nova_senha: String,
    #[validate(length(min = 1, message = "Token de redefinição de senha inválido."))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountTypeFilter {
    #[serde(default)]
    #[validate(length(
        min = 1,
        message = "O tipo de conta é obrigatório e deve ser um array não vazio no corpo da solicitação."
    ))]
    pub tipo_conta: Vec<String>,
}

/// Exact-match filters for `/buscar-usuario-params`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchQuery {
    pub nome: Option<String>,
    pub nome_fantasia: Option<String>,
    pub razao_social: Option<String>,
    pub nome_contato: Option<String>,
    pub estado: Option<String>,
    pub cidade: Option<String>,
    pub usuario_criador_id: Option<i64>,
    pub tipo_da_conta: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl UserSearchQuery {
    /// Column filters in a fixed order.
    pub fn text_filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("nome", &self.nome),
            ("nomeFantasia", &self.nome_fantasia),
            ("razaoSocial", &self.razao_social),
            ("nomeContato", &self.nome_contato),
            ("estado", &self.estado),
            ("cidade", &self.cidade),
        ]
        .into_iter()
        .filter_map(|(col, v)| v.as_deref().map(|v| (col, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_row() -> serde_json::Value {
        json!({
            "idUsuario": 7,
            "nome": "Ana",
            "email": "ana@x.com",
            "cpf": null,
            "senha": "$2b$04$hash",
            "permissoesDoUsuario": "[\"admin\"]",
            "tokenResetSenha": "abc",
            "usuarioCriadorId": null,
            "nomeFantasia": null,
            "razaoSocial": null,
            "nomeContato": null,
            "telefone": null,
            "estado": "SP",
            "cidade": null,
            "bloqueado": false
        })
    }

    #[test]
    fn secrets_never_serialize() {
        let user: User = serde_json::from_value(user_row()).unwrap();
        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("senha").is_none());
        assert!(out.get("tokenResetSenha").is_none());
        assert_eq!(out["idUsuario"], 7);
        assert_eq!(out["estado"], "SP");
        assert_eq!(user.permissions(), vec!["admin".to_string()]);
    }

    #[test]
    fn garbage_permission_text_reads_empty() {
        assert!(parse_permissions("not json").is_empty());
        assert!(parse_permissions("[]").is_empty());
    }

    #[test]
    fn login_kind_follows_at_sign() {
        let by_mail = LoginRequest {
            login: "a@b.com".into(),
            senha: "x".into(),
        };
        let by_cpf = LoginRequest {
            login: "12345678909".into(),
            senha: "x".into(),
        };
        assert_eq!(by_mail.lookup_column(), "email");
        assert_eq!(by_cpf.lookup_column(), "cpf");
    }

    #[test]
    fn create_user_validation() {
        let mut req: CreateUserRequest = serde_json::from_value(json!({
            "nome": "Ana", "email": "ana@x.com", "senha": "segredo", "cpf": "123.456.789-09"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        req.cpf = Some("12-3".into());
        assert!(req.validate().is_err());
        req.cpf = None;
        req.email = "sem-arroba".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_skips_absent_fields() {
        let req = UpdateUserRequest {
            cidade: Some("Recife".into()),
            ..Default::default()
        };
        let row = crate::store::to_row(&req).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["cidade"], "Recife");
    }

    #[test]
    fn empty_type_list_is_invalid() {
        let f: AccountTypeFilter = serde_json::from_value(json!({})).unwrap();
        assert!(f.validate().is_err());
        let f: AccountTypeFilter = serde_json::from_value(json!({"tipoConta": ["Associado"]})).unwrap();
        assert!(f.validate().is_ok());
    }
}
