use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id_plano: i64,
    pub nome_plano: String,
    pub tipo_do_plano: Option<String>,
    pub taxa_inscricao: Option<f64>,
    pub taxa_comissao: Option<f64>,
    pub taxa_manutencao_anual: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 120, message = "O nome do plano é obrigatório."))]
    pub nome_plano: String,
    pub tipo_do_plano: Option<String>,
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_inscricao: Option<f64>,
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_comissao: Option<f64>,
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_manutencao_anual: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "O nome do plano é obrigatório."))]
    pub nome_plano: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_do_plano: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_inscricao: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_comissao: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Taxas não podem ser negativas."))]
    pub taxa_manutencao_anual: Option<f64>,
}
