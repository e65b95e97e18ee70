use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id_categoria: i64,
    pub nome_categoria: String,
    pub tipo_categoria: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id_subcategoria: i64,
    pub nome_subcategoria: String,
    pub categoria_id: i64,
}

/// Category as listed, with its subcategories.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub categoria: Category,
    pub subcategorias: Vec<Subcategory>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "O nome da categoria é obrigatório."))]
    pub nome_categoria: String,
    pub tipo_categoria: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "O nome da categoria é obrigatório."))]
    pub nome_categoria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_categoria: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryRequest {
    #[validate(length(min = 1, max = 120, message = "O nome da subcategoria é obrigatório."))]
    pub nome_subcategoria: String,
}
