//! Categories and their subcategories.

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::AppError;
use crate::extractors::{ApiPath, ApiQuery, ValidJson};
use crate::handlers::{create, ensure_absent, fetch, update_by_id};
use crate::models::{
    Category, CategoryWithSubcategories, CreateCategoryRequest, PageQuery, Subcategory, SubcategoryRequest,
    UpdateCategoryRequest,
};
use crate::response::{self, PageMeta};
use crate::schema::{CATEGORIES, SUBCATEGORIES};
use crate::state::AppState;
use crate::store::{decode, decode_all, to_row, Filter, SelectOptions};

const CATEGORY_NOT_FOUND: &str = "Categoria não encontrada.";
const SUBCATEGORY_NOT_FOUND: &str = "Subcategoria não encontrada.";

pub async fn create_category(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    ensure_absent(
        store,
        &CATEGORIES,
        "nomeCategoria",
        &req.nome_categoria,
        "Já existe uma categoria com o mesmo nome.",
    )
    .await?;
    let category: Category = create(store, &CATEGORIES, to_row(&req)?).await?;
    tracing::info!(id = category.id_categoria, "category created");
    Ok(response::created(category))
}

pub async fn create_subcategory(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ValidJson(req): ValidJson<SubcategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    fetch::<Category>(store, &CATEGORIES, category_id, CATEGORY_NOT_FOUND).await?;
    let mut data = to_row(&req)?;
    data.insert("categoriaId".into(), category_id.into());
    let sub: Subcategory = create(store, &SUBCATEGORIES, data).await?;
    tracing::info!(id = sub.id_subcategoria, category_id, "subcategory created");
    Ok(response::created(sub))
}

pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let page = q.request(10);
    let result = store.paginate(&CATEGORIES, &Filter::all(), page).await?;
    let categories: Vec<Category> = decode_all(result.rows)?;

    let ids: Vec<i64> = categories.iter().map(|c| c.id_categoria).collect();
    let subs: Vec<Subcategory> = decode_all(
        store
            .select(
                &SUBCATEGORIES,
                &Filter::all().and_in("categoriaId", ids),
                &SelectOptions::order_asc("idSubcategoria"),
            )
            .await?,
    )?;
    let mut by_category: HashMap<i64, Vec<Subcategory>> = HashMap::new();
    for sub in subs {
        by_category.entry(sub.categoria_id).or_default().push(sub);
    }

    let data = categories
        .into_iter()
        .map(|categoria| CategoryWithSubcategories {
            subcategorias: by_category.remove(&categoria.id_categoria).unwrap_or_default(),
            categoria,
        })
        .collect();
    Ok(response::paged::<CategoryWithSubcategories>(data, PageMeta::new(page, result.total)))
}

pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ValidJson(req): ValidJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category: Category = update_by_id(
        state.store.as_ref(),
        &CATEGORIES,
        category_id,
        to_row(&req)?,
        CATEGORY_NOT_FOUND,
    )
    .await?;
    tracing::info!(id = category_id, "category updated");
    Ok(response::ok(category))
}

pub async fn edit_subcategory(
    State(state): State<AppState>,
    ApiPath(subcategory_id): ApiPath<i64>,
    ValidJson(req): ValidJson<SubcategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let sub: Subcategory = update_by_id(
        state.store.as_ref(),
        &SUBCATEGORIES,
        subcategory_id,
        to_row(&req)?,
        SUBCATEGORY_NOT_FOUND,
    )
    .await?;
    tracing::info!(id = subcategory_id, "subcategory updated");
    Ok(response::ok(sub))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubcategoryDeleted {
    message: &'static str,
    subcategoria_deletada: Subcategory,
}

pub async fn delete_subcategory(
    State(state): State<AppState>,
    ApiPath(subcategory_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = state
        .store
        .delete(&SUBCATEGORIES, &Filter::eq("idSubcategoria", subcategory_id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(SUBCATEGORY_NOT_FOUND.into()))?;
    tracing::info!(id = subcategory_id, "subcategory deleted");
    Ok(response::ok(SubcategoryDeleted {
        message: "Subcategoria deletada com sucesso",
        subcategoria_deletada: decode(row)?,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDeleted {
    message: &'static str,
    categoria_deletada: Category,
}

/// Refused while subcategories reference the category; the foreign key backs the check.
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    fetch::<Category>(store, &CATEGORIES, category_id, CATEGORY_NOT_FOUND).await?;
    let linked = store
        .count(&SUBCATEGORIES, &Filter::eq("categoriaId", category_id))
        .await?;
    if linked > 0 {
        return Err(AppError::Conflict(
            "Não é possível deletar a categoria pois existem subcategorias relacionadas.".into(),
        ));
    }
    let row = store
        .delete(&CATEGORIES, &Filter::eq("idCategoria", category_id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.into()))?;
    tracing::info!(id = category_id, "category deleted");
    Ok(response::ok(CategoryDeleted {
        message: "Categoria deletada com sucesso.",
        categoria_deletada: decode(row)?,
    }))
}
