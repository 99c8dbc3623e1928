use axum::extract::{Query, State};
use axum::Json;
use leychile_harvester::config::validate_id_parte;
use leychile_harvester::harvester::global_search;
use leychile_harvester::types::{ArticleSummary, HtmlFragment, SearchHit};
use leychile_harvester::{ArticleRecord, LawDetail, Resolution};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Bounds of the `max_leyes` and `max_resultados` search parameters.
const SEARCH_LIMIT_RANGE: std::ops::RangeInclusive<u16> = 1..=50;
const DEFAULT_SEARCH_LIMIT: u16 = 10;

pub const ROUTES: [&str; 7] = [
    "/",
    "/health",
    "/ley",
    "/ley_articulos_ids",
    "/ley_articulo_idparte",
    "/buscar_global",
    "/ley_html",
];

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub routes: &'static [&'static str],
}

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        routes: &ROUTES,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct LawQuery {
    pub numero_ley: String,
    pub articulo: Option<String>,
}

pub async fn law(
    State(state): State<AppState>,
    Query(params): Query<LawQuery>,
) -> Result<Json<LawDetail>, ApiError> {
    let law = state.load_law(&params.numero_ley).await?;
    match law.detail(params.articulo.as_deref(), state.config.max_articles)? {
        Resolution::Found(detail) => Ok(Json(detail)),
        Resolution::NotFound(diagnostic) => Err(ApiError::ArticleNotFound(Box::new(diagnostic))),
    }
}

#[derive(Deserialize)]
pub struct LawIdsQuery {
    pub numero_ley: String,
}

pub async fn article_ids(
    State(state): State<AppState>,
    Query(params): Query<LawIdsQuery>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let law = state.load_law(&params.numero_ley).await?;
    Ok(Json(law.summaries()))
}

#[derive(Deserialize)]
pub struct PartQuery {
    pub numero_ley: String,
    #[serde(rename = "idParte", alias = "id_parte")]
    pub id_parte: String,
}

pub async fn article_by_part(
    State(state): State<AppState>,
    Query(params): Query<PartQuery>,
) -> Result<Json<ArticleRecord>, ApiError> {
    validate_id_parte(&params.id_parte)?;
    let law = state.load_law(&params.numero_ley).await?;
    law.find_part(&params.id_parte)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No article with idParte {} in law {}",
                params.id_parte, law.law_number
            ))
        })
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub consulta: String,
    pub max_leyes: Option<u16>,
    pub max_resultados: Option<u16>,
}

fn search_limit(name: &str, value: Option<u16>) -> Result<usize, ApiError> {
    let value = value.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if SEARCH_LIMIT_RANGE.contains(&value) {
        Ok(usize::from(value))
    } else {
        Err(ApiError::BadRequest(format!(
            "{name} must be between {} and {}",
            SEARCH_LIMIT_RANGE.start(),
            SEARCH_LIMIT_RANGE.end()
        )))
    }
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let phrase = params.consulta.trim().to_string();
    if phrase.is_empty() {
        return Err(ApiError::BadRequest("consulta must not be empty".to_string()));
    }
    let max_laws = search_limit("max_leyes", params.max_leyes)?;
    let max_results = search_limit("max_resultados", params.max_resultados)?;

    let hits = state
        .run_blocking(move |source| global_search(source, &phrase, max_laws, max_results))
        .await?;
    Ok(Json(hits))
}

#[derive(Deserialize)]
pub struct HtmlQuery {
    #[serde(rename = "idNorma", alias = "id_norma")]
    pub id_norma: String,
    #[serde(rename = "idParte", alias = "id_parte")]
    pub id_parte: String,
}

pub async fn law_html(
    State(state): State<AppState>,
    Query(params): Query<HtmlQuery>,
) -> Result<Json<HtmlFragment>, ApiError> {
    let fragment = state
        .run_blocking(move |source| source.fetch_html_fragment(&params.id_norma, &params.id_parte))
        .await?;
    Ok(Json(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_limits() {
        assert_eq!(search_limit("max_leyes", None).unwrap(), 10);
        assert_eq!(search_limit("max_leyes", Some(50)).unwrap(), 50);
        assert!(matches!(
            search_limit("max_leyes", Some(0)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            search_limit("max_resultados", Some(51)),
            Err(ApiError::BadRequest(msg)) if msg.contains("max_resultados")
        ));
    }
}
