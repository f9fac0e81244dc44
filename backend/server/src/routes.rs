use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{self, Path},
    response::IntoResponse,
};
use catalog::Item;

use crate::{
    aggregate::compute_report,
    error::AppError,
    ledger::{apply_vote, session_counts},
    models::{Figure, ItemCount},
    session::SessionContext,
    state::State,
    utils::get_vote_from_body,
};

pub async fn catalog_handler(extract::State(state): extract::State<Arc<State>>) -> Json<Vec<Item>> {
    Json(state.catalog.items().to_vec())
}

pub async fn tally_handler(
    extract::State(state): extract::State<Arc<State>>,
    session: SessionContext,
) -> Result<impl IntoResponse, AppError> {
    let counts = session_counts(&state.store, &state.catalog, session.id()).await?;

    Ok(Json(
        counts
            .into_iter()
            .map(|(item, count)| ItemCount { item, count })
            .collect::<Vec<_>>(),
    ))
}

pub async fn vote_handler(
    extract::State(state): extract::State<Arc<State>>,
    mut session: SessionContext,
    Path(item): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let vote = get_vote_from_body(body)?;
    let id = session.ensure_session_id();

    let count = apply_vote(&state.store, &state.catalog, id, &item, vote.plus, vote.minus).await?;

    Ok((session, Json(ItemCount { item, count })))
}

pub async fn report_handler(
    extract::State(state): extract::State<Arc<State>>,
) -> Result<Json<Figure>, AppError> {
    let report = compute_report(&state.store, &state.catalog).await?;

    Ok(Json(Figure::bar(report, &state.config.report_title)))
}
