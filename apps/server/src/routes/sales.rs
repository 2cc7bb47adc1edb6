//! Point of sale: recording sales, sale history and invoice PDFs.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::RangeQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::export::invoice_pdf;
use crate::extract::{PathParam, Payload, QueryParams};
use crate::AppState;
use medisync_core::sale::{SaleReceipt, SaleRequest};
use medisync_core::{authorize, Action, Sale, SaleDetail};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sales", get(list).post(record))
        .route("/api/sales/{id}", get(show))
        .route("/api/sales/{id}/invoice", get(invoice))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    QueryParams(query): QueryParams<RangeQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    authorize(&user.actor(), Action::ListSales)?;
    let range = query.into_range()?;
    Ok(Json(state.db.sales().list(&range).await?))
}

/// Records a sale for the calling user. The gate runs again inside the
/// sale transaction with the same actor.
async fn record(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(request): Payload<SaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    let actor = user.actor();
    authorize(&actor, Action::RecordSale)?;
    let receipt = state.db.sales().record_sale(&actor, &request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<SaleDetail>> {
    authorize(&user.actor(), Action::ViewSale)?;
    Ok(Json(state.db.sales().get_detail(id).await?))
}

async fn invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user.actor(), Action::ExportInvoice)?;

    let detail = state.db.sales().get_detail(id).await?;
    let pdf = invoice_pdf(&detail)?;
    let disposition = format!(
        "attachment; filename=\"invoice_{}.pdf\"",
        detail.sale.invoice_number
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
