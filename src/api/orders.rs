use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::order::{CreateOrder, Order, OrderCommandHandler, OrderId, UpdateStatus};
use crate::store::SCAN_COMPLETE;

use super::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<Order>,
    #[serde(default, skip_serializing_if = "is_complete")]
    pub next: u64,
}

fn is_complete(cursor: &u64) -> bool {
    *cursor == SCAN_COMPLETE
}

/// `POST /orders`
pub async fn create(
    handler: web::Data<OrderCommandHandler>,
    body: web::Json<CreateOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = handler.create(body.into_inner()).await?;
    tracing::info!(order_id = order.order_id, "Order created");
    Ok(HttpResponse::Created().json(order))
}

/// `GET /orders?cursor=N`
pub async fn list(
    handler: web::Data<OrderCommandHandler>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let cursor = match query.cursor.as_deref() {
        None | Some("") => SCAN_COMPLETE,
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ApiError::BadRequest(format!("invalid cursor '{raw}'")))?,
    };

    let page = handler.list(cursor).await?;
    Ok(HttpResponse::Ok().json(ListResponse {
        items: page.orders,
        next: page.next_offset,
    }))
}

/// `GET /orders/{id}`
pub async fn get_by_id(
    handler: web::Data<OrderCommandHandler>,
    id: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order = handler.get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// `PUT /orders/{id}` with body `{"status": "shipped" | "completed"}`
pub async fn update_by_id(
    handler: web::Data<OrderCommandHandler>,
    id: web::Path<OrderId>,
    body: web::Json<UpdateStatus>,
) -> Result<HttpResponse, ApiError> {
    let order = handler.update_status(id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// `DELETE /orders/{id}`
pub async fn delete_by_id(
    handler: web::Data<OrderCommandHandler>,
    id: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    handler.delete(id).await?;
    tracing::info!(order_id = id, "Order deleted");
    Ok(HttpResponse::NoContent().finish())
}
