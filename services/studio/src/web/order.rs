//! services/studio/src/web/order.rs
//!
//! Handlers for buying a license: pricing, placing the order with its
//! transfer receipt, and the cached last order.

use crate::web::{
    port_error,
    protocol::{OrderReceiptView, QuoteQuery, QuoteView},
    state::AppState,
};
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use freeplotter_core::{
    order::{duration_label, ensure_no_pending_order, quote, OrderForm},
    ports::{PortError, PortResult},
    LicenseType, ReceiptImage,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

fn license_type(code: u8) -> PortResult<LicenseType> {
    LicenseType::from_code(code)
        .ok_or_else(|| PortError::Validation(format!("Unknown license type {}", code)))
}

/// Prices a license type and duration, including the unique transfer code.
#[utoipa::path(
    get,
    path = "/order/quote",
    params(
        ("licenseType" = u8, Query, description = "1 for Standard, 2 for Premium"),
        ("duration" = u8, Query, description = "Duration step from 1 to 7")
    ),
    responses(
        (status = 200, description = "The price to transfer", body = QuoteView),
        (status = 422, description = "Unknown license type or duration")
    )
)]
pub async fn quote_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let license_type = license_type(query.license_type).map_err(port_error)?;
    let unique_code = *app_state.order_code.lock().await;
    let priced = quote(license_type, query.duration, unique_code).map_err(port_error)?;
    let label = duration_label(query.duration).map_err(port_error)?;
    Ok(Json(QuoteView::new(license_type, label, priced)))
}

/// Places an order.
///
/// Accepts a multipart/form-data request with the fields `name`, `email`,
/// `phone` (optional), `license_type`, `duration` and the receipt image as
/// `tximg`.
#[utoipa::path(
    post,
    path = "/order",
    request_body(content_type = "multipart/form-data", description = "The order form and the transfer receipt."),
    responses(
        (status = 201, description = "Order accepted", body = OrderReceiptView),
        (status = 422, description = "Invalid form, or an order is already on record"),
        (status = 502, description = "The order service failed")
    )
)]
pub async fn submit_order_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = read_order_form(&mut multipart).await.map_err(port_error)?;

    let last_order = app_state.preferences.last_order().await.map_err(port_error)?;
    ensure_no_pending_order(last_order.as_ref()).map_err(port_error)?;

    let unique_code = *app_state.order_code.lock().await;
    let submission = form
        .into_submission(unique_code, Utc::now())
        .map_err(port_error)?;

    let start_time = Instant::now();
    let outcome = tokio::select! {
        _ = app_state.shutdown.cancelled() => Err(PortError::Cancelled),
        result = app_state.orders.submit_order(&submission) => result,
    };
    info!("⏱️ Order submission took: {:?}", start_time.elapsed());

    let receipt = outcome.map_err(|e| {
        error!("Order submission failed: {}", e);
        port_error(e)
    })?;
    app_state
        .preferences
        .set_last_order(Some(&receipt))
        .await
        .map_err(port_error)?;
    info!("Order placed, license valid until {}", receipt.end_date);

    Ok((StatusCode::CREATED, Json(OrderReceiptView::from(receipt))))
}

/// Returns the cached last order, if any.
#[utoipa::path(
    get,
    path = "/order/last",
    responses(
        (status = 200, description = "The last order", body = OrderReceiptView),
        (status = 404, description = "No order on record")
    )
)]
pub async fn last_order_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let receipt = app_state
        .preferences
        .last_order()
        .await
        .map_err(port_error)?
        .ok_or_else(|| port_error(PortError::NotFound("No order on record".to_string())))?;
    Ok(Json(OrderReceiptView::from(receipt)))
}

/// Forgets the last order so a new one can be placed.
#[utoipa::path(
    delete,
    path = "/order/last",
    responses((status = 204, description = "Order forgotten"))
)]
pub async fn reset_order_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .preferences
        .set_last_order(None)
        .await
        .map_err(port_error)?;
    app_state.refresh_order_code().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_order_form(multipart: &mut Multipart) -> PortResult<OrderForm> {
    let mut name = String::new();
    let mut email = String::new();
    let mut phone = None;
    let mut license_code = None;
    let mut duration = None;
    let mut receipt = None;

    let bad_form = |e: axum::extract::multipart::MultipartError| {
        PortError::Validation(format!("Failed to read multipart data: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "tximg" => {
                let file_name = field.file_name().unwrap_or("receipt").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;
                receipt = Some(ReceiptImage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "name" => name = field.text().await.map_err(bad_form)?,
            "email" => email = field.text().await.map_err(bad_form)?,
            "phone" => phone = Some(field.text().await.map_err(bad_form)?),
            "license_type" => {
                let raw = field.text().await.map_err(bad_form)?;
                license_code = Some(parse_number(&raw, "license_type")?);
            }
            "duration" => {
                let raw = field.text().await.map_err(bad_form)?;
                duration = Some(parse_number(&raw, "duration")?);
            }
            _ => {}
        }
    }

    Ok(OrderForm {
        name,
        email,
        phone,
        license_type: license_type(license_code.unwrap_or(1))?,
        duration_step: duration.unwrap_or(1),
        receipt,
    })
}

fn parse_number(raw: &str, field: &str) -> PortResult<u8> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| PortError::Validation(format!("'{}' is not a valid {}", raw, field)))
}
