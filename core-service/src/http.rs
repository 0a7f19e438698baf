//! # HTTP Routes
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | `GET` | `/<format>/<table>/<id>` | unique lookup |
//! | `GET` | `/<format>/<table>?data=...` | query batch |
//! | `POST` | `/<format>/<table>` | create |
//! | `PUT` | `/<format>/<table>` | update |
//!
//! Successful responses carry the format's content type. Failures are
//! rendered by [`ServiceError`](crate::ServiceError).

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::dispatcher::{Dispatcher, Encoded};
use crate::error::Result;

/// Query-string key carrying one example payload.
pub const DATA_PARAM: &str = "data";

impl IntoResponse for Encoded {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, self.format.content_type())],
            self.body,
        )
            .into_response()
    }
}

/// Catalogue router over `dispatcher`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(
            "/:format/:table",
            get(query_handler).post(create_handler).put(update_handler),
        )
        .route("/:format/:table/:id", get(lookup_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Every `data` value of a raw query string, decoded, in order.
pub fn data_payloads(raw_query: Option<&str>) -> Vec<String> {
    raw_query
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .filter(|(key, _)| key == DATA_PARAM)
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

async fn lookup_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((format, table, id)): Path<(String, String, String)>,
) -> Result<Encoded> {
    dispatcher.lookup(&format, &table, &id).await
}

async fn query_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((format, table)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Result<Encoded> {
    let payloads = data_payloads(query.as_deref());
    dispatcher.query(&format, &table, &payloads).await
}

async fn create_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((format, table)): Path<(String, String)>,
    body: Bytes,
) -> Result<Encoded> {
    dispatcher.create(&format, &table, &body).await
}

async fn update_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((format, table)): Path<(String, String)>,
    body: Bytes,
) -> Result<Encoded> {
    dispatcher.update(&format, &table, &body).await
}
