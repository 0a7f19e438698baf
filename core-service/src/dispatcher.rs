//! Request dispatch.
//!
//! Resolves the format tag, the table and the identifier, in that order,
//! then hands the resolved pieces to the table's handler. Nothing here knows
//! about HTTP; [`ServiceError::status_code`](crate::ServiceError::status_code)
//! applies the status mapping at the edge.

use crate::error::{Result, ServiceError};
use crate::handlers::CatalogRoute;
use crate::registry::EntityRegistry;
use core_encoding::Format;
use std::sync::Arc;

/// A successful response body and the format it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub format: Format,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: EntityRegistry,
}

impl Dispatcher {
    pub fn new(registry: EntityRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn resolve(&self, format: &str, table: &str) -> Result<(Format, &Arc<dyn CatalogRoute>)> {
        let format = Format::from_tag(format)
            .ok_or_else(|| ServiceError::UnknownFormat(format.to_string()))?;
        let route = self
            .registry
            .route(table)
            .ok_or_else(|| ServiceError::UnknownTable(table.to_string()))?;
        Ok((format, route))
    }

    /// `GET /<format>/<table>/<id>`
    pub async fn lookup(&self, format: &str, table: &str, id: &str) -> Result<Encoded> {
        let (format, route) = self.resolve(format, table)?;
        let id = id
            .parse::<i64>()
            .map_err(|_| ServiceError::InvalidIdentifier(id.to_string()))?;

        let body = route.lookup(format, id).await?;
        Ok(Encoded { format, body })
    }

    /// `GET /<format>/<table>?data=...`
    pub async fn query(&self, format: &str, table: &str, payloads: &[String]) -> Result<Encoded> {
        let (format, route) = self.resolve(format, table)?;
        let body = route.query(format, payloads).await?;
        Ok(Encoded { format, body })
    }

    /// `POST /<format>/<table>`
    pub async fn create(&self, format: &str, table: &str, payload: &[u8]) -> Result<Encoded> {
        let (format, route) = self.resolve(format, table)?;
        let body = route.create(format, payload).await?;
        Ok(Encoded { format, body })
    }

    /// `PUT /<format>/<table>`
    pub async fn update(&self, format: &str, table: &str, payload: &[u8]) -> Result<Encoded> {
        let (format, route) = self.resolve(format, table)?;
        let body = route.update(format, payload).await?;
        Ok(Encoded { format, body })
    }
}
