//! Product resource client for the `/papeleria` collection.
//!
//! DESIGN
//! ======
//! Payload encoding is picked from the payload itself: an attached image means
//! multipart, anything else is JSON. Multipart updates go out as
//! `POST /papeleria/:id` with a `_method=PUT` form field because the backend
//! cannot parse multipart bodies on `PUT`.
//!
//! ERROR HANDLING
//! ==============
//! Backend error bodies are returned unchanged inside `ApiError::Backend`.

#[cfg(test)]
#[path = "products_test.rs"]
mod products_test;

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};

use crate::error::ApiError;
use crate::net::api::ApiClient;
use crate::net::types::{
    Encoding, IMAGE_FIELD, Product, ProductEnvelope, ProductFilter, ProductListEnvelope, ProductPayload, form_text,
};
use crate::state::AuthWatch;

const COLLECTION: &str = "papeleria";
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// How a create/update call is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPlan {
    pub method: Method,
    pub segments: Vec<String>,
    pub encoding: Encoding,
    /// Value of the `_method` form field, when the verb is overridden.
    pub method_override: Option<Method>,
}

#[must_use]
pub fn plan_create(payload: &ProductPayload) -> RequestPlan {
    RequestPlan {
        method: Method::POST,
        segments: vec![COLLECTION.to_owned()],
        encoding: payload.encoding(),
        method_override: None,
    }
}

#[must_use]
pub fn plan_update(id: i64, payload: &ProductPayload) -> RequestPlan {
    let segments = vec![COLLECTION.to_owned(), id.to_string()];
    match payload.encoding() {
        Encoding::Json => RequestPlan { method: Method::PUT, segments, encoding: Encoding::Json, method_override: None },
        Encoding::Multipart => RequestPlan {
            method: Method::POST,
            segments,
            encoding: Encoding::Multipart,
            method_override: Some(Method::PUT),
        },
    }
}

#[derive(Clone, Debug)]
pub struct ProductClient {
    api: ApiClient,
    auth: AuthWatch,
}

impl ProductClient {
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthWatch) -> Self {
        Self { api, auth }
    }

    /// `GET /papeleria[?params]`.
    ///
    /// # Errors
    ///
    /// Network, backend or decode failures.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let mut request = self.request(Method::GET, &[COLLECTION])?;
        if !filter.is_empty() {
            request = request.query(filter.params());
        }
        let envelope: ProductListEnvelope = self.api.send_json(request).await?;
        Ok(envelope.into_products())
    }

    /// `GET /papeleria/:id`.
    ///
    /// # Errors
    ///
    /// Network, backend or decode failures.
    pub async fn get(&self, id: i64) -> Result<Product, ApiError> {
        let id = id.to_string();
        let request = self.request(Method::GET, &[COLLECTION, &id])?;
        let envelope: ProductEnvelope = self.api.send_json(request).await?;
        Ok(envelope.into_product())
    }

    /// `POST /papeleria` as JSON or multipart.
    ///
    /// # Errors
    ///
    /// `Validation` when a present field breaks the form rules (no request is
    /// sent); otherwise network, backend or decode failures.
    pub async fn create(&self, payload: ProductPayload) -> Result<Product, ApiError> {
        payload.validate()?;
        let plan = plan_create(&payload);
        self.submit(plan, payload).await
    }

    /// `PUT /papeleria/:id` (JSON) or `POST /papeleria/:id` + `_method=PUT` (multipart).
    ///
    /// # Errors
    ///
    /// As [`ProductClient::create`].
    pub async fn update(&self, id: i64, payload: ProductPayload) -> Result<Product, ApiError> {
        payload.validate()?;
        let plan = plan_update(id, &payload);
        self.submit(plan, payload).await
    }

    /// `DELETE /papeleria/:id`.
    ///
    /// # Errors
    ///
    /// Network or backend failures.
    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let id = id.to_string();
        let request = self.request(Method::DELETE, &[COLLECTION, &id])?;
        self.api.send(request).await?;
        Ok(())
    }

    /// `GET /papeleria/categoria/:category`.
    ///
    /// # Errors
    ///
    /// Network, backend or decode failures.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, &[COLLECTION, "categoria", category])?;
        let envelope: ProductListEnvelope = self.api.send_json(request).await?;
        Ok(envelope.into_products())
    }

    /// `GET /papeleria/search?q=`.
    ///
    /// # Errors
    ///
    /// Network, backend or decode failures.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, &[COLLECTION, "search"])?.query(&[("q", query)]);
        let envelope: ProductListEnvelope = self.api.send_json(request).await?;
        Ok(envelope.into_products())
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let token = self.auth.token();
        self.api.request(method, segments, token.as_deref())
    }

    async fn submit(&self, plan: RequestPlan, payload: ProductPayload) -> Result<Product, ApiError> {
        let segments: Vec<&str> = plan.segments.iter().map(String::as_str).collect();
        let request = self.request(plan.method.clone(), &segments)?;
        let request = match plan.encoding {
            Encoding::Json => request.json(&payload.fields),
            Encoding::Multipart => request.multipart(multipart_form(payload, plan.method_override.as_ref())?),
        };
        let envelope: ProductEnvelope = self.api.send_json(request).await?;
        Ok(envelope.into_product())
    }
}

fn multipart_form(payload: ProductPayload, method_override: Option<&Method>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (key, value) in &payload.fields {
        if key == IMAGE_FIELD && payload.image.is_some() {
            continue;
        }
        form = form.text(key.clone(), form_text(value));
    }
    if let Some(method) = method_override {
        form = form.text(METHOD_OVERRIDE_FIELD, method.as_str().to_owned());
    }
    if let Some(image) = payload.image {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime)
            .map_err(|e| ApiError::Request(format!("invalid image type: {e}")))?;
        form = form.part(IMAGE_FIELD, part);
    }
    Ok(form)
}

// =============================================================================
// DASHBOARD SUMMARY
// =============================================================================

/// Products at or below this stock level are flagged on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventorySummary {
    pub product_count: usize,
    pub total_units: i64,
    pub inventory_value: f64,
    /// Product count per category; uncategorised products are counted under `""`.
    pub by_category: BTreeMap<String, usize>,
    /// `(id, nombre, existencias)` of products at or below the threshold.
    pub low_stock: Vec<(i64, String, i64)>,
}

#[must_use]
pub fn summarize(products: &[Product]) -> InventorySummary {
    let mut summary = InventorySummary { product_count: products.len(), ..InventorySummary::default() };
    for product in products {
        summary.total_units = summary.total_units.saturating_add(product.existencias);
        #[allow(clippy::cast_precision_loss)]
        let units = product.existencias as f64;
        summary.inventory_value += product.precio * units;
        let category = product.categoria.clone().unwrap_or_default();
        *summary.by_category.entry(category).or_insert(0) += 1;
        if product.existencias <= LOW_STOCK_THRESHOLD {
            summary.low_stock.push((product.id, product.nombre.clone(), product.existencias));
        }
    }
    summary
}
