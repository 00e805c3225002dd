//! Wire DTOs for the inventory backend.
//!
//! DESIGN
//! ======
//! Product records use the `nombre/descripcion/precio/existencias/categoria/
//! imagen` schema. Fields the client does not model are kept in `extra` so a
//! record read from the backend can be sent back without losing data.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

// =============================================================================
// AUTH
// =============================================================================

pub const ADMIN_ROLE: &str = "admin";

/// Cached profile of the signed-in user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Client-held proof of authentication plus the cached user profile.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Whether the session belongs to an administrator.
#[must_use]
pub fn is_admin(session: &Session) -> bool {
    session.user.role.as_deref() == Some(ADMIN_ROLE)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Trimmed email, non-empty email and password.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank email or an empty password.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(Self { email: email.to_owned(), password: self.password.clone() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegistrationData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegistrationData {
    /// Check the form before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns `PasswordMismatch` when the confirmation differs, or
    /// `MissingField` for a blank name, email or password.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.password_confirmation {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials { email: self.email.trim().to_owned(), password: self.password.clone() }
    }
}

/// `POST /login` and `POST /register` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

// =============================================================================
// PRODUCT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Missing or `null` reads as 0.
    #[serde(default, deserialize_with = "deserialize_f64_or_null")]
    pub precio: f64,
    /// Missing or `null` reads as 0.
    #[serde(default, deserialize_with = "deserialize_i64_or_null")]
    pub existencias: i64,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub imagen: Option<String>,
    /// Backend fields not modelled above (timestamps, foreign keys, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /papeleria/:id` may wrap the record or return it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductEnvelope {
    Wrapped { producto: Product },
    Bare(Product),
}

impl ProductEnvelope {
    pub(crate) fn into_product(self) -> Product {
        match self {
            Self::Wrapped { producto } | Self::Bare(producto) => producto,
        }
    }
}

/// `GET /papeleria` may wrap the list or return it bare.
///
/// Records are decoded one by one; a record that does not decode is logged
/// and skipped instead of failing the whole list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductListEnvelope {
    Wrapped {
        #[serde(default)]
        productos: Vec<Value>,
    },
    Bare(Vec<Value>),
}

impl ProductListEnvelope {
    pub(crate) fn into_products(self) -> Vec<Product> {
        let (Self::Wrapped { productos: records } | Self::Bare(records)) = self;
        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<Product>(record) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping product record that does not decode");
                    None
                }
            })
            .collect()
    }
}

/// Query parameters for `GET /papeleria`, sent in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    params: Vec<(String, String)>,
}

impl ProductFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// Form field that carries the product image.
pub const IMAGE_FIELD: &str = "imagen";

/// Binary image attached to a product payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_image_mime(&file_name).to_owned();
        Self { file_name, mime, bytes }
    }

    /// Read an image file from disk.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the file cannot be read or is empty.
    pub async fn read(path: &Path) -> Result<Self, ValidationError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ValidationError::Invalid {
            field: IMAGE_FIELD.to_owned(),
            reason: format!("{}: {e}", path.display()),
        })?;
        if bytes.is_empty() {
            return Err(ValidationError::Invalid {
                field: IMAGE_FIELD.to_owned(),
                reason: format!("{} is empty", path.display()),
            });
        }
        let file_name = path
            .file_name()
            .map_or_else(|| "imagen".to_owned(), |name| name.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_image_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// How a payload goes over the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Multipart,
}

/// Create/update body: flat scalar fields plus an optional binary image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPayload {
    pub fields: Map<String, Value>,
    pub image: Option<ImageUpload>,
}

impl ProductPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        if self.image.is_some() { Encoding::Multipart } else { Encoding::Json }
    }

    /// Apply the product form rules to whichever fields are present, so a
    /// partial update is held to the same rules as a full create.
    ///
    /// # Errors
    ///
    /// `MissingField` for a blank `nombre`/`descripcion`, `Negative` for a
    /// negative `precio`/`existencias`, `Invalid` when either is not a number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in ["nombre", "descripcion"] {
            match self.fields.get(field) {
                None => {}
                Some(Value::String(text)) if !text.trim().is_empty() => {}
                Some(_) => return Err(ValidationError::MissingField(field)),
            }
        }
        if let Some(value) = self.fields.get("precio") {
            let precio = value.as_f64().filter(|p| p.is_finite()).ok_or_else(|| not_a_number("precio", value))?;
            if precio < 0.0 {
                return Err(ValidationError::Negative("precio"));
            }
        }
        if let Some(value) = self.fields.get("existencias") {
            let existencias = value.as_i64().ok_or_else(|| not_a_number("existencias", value))?;
            if existencias < 0 {
                return Err(ValidationError::Negative("existencias"));
            }
        }
        Ok(())
    }
}

fn not_a_number(field: &str, value: &Value) -> ValidationError {
    ValidationError::Invalid { field: field.to_owned(), reason: format!("{value} is not a number") }
}

/// Text form of a scalar for a multipart part.
pub(crate) fn form_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Image on a product form: an existing URL or a file to upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Upload(ImageUpload),
}

/// Product form as typed by the user, before validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductDraft {
    pub nombre: String,
    pub descripcion: String,
    pub precio: Option<f64>,
    pub existencias: Option<i64>,
    pub categoria: Option<String>,
    pub imagen: Option<ImageSource>,
}

impl ProductDraft {
    /// Validate the form and shape it into a request payload.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank `nombre`/`descripcion` or an absent
    /// `precio`/`existencias`, and `Negative` for negative numbers.
    pub fn into_payload(self) -> Result<ProductPayload, ValidationError> {
        let nombre = self.nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError::MissingField("nombre"));
        }
        let descripcion = self.descripcion.trim();
        if descripcion.is_empty() {
            return Err(ValidationError::MissingField("descripcion"));
        }
        let precio = self.precio.ok_or(ValidationError::MissingField("precio"))?;
        if !precio.is_finite() {
            return Err(ValidationError::Invalid { field: "precio".to_owned(), reason: "not a number".to_owned() });
        }
        if precio < 0.0 {
            return Err(ValidationError::Negative("precio"));
        }
        let existencias = self.existencias.ok_or(ValidationError::MissingField("existencias"))?;
        if existencias < 0 {
            return Err(ValidationError::Negative("existencias"));
        }

        let mut payload = ProductPayload::new()
            .field("nombre", nombre)
            .field("descripcion", descripcion)
            .field("precio", precio)
            .field("existencias", existencias);
        if let Some(categoria) = self.categoria.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()) {
            payload = payload.field("categoria", categoria);
        }
        match self.imagen {
            Some(ImageSource::Url(url)) if !url.trim().is_empty() => {
                payload = payload.field(IMAGE_FIELD, url.trim());
            }
            Some(ImageSource::Upload(upload)) => payload = payload.with_image(upload),
            _ => {}
        }
        Ok(payload)
    }
}

// =============================================================================
// NUMBER HELPERS
// =============================================================================

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected integer string, got {s:?}"))),
        other => Err(D::Error::custom(format!("expected integer, got {other}"))),
    }
}

fn deserialize_f64_from_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("expected number, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected numeric string, got {s:?}"))),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}

fn deserialize_f64_or_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        other => deserialize_f64_from_number(other).map_err(D::Error::custom),
    }
}

fn deserialize_i64_or_null<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        other => deserialize_i64_from_number(other).map_err(D::Error::custom),
    }
}
