use super::*;
use serde_json::json;

fn user(role: Option<&str>) -> User {
    User { id: 1, name: "A".to_owned(), email: None, role: role.map(str::to_owned) }
}

// =============================================================================
// User / Session
// =============================================================================

#[test]
fn user_deserializes_without_email() {
    let u: User = serde_json::from_value(json!({ "id": 1, "name": "A", "role": "admin" })).unwrap();
    assert_eq!(u, user(Some("admin")));
}

#[test]
fn user_accepts_string_id() {
    let u: User = serde_json::from_value(json!({ "id": "17", "name": "B", "email": "b@c.com" })).unwrap();
    assert_eq!(u.id, 17);
    assert_eq!(u.email.as_deref(), Some("b@c.com"));
    assert_eq!(u.role, None);
}

#[test]
fn is_admin_only_for_admin_role() {
    let admin = Session { token: "t".into(), user: user(Some("admin")) };
    let clerk = Session { token: "t".into(), user: user(Some("empleado")) };
    let roleless = Session { token: "t".into(), user: user(None) };
    assert!(is_admin(&admin));
    assert!(!is_admin(&clerk));
    assert!(!is_admin(&roleless));
}

// =============================================================================
// Credentials / RegistrationData
// =============================================================================

#[test]
fn credentials_validate_trims_email() {
    let creds = Credentials { email: "  a@b.com ".into(), password: "secret".into() };
    assert_eq!(creds.validate().unwrap().email, "a@b.com");
}

#[test]
fn credentials_validate_requires_both_fields() {
    let no_email = Credentials { email: " ".into(), password: "secret".into() };
    let no_password = Credentials { email: "a@b.com".into(), password: String::new() };
    assert_eq!(no_email.validate(), Err(ValidationError::MissingField("email")));
    assert_eq!(no_password.validate(), Err(ValidationError::MissingField("password")));
}

#[test]
fn registration_mismatch_is_reported_first() {
    let data = RegistrationData {
        name: String::new(),
        email: String::new(),
        password: "secret1".into(),
        password_confirmation: "secret2".into(),
    };
    assert_eq!(data.validate(), Err(ValidationError::PasswordMismatch));
}

#[test]
fn registration_requires_name() {
    let data = RegistrationData {
        name: "  ".into(),
        email: "a@b.com".into(),
        password: "secret".into(),
        password_confirmation: "secret".into(),
    };
    assert_eq!(data.validate(), Err(ValidationError::MissingField("name")));
}

// =============================================================================
// Product
// =============================================================================

#[test]
fn product_accepts_decimal_strings_and_keeps_extra_fields() {
    let p: Product = serde_json::from_value(json!({
        "id": 3,
        "nombre": "Cuaderno",
        "descripcion": "Cuaderno profesional 100 hojas",
        "precio": "45.50",
        "existencias": "12",
        "categoria": "Cuadernos",
        "imagen": null,
        "created_at": "2024-05-01T10:00:00Z"
    }))
    .unwrap();
    assert!((p.precio - 45.5).abs() < f64::EPSILON);
    assert_eq!(p.existencias, 12);
    assert_eq!(p.imagen, None);
    assert_eq!(p.extra.get("created_at"), Some(&json!("2024-05-01T10:00:00Z")));
}

#[test]
fn product_rejects_non_numeric_price() {
    let result: Result<Product, _> = serde_json::from_value(json!({
        "id": 1, "nombre": "Lápiz", "precio": "barato", "existencias": 1
    }));
    assert!(result.is_err());
}

#[test]
fn envelope_unwraps_producto_key() {
    let wrapped: ProductEnvelope = serde_json::from_value(json!({
        "producto": { "id": 9, "nombre": "Goma", "precio": 5, "existencias": 30 }
    }))
    .unwrap();
    let bare: ProductEnvelope =
        serde_json::from_value(json!({ "id": 9, "nombre": "Goma", "precio": 5, "existencias": 30 })).unwrap();
    assert_eq!(wrapped.into_product(), bare.into_product());
}

#[test]
fn list_envelope_accepts_wrapped_and_bare() {
    let item = json!({ "id": 1, "nombre": "Regla", "precio": 12.0, "existencias": 4 });
    let wrapped: ProductListEnvelope = serde_json::from_value(json!({ "productos": [item.clone()] })).unwrap();
    let bare: ProductListEnvelope = serde_json::from_value(json!([item])).unwrap();
    assert_eq!(wrapped.into_products().len(), 1);
    assert_eq!(bare.into_products().len(), 1);
}

#[test]
fn product_with_null_or_missing_numbers_reads_as_zero() {
    let p: Product = serde_json::from_value(json!({ "id": 2, "nombre": "Goma", "precio": null })).unwrap();
    assert!(p.precio.abs() < f64::EPSILON);
    assert_eq!(p.existencias, 0);
}

#[test]
fn list_envelope_skips_records_that_do_not_decode() {
    let envelope: ProductListEnvelope = serde_json::from_value(json!({ "productos": [
        { "id": 1, "nombre": "Regla", "precio": 12.0, "existencias": 4 },
        { "id": 2, "nombre": "Goma", "precio": null, "existencias": 3 },
        { "nombre": "Sin id", "precio": 1, "existencias": 1 },
        { "id": 4, "nombre": "Lápiz", "precio": "barato", "existencias": 1 }
    ]}))
    .unwrap();
    let ids: Vec<i64> = envelope.into_products().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

// =============================================================================
// ProductDraft / ProductPayload
// =============================================================================

fn draft() -> ProductDraft {
    ProductDraft {
        nombre: " Pluma azul ".into(),
        descripcion: "Pluma de gel".into(),
        precio: Some(15.0),
        existencias: Some(100),
        categoria: Some("Escritura".into()),
        imagen: None,
    }
}

#[test]
fn draft_builds_json_payload() {
    let payload = draft().into_payload().unwrap();
    assert_eq!(payload.encoding(), Encoding::Json);
    assert_eq!(payload.fields.get("nombre"), Some(&json!("Pluma azul")));
    assert_eq!(payload.fields.get("existencias"), Some(&json!(100)));
    assert_eq!(payload.fields.get("categoria"), Some(&json!("Escritura")));
    assert!(!payload.fields.contains_key(IMAGE_FIELD));
}

#[test]
fn draft_with_image_url_stays_json() {
    let mut d = draft();
    d.imagen = Some(ImageSource::Url("https://cdn.example.test/pluma.png".into()));
    let payload = d.into_payload().unwrap();
    assert_eq!(payload.encoding(), Encoding::Json);
    assert_eq!(payload.fields.get(IMAGE_FIELD), Some(&json!("https://cdn.example.test/pluma.png")));
}

#[test]
fn draft_with_upload_is_multipart() {
    let mut d = draft();
    d.imagen = Some(ImageSource::Upload(ImageUpload::new("pluma.PNG", vec![1, 2, 3])));
    let payload = d.into_payload().unwrap();
    assert_eq!(payload.encoding(), Encoding::Multipart);
    assert_eq!(payload.image.as_ref().map(|i| i.mime.as_str()), Some("image/png"));
}

#[test]
fn draft_requires_fields_in_form_order() {
    let mut d = draft();
    d.nombre = "  ".into();
    assert_eq!(d.into_payload(), Err(ValidationError::MissingField("nombre")));

    let mut d = draft();
    d.precio = None;
    assert_eq!(d.into_payload(), Err(ValidationError::MissingField("precio")));

    let mut d = draft();
    d.existencias = None;
    assert_eq!(d.into_payload(), Err(ValidationError::MissingField("existencias")));
}

#[test]
fn draft_rejects_negative_numbers() {
    let mut d = draft();
    d.precio = Some(-1.0);
    assert_eq!(d.into_payload(), Err(ValidationError::Negative("precio")));

    let mut d = draft();
    d.existencias = Some(-3);
    assert_eq!(d.into_payload(), Err(ValidationError::Negative("existencias")));
}

#[test]
fn form_text_renders_scalars() {
    assert_eq!(form_text(&json!("x")), "x");
    assert_eq!(form_text(&json!(12.5)), "12.5");
    assert_eq!(form_text(&json!(true)), "true");
    assert_eq!(form_text(&Value::Null), "");
}

#[test]
fn filter_keeps_insertion_order() {
    let filter = ProductFilter::new().param("categoria", "Arte").param("page", "2");
    assert_eq!(
        filter.params(),
        &[("categoria".to_owned(), "Arte".to_owned()), ("page".to_owned(), "2".to_owned())]
    );
}

#[test]
fn payload_validate_checks_only_present_fields() {
    assert!(ProductPayload::new().field("existencias", 0).validate().is_ok());
    assert!(ProductPayload::new().field("categoria", "").validate().is_ok());
    assert_eq!(
        ProductPayload::new().field("nombre", "").validate(),
        Err(ValidationError::MissingField("nombre"))
    );
    assert_eq!(
        ProductPayload::new().field("descripcion", 5).validate(),
        Err(ValidationError::MissingField("descripcion"))
    );
    assert_eq!(ProductPayload::new().field("precio", -1.0).validate(), Err(ValidationError::Negative("precio")));
    assert!(matches!(
        ProductPayload::new().field("existencias", "muchas").validate(),
        Err(ValidationError::Invalid { .. })
    ));
}

#[test]
fn validated_draft_payload_passes_payload_rules() {
    assert!(draft().into_payload().unwrap().validate().is_ok());
}
