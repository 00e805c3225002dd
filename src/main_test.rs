use clap::CommandFactory;
use papeleria::net::types::{Session, User};
use serde_json::json;

use super::*;

fn signed_in(role: Option<&str>) -> AuthState {
    AuthState::Authenticated(Session {
        token: "t1".to_owned(),
        user: User { id: 1, name: "Ana".to_owned(), email: None, role: role.map(str::to_owned) },
    })
}

fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_repeated_fields_and_image() {
    let cli = Cli::try_parse_from([
        "papeleria",
        "--api-url",
        "http://localhost:8000/api",
        "products",
        "update",
        "7",
        "--field",
        "precio=12.5",
        "--field",
        "existencias=3",
        "--image",
        "pluma.png",
    ])
    .unwrap();

    assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8000/api"));
    let Command::Products(ProductsCommand { command: ProductsSubcommand::Update { id, fields, image } }) = cli.command
    else {
        panic!("expected products update");
    };
    assert_eq!(id, 7);
    assert_eq!(fields, strings(&["precio=12.5", "existencias=3"]));
    assert_eq!(image, Some(PathBuf::from("pluma.png")));
}

// =============================================================================
// Routing and guard
// =============================================================================

#[test]
fn commands_map_to_screens() {
    let products = |command| Command::Products(ProductsCommand { command });
    assert_eq!(route_for(&Command::Login { email: String::new(), password: String::new() }), Some(Route::Login));
    assert_eq!(route_for(&Command::Dashboard), Some(Route::Dashboard));
    assert_eq!(route_for(&products(ProductsSubcommand::Search { query: "x".into() })), Some(Route::Products));
    assert_eq!(route_for(&products(ProductsSubcommand::Delete { id: 4 })), Some(Route::ProductDetail("4".into())));
    assert_eq!(
        route_for(&products(ProductsSubcommand::Create { fields: vec![], image: None })),
        Some(Route::NewProduct)
    );
    assert_eq!(
        route_for(&products(ProductsSubcommand::Update { id: 4, fields: vec![], image: None })),
        Some(Route::EditProduct("4".into()))
    );
}

#[test]
fn logout_is_not_guarded() {
    assert_eq!(route_for(&Command::Logout), None);
}

#[test]
fn anonymous_user_must_sign_in_first() {
    let err = guard(&AuthState::Anonymous, &Route::Products).unwrap_err();
    assert!(matches!(err, CliError::SignInRequired(Route::Products)));
    assert!(guard(&AuthState::Anonymous, &Route::Login).is_ok());
}

#[test]
fn signed_in_user_cannot_reopen_login() {
    let err = guard(&signed_in(None), &Route::Register).unwrap_err();
    assert!(matches!(err, CliError::AlreadySignedIn(Route::Register)));
    assert!(guard(&signed_in(None), &Route::Dashboard).is_ok());
}

#[test]
fn pending_session_is_not_rendered() {
    assert!(matches!(guard(&AuthState::Pending, &Route::Login), Err(CliError::SessionPending)));
}

#[test]
fn admin_gate() {
    assert!(require_admin(&signed_in(Some("admin")), "delete products").is_ok());
    assert!(matches!(require_admin(&signed_in(Some("user")), "delete products"), Err(CliError::Forbidden(_))));
    assert!(matches!(require_admin(&AuthState::Anonymous, "create products"), Err(CliError::Forbidden(_))));
}

// =============================================================================
// Field parsing
// =============================================================================

#[test]
fn pairs_split_on_first_equals() {
    assert_eq!(parse_pair("q=a=b").unwrap(), ("q".to_owned(), "a=b".to_owned()));
    assert_eq!(parse_pair("categoria=").unwrap(), ("categoria".to_owned(), String::new()));
    assert!(matches!(parse_pair("nombre"), Err(CliError::InvalidPair(_))));
    assert!(matches!(parse_pair("=x"), Err(CliError::InvalidPair(_))));
}

#[test]
fn only_price_and_stock_are_numeric() {
    assert_eq!(field_value("existencias", "100").unwrap(), json!(100));
    assert_eq!(field_value("precio", "15.5").unwrap(), json!(15.5));
    assert_eq!(field_value("nombre", "2024").unwrap(), json!("2024"));
    assert_eq!(field_value("categoria", "3").unwrap(), json!("3"));
    assert!(matches!(field_value("precio", "NaN"), Err(ValidationError::Invalid { .. })));
    assert!(matches!(field_value("existencias", "1.5"), Err(ValidationError::Invalid { .. })));
}

#[test]
fn update_payload_is_partial_json() {
    let payload = payload_from_fields(&strings(&["existencias=3", "nombre=2024"])).unwrap();
    assert_eq!(payload.fields.get("existencias"), Some(&json!(3)));
    assert_eq!(payload.fields.get("nombre"), Some(&json!("2024")));
    assert_eq!(payload.fields.len(), 2);
    assert!(payload.image.is_none());
}

#[test]
fn update_payload_follows_form_rules() {
    assert!(matches!(
        payload_from_fields(&strings(&["nombre=", "precio=10"])),
        Err(CliError::Validation(ValidationError::MissingField("nombre")))
    ));
    assert!(matches!(
        payload_from_fields(&strings(&["existencias=-3"])),
        Err(CliError::Validation(ValidationError::Negative("existencias")))
    ));
    assert!(matches!(
        payload_from_fields(&strings(&["precio=-1"])),
        Err(CliError::Validation(ValidationError::Negative("precio")))
    ));
}

#[test]
fn create_fields_become_a_validated_draft() {
    let draft = draft_from_fields(
        &strings(&["nombre=Pluma", "descripcion=Gel azul", "precio=15", "existencias=100", "categoria=Escritura"]),
        None,
    )
    .unwrap();
    assert_eq!(draft.precio, Some(15.0));
    assert_eq!(draft.existencias, Some(100));

    let payload = draft.into_payload().unwrap();
    assert_eq!(payload.fields.get("categoria"), Some(&json!("Escritura")));
}

#[test]
fn create_rejects_unknown_and_non_numeric_fields() {
    assert!(matches!(draft_from_fields(&strings(&["color=rojo"]), None), Err(CliError::UnknownField(k)) if k == "color"));
    assert!(matches!(
        draft_from_fields(&strings(&["precio=barato"]), None),
        Err(CliError::Validation(ValidationError::Invalid { .. }))
    ));
}

#[test]
fn uploaded_image_replaces_image_url() {
    let upload = ImageUpload::new("pluma.png", b"PNG".to_vec());
    let draft = draft_from_fields(&strings(&["imagen=https://cdn.example.test/a.png"]), Some(upload.clone())).unwrap();
    assert_eq!(draft.imagen, Some(ImageSource::Upload(upload)));
}
