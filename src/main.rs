use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use papeleria::config::{ClientConfig, ConfigError};
use papeleria::error::{ApiError, AuthError, ValidationError};
use papeleria::net::api::ApiClient;
use papeleria::net::types::{
    Credentials, ImageSource, ImageUpload, ProductDraft, ProductFilter, ProductPayload, RegistrationData, is_admin,
};
use papeleria::routes::{GuardDecision, Route, decide};
use papeleria::services::auth::{AuthManager, RegisterOutcome};
use papeleria::services::products::{ProductClient, summarize};
use papeleria::state::AuthState;
use papeleria::storage::{FileStorage, SessionStore};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} needs a signed-in user; run `papeleria login` first")]
    SignInRequired(Route),
    #[error("already signed in; run `papeleria logout` before opening {0}")]
    AlreadySignedIn(Route),
    #[error("session is still loading")]
    SessionPending,
    #[error("administrator role required to {0}")]
    Forbidden(&'static str),
    #[error("invalid argument '{0}' (expected key=value)")]
    InvalidPair(String),
    #[error("unknown product field `{0}`")]
    UnknownField(String),
    #[error("account created, but signing in failed: {0}")]
    RegisteredLoginFailed(AuthError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "papeleria", about = "Stationery inventory client")]
struct Cli {
    #[arg(long, env = "PAPELERIA_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "PAPELERIA_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirmation: String,
    },
    Logout,
    Dashboard,
    Products(ProductsCommand),
}

#[derive(Args, Debug)]
struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProductsSubcommand {
    List {
        /// Query parameter passed through to the backend, as `key=value`.
        #[arg(long = "param")]
        params: Vec<String>,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long = "field")]
        fields: Vec<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Update {
        id: i64,
        #[arg(long = "field")]
        fields: Vec<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete {
        id: i64,
    },
    Category {
        name: String,
    },
    Search {
        query: String,
    },
}

struct Shell {
    auth: AuthManager,
    products: ProductClient,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_url(api_url)?;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }

    let shell = Shell::new(&config)?;
    shell.run(cli.command).await
}

impl Shell {
    fn new(config: &ClientConfig) -> Result<Self, CliError> {
        let api = ApiClient::new(config)?;
        let store = SessionStore::new(Arc::new(FileStorage::new(config.session_file.clone())));
        let auth = AuthManager::new(api.clone(), store)
            .with_auto_login_after_register(config.auto_login_after_register);
        let products = ProductClient::new(api, auth.subscribe());
        tracing::debug!(api_url = %config.api_url, session_file = %config.session_file.display(), "shell ready");
        Ok(Self { auth, products })
    }

    async fn run(&self, command: Command) -> Result<(), CliError> {
        self.auth.initialize();
        let state = self.auth.subscribe().resolved().await;
        if let Some(route) = route_for(&command) {
            guard(&state, &route)?;
        }

        match command {
            Command::Login { email, password } => {
                let session = self.auth.login(&Credentials { email, password }).await?;
                println!("signed in as {}", session.user.name);
                Ok(())
            }
            Command::Register { name, email, password, password_confirmation } => {
                let data = RegistrationData { name, email, password, password_confirmation };
                match self.auth.register(&data).await? {
                    RegisterOutcome::Authenticated(session) => {
                        println!("account created; signed in as {}", session.user.name);
                        Ok(())
                    }
                    RegisterOutcome::Registered { .. } => {
                        println!("account created; run `papeleria login` to sign in");
                        Ok(())
                    }
                    RegisterOutcome::RegisteredLoginFailed { error, .. } => Err(CliError::RegisteredLoginFailed(error)),
                }
            }
            Command::Logout => {
                self.auth.logout().await;
                println!("signed out");
                Ok(())
            }
            Command::Dashboard => self.dashboard(&state).await,
            Command::Products(products) => self.products(&state, products.command).await,
        }
    }

    async fn dashboard(&self, state: &AuthState) -> Result<(), CliError> {
        let products = self.products.list(&ProductFilter::new()).await?;
        let summary = summarize(&products);

        if let Some(user) = state.user() {
            let role = user.role.as_deref().unwrap_or("user");
            match user.email.as_deref() {
                Some(email) => println!("{} <{email}> ({role})", user.name),
                None => println!("{} ({role})", user.name),
            }
        }
        println!("products:        {}", summary.product_count);
        println!("units in stock:  {}", summary.total_units);
        println!("inventory value: {:.2}", summary.inventory_value);
        for (category, count) in &summary.by_category {
            let category = if category.is_empty() { "(none)" } else { category.as_str() };
            println!("  {category}: {count}");
        }
        if !summary.low_stock.is_empty() {
            println!("low stock:");
            for (id, nombre, existencias) in &summary.low_stock {
                println!("  #{id} {nombre}: {existencias}");
            }
        }
        Ok(())
    }

    async fn products(&self, state: &AuthState, command: ProductsSubcommand) -> Result<(), CliError> {
        match command {
            ProductsSubcommand::List { params } => {
                let mut filter = ProductFilter::new();
                for raw in &params {
                    let (key, value) = parse_pair(raw)?;
                    filter = filter.param(key, value);
                }
                print_json(&self.products.list(&filter).await?)
            }
            ProductsSubcommand::Get { id } => print_json(&self.products.get(id).await?),
            ProductsSubcommand::Create { fields, image } => {
                require_admin(state, "create products")?;
                let image = read_image(image).await?;
                let payload = draft_from_fields(&fields, image)?.into_payload()?;
                print_json(&self.products.create(payload).await?)
            }
            ProductsSubcommand::Update { id, fields, image } => {
                let mut payload = payload_from_fields(&fields)?;
                if let Some(image) = read_image(image).await? {
                    payload = payload.with_image(image);
                }
                print_json(&self.products.update(id, payload).await?)
            }
            ProductsSubcommand::Delete { id } => {
                require_admin(state, "delete products")?;
                self.products.remove(id).await?;
                println!("deleted product {id}");
                Ok(())
            }
            ProductsSubcommand::Category { name } => print_json(&self.products.by_category(&name).await?),
            ProductsSubcommand::Search { query } => print_json(&self.products.search(&query).await?),
        }
    }
}

/// Screen each command renders. `logout` has none: local teardown always runs.
fn route_for(command: &Command) -> Option<Route> {
    let route = match command {
        Command::Logout => return None,
        Command::Login { .. } => Route::Login,
        Command::Register { .. } => Route::Register,
        Command::Dashboard => Route::Dashboard,
        Command::Products(products) => match &products.command {
            ProductsSubcommand::List { .. } | ProductsSubcommand::Category { .. } | ProductsSubcommand::Search { .. } => {
                Route::Products
            }
            ProductsSubcommand::Get { id } | ProductsSubcommand::Delete { id } => Route::ProductDetail(id.to_string()),
            ProductsSubcommand::Create { .. } => Route::NewProduct,
            ProductsSubcommand::Update { id, .. } => Route::EditProduct(id.to_string()),
        },
    };
    Some(route)
}

fn guard(state: &AuthState, route: &Route) -> Result<(), CliError> {
    match decide(state, route) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Loading => Err(CliError::SessionPending),
        GuardDecision::Redirect(Route::Login) => Err(CliError::SignInRequired(route.clone())),
        GuardDecision::Redirect(_) => Err(CliError::AlreadySignedIn(route.clone())),
    }
}

fn require_admin(state: &AuthState, action: &'static str) -> Result<(), CliError> {
    match state.session() {
        Some(session) if is_admin(session) => Ok(()),
        _ => Err(CliError::Forbidden(action)),
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_owned(), value.to_owned())),
        _ => Err(CliError::InvalidPair(raw.to_owned())),
    }
}

/// `precio` and `existencias` go on the wire as numbers; every other field as text.
fn field_value(key: &str, raw: &str) -> Result<Value, ValidationError> {
    match key {
        "precio" => parse_price(raw).map(Value::from),
        "existencias" => parse_number::<i64>(key, raw).map(Value::from),
        _ => Ok(Value::String(raw.to_owned())),
    }
}

/// Partial update body, held to the same rules as the create form.
fn payload_from_fields(fields: &[String]) -> Result<ProductPayload, CliError> {
    let mut payload = ProductPayload::new();
    for raw in fields {
        let (key, value) = parse_pair(raw)?;
        let value = field_value(&key, &value)?;
        payload = payload.field(key, value);
    }
    payload.validate()?;
    Ok(payload)
}

fn draft_from_fields(fields: &[String], image: Option<ImageUpload>) -> Result<ProductDraft, CliError> {
    let mut values = BTreeMap::new();
    for raw in fields {
        let (key, value) = parse_pair(raw)?;
        values.insert(key, value);
    }

    let mut draft = ProductDraft::default();
    for (key, value) in values {
        match key.as_str() {
            "nombre" => draft.nombre = value,
            "descripcion" => draft.descripcion = value,
            "precio" => draft.precio = Some(parse_price(&value)?),
            "existencias" => draft.existencias = Some(parse_number(&key, &value)?),
            "categoria" => draft.categoria = Some(value),
            "imagen" => draft.imagen = Some(ImageSource::Url(value)),
            _ => return Err(CliError::UnknownField(key)),
        }
    }
    if let Some(image) = image {
        draft.imagen = Some(ImageSource::Upload(image));
    }
    Ok(draft)
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::Invalid { field: field.to_owned(), reason: format!("'{raw}' is not a number") })
}

fn parse_price(raw: &str) -> Result<f64, ValidationError> {
    let precio: f64 = parse_number("precio", raw)?;
    if !precio.is_finite() {
        return Err(ValidationError::Invalid { field: "precio".to_owned(), reason: format!("'{raw}' is not a number") });
    }
    Ok(precio)
}

async fn read_image(path: Option<PathBuf>) -> Result<Option<ImageUpload>, CliError> {
    match path {
        Some(path) => Ok(Some(ImageUpload::read(&path).await?)),
        None => Ok(None),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
