//! Signup API Example
//!
//! A small axum server whose request bodies are validated and normalized
//! before the handlers see them:
//! - the schema is declared in YAML, including a custom `hexcolor` type
//! - usernames are checked by an asynchronous validator
//! - invalid bodies are answered with 422 and one message per field
//!
//! Try it:
//!
//! ```text
//! curl -s localhost:3000/signup -H 'content-type: application/json' \
//!   -d '{"username":"jdoe","email":"John.Doe@Gmail.com","age":"31","colors":["#AABBCC"]}'
//! ```

use anyhow::Result;
use axum::routing::{patch, post};
use axum::{Json, Router};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vschema::prelude::*;

const SIGNUP_SCHEMA: &str = r#"
types:
  hexcolor:
    filters: [toLower]
    validators: [isHexColor]

fields:
  username:
    type: alnum
    required: true
    validators: [isAvailable]
  email:
    type: email
    required: true
    errorMessage: "A valid e-mail address is required"
  age:
    type: integer
  colors:
    - type: hexcolor
  newsletter:
    type: bool
    default: false
"#;

const RESERVED: &[&str] = &["admin", "root", "support"];

fn config() -> &'static SchemaConfig {
    static CONFIG: OnceLock<SchemaConfig> = OnceLock::new();
    CONFIG.get_or_init(|| {
        SchemaConfig::from_yaml_str(SIGNUP_SCHEMA).expect("embedded schema must parse")
    })
}

struct Signup;

impl ValidatedPayload for Signup {
    fn schema(operation: &str) -> Schema {
        let schema = config()
            .clone()
            .into_schema()
            .expect("embedded schema must build");

        // Profile updates may leave out anything they do not change
        match operation {
            "update" => schema
                .iter()
                .map(|(key, decl)| (key.clone(), decl.clone().optional()))
                .collect(),
            _ => schema,
        }
    }

    fn engine() -> Engine {
        static ENGINE: OnceLock<Engine> = OnceLock::new();
        ENGINE
            .get_or_init(|| {
                config()
                    .register_types(Engine::builder())
                    .expect("embedded types must register")
                    .register_validator("isHexColor", |value: &Value, _: &FieldDescriptor| {
                        value.as_str().is_some_and(|s| {
                            s.len() == 7
                                && s.starts_with('#')
                                && s[1..].chars().all(|c| c.is_ascii_hexdigit())
                        })
                    })
                    .register_async_validator("isAvailable", |value, _| async move {
                        // Stands in for a lookup against a user store
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        match value.as_str() {
                            Some(name) if RESERVED.contains(&name.to_lowercase().as_str()) => {
                                Err(format!("Username '{}' is not available", name))
                            }
                            _ => Ok(()),
                        }
                    })
                    .deferred_timeout(Duration::from_secs(2))
                    .build()
            })
            .clone()
    }
}

async fn signup(payload: Validated<Signup>) -> Json<Value> {
    let account = payload.into_inner();
    tracing::info!(username = %account["username"], "account created");
    Json(json!({ "created": account }))
}

async fn update_profile(payload: Validated<Signup>) -> Json<Value> {
    Json(json!({ "updated": payload.into_inner() }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vschema=debug")),
        )
        .init();

    let app = Router::new()
        .route("/signup", post(signup))
        .route("/profile", patch(update_profile));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;

    println!("🚀 Signup API running on http://127.0.0.1:3000");
    println!("    POST   /signup    - Create an account (all rules apply)");
    println!("    PATCH  /profile   - Update an account (every field optional)");

    axum::serve(listener, app).await?;

    Ok(())
}
