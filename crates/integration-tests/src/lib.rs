//! End-to-end test helpers for the clinic API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL, migrate, and run the server with room for many logins
//! clinic-cli migrate
//! CLINIC_AUTH_RATE_LIMIT_PERIOD_SECS=1 CLINIC_AUTH_RATE_LIMIT_BURST=1000 cargo run -p clinic-server
//!
//! # Run the ignored end-to-end tests against it
//! CLINIC_BASE_URL=http://localhost:8000 cargo test -p clinic-integration-tests -- --ignored
//! ```
//!
//! Tests that change accounts directly (deactivation, deletion) connect to
//! the server's database through `CLINIC_DATABASE_URL` or `DATABASE_URL`.
//!
//! Every account gets a unique email, so tests can share one database and
//! run in any order. All tests log in from the same address, so the server
//! needs a credential rate limit above the default.

use clinic_core::Email;
use clinic_server::db::{DoctorRepository, create_pool};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse-battery";

/// Base URL of the running server (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("CLINIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// A unique email address on the test domain.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@clinic.test", Uuid::new_v4().simple())
}

/// Connect to the database the server under test uses.
///
/// # Panics
///
/// Panics if no database URL is configured or the connection fails.
pub async fn connect_db() -> PgPool {
    let url = clinic_server::config::database_url_from_env()
        .expect("CLINIC_DATABASE_URL or DATABASE_URL must be set");
    create_pool(&url)
        .await
        .expect("Failed to connect to test database")
}

/// A logged-in doctor.
#[derive(Debug, Clone)]
pub struct TestDoctor {
    pub id: i64,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

/// A logged-in patient.
#[derive(Debug, Clone)]
pub struct TestPatient {
    pub id: i64,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

/// HTTP client bound to the server under test.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Create a context for the server at [`base_url`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
        }
    }

    /// `GET {base_url}{path}` with an optional bearer token.
    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        bearer(self.client.get(format!("{}{path}", self.base_url)), token)
    }

    /// `POST {base_url}{path}` with a JSON body and an optional bearer token.
    pub fn post(&self, path: &str, token: Option<&str>, body: &Value) -> RequestBuilder {
        bearer(self.client.post(format!("{}{path}", self.base_url)), token).json(body)
    }

    /// `PATCH {base_url}{path}` with a JSON body and a bearer token.
    pub fn patch(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        bearer(
            self.client.patch(format!("{}{path}", self.base_url)),
            Some(token),
        )
        .json(body)
    }

    /// POST to a rate-limited credential route.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_credentials(&self, path: &str, body: &Value) -> Response {
        self.post(path, None, body)
            .send()
            .await
            .expect("Failed to send credential request")
    }

    /// Sign up and log in a new doctor.
    ///
    /// # Panics
    ///
    /// Panics if signup or login does not succeed.
    pub async fn doctor(&self) -> TestDoctor {
        let email = unique_email("doctor");
        let resp = self
            .post_credentials(
                "/doctors/signup",
                &json!({
                    "first_name": "Test",
                    "last_name": "Doctor",
                    "email": email,
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED, "doctor signup failed");
        let id = json_body(resp).await["id"]
            .as_i64()
            .expect("signup response has an id");

        let resp = self
            .post_credentials(
                "/doctors/login",
                &json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "doctor login failed");
        let tokens = json_body(resp).await;

        TestDoctor {
            id,
            email,
            access: string_field(&tokens, "access"),
            refresh: string_field(&tokens, "refresh"),
        }
    }

    /// Create a patient as `doctor` and log the patient in.
    ///
    /// # Panics
    ///
    /// Panics if creation or login does not succeed.
    pub async fn patient(&self, doctor: &TestDoctor) -> TestPatient {
        let email = unique_email("patient");
        let resp = self
            .post(
                "/doctors/patients",
                Some(&doctor.access),
                &json!({
                    "first_name": "Test",
                    "last_name": "Patient",
                    "email": email,
                    "password": PASSWORD,
                    "phone_number": "+14155550123",
                }),
            )
            .send()
            .await
            .expect("Failed to create patient");
        assert_eq!(resp.status(), StatusCode::CREATED, "patient creation failed");
        let id = json_body(resp).await["id"]
            .as_i64()
            .expect("patient response has an id");

        let resp = self
            .post_credentials(
                "/patients/login",
                &json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "patient login failed");
        let body = json_body(resp).await;

        TestPatient {
            id,
            email,
            access: string_field(&body, "access"),
            refresh: string_field(&body, "refresh"),
        }
    }
}

impl TestDoctor {
    /// This doctor's email as the domain type.
    ///
    /// # Panics
    ///
    /// Panics if the stored email does not parse.
    #[must_use]
    pub fn parsed_email(&self) -> Email {
        Email::parse(&self.email).expect("test doctor email is valid")
    }

    /// Activate or deactivate this doctor, as `clinic-cli doctor` does.
    ///
    /// # Panics
    ///
    /// Panics if the update fails.
    pub async fn set_active(&self, pool: &PgPool, active: bool) {
        DoctorRepository::new(pool)
            .set_active(&self.parsed_email(), active)
            .await
            .expect("Failed to change doctor status");
    }

    /// Delete this doctor, as `clinic-cli doctor delete` does.
    ///
    /// # Panics
    ///
    /// Panics if the delete fails.
    pub async fn delete(&self, pool: &PgPool) {
        DoctorRepository::new(pool)
            .delete(&self.parsed_email())
            .await
            .expect("Failed to delete doctor");
    }
}

fn bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Response body is not JSON")
}

fn string_field(value: &Value, field: &str) -> String {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("response has no string field {field}"))
        .to_owned()
}
