//! Create view: register a name and phone, get a printable QR code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use lost_found_core::{OwnerName, Phone};

use crate::error::{AppError, PageError};
use crate::filters;
use crate::qr;
use crate::services::RegistrationService;
use crate::state::AppState;

/// Registration form.
#[derive(Template, WebTemplate)]
#[template(path = "create.html")]
pub struct CreateTemplate {
    pub error: Option<String>,
    pub name: String,
    pub phone: String,
    pub name_max: usize,
    pub phone_max: usize,
}

impl CreateTemplate {
    fn new(error: Option<String>, name: String, phone: String) -> Self {
        Self {
            error,
            name,
            phone,
            name_max: OwnerName::MAX_LENGTH,
            phone_max: Phone::MAX_LENGTH,
        }
    }
}

/// Successful registration with the generated QR code.
#[derive(Template, WebTemplate)]
#[template(path = "created.html")]
pub struct CreatedTemplate {
    pub name: String,
    pub code: String,
    pub qr_data_url: String,
    pub download_name: String,
}

/// Submitted registration form.
#[derive(Debug, Deserialize)]
pub struct CreateForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// File name offered when downloading the QR image.
#[must_use]
pub fn download_name(code: &str) -> String {
    format!("qr-code-{code}.png")
}

/// Display the registration form.
///
/// GET /
pub async fn form() -> impl IntoResponse {
    CreateTemplate::new(None, String::new(), String::new())
}

/// Register an owner and show their QR code.
///
/// POST /
///
/// Invalid input re-renders the form with the message and the entered values.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CreateForm>,
) -> Result<Response, PageError> {
    let owner = match RegistrationService::new(state.store())
        .register(&form.name, &form.phone)
        .await
    {
        Ok(owner) => owner,
        Err(e) if e.is_validation() => {
            let message = AppError::from(e).public_message();
            let page = CreateTemplate::new(Some(message), form.name, form.phone);
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let scan_url = state.config().scan_url(owner.unique_code.as_str());
    let image = qr::encode(scan_url.as_str(), &state.config().qr).map_err(AppError::from)?;

    let code = owner.unique_code.into_inner();
    Ok(CreatedTemplate {
        name: owner.name.into_inner(),
        download_name: download_name(&code),
        qr_data_url: image.data_url(),
        code,
    }
    .into_response())
}
