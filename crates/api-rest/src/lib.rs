//! # API REST
//!
//! REST API for the CMF patient portal.
//!
//! Handles:
//! - HTTP endpoints with axum, bearer sessions issued by login and registration
//! - OpenAPI/Swagger documentation
//! - Settings change notifications over server-sent events
//!
//! Uses `api-shared` for wire DTOs and `cmf-core` for every portal operation.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{get, post, put},
    Router,
};
use futures_util::Stream;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::bearer_token;
use api_shared::{
    AppointmentReq, CatalogsRes, ErrorRes, FaqEntryRes, FaqRes, HealthRes, HealthService,
    LoginReq, MedicationReq, MessageRes, PasswordChangeReq, PasswordResetReq, PatientRes,
    PrescriptionReq, ProfileDto, RegisterReq, SessionRes, SettingsRes, SettingsUpdateReq,
    SubmitRes, UserRes,
};
use cmf_core::accounts::MemoryIdentity;
use cmf_core::appointment::AppointmentForm;
use cmf_core::catalog::Catalogs;
use cmf_core::constants::messages;
use cmf_core::identity::{AuthError, AuthErrorCode, SessionUser};
use cmf_core::intake::HttpIntakeClient;
use cmf_core::prescription::PrescriptionForm;
use cmf_core::profile_store::FileProfileStore;
use cmf_core::registration::{RegistrationError, RegistrationForm};
use cmf_core::settings::{JsonFilePreferences, PreferenceUpdate, SettingsStore};
use cmf_core::submission::{
    submit_shared, FailureReason, FormController, IntakeForm, RequestState, SubmitRefused,
};
use cmf_core::{faq, CoreConfig, PortalError, PortalResult, PortalService};

type ApiError = (StatusCode, Json<ErrorRes>);

type SharedController<F> = Arc<Mutex<FormController<F>>>;

/// Form controllers keyed by session token, one per request flow.
#[derive(Default)]
struct FormRegistry {
    prescriptions: Mutex<HashMap<String, SharedController<PrescriptionForm>>>,
    appointments: Mutex<HashMap<String, SharedController<AppointmentForm>>>,
}

impl FormRegistry {
    fn forget(&self, token: &str) {
        self.prescriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        self.appointments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    /// Drop the controllers of every token whose session has ended.
    fn prune(&self, portal: &PortalService) {
        portal.prune_sessions();
        let dropped =
            retain_live(&self.prescriptions, portal) + retain_live(&self.appointments, portal);
        if dropped > 0 {
            tracing::debug!(dropped, "form controllers of ended sessions dropped");
        }
    }
}

fn retain_live<F: IntakeForm>(
    controllers: &Mutex<HashMap<String, SharedController<F>>>,
    portal: &PortalService,
) -> usize {
    let mut controllers = controllers.lock().unwrap_or_else(PoisonError::into_inner);
    let before = controllers.len();
    controllers.retain(|token, _| portal.session_active(token));
    before - controllers.len()
}

fn controller_for<F: IntakeForm + Default>(
    controllers: &Mutex<HashMap<String, SharedController<F>>>,
    token: &str,
    notice_window: Duration,
) -> SharedController<F> {
    controllers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(token.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(FormController::new(F::default(), notice_window))))
        .clone()
}

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    portal: PortalService,
    intake: Arc<HttpIntakeClient>,
    settings: Arc<SettingsStore>,
    forms: Arc<FormRegistry>,
    notice_window: Duration,
}

impl AppState {
    pub fn new(
        cfg: &CoreConfig,
        portal: PortalService,
        settings: Arc<SettingsStore>,
    ) -> PortalResult<Self> {
        Ok(Self {
            portal,
            intake: Arc::new(HttpIntakeClient::from_config(cfg)?),
            settings,
            forms: Arc::new(FormRegistry::default()),
            notice_window: cfg.notice_window(),
        })
    }

    /// State for a server process: profiles and preferences live under the configured data
    /// directory, accounts are held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles directory cannot be created, the stored preferences
    /// cannot be read, or the HTTP client cannot be built.
    pub fn from_config(cfg: &CoreConfig) -> PortalResult<Self> {
        let profiles = Arc::new(FileProfileStore::new(cfg.profiles_dir())?);
        let portal = PortalService::new(Arc::new(MemoryIdentity::new()), profiles);
        let settings = Arc::new(SettingsStore::new(JsonFilePreferences::new(
            cfg.preferences_path(),
        ))?);
        Self::new(cfg, portal, settings)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        logout,
        register,
        password_reset,
        get_profile,
        put_profile,
        change_password,
        get_patient,
        submit_prescription,
        submit_appointment,
        catalogs,
        faq_entries,
        get_settings,
        put_settings,
        settings_events,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        MessageRes,
        LoginReq,
        UserRes,
        SessionRes,
        RegisterReq,
        PasswordResetReq,
        ProfileDto,
        PasswordChangeReq,
        PatientRes,
        MedicationReq,
        PrescriptionReq,
        AppointmentReq,
        SubmitRes,
        CatalogsRes,
        FaqEntryRes,
        FaqRes,
        SettingsRes,
        SettingsUpdateReq,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/password-reset", post(password_reset))
        .route("/profile", get(get_profile).put(put_profile))
        .route("/profile/password", put(change_password))
        .route("/patient", get(get_patient))
        .route("/prescriptions", post(submit_prescription))
        .route("/appointments", post(submit_appointment))
        .route("/catalogs", get(catalogs))
        .route("/faq", get(faq_entries))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/settings/events", get(settings_events))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            message: message.into(),
        }),
    )
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err.code() {
        Some(AuthErrorCode::WrongPassword) => StatusCode::UNAUTHORIZED,
        Some(AuthErrorCode::UserNotFound) => StatusCode::NOT_FOUND,
        Some(AuthErrorCode::InvalidEmail | AuthErrorCode::WeakPassword) => StatusCode::BAD_REQUEST,
        Some(AuthErrorCode::UserDisabled | AuthErrorCode::OperationNotAllowed) => {
            StatusCode::FORBIDDEN
        }
        Some(AuthErrorCode::TooManyRequests) => StatusCode::TOO_MANY_REQUESTS,
        Some(AuthErrorCode::EmailAlreadyInUse) => StatusCode::CONFLICT,
        None => StatusCode::BAD_GATEWAY,
    }
}

fn portal_error(err: PortalError) -> ApiError {
    let status = match &err {
        PortalError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortalError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        PortalError::Auth(e) => auth_status(e),
        PortalError::Intake(_) => StatusCode::BAD_GATEWAY,
        _ => {
            tracing::error!("portal error: {err:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error(status, err.user_message())
}

fn registration_error(err: RegistrationError) -> ApiError {
    match err {
        RegistrationError::Auth(e) => error(auth_status(&e), e.user_message()),
        RegistrationError::Store(e) => portal_error(e),
        other => error(StatusCode::BAD_REQUEST, other.user_message()),
    }
}

/// Resolve the bearer token in `headers` to its session user.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(String, SessionUser), ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = bearer_token(header)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, messages::NOT_AUTHENTICATED))?;
    let user = state.portal.current_user(token).map_err(portal_error)?;
    Ok((token.to_string(), user))
}

fn submit_status(report_state: RequestState) -> StatusCode {
    match report_state {
        RequestState::Succeeded => StatusCode::OK,
        RequestState::Failed(FailureReason::Incomplete) => StatusCode::UNPROCESSABLE_ENTITY,
        RequestState::Failed(FailureReason::Rejected { .. } | FailureReason::Transport) => {
            StatusCode::BAD_GATEWAY
        }
        RequestState::Idle | RequestState::Submitting => StatusCode::ACCEPTED,
    }
}

/// Put `form` into the caller's controller and submit it for the caller's patient.
async fn submit_form<F>(
    state: &AppState,
    headers: &HeaderMap,
    controllers: &Mutex<HashMap<String, SharedController<F>>>,
    form: F,
) -> Result<(StatusCode, Json<SubmitRes>), ApiError>
where
    F: IntakeForm + Default + Send,
    F::Payload: Send,
{
    let (token, user) = authenticate(state, headers)?;
    let patient = state.portal.load_patient(&user);
    state.forms.prune(&state.portal);
    let controller = controller_for(controllers, &token, state.notice_window);

    *controller
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .form_mut() = form;

    match submit_shared(&controller, state.intake.as_ref(), Some(&patient)).await {
        Ok(report) => {
            let status = submit_status(report.state);
            Ok((status, Json(SubmitRes::from(report))))
        }
        Err(SubmitRefused::InFlight) => {
            tracing::debug!(user = %user.id, "submit refused while another is in flight");
            Err(error(StatusCode::CONFLICT, messages::REQUEST_IN_FLIGHT))
        }
        Err(SubmitRefused::Incomplete) => Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            F::MESSAGES.incomplete,
        )),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check used by monitoring and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Signed in", body = SessionRes),
        (status = 401, description = "Wrong password", body = ErrorRes),
        (status = 404, description = "No account for this email", body = ErrorRes),
        (status = 429, description = "Too many failed attempts", body = ErrorRes)
    )
)]
/// Sign in with email and password.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<SessionRes>, ApiError> {
    let signed_in = state
        .portal
        .login(&req.email, &req.password)
        .map_err(portal_error)?;
    Ok(Json(signed_in.into()))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Unknown session", body = ErrorRes)
    )
)]
/// End the caller's session and drop its in-progress forms.
#[axum::debug_handler]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let (token, _) = authenticate(&state, &headers)?;
    state.portal.logout(&token).map_err(portal_error)?;
    state.forms.forget(&token);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionRes),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Create an account and its profile document.
#[axum::debug_handler]
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<SessionRes>), ApiError> {
    let form = RegistrationForm::from(req);
    let signed_in = state.portal.register(&form).map_err(registration_error)?;
    Ok((StatusCode::CREATED, Json(signed_in.into())))
}

#[utoipa::path(
    post,
    path = "/auth/password-reset",
    request_body = PasswordResetReq,
    responses(
        (status = 200, description = "Reset email sent", body = MessageRes),
        (status = 400, description = "Email missing or invalid", body = ErrorRes),
        (status = 404, description = "No account for this email", body = ErrorRes)
    )
)]
/// Send a password reset email.
#[axum::debug_handler]
async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetReq>,
) -> Result<Json<MessageRes>, ApiError> {
    state
        .portal
        .reset_password(&req.email)
        .map_err(portal_error)?;
    Ok(Json(MessageRes {
        message: messages::RESET_EMAIL_SENT.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Editable profile fields", body = ProfileDto),
        (status = 401, description = "Not signed in", body = ErrorRes)
    )
)]
/// Profile fields as shown on the profile page.
#[axum::debug_handler]
async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileDto>, ApiError> {
    let (_, user) = authenticate(&state, &headers)?;
    let form = state.portal.load_profile(&user).map_err(portal_error)?;
    Ok(Json(form.into()))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileDto,
    responses(
        (status = 200, description = "Profile saved", body = MessageRes),
        (status = 401, description = "Not signed in", body = ErrorRes)
    )
)]
/// Merge the edited fields into the stored profile.
#[axum::debug_handler]
async fn put_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(dto): Json<ProfileDto>,
) -> Result<Json<MessageRes>, ApiError> {
    let (_, user) = authenticate(&state, &headers)?;
    state
        .portal
        .save_profile(&user, &dto.into())
        .map_err(portal_error)?;
    Ok(Json(MessageRes {
        message: messages::PROFILE_SAVED.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/profile/password",
    request_body = PasswordChangeReq,
    responses(
        (status = 200, description = "Password updated", body = MessageRes),
        (status = 400, description = "Passwords differ or are too short", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PasswordChangeReq>,
) -> Result<Json<MessageRes>, ApiError> {
    let (_, user) = authenticate(&state, &headers)?;
    state
        .portal
        .change_password(&user, &req.into())
        .map_err(portal_error)?;
    Ok(Json(MessageRes {
        message: messages::PASSWORD_UPDATED.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/patient",
    responses(
        (status = 200, description = "Reconciled patient identity", body = PatientRes),
        (status = 401, description = "Not signed in", body = ErrorRes)
    )
)]
/// The signed-in patient's identity, reconciled from whichever profile layout is stored.
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PatientRes>, ApiError> {
    let (_, user) = authenticate(&state, &headers)?;
    let patient = state.portal.load_patient(&user);
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    request_body = PrescriptionReq,
    responses(
        (status = 200, description = "Request accepted by the intake API", body = SubmitRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 409, description = "A prescription request is already in flight", body = ErrorRes),
        (status = 422, description = "Medication rows incomplete", body = SubmitRes),
        (status = 502, description = "Intake API rejected or unreachable", body = SubmitRes)
    )
)]
/// Submit a prescription request for the signed-in patient.
#[axum::debug_handler]
async fn submit_prescription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PrescriptionReq>,
) -> Result<(StatusCode, Json<SubmitRes>), ApiError> {
    let forms = state.forms.clone();
    submit_form(&state, &headers, &forms.prescriptions, PrescriptionForm::from(req)).await
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentReq,
    responses(
        (status = 200, description = "Request accepted by the intake API", body = SubmitRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 409, description = "An appointment request is already in flight", body = ErrorRes),
        (status = 422, description = "Required fields missing", body = SubmitRes),
        (status = 502, description = "Intake API rejected or unreachable", body = SubmitRes)
    )
)]
/// Submit an appointment request for the signed-in patient.
#[axum::debug_handler]
async fn submit_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AppointmentReq>,
) -> Result<(StatusCode, Json<SubmitRes>), ApiError> {
    let forms = state.forms.clone();
    submit_form(&state, &headers, &forms.appointments, AppointmentForm::from(req)).await
}

#[utoipa::path(
    get,
    path = "/catalogs",
    responses(
        (status = 200, description = "Selectable option lists", body = CatalogsRes)
    )
)]
async fn catalogs() -> Json<CatalogsRes> {
    Json(Catalogs::standard().into())
}

#[utoipa::path(
    get,
    path = "/faq",
    responses(
        (status = 200, description = "Frequently asked questions", body = FaqRes)
    )
)]
async fn faq_entries() -> Json<FaqRes> {
    Json(FaqRes {
        entries: faq::entries().iter().map(FaqEntryRes::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Current accessibility settings", body = SettingsRes)
    )
)]
#[axum::debug_handler]
async fn get_settings(State(state): State<AppState>) -> Json<SettingsRes> {
    Json(state.settings.current().into())
}

#[utoipa::path(
    put,
    path = "/settings",
    request_body = SettingsUpdateReq,
    responses(
        (status = 200, description = "Settings after the change", body = SettingsRes),
        (status = 400, description = "Unsupported text size", body = ErrorRes)
    )
)]
/// Change some accessibility settings; omitted fields keep their value.
#[axum::debug_handler]
async fn put_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdateReq>,
) -> Result<Json<SettingsRes>, ApiError> {
    let update = PreferenceUpdate::try_from(req).map_err(|e| error(StatusCode::BAD_REQUEST, e))?;
    let prefs = state.settings.apply(update).map_err(portal_error)?;
    Ok(Json(prefs.into()))
}

#[utoipa::path(
    get,
    path = "/settings/events",
    responses(
        (status = 200, description = "Stream of `settings` events, each carrying a SettingsRes snapshot", content_type = "text/event-stream")
    )
)]
/// Stream the current settings, then a new snapshot after every change.
async fn settings_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.settings.subscribe();
    let stream = futures_util::stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let snapshot = SettingsRes::from(*receiver.borrow_and_update());
        let event = Event::default()
            .event("settings")
            .json_data(&snapshot)
            .unwrap_or_else(|e| {
                tracing::warn!("failed to encode settings event: {e}");
                Event::default().event("settings")
            });
        Some((Ok(event), (receiver, false)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
