//! REST endpoints for onboarding sessions, the catalog and hydration.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::catalog::{Catalog, SportCategory};
use crate::error::{Error, FlowError, SessionError};
use crate::hydration::{DrinkKind, HydrationDay, HydrationLog, HydrationSummary, Intake};

use super::calculators::{self, personalized_hydration_goal_ml};
use super::flow::Locale;
use super::navigator::{CalculatorSettings, SessionView};
use super::persistence::SaveOutcome;
use super::response::Response as StepResponse;
use super::sessions::SessionRegistry;
use super::state::OnboardingState;

/// Header carrying the authenticated user id, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub sessions: Arc<SessionRegistry>,
    pub catalog: Arc<Catalog>,
    pub hydration: Arc<HydrationLog>,
    pub settings: CalculatorSettings,
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/onboarding/flows", get(list_flows))
        .route("/api/onboarding/sessions", post(create_session))
        .route(
            "/api/onboarding/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/onboarding/sessions/{id}/advance", post(advance_session))
        .route("/api/onboarding/sessions/{id}/skip", post(skip_session))
        .route("/api/onboarding/sessions/{id}/complete", post(complete_session))
        .route("/api/catalog/sports", get(list_sports))
        .route("/api/catalog/packs", get(list_packs))
        .route("/api/hydration/goal", get(hydration_goal))
        .route("/api/hydration/day", get(get_hydration_day))
        .route("/api/hydration/day/goal", put(set_hydration_goal))
        .route("/api/hydration/day/intakes", post(add_intake))
        .route("/api/hydration/day/intakes/last", delete(remove_last_intake))
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Session(SessionError::Busy(_) | SessionError::AlreadyComplete(_)) => StatusCode::CONFLICT,
        Error::Session(SessionError::UnknownFlow(_)) => StatusCode::BAD_REQUEST,
        Error::Flow(FlowError::AtTerminal { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Onboarding request failed: {err}");
    } else {
        debug!(status = status.as_u16(), "Onboarding request refused: {err}");
    }
    error_body(status, err.to_string())
}

fn parse_session_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| error_body(StatusCode::BAD_REQUEST, "Invalid session ID"))
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fit-onboard"
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SessionBody {
    session_id: Uuid,
    #[serde(flatten)]
    view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    save: Option<SaveOutcome>,
}

#[derive(Serialize)]
struct FlowSummary {
    id: String,
    initial_step: String,
    total_steps: usize,
    estimated_minutes: u32,
}

async fn list_flows(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    let flows: Vec<FlowSummary> = super::flows::FLOW_IDS
        .iter()
        .filter_map(|id| state.sessions.flow(id))
        .map(|flow| FlowSummary {
            id: flow.id().to_string(),
            initial_step: flow.initial().to_string(),
            total_steps: flow.total_steps(),
            estimated_minutes: flow.estimated_minutes(),
        })
        .collect();
    Json(flows)
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    flow: String,
    #[serde(default)]
    locale: Locale,
}

async fn create_session(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Response {
    match state
        .sessions
        .create(&body.flow, user_id(&headers), body.locale)
        .await
    {
        Ok((session_id, view)) => (
            StatusCode::CREATED,
            Json(SessionBody {
                session_id,
                view,
                save: None,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_session(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.view(session_id).await {
        Ok(view) => Json(SessionBody {
            session_id,
            view,
            save: None,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_session(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if state.sessions.remove(session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(SessionError::NotFound(session_id).into())
    }
}

#[derive(Deserialize)]
struct AdvanceRequest {
    #[serde(default)]
    response: StepResponse,
}

async fn advance_session(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
    Json(body): Json<AdvanceRequest>,
) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.advance(session_id, body.response).await {
        Ok((outcome, view)) => Json(SessionBody {
            session_id,
            view,
            save: Some(outcome.save),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn skip_session(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.skip(session_id).await {
        Ok((outcome, view)) => Json(SessionBody {
            session_id,
            view,
            save: Some(outcome.save),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Serialize)]
struct CompletionBody {
    session_id: Uuid,
    state: OnboardingState,
    save: SaveOutcome,
}

async fn complete_session(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.complete(session_id).await {
        Ok(completion) => Json(CompletionBody {
            session_id,
            state: completion.state,
            save: completion.save,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

// ── Catalog ─────────────────────────────────────────────────────────────

async fn list_sports(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.catalog.sports().await)
}

#[derive(Serialize)]
struct PackSummary {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    modules: &'static [&'static str],
    #[serde(with = "rust_decimal::serde::str")]
    price: rust_decimal::Decimal,
}

async fn list_packs(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    let packs: Vec<PackSummary> = state
        .catalog
        .packs()
        .iter()
        .map(|p| PackSummary {
            id: p.id,
            name: p.name_fr,
            description: p.description,
            modules: p.modules,
            price: calculators::price_of(p.modules),
        })
        .collect();
    Json(packs)
}

// ── Hydration ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct HydrationQuery {
    sport: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    /// Comma-separated goal ids.
    goals: Option<String>,
}

async fn hydration_goal(
    State(state): State<OnboardingRouteState>,
    Query(query): Query<HydrationQuery>,
) -> impl IntoResponse {
    let category = match query.sport.as_deref() {
        Some(id) => state
            .catalog
            .sport(id)
            .await
            .map(|s| s.category)
            .unwrap_or_default(),
        None => SportCategory::default(),
    };
    let goals: Vec<&str> = query
        .goals
        .as_deref()
        .map(|g| g.split(',').map(str::trim).filter(|g| !g.is_empty()).collect())
        .unwrap_or_default();

    let goal_ml = personalized_hydration_goal_ml(
        state.settings.hydration_base_ml,
        category,
        query.age,
        query.gender.as_deref(),
        &goals,
    );
    Json(serde_json::json!({
        "goal_ml": goal_ml,
        "sport_category": category,
    }))
}

#[derive(Serialize)]
struct HydrationDayBody {
    date: NaiveDate,
    intakes: Vec<Intake>,
    #[serde(flatten)]
    summary: HydrationSummary,
}

impl HydrationDayBody {
    fn new(date: NaiveDate, day: &HydrationDay) -> Self {
        Self {
            date,
            intakes: day.intakes().to_vec(),
            summary: day.summary(),
        }
    }
}

fn require_user(headers: &HeaderMap) -> Result<String, Response> {
    user_id(headers).ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "Missing user id"))
}

async fn get_hydration_day(State(state): State<OnboardingRouteState>, headers: HeaderMap) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let today = Utc::now().date_naive();
    let day = state
        .hydration
        .day(&user, today, state.settings.hydration_base_ml)
        .await;
    Json(HydrationDayBody::new(today, &day)).into_response()
}

#[derive(Deserialize)]
struct GoalRequest {
    goal_ml: u32,
}

async fn set_hydration_goal(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(body): Json<GoalRequest>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if body.goal_ml == 0 {
        return error_body(StatusCode::BAD_REQUEST, "Goal must be positive");
    }
    let today = Utc::now().date_naive();
    let ((), day) = state
        .hydration
        .update(&user, today, state.settings.hydration_base_ml, |day| {
            day.goal_ml = body.goal_ml;
        })
        .await;
    Json(HydrationDayBody::new(today, &day)).into_response()
}

#[derive(Deserialize)]
struct IntakeRequest {
    amount_ml: u32,
    #[serde(default)]
    kind: DrinkKind,
    /// Defaults to now.
    time: Option<NaiveTime>,
}

async fn add_intake(
    State(state): State<OnboardingRouteState>,
    headers: HeaderMap,
    Json(body): Json<IntakeRequest>,
) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if body.amount_ml == 0 {
        return error_body(StatusCode::BAD_REQUEST, "Amount must be positive");
    }
    let now = Utc::now();
    let today = now.date_naive();
    let time = body.time.unwrap_or_else(|| now.time());
    let ((), day) = state
        .hydration
        .update(&user, today, state.settings.hydration_base_ml, |day| {
            day.add(time, body.amount_ml, body.kind);
        })
        .await;
    debug!(user_id = %user, amount_ml = body.amount_ml, "Hydration intake logged");
    (StatusCode::CREATED, Json(HydrationDayBody::new(today, &day))).into_response()
}

async fn remove_last_intake(State(state): State<OnboardingRouteState>, headers: HeaderMap) -> Response {
    let user = match require_user(&headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let today = Utc::now().date_naive();
    let (removed, day) = state
        .hydration
        .update(&user, today, state.settings.hydration_base_ml, HydrationDay::remove_last)
        .await;
    match removed {
        Some(_) => Json(HydrationDayBody::new(today, &day)).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "No intake to remove"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::navigator::SystemClock;
    use crate::onboarding::persistence::MemoryProgressStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        let catalog = Arc::new(Catalog::new());
        let sessions = SessionRegistry::new(
            Arc::clone(&catalog),
            Arc::new(MemoryProgressStore::new()),
            Arc::new(SystemClock),
            CalculatorSettings::default(),
        )
        .unwrap();
        onboarding_routes(OnboardingRouteState {
            sessions: Arc::new(sessions),
            catalog,
            hydration: Arc::new(HydrationLog::new()),
            settings: CalculatorSettings::default(),
        })
    }

    fn hydration_request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, "user-1")
            .header("content-type", "application/json");
        builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_session_id_is_bad_request() {
        let resp = router()
            .oneshot(
                Request::get("/api/onboarding/sessions/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let uri = format!("/api/onboarding/sessions/{}", Uuid::new_v4());
        let resp = router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_flow_is_bad_request() {
        let resp = router()
            .oneshot(
                Request::post("/api/onboarding/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"flow":"nope"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn hydration_goal_uses_sport_category() {
        let resp = router()
            .oneshot(
                Request::get("/api/hydration/goal?sport=running&age=30&gender=male&goals=endurance,endurance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        // 2500 + 750 endurance sport + 300 male + 400 endurance goal, once
        assert_eq!(body["goal_ml"], 3950);
        assert_eq!(body["sport_category"], "endurance");
    }

    #[tokio::test]
    async fn packs_are_priced() {
        let resp = router()
            .oneshot(Request::get("/api/catalog/packs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body[0]["id"], "performance");
        assert_eq!(body[0]["price"], "28");
    }

    #[tokio::test]
    async fn hydration_day_logs_and_undoes_intakes() {
        let app = router();

        let resp = app
            .clone()
            .oneshot(hydration_request(
                "POST",
                "/api/hydration/day/intakes",
                Some(r#"{"amount_ml":250,"time":"08:00:00"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        app.clone()
            .oneshot(hydration_request(
                "POST",
                "/api/hydration/day/intakes",
                Some(r#"{"amount_ml":500,"kind":"juice","time":"12:30:00"}"#),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(hydration_request("GET", "/api/hydration/day", None))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["goal_ml"], 2500);
        assert_eq!(body["current_ml"], 750);
        assert_eq!(body["remaining_ml"], 1750);
        assert_eq!(body["intakes"][1]["kind"], "juice");

        let resp = app
            .clone()
            .oneshot(hydration_request("DELETE", "/api/hydration/day/intakes/last", None))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["current_ml"], 250);
        app.clone()
            .oneshot(hydration_request("DELETE", "/api/hydration/day/intakes/last", None))
            .await
            .unwrap();
        let resp = app
            .oneshot(hydration_request("DELETE", "/api/hydration/day/intakes/last", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hydration_goal_can_be_changed() {
        let app = router();
        let resp = app
            .clone()
            .oneshot(hydration_request("PUT", "/api/hydration/day/goal", Some(r#"{"goal_ml":1000}"#)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app
            .oneshot(hydration_request(
                "POST",
                "/api/hydration/day/intakes",
                Some(r#"{"amount_ml":1200}"#),
            ))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["goal_ml"], 1000);
        assert_eq!(body["percentage"], 100.0);
        assert_eq!(body["goal_reached"], true);
    }

    #[tokio::test]
    async fn hydration_day_needs_user_and_positive_amounts() {
        let app = router();
        let resp = app
            .clone()
            .oneshot(Request::get("/api/hydration/day").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(hydration_request(
                "POST",
                "/api/hydration/day/intakes",
                Some(r#"{"amount_ml":0}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
