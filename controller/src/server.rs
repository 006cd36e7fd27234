use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use countdown_common::FormSubmission;

use crate::app::{ControlRequest, ControlResponse, Exchange};

const MAX_FORM_BODY_BYTES: usize = 4096;

#[derive(Clone)]
struct ServerState {
    requests: mpsc::Sender<Exchange>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(requests: mpsc::Sender<Exchange>) -> Router {
    Router::new()
        .route("/", get(handle_get_form).post(handle_post_form))
        .route("/api/status", get(handle_get_status))
        .layer(DefaultBodyLimit::max(MAX_FORM_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { requests })
}

async fn handle_get_form(State(state): State<ServerState>) -> Response {
    dispatch(&state, ControlRequest::FormGet).await
}

async fn handle_post_form(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let submission = FormSubmission::decode(content_type, &body);

    dispatch(&state, ControlRequest::FormPost(submission)).await
}

async fn handle_get_status(State(state): State<ServerState>) -> Response {
    dispatch(&state, ControlRequest::Status).await
}

/// Hands the request to the main loop and waits for its answer.
async fn dispatch(state: &ServerState, request: ControlRequest) -> Response {
    let (reply, answer) = oneshot::channel();

    if state.requests.send(Exchange { request, reply }).await.is_err() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "main loop is not running");
    }

    match answer.await {
        Ok(response) => response.into_response(),
        Err(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "main loop dropped the request",
        ),
    }
}

impl IntoResponse for ControlResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Page { status, html } => (status, Html(html)).into_response(),
            Self::Status(status) => Json(status).into_response(),
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::CountdownApp, display::LogDisplay, rtc::SystemRtc};
    use axum::http::HeaderValue;
    use chrono::{NaiveDate, NaiveTime};
    use countdown_common::{AlarmSchedule, CurrentTime, FormVariant, TargetDate};

    /// Answers exchanges the way the main loop does, without ticking.
    fn spawn_responder(variant: FormVariant) -> ServerState {
        let now = NaiveDate::from_ymd_opt(2025, 4, 29)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut app = CountdownApp::new(
            SystemRtc::with_source(Box::new(move || now)),
            LogDisplay::new(),
            TargetDate::from_ymd(2025, 4, 30).unwrap(),
            variant,
            "UTC".to_string(),
        );
        app.boot(
            CurrentTime::new(now),
            AlarmSchedule::daily(NaiveTime::from_hms_opt(0, 0, 1).unwrap()),
            0.2,
        )
        .unwrap();

        let (requests, mut inbox) = mpsc::channel::<Exchange>(4);
        tokio::spawn(async move {
            while let Some(Exchange { request, reply }) = inbox.recv().await {
                let _ = reply.send(app.handle(request));
            }
        });

        ServerState { requests }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn get_serves_the_prefilled_form() {
        let state = spawn_responder(FormVariant::Split);

        let response = handle_get_form(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("name=\"fyear\" value=\"2025\""));
        assert!(html.contains("name=\"fday\" value=\"30\""));
    }

    #[tokio::test]
    async fn urlencoded_post_updates_the_countdown() {
        let state = spawn_responder(FormVariant::Iso);
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let response = handle_post_form(
            State(state.clone()),
            headers,
            Bytes::from_static(b"fdate=2025-05-09"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("remaining = 10"));

        let status = body_text(handle_get_status(State(state)).await).await;
        let status: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(status["targetDate"], "2025-05-09");
        assert_eq!(status["daysRemaining"], 10);
        assert_eq!(status["lastSubmitted"], 10);
    }

    #[tokio::test]
    async fn plain_text_post_is_accepted() {
        let state = spawn_responder(FormVariant::Split);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = handle_post_form(
            State(state),
            headers,
            Bytes::from_static(b"fyear=2025\r\nfmonth=04\r\nfday=30\r\n"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("remaining = 1"));
    }

    #[tokio::test]
    async fn invalid_date_is_a_bad_request() {
        let state = spawn_responder(FormVariant::Split);

        let response = handle_post_form(
            State(state),
            HeaderMap::new(),
            Bytes::from_static(b"fyear=2025&fmonth=2&fday=30"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Submission rejected"));
    }

    #[tokio::test]
    async fn stopped_loop_answers_service_unavailable() {
        let (requests, inbox) = mpsc::channel::<Exchange>(1);
        drop(inbox);

        let response = handle_get_status(State(ServerState { requests })).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(response).await.contains("main loop is not running"));
    }
}
