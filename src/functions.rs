//! JSON endpoints the invite page talks to: `get-invite` checks a token, `submit-rsvp` records
//! the answer. Both are open to any origin and report every failure as a 400 with a JSON body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header::HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::model::{InviteDetails, RsvpSubmission};
use crate::{get_invite_by_token, run_db, submit_rsvp, DbPool};

#[derive(Debug, Deserialize)]
pub struct GetInviteRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetInviteResponse {
    pub valid: bool,
    #[serde(flatten)]
    pub invite: Option<InviteDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `guests_count` arrives as whatever the form sent, a number or a numeric string.
#[derive(Debug, Deserialize)]
pub struct SubmitRsvpRequest {
    pub invite_id: Option<i32>,
    pub guest_name: Option<String>,
    pub attending: Option<bool>,
    pub guests_count: Option<Value>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitRsvpResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "rsvpId")]
    pub rsvp_id: i32,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Reads a guest count the way a lenient form parser would: leading digits of a string count,
/// fractions are truncated, anything else is treated as absent. Digits past `i64` saturate, so
/// an absurd count still fails the capacity check instead of being dropped.
pub fn parse_guests_count(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let leading: String = digits.chars().take_while(char::is_ascii_digit).collect();
            if leading.is_empty() {
                return None;
            }
            Some(sign * leading.parse::<i64>().unwrap_or(i64::MAX))
        }
        _ => None,
    }
}

impl From<SubmitRsvpRequest> for RsvpSubmission {
    fn from(req: SubmitRsvpRequest) -> Self {
        RsvpSubmission {
            invite_id: req.invite_id,
            guest_name: req.guest_name,
            attending: req.attending,
            guests_count: parse_guests_count(req.guests_count.as_ref()),
            phone: req.phone,
            message: req.message,
        }
    }
}

fn bad_request<T: Serialize>(body: T) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn invite_error(message: String) -> Response {
    bad_request(GetInviteResponse {
        valid: false,
        invite: None,
        error: Some(message),
    })
}

async fn get_invite(
    State(pool): State<DbPool>,
    payload: Result<Json<GetInviteRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "get-invite: malformed body");
            return invite_error(rejection.body_text());
        }
    };

    let token = request.token.unwrap_or_default();
    let now = Utc::now().naive_utc();
    match run_db(&pool, move |conn| get_invite_by_token(conn, &token, now)).await {
        Ok(invite) => {
            tracing::info!(invite_id = invite.invite_id, "invite validated");
            Json(GetInviteResponse {
                valid: true,
                invite: Some(invite),
                error: None,
            })
            .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "get-invite rejected");
            invite_error(err.to_string())
        }
    }
}

async fn submit(
    State(pool): State<DbPool>,
    payload: Result<Json<SubmitRsvpRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "submit-rsvp: malformed body");
            return bad_request(ErrorBody {
                error: rejection.body_text(),
            });
        }
    };

    let submission = RsvpSubmission::from(request);
    let now = Utc::now().naive_utc();
    match run_db(&pool, move |conn| submit_rsvp(conn, &submission, now)).await {
        Ok(rsvp) => {
            tracing::info!(
                rsvp_id = rsvp.id,
                invite_id = rsvp.invite_id,
                attending = rsvp.attending,
                guests_count = rsvp.guests_count,
                "rsvp recorded"
            );
            Json(SubmitRsvpResponse {
                success: true,
                message: "RSVP saved successfully.".to_string(),
                rsvp_id: rsvp.id,
            })
            .into_response()
        }
        Err(err) => {
            if err.is_server_fault() {
                tracing::error!(error = %err, "submit-rsvp failed");
            } else {
                tracing::warn!(error = %err, "submit-rsvp rejected");
            }
            bad_request(ErrorBody {
                error: err.to_string(),
            })
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static("content-type"),
        ])
}

/// Routes for `/get-invite` and `/submit-rsvp`. Nest it under `/functions/v1`.
pub fn router<S>(pool: DbPool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/get-invite", post(get_invite))
        .route("/submit-rsvp", post(submit))
        .layer(cors_layer())
        .with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GuestForm, GuestKind, InviteForm};
    use crate::{build_pool, create_invite};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        token: String,
        invite_id: i32,
    }

    // One connection, so every request sees the same in-memory database.
    fn setup() -> TestApp {
        let pool = build_pool(":memory:", 1).unwrap();
        let mut conn = pool.get().unwrap();
        let form = InviteForm {
            label: "The Almeidas".to_string(),
            max_guests: 2,
            allow_plus_one: true,
            guests: vec![GuestForm {
                name: "Marta Almeida".to_string(),
                kind: GuestKind::Principal,
            }],
        };
        let expires = Utc::now().naive_utc() + chrono::Duration::days(30);
        let invite = create_invite(&mut conn, &form, "Wedding", Some(expires)).unwrap();
        drop(conn);

        TestApp {
            app: router(pool),
            token: invite.token,
            invite_id: invite.id,
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_guests_count() {
        assert_eq!(parse_guests_count(None), None);
        assert_eq!(parse_guests_count(Some(&json!(2))), Some(2));
        assert_eq!(parse_guests_count(Some(&json!(2.7))), Some(2));
        assert_eq!(parse_guests_count(Some(&json!("3"))), Some(3));
        assert_eq!(parse_guests_count(Some(&json!(" 4 people"))), Some(4));
        assert_eq!(parse_guests_count(Some(&json!("-1"))), Some(-1));
        assert_eq!(parse_guests_count(Some(&json!("abc"))), None);
        assert_eq!(
            parse_guests_count(Some(&json!("99999999999999999999"))),
            Some(i64::MAX)
        );
        assert_eq!(
            parse_guests_count(Some(&json!("-99999999999999999999"))),
            Some(-i64::MAX)
        );
        assert_eq!(parse_guests_count(Some(&json!(null))), None);
        assert_eq!(parse_guests_count(Some(&json!(true))), None);
    }

    #[tokio::test]
    async fn test_get_invite_valid_token() {
        let t = setup();
        let response = t
            .app
            .oneshot(post_json("/get-invite", json!({ "token": t.token })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["invite_id"], t.invite_id);
        assert_eq!(body["label"], "The Almeidas");
        assert_eq!(body["max_guests"], 2);
        assert_eq!(body["allow_plus_one"], true);
        assert_eq!(body["event"], "Wedding");
        assert_eq!(body["guests"][0]["name"], "Marta Almeida");
        assert_eq!(body["guests"][0]["type"], "principal");
        assert_eq!(body["guests"][0]["status"], "pending");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_get_invite_errors() {
        let t = setup();

        let response = t
            .app
            .clone()
            .oneshot(post_json("/get-invite", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "An invite token is required.");

        let response = t
            .app
            .clone()
            .oneshot(post_json("/get-invite", json!({ "token": "ZZZZZZZZ" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invite not found.");

        let malformed = Request::builder()
            .method("POST")
            .uri("/get-invite")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = t.app.oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["valid"], false);
    }

    #[tokio::test]
    async fn test_submit_rsvp_success() {
        let t = setup();
        let response = t
            .app
            .oneshot(post_json(
                "/submit-rsvp",
                json!({
                    "invite_id": t.invite_id,
                    "guest_name": "Marta Almeida",
                    "attending": true,
                    "guests_count": "2",
                    "phone": "",
                    "message": "Can't wait!"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["rsvpId"].as_i64().is_some());
        assert!(body["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_submit_rsvp_over_capacity() {
        let t = setup();
        let response = t
            .app
            .oneshot(post_json(
                "/submit-rsvp",
                json!({
                    "invite_id": t.invite_id,
                    "guest_name": "Marta Almeida",
                    "attending": true,
                    "guests_count": 5
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "The number of guests (5) exceeds the allowed (2)."
        );
    }

    #[tokio::test]
    async fn test_submit_rsvp_huge_count_is_rejected() {
        let t = setup();
        let response = t
            .app
            .oneshot(post_json(
                "/submit-rsvp",
                json!({
                    "invite_id": t.invite_id,
                    "guest_name": "Marta Almeida",
                    "attending": true,
                    "guests_count": "99999999999999999999"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            format!("The number of guests ({}) exceeds the allowed (2).", i32::MAX)
        );
    }

    #[tokio::test]
    async fn test_submit_rsvp_missing_field() {
        let t = setup();
        let response = t
            .app
            .oneshot(post_json(
                "/submit-rsvp",
                json!({ "invite_id": t.invite_id, "attending": false }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing required field: guest_name."
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let t = setup();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/submit-rsvp")
            .header("origin", "https://guests.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,apikey")
            .body(Body::empty())
            .unwrap();
        let response = t.app.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("DELETE"));
        let allowed = headers["access-control-allow-headers"].to_str().unwrap();
        assert!(allowed.contains("apikey"));
        assert!(allowed.contains("x-client-info"));
    }
}
