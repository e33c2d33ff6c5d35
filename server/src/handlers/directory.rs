use anyhow::{Result, anyhow, bail};
use http_body_util::BodyExt;
use hyper::{Request, Response, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use shared::types::{Collection, JwtClaims};

use crate::database::documents;
use crate::handlers::utils::{deliver_error_json, deliver_serialized_json};
use crate::{AppState, RequestBody, ResponseBody};

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read the request body as a JSON object.
async fn read_json_object(req: Request<RequestBody>) -> Result<Map<String, Value>> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {}", e))?
        .to_bytes();

    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {}", other),
    }
}

/// `?id=` from the query string.
fn query_id(req: &Request<RequestBody>) -> Option<String> {
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}

fn store_failure(
    verb: &str,
    collection: Collection,
    e: &documents::DocumentError,
) -> Result<Response<ResponseBody>> {
    error!("Failed to {} {}: {}", verb, collection.name(), e);
    deliver_error_json(
        &format!("Failed to {} {}", verb, collection.label().to_lowercase()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET <admin>/<collection>`
pub async fn handle_list(
    _req: Request<RequestBody>,
    state: AppState,
    collection: Collection,
) -> Result<Response<ResponseBody>> {
    list_response(&state, collection, &format!("Failed to fetch {}", collection.name())).await
}

/// `GET /api/<collection>`, the read-only listing behind no login.
pub async fn handle_public_list(
    _req: Request<RequestBody>,
    state: AppState,
    collection: Collection,
) -> Result<Response<ResponseBody>> {
    list_response(
        &state,
        collection,
        &format!("Failed to fetch {} data", collection.name()),
    )
    .await
}

async fn list_response(
    state: &AppState,
    collection: Collection,
    failure: &str,
) -> Result<Response<ResponseBody>> {
    match documents::list(&state.db, collection).await {
        Ok(docs) => deliver_serialized_json(&docs, StatusCode::OK),
        Err(e) => {
            error!("Failed to list {}: {}", collection.name(), e);
            deliver_error_json(failure, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// `POST <admin>/<collection>`
pub async fn handle_create(
    req: Request<RequestBody>,
    state: AppState,
    claims: JwtClaims,
    collection: Collection,
) -> Result<Response<ResponseBody>> {
    let mut doc = match read_json_object(req).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Create {} rejected: {:#}", collection.name(), e);
            return deliver_error_json("Invalid request body", StatusCode::BAD_REQUEST);
        }
    };

    if let Some(field) = collection.missing_required_field(&doc) {
        return deliver_error_json(
            &format!("Missing required field: {}", field),
            StatusCode::BAD_REQUEST,
        );
    }

    collection.normalize(&mut doc);

    if collection == Collection::Teachers {
        if let Some(email) = doc.get("email").and_then(Value::as_str) {
            match documents::exists_with_field(&state.db, collection, "email", email).await {
                Ok(true) => {
                    return deliver_error_json(
                        "A teacher with this email already exists",
                        StatusCode::BAD_REQUEST,
                    );
                }
                Ok(false) => {}
                Err(e) => return store_failure(collection.create_verb(), collection, &e),
            }
        }
    }

    match documents::insert(&state.db, collection, doc).await {
        Ok(id) => {
            info!("{} created {} {}", claims.username, collection.name(), id);
            deliver_serialized_json(
                &json!({
                    "success": true,
                    "id": id,
                    "message": collection.created_message(),
                }),
                StatusCode::OK,
            )
        }
        Err(e) => store_failure(collection.create_verb(), collection, &e),
    }
}

/// `PUT <admin>/<collection>`, body carries `_id` plus the fields to change.
pub async fn handle_update(
    req: Request<RequestBody>,
    state: AppState,
    claims: JwtClaims,
    collection: Collection,
) -> Result<Response<ResponseBody>> {
    let mut patch = match read_json_object(req).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Update {} rejected: {:#}", collection.name(), e);
            return deliver_error_json("Invalid request body", StatusCode::BAD_REQUEST);
        }
    };

    let id = match patch.remove("_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        _ => {
            return deliver_error_json(
                &format!("{} ID is required", collection.label()),
                StatusCode::BAD_REQUEST,
            );
        }
    };

    collection.normalize(&mut patch);

    match documents::update(&state.db, collection, &id, patch).await {
        Ok(true) => {
            info!("{} updated {} {}", claims.username, collection.name(), id);
            deliver_serialized_json(
                &json!({
                    "success": true,
                    "message": format!("{} updated successfully", collection.label()),
                }),
                StatusCode::OK,
            )
        }
        Ok(false) => deliver_error_json(
            &format!("{} not found", collection.label()),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => store_failure("update", collection, &e),
    }
}

/// `DELETE <admin>/<collection>?id=...`
pub async fn handle_delete(
    req: Request<RequestBody>,
    state: AppState,
    claims: JwtClaims,
    collection: Collection,
) -> Result<Response<ResponseBody>> {
    let Some(id) = query_id(&req) else {
        return deliver_error_json(
            &format!("{} ID is required", collection.label()),
            StatusCode::BAD_REQUEST,
        );
    };

    match documents::delete(&state.db, collection, &id).await {
        Ok(true) => {
            info!("{} deleted {} {}", claims.username, collection.name(), id);
            deliver_serialized_json(
                &json!({
                    "success": true,
                    "message": format!("{} deleted successfully", collection.label()),
                }),
                StatusCode::OK,
            )
        }
        Ok(false) => deliver_error_json(
            &format!("{} not found", collection.label()),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => store_failure("delete", collection, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body_from;
    use crate::database::test_pool;
    use shared::config::parse_config;

    async fn closed_state() -> AppState {
        let config = parse_config(
            r#"
            [server]
            bind = "127.0.0.1"

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [auth]
            jwt_secret = "test-secret-key-0123456789abcdef"
            "#,
        )
        .unwrap();
        let db = test_pool().await;
        db.close().await;
        AppState::new(config, db).unwrap()
    }

    async fn error_of(res: Response<ResponseBody>) -> (StatusCode, Value) {
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn request(uri: &str) -> Request<RequestBody> {
        Request::delete(uri).body(body_from("")).unwrap()
    }

    #[test]
    fn id_is_read_from_query() {
        assert_eq!(
            query_id(&request("/api/admin/locations?id=abc-123")).as_deref(),
            Some("abc-123")
        );
        assert_eq!(
            query_id(&request("/api/admin/locations?x=1&id=a%20b")).as_deref(),
            Some("a b")
        );
    }

    #[test]
    fn missing_or_blank_id_is_none() {
        assert!(query_id(&request("/api/admin/locations")).is_none());
        assert!(query_id(&request("/api/admin/locations?id=")).is_none());
        assert!(query_id(&request("/api/admin/locations?other=1")).is_none());
    }

    #[tokio::test]
    async fn listing_failures_name_the_collection() {
        let state = closed_state().await;

        let res = handle_public_list(
            request("/api/locations"),
            state.clone(),
            Collection::Locations,
        )
        .await
        .unwrap();
        assert_eq!(
            error_of(res).await,
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch locations data" })
            )
        );

        let res = handle_list(request("/api/admin/timetable"), state, Collection::Timetable)
            .await
            .unwrap();
        assert_eq!(
            error_of(res).await,
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch timetable" })
            )
        );
    }

    #[tokio::test]
    async fn write_failures_use_the_collection_verb() {
        let state = closed_state().await;
        let claims = JwtClaims {
            user_id: "u-1".into(),
            username: "admin".into(),
            role: shared::types::Role::Admin,
            iat: 0,
            exp: 0,
        };

        let create = Request::post("/api/admin/timetable")
            .body(body_from(
                r#"{"course":"CS101","title":"Intro","day":"Monday","time":"09:00","room":"B1","teacher":"Ada","semester":"Fall"}"#,
            ))
            .unwrap();
        let res = handle_create(create, state.clone(), claims.clone(), Collection::Timetable)
            .await
            .unwrap();
        assert_eq!(
            error_of(res).await.1,
            json!({ "error": "Failed to add timetable entry" })
        );

        let res = handle_delete(
            request("/api/admin/teachers?id=abc"),
            state,
            claims,
            Collection::Teachers,
        )
        .await
        .unwrap();
        assert_eq!(
            error_of(res).await.1,
            json!({ "error": "Failed to delete teacher" })
        );
    }

    #[tokio::test]
    async fn body_must_be_a_json_object() {
        let ok = Request::post("/").body(body_from(r#"{"name":"Lab"}"#)).unwrap();
        assert_eq!(read_json_object(ok).await.unwrap()["name"], "Lab");

        let array = Request::post("/").body(body_from("[1,2]")).unwrap();
        assert!(read_json_object(array).await.is_err());

        let junk = Request::post("/").body(body_from("{nope")).unwrap();
        assert!(read_json_object(junk).await.is_err());
    }
}
