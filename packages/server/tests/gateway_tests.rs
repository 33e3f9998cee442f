//! Router-level tests: requests go through the full middleware stack and
//! the in-memory stores, no database required.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use scrutin_core::domains::access::models::AccessLevel;
use scrutin_core::domains::territory::{NodeKind, TerritorialNode, TerritoryIndex};
use scrutin_core::kernel::ServerDeps;
use scrutin_core::server::build_app;
use scrutin_core::server::middleware::AuthVerifier;

fn node(code: i32, libelle: &str, kind: NodeKind, parent: Option<i32>) -> TerritorialNode {
    TerritorialNode {
        code,
        libelle: libelle.to_string(),
        kind,
        parent_code: parent,
    }
}

fn test_tree() -> TerritoryIndex {
    TerritoryIndex::build(vec![
        node(100, "Littoral", NodeKind::Region, None),
        node(1, "Wouri", NodeKind::Department, Some(100)),
        node(2, "Moungo", NodeKind::Department, Some(100)),
        node(11, "Douala I", NodeKind::Arrondissement, Some(1)),
        node(21, "Nkongsamba I", NodeKind::Arrondissement, Some(2)),
        node(111, "EP Bonanjo A", NodeKind::PollingStation, Some(11)),
        node(112, "EP Bonanjo B", NodeKind::PollingStation, Some(11)),
        node(211, "Lycée de Nkongsamba", NodeKind::PollingStation, Some(21)),
    ])
    .unwrap()
}

struct Harness {
    app: Router,
    verifier: Arc<AuthVerifier>,
    deps: ServerDeps,
}

fn harness() -> Harness {
    let deps = ServerDeps::in_memory(test_tree());
    let verifier = Arc::new(AuthVerifier::new("test-secret", "test-issuer".to_string()));
    let app = build_app(deps.clone(), verifier.clone());
    Harness {
        app,
        verifier,
        deps,
    }
}

impl Harness {
    fn token(&self, user_id: &str, role: &str) -> String {
        self.verifier.create_token(user_id, role).unwrap()
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            // The rate limiter extracts the client IP from headers
            .header("x-forwarded-for", "127.0.0.1");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_health_reports_territory() {
    let h = harness();
    let (status, body) = h.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["territory"]["nodes"], 8);
}

#[tokio::test]
async fn test_rate_limiter_keys_on_forwarded_headers() {
    // No ConnectInfo is attached here, so the limiter must be able to key
    // requests from proxy headers alone
    let h = harness();
    for header_name in ["x-forwarded-for", "x-real-ip"] {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .header(header_name, "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_submission_requires_authentication() {
    let h = harness();
    let payload = json!({
        "arrondissement_code": 11,
        "registered": 100,
        "voters": 80,
        "null_ballots": 2
    });
    let (status, body) = h
        .request("POST", "/participation/stations/111", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Authentication"));
}

#[tokio::test]
async fn test_scoped_operator_cannot_write_other_department() {
    let h = harness();
    // agent-7 only covers department 2
    h.deps
        .grants
        .insert_grant("agent-7", 2, AccessLevel::Edit)
        .await
        .unwrap();
    let token = h.token("agent-7", "operateur-departemental");

    let payload = json!({
        "arrondissement_code": 11,
        "registered": 100,
        "voters": 80,
        "null_ballots": 2
    });
    let (status, _) = h
        .request(
            "POST",
            "/participation/stations/111",
            Some(&token),
            Some(payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Station 211 is inside the covered department
    let own = json!({
        "arrondissement_code": 21,
        "registered": 100,
        "voters": 80,
        "null_ballots": 2
    });
    let (status, body) = h
        .request("POST", "/participation/stations/211", Some(&token), Some(own))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["station_code"], 211);
    // Response is enriched with the territorial ancestry
    assert_eq!(body["ancestry"][2]["libelle"], "Moungo");
}

#[tokio::test]
async fn test_correction_flow_changes_national_tally() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");

    for (station, arr, party, votes) in [(111, 11, "PDC", 40), (211, 21, "UNDP", 10)] {
        let (status, _) = h
            .request(
                "POST",
                &format!("/results/stations/{}", station),
                Some(&admin),
                Some(json!({
                    "arrondissement_code": arr,
                    "party": party,
                    "votes": votes
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = h
        .request(
            "GET",
            "/results/national?include_party_details=true",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_votes"], 50);
    assert_eq!(body["parties"][0]["party"], "PDC");
    assert_eq!(body["parties"][0]["votes"], 40);

    // Redress the PDC count at station 111: 40 -> 45
    let (status, correction) = h
        .request(
            "POST",
            "/corrections/votes/111",
            Some(&admin),
            Some(json!({
                "party": "PDC",
                "initial": { "kind": "votes", "votes": 40 },
                "corrected": { "kind": "votes", "votes": 45 },
                "reason": "recount after PV verification"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(correction["status"], "submitted");

    let (status, body) = h
        .request("GET", "/results/national", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_votes"], 55);
    // Party details were not requested
    assert!(body.get("parties").is_none());
}

#[tokio::test]
async fn test_review_and_filtered_tally() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");

    let (status, _) = h
        .request(
            "POST",
            "/results/stations/111",
            Some(&admin),
            Some(json!({ "arrondissement_code": 11, "party": "PDC", "votes": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, correction) = h
        .request(
            "POST",
            "/corrections/votes/111",
            Some(&admin),
            Some(json!({
                "party": "PDC",
                "initial": { "kind": "votes", "votes": 40 },
                "corrected": { "kind": "votes", "votes": 45 },
                "reason": "recount"
            })),
        )
        .await;
    let id = correction["id"].as_str().unwrap().to_string();

    // Only validated corrections count under the filter; none yet
    let (status, body) = h
        .request(
            "GET",
            "/results/national?validation_status=validated",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_votes"], 40);

    // Rejection without a reason is refused
    let (status, _) = h
        .request(
            "POST",
            &format!("/corrections/review/{}/reject", id),
            Some(&admin),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, reviewed) = h
        .request(
            "POST",
            &format!("/corrections/review/{}/validate", id),
            Some(&admin),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "validated");

    let (_, body) = h
        .request(
            "GET",
            "/results/national?validation_status=validated",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(body["total_votes"], 45);

    // The full history keeps the original submission
    let (status, history) = h
        .request(
            "GET",
            "/corrections/votes/111/history?party=PDC",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["initial"]["votes"], 40);
}

#[tokio::test]
async fn test_grant_administration_roundtrip() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");
    let operator = h.token("agent-7", "operateur-departemental");

    // Operators cannot manage grants
    let grant_payload = json!({ "user_id": "agent-7", "node_code": 1, "level": "edit" });
    let (status, _) = h
        .request(
            "POST",
            "/access/grants",
            Some(&operator),
            Some(grant_payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, grant) = h
        .request("POST", "/access/grants", Some(&admin), Some(grant_payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grant["active"], true);

    // The decision endpoint sees the new grant, downward inheritance included
    let (status, decision) = h
        .request(
            "GET",
            "/access/check?user_id=agent-7&node=111&level=edit",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["allowed"], true);

    // But never upward
    let (_, decision) = h
        .request(
            "GET",
            "/access/check?user_id=agent-7&node=100&level=read",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(decision["allowed"], false);

    let id = grant["id"].as_str().unwrap();
    let (status, deactivated) = h
        .request(
            "POST",
            &format!("/access/grants/{}/deactivate", id),
            Some(&admin),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["active"], false);

    let (_, decision) = h
        .request(
            "GET",
            "/access/check?user_id=agent-7&node=111&level=edit",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(decision["allowed"], false);
}

#[tokio::test]
async fn test_hierarchy_and_commission_routes() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");

    let (status, view) = h
        .request(
            "GET",
            "/territorial/hierarchy?node=1&depth=arrondissement",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<i64> = view["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["code"].as_i64().unwrap())
        .collect();
    assert_eq!(codes, vec![1, 11]);

    let (status, member) = h
        .request(
            "POST",
            "/commissions/1/members",
            Some(&admin),
            Some(json!({ "full_name": "A. Mbarga", "fonction": "president" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["commission"]["department_code"], 1);

    let (status, roster) = h
        .request("GET", "/commissions/1/members", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pv_upload_multipart() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");

    let boundary = "x-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"pv-111.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4 fake\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/documents/stations/111")
        .header("x-forwarded-for", "127.0.0.1")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["label"], "pv-111.pdf");
    assert_eq!(value["station_code"], 111);
    assert!(!value["content_hash"].as_str().unwrap().is_empty());

    let (status, listed) = h
        .request("GET", "/documents/stations/111", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_station_is_not_found() {
    let h = harness();
    let admin = h.token("admin-1", "administrateur");
    let (status, _) = h
        .request(
            "POST",
            "/results/stations/9999",
            Some(&admin),
            Some(json!({ "arrondissement_code": 11, "party": "PDC", "votes": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
