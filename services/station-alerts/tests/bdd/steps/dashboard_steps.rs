//! BDD step definitions for the web dashboard feature

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cucumber::{then, when};
use tower::ServiceExt;

use station_alerts::dashboard::{build_router, DashboardState};

use crate::world::AlertsWorld;

#[when(expr = "the dashboard page {string} is requested")]
async fn page_requested(world: &mut AlertsWorld, path: String) {
    let state = DashboardState::from_session(&world.mount().session);
    let response = build_router(state)
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.dashboard_response_body = Some(String::from_utf8(body.to_vec()).unwrap());
}

#[then(expr = "the response should contain {string}")]
fn response_contains(world: &mut AlertsWorld, needle: String) {
    let body = world
        .dashboard_response_body
        .as_ref()
        .expect("no dashboard response");
    assert!(body.contains(&needle), "response did not contain {:?}", needle);
}

#[then(expr = "the response should not contain {string}")]
fn response_not_contains(world: &mut AlertsWorld, needle: String) {
    let body = world
        .dashboard_response_body
        .as_ref()
        .expect("no dashboard response");
    assert!(!body.contains(&needle), "response contained {:?}", needle);
}
