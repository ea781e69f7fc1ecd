//! HTTP-level integration tests for the `/variables` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json};
use serde_json::json;
use sqlx::PgPool;

fn new_variable(code: &str, scope: &str) -> serde_json::Value {
    json!({
        "code": code,
        "name": format!("Variable {code}"),
        "scope": scope,
        "is_required": true,
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_get_variable(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/variables",
        json!({
            "code": "EMPLOYEE_DNI",
            "name": "DNI del trabajador",
            "scope": "contract_template",
            "is_required": true,
            "validation": {
                "error_message": "El DNI debe tener 8 dígitos",
                "entries": [
                    { "method_id": 1, "execution_order": 1 },
                    { "method_id": 6, "value": "8", "execution_order": 2 }
                ]
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let id = json["data"]["variable"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["variable"]["scope"], "contract_template");
    assert_eq!(json["data"]["validation"]["entries"].as_array().unwrap().len(), 2);

    let app = build_test_app(pool);
    let response = get(app, &format!("/api/v1/variables/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["code"], "EMPLOYEE_DNI");
    assert_eq!(json["data"]["is_required"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_code_returns_409(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/variables", new_variable("RUC", "dynamic")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/variables", new_variable("RUC", "dynamic")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "A variable with code 'RUC' already exists");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_code_returns_400(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/variables",
        new_variable("employee dni", "dynamic"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_variable_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/variables/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Variable with id 999 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_by_scope(pool: PgPool) {
    for (code, scope) in [
        ("CONTRACT_START", "contract_template"),
        ("ADDENDUM_REASON", "addendum_template"),
        ("BANK_ACCOUNT", "dynamic"),
    ] {
        let app = build_test_app(pool.clone());
        let response = post_json(app, "/api/v1/variables", new_variable(code, scope)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let app = build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/variables").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let app = build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/variables?scope=addendum_template").await).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["code"], "ADDENDUM_REASON");

    let app = build_test_app(pool);
    let response = get(app, "/api/v1/variables?scope=payroll").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
