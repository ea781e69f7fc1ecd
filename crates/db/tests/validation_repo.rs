//! Integration tests for the rule chain repositories.

use planilla_core::validation::chain::{ChainEntryRecord, ValidationRecord};
use planilla_core::validation::methods::{MethodType, ValidationMethod};
use planilla_core::variable::{VariableDraft, VariableScope};
use planilla_db::repositories::{ValidationMethodRepo, VariableRepo, VariableValidationRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn draft(code: &str, scope: VariableScope) -> VariableDraft {
    VariableDraft {
        code: code.to_string(),
        name: format!("Variable {code}"),
        default_value: None,
        is_required: true,
        scope,
    }
}

fn entry(method_id: i64, value: Option<&str>, execution_order: i32) -> ChainEntryRecord {
    ChainEntryRecord {
        method_id,
        value: value.map(str::to_string),
        execution_order,
    }
}

fn dni_record() -> ValidationRecord {
    ValidationRecord {
        error_message: "El DNI debe tener 8 dígitos".to_string(),
        entries: vec![entry(1, None, 1), entry(6, Some("8"), 2)],
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_catalog_is_ordered_and_known(pool: PgPool) {
    let methods: Vec<ValidationMethod> = ValidationMethodRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(ValidationMethod::from)
        .collect();

    let ids: Vec<i64> = methods.iter().map(|m| m.id).collect();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());
    assert_eq!(methods[0].method_type, MethodType::NumbersOnly);
    assert_eq!(methods[6].method_type, MethodType::LengthRange);
    assert!(methods[6].requires_value);
    assert!(!methods[4].requires_value);
    assert!(methods
        .iter()
        .all(|m| !matches!(m.method_type, MethodType::Unsupported(_))));
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_variable_with_chain(pool: PgPool) {
    let row = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("EMPLOYEE_DNI", VariableScope::ContractTemplate),
        &dni_record(),
    )
    .await
    .unwrap();
    assert_eq!(row.code, "EMPLOYEE_DNI");
    assert_eq!(row.scope, "contract_template");

    let stored = VariableValidationRepo::find_record(&pool, row.id)
        .await
        .unwrap()
        .expect("chain should be stored");
    assert_eq!(stored, dni_record());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_variable_with_empty_chain(pool: PgPool) {
    let row = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("FREE_TEXT", VariableScope::Dynamic),
        &ValidationRecord::default(),
    )
    .await
    .unwrap();

    let stored = VariableValidationRepo::find_record(&pool, row.id).await.unwrap();
    assert_eq!(stored, Some(ValidationRecord::default()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_code_rejected(pool: PgPool) {
    let d = draft("EMPLOYEE_DNI", VariableScope::ContractTemplate);
    VariableValidationRepo::create_variable_with_validation(&pool, &d, &dni_record())
        .await
        .unwrap();

    let err = VariableValidationRepo::create_variable_with_validation(&pool, &d, &dni_record())
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_variables_code"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_create_leaves_nothing_behind(pool: PgPool) {
    let record = ValidationRecord {
        error_message: String::new(),
        entries: vec![entry(999, None, 1)],
    };
    let result = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("ORPHAN", VariableScope::Dynamic),
        &record,
    )
    .await;
    assert!(result.is_err(), "unknown method id must violate the foreign key");

    let all = VariableRepo::list(&pool, None).await.unwrap();
    assert!(all.is_empty(), "variable insert must roll back");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_scope(pool: PgPool) {
    for (code, scope) in [
        ("CONTRACT_START", VariableScope::ContractTemplate),
        ("ADDENDUM_REASON", VariableScope::AddendumTemplate),
        ("BANK_ACCOUNT", VariableScope::Dynamic),
        ("ACCOUNT_HOLDER", VariableScope::Dynamic),
    ] {
        VariableValidationRepo::create_variable_with_validation(
            &pool,
            &draft(code, scope),
            &ValidationRecord::default(),
        )
        .await
        .unwrap();
    }

    let all = VariableRepo::list(&pool, None).await.unwrap();
    assert_eq!(all.len(), 4);

    let dynamic = VariableRepo::list(&pool, Some("dynamic")).await.unwrap();
    let codes: Vec<&str> = dynamic.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, vec!["ACCOUNT_HOLDER", "BANK_ACCOUNT"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_and_exists(pool: PgPool) {
    let row = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("RUC", VariableScope::Dynamic),
        &ValidationRecord::default(),
    )
    .await
    .unwrap();

    let found = VariableRepo::find_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(found.code, "RUC");
    assert!(VariableRepo::exists(&pool, row.id).await.unwrap());
    assert!(!VariableRepo::exists(&pool, row.id + 1000).await.unwrap());
    assert!(VariableRepo::find_by_id(&pool, row.id + 1000).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Replace
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_swaps_entire_chain(pool: PgPool) {
    let row = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("EMPLOYEE_DNI", VariableScope::ContractTemplate),
        &dni_record(),
    )
    .await
    .unwrap();

    let replacement = ValidationRecord {
        error_message: "Entre 3 y 10 letras".to_string(),
        entries: vec![entry(2, None, 1), entry(7, Some("3,10"), 2), entry(5, None, 3)],
    };
    let header = VariableValidationRepo::replace(&pool, row.id, &replacement)
        .await
        .unwrap()
        .expect("variable exists");
    assert_eq!(header.variable_id, row.id);

    let stored = VariableValidationRepo::find_record(&pool, row.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, replacement);

    let entries = VariableValidationRepo::list_entries(&pool, header.id).await.unwrap();
    assert_eq!(entries.len(), 3, "old entries must be removed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_missing_variable_returns_none(pool: PgPool) {
    let result = VariableValidationRepo::replace(&pool, 4242, &dni_record())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_replace_keeps_previous_chain(pool: PgPool) {
    let row = VariableValidationRepo::create_variable_with_validation(
        &pool,
        &draft("EMPLOYEE_DNI", VariableScope::ContractTemplate),
        &dni_record(),
    )
    .await
    .unwrap();

    let broken = ValidationRecord {
        error_message: "changed".to_string(),
        entries: vec![entry(1, None, 1), entry(999, None, 2)],
    };
    assert!(VariableValidationRepo::replace(&pool, row.id, &broken).await.is_err());

    let stored = VariableValidationRepo::find_record(&pool, row.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, dni_record());
}
