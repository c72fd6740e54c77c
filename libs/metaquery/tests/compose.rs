//! End-to-end composition of criteria trees into statements.

use metaquery::{compose, BindValue, Dialect, Error, QueryBuilder};
use serde_json::json;

mod support;

use support::{node, NESTED_SAMPLE_STATEMENT};

#[test]
fn composes_nested_sample_criteria() {
    let query = compose(&node(support::nested_sample_criteria())).unwrap();
    assert_eq!(query.statement, NESTED_SAMPLE_STATEMENT);
    assert_eq!(query.parameters.len(), 14);
    assert_eq!(
        query.parameters,
        vec![
            BindValue::Integer(4),
            BindValue::Integer(1),
            BindValue::from("quantity"),
            BindValue::from("1.0"),
            BindValue::from(r#"{"quantity":{"unit":"μg"}}"#),
            BindValue::Integer(6),
            BindValue::from(r#"{"platform":{"value":"Agilent"}}"#),
            BindValue::from(r#"{"array":{"value":"4x180K"}}"#),
            BindValue::Integer(7),
            BindValue::from(r#"{"genome":{"value":"hg19"}}"#),
            BindValue::Integer(8),
            BindValue::from(r#"{"chr":{"value":"chr11"}}"#),
            BindValue::from(r#"{"chr":{"value":"chr17"}}"#),
            BindValue::from(r#"{"is_amplification":{"value":true}}"#),
        ]
    );
}

#[test]
fn composes_empty_sample_criteria() {
    let query = compose(&node(support::empty_sample_criteria())).unwrap();
    assert_eq!(
        query.statement,
        "WITH bb AS (SELECT id, biobank_id, acronym, name FROM biobank) \
         SELECT DISTINCT d.id, d.biobank, d.biobank_code, bb.acronym AS biobank_acronym, d.metadata FROM sample d \
         LEFT JOIN bb ON bb.id = d.biobank \
         WHERE d.type = $1;"
    );
    assert_eq!(query.parameters, vec![BindValue::Integer(2)]);
}

#[test]
fn composes_flat_star_criteria() {
    let query = compose(&node(support::star_criteria())).unwrap();
    assert_eq!(
        query.statement,
        "SELECT DISTINCT d.id, d.metadata FROM data d WHERE d.type = $1 AND (\
         (d.metadata @> $2) AND \
         (d.metadata @> $3 OR d.metadata @> $4 OR d.metadata @> $5) AND \
         ((d.metadata->$6->>'value')::float >= $7 AND d.metadata @> $8) AND \
         ((d.metadata->$9->>'value')::integer > $10 AND d.metadata @> $11));"
    );
    assert_eq!(query.parameters.len(), 11);
    assert_eq!(
        query.parameters[1],
        BindValue::from(r#"{"constellation":{"value":"cepheus"}}"#)
    );
    assert!(query.is_aligned());
}

#[test]
fn json_dialect_uses_accessors_throughout() {
    let query = QueryBuilder::new(Dialect::Json)
        .compose_json(&support::star_criteria())
        .unwrap();
    assert_eq!(
        query.statement,
        "SELECT DISTINCT d.id, d.metadata FROM data d WHERE d.type = $1 AND (\
         ((d.metadata->$2->>'value')::text = $3) AND \
         ((d.metadata->$4->>'value')::text IN ($5,$6,$7)) AND \
         ((d.metadata->$8->>'value')::float >= $9 AND (d.metadata->$8->>'unit')::text LIKE $10) AND \
         ((d.metadata->$11->>'value')::integer > $12 AND (d.metadata->$11->>'unit')::text LIKE $13));"
    );
    assert_eq!(query.parameters.len(), 13);
    assert!(query.is_aligned());
}

#[test]
fn four_levels_yield_three_nested_ctes_in_ancestor_order() {
    let builder = QueryBuilder::default();
    let plan = builder.plan(&node(support::chain(4))).unwrap();
    assert_eq!(plan.cte_aliases(), ["nested_1", "nested_2", "nested_3"]);
    let joins: Vec<_> = plan.ctes.iter().map(|c| c.join_clause.as_str()).collect();
    assert_eq!(
        joins,
        [
            "INNER JOIN nested_1 ON nested_1.parent_subject = d.id",
            "INNER JOIN nested_2 ON nested_2.parent_sample = nested_1.id",
            "INNER JOIN nested_3 ON nested_3.parent_data = nested_2.id",
        ]
    );
    let query = plan.into_composed();
    assert_eq!(query.parameters.len(), 4);
    assert!(query.is_aligned());
}

#[test]
fn identical_inputs_compose_identically() {
    let first = compose(&node(support::nested_sample_criteria())).unwrap();
    let second = compose(&node(support::nested_sample_criteria())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn boolean_criteria_accept_strings_and_natives() {
    let natives = compose(&node(json!({"dataType": 1, "content": [
        {"comparator": "=", "fieldName": "is_neutron_star", "fieldType": "boolean", "fieldValue": true},
        {"comparator": "=", "fieldName": "is_black_hole", "fieldType": "boolean", "fieldValue": false}
    ]})))
    .unwrap();
    let strings = compose(&node(json!({"dataType": 1, "content": [
        {"comparator": "=", "fieldName": "is_neutron_star", "fieldType": "boolean", "fieldValue": "true"},
        {"comparator": "=", "fieldName": "is_black_hole", "fieldType": "boolean", "fieldValue": "false"}
    ]})))
    .unwrap();
    assert_eq!(natives, strings);
    assert_eq!(
        natives.parameters[2],
        BindValue::from(r#"{"is_black_hole":{"value":false}}"#)
    );
}

#[test]
fn loop_equality_checks_values_array() {
    let query = compose(&node(support::gene_loop_criteria("=", json!("Corf44")))).unwrap();
    assert_eq!(
        query.statement,
        "SELECT DISTINCT d.id, d.metadata FROM data d WHERE d.type = $1 AND (((d.metadata->$2->'values' ? $3)));"
    );
    assert_eq!(
        query.parameters,
        vec![
            BindValue::Integer(7),
            BindValue::from("gene_name"),
            BindValue::from("Corf44")
        ]
    );
}

#[test]
fn loop_all_of_binds_text_array() {
    let genes = json!(["MYCN", "ALK", "CD44"]);
    let query = compose(&node(support::gene_loop_criteria("?&", genes))).unwrap();
    assert!(query
        .statement
        .ends_with("WHERE d.type = $1 AND (((d.metadata->$2->'values' ?& $3)));"));
    assert_eq!(
        query.parameters[2],
        BindValue::TextArray(vec!["MYCN".into(), "ALK".into(), "CD44".into()])
    );
}

#[test]
fn loops_are_rejected_by_json_dialect() {
    let err = QueryBuilder::new(Dialect::Json)
        .compose_json(&support::gene_loop_criteria("=", json!("ALK")))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedCriterion { .. }));
}

#[test]
fn subject_with_personal_details_and_nested_sample() {
    let query = compose(&node(json!({
        "dataType": 3,
        "model": "Subject",
        "wantsPersonalInfo": true,
        "junction": "OR",
        "content": [
            {"personalDetails": true, "surname": "Rossi", "givenName": "Mario"},
            {"specializedQuery": "Subject", "code": "PAT-01", "codeComparator": "LIKE"},
            {"dataType": 4, "model": "Sample", "content": [
                {"specializedQuery": "Sample", "biobankCode": ["BB-1", "BB-2"]}
            ]}
        ]
    })))
    .unwrap();
    assert_eq!(
        query.statement,
        "WITH pd AS (SELECT id, given_name, surname, birth_date FROM personal_details), \
         nested_1 AS (SELECT id, biobank_code, parent_subject, parent_sample FROM sample \
         WHERE type = $5 AND ((biobank_code IN ($6,$7)))) \
         SELECT DISTINCT d.id, d.code, d.sex, pd.given_name, pd.surname, pd.birth_date, d.metadata \
         FROM subject d LEFT JOIN pd ON pd.id = d.personal_info \
         INNER JOIN nested_1 ON nested_1.parent_subject = d.id \
         WHERE d.type = $1 AND ((pd.given_name = $2 AND pd.surname = $3) OR (d.code LIKE $4));"
    );
    assert_eq!(query.parameters.len(), 7);
    assert_eq!(query.parameters[1], BindValue::from("MARIO"));
    assert_eq!(query.parameters[2], BindValue::from("ROSSI"));
}

#[test]
fn injection_anywhere_aborts_composition() {
    let err = compose(&node(json!({
        "dataType": 1,
        "content": [
            {"fieldName": "ok", "comparator": "=", "fieldValue": "x"},
            {"dataType": 2, "content": [
                {"fieldName": "mass", "comparator": ">= 0 OR 1=1; --", "fieldValue": "1"}
            ]}
        ]
    })))
    .unwrap_err();
    assert_eq!(
        err,
        Error::InjectionRejected {
            comparator: ">= 0 OR 1=1; --".into()
        }
    );
}

#[test]
fn unknown_model_is_rejected_while_decoding() {
    let err = QueryBuilder::default()
        .compose_json(&json!({"dataType": 1, "model": "Planet"}))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(msg) if msg.contains("Planet")));
}

#[test]
fn repeated_personal_details_blocks_declare_pd_once() {
    let query = compose(&node(json!({
        "dataType": 3,
        "model": "Subject",
        "wantsPersonalInfo": true,
        "content": [
            {"personalDetails": true, "surname": "Rossi"},
            {"personalDetails": true, "givenName": "Mario"}
        ]
    })))
    .unwrap();
    assert_eq!(query.statement.matches("pd AS (").count(), 1);
    assert_eq!(query.statement.matches("LEFT JOIN pd ").count(), 1);
    assert!(query
        .statement
        .ends_with("WHERE d.type = $1 AND ((pd.surname = $2) AND (pd.given_name = $3));"));
    assert!(query.is_aligned());
}

#[test]
fn list_comparators_on_single_values_fail_in_both_dialects() {
    for op in ["IN", "NOT IN", "?&", "?|"] {
        let criteria = node(json!({
            "dataType": 1,
            "model": "Data",
            "content": [
                {"fieldName": "type", "fieldType": "text", "comparator": op, "fieldValue": "giant"}
            ]
        }));
        for dialect in [Dialect::Jsonb, Dialect::Json] {
            let err = QueryBuilder::new(dialect).compose(&criteria).unwrap_err();
            assert!(
                matches!(err, Error::MalformedCriterion { .. }),
                "{op} under {dialect}: {err}"
            );
        }
    }
}
