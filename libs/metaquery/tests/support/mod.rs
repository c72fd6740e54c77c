#![allow(dead_code)]

use metaquery::EntityNode;
use serde_json::{json, Value};

pub fn node(value: Value) -> EntityNode {
    EntityNode::from_value(value).expect("fixture should decode")
}

/// Stellar catalogue criteria covering equality, lists, ranges and units.
pub fn star_criteria() -> Value {
    json!({
        "dataType": 1,
        "model": "Data",
        "content": [
            {"fieldName": "constellation", "fieldType": "text", "comparator": "=", "fieldValue": "cepheus", "isList": false},
            {"fieldName": "type", "fieldType": "text", "comparator": "IN",
             "fieldValue": ["hypergiant", "supergiant", "main-sequence star"], "isList": true},
            {"fieldName": "mass", "fieldType": "float", "comparator": ">=", "fieldValue": "1.5", "fieldUnit": "M☉"},
            {"comparator": ">", "fieldName": "distance", "fieldType": "integer", "fieldUnit": "pc", "fieldValue": "50"}
        ]
    })
}

/// Sample root with subject enrichment and three levels of nested data.
pub fn nested_sample_criteria() -> Value {
    json!({
        "dataType": 4,
        "model": "Sample",
        "wantsSubject": true,
        "wantsPersonalInfo": true,
        "content": [
            {"specializedQuery": "Sample", "biobank": 1, "biobankComparator": "="},
            {"fieldName": "quantity", "fieldType": "float", "isList": false, "comparator": ">=", "fieldValue": "1.0", "fieldUnit": "μg"},
            {"dataType": 6, "model": "Data", "content": [
                {"fieldName": "platform", "fieldType": "text", "isList": true, "comparator": "IN", "fieldValue": ["Agilent"]},
                {"fieldName": "array", "fieldType": "text", "isList": true, "comparator": "IN", "fieldValue": ["4x180K"]},
                {"dataType": 7, "model": "Data", "content": [
                    {"fieldName": "genome", "fieldType": "text", "isList": true, "comparator": "IN", "fieldValue": ["hg19"]},
                    {"dataType": 8, "model": "Data", "content": [
                        {"fieldName": "chr", "fieldType": "text", "isList": true, "comparator": "IN", "fieldValue": ["chr11", "chr17"]},
                        {"fieldName": "is_amplification", "fieldType": "boolean", "isList": false, "comparator": "=", "fieldValue": "true"}
                    ]}
                ]}
            ]}
        ]
    })
}

pub const NESTED_SAMPLE_STATEMENT: &str = concat!(
    "WITH s AS (SELECT id, code, sex, personal_info FROM subject), ",
    "pd AS (SELECT id, given_name, surname, birth_date FROM personal_details), ",
    "bb AS (SELECT id, biobank_id, acronym, name FROM biobank), ",
    "nested_1 AS (SELECT id, parent_subject, parent_sample, parent_data FROM data ",
    "WHERE type = $6 AND ((metadata @> $7) AND (metadata @> $8))), ",
    "nested_2 AS (SELECT id, parent_subject, parent_sample, parent_data FROM data WHERE type = $9 AND ((metadata @> $10))), ",
    "nested_3 AS (SELECT id, parent_subject, parent_sample, parent_data FROM data ",
    "WHERE type = $11 AND ((metadata @> $12 OR metadata @> $13) AND (metadata @> $14))) ",
    "SELECT DISTINCT d.id, d.biobank, d.biobank_code, s.code, s.sex, pd.given_name, pd.surname, pd.birth_date, ",
    "bb.acronym AS biobank_acronym, d.metadata FROM sample d ",
    "LEFT JOIN s ON s.id = d.parent_subject ",
    "LEFT JOIN pd ON pd.id = s.personal_info ",
    "LEFT JOIN bb ON bb.id = d.biobank ",
    "INNER JOIN nested_1 ON nested_1.parent_sample = d.id ",
    "INNER JOIN nested_2 ON nested_2.parent_data = nested_1.id ",
    "INNER JOIN nested_3 ON nested_3.parent_data = nested_2.id ",
    "WHERE d.type = $1 AND ((d.biobank = $2) AND ((d.metadata->$3->>'value')::float >= $4 AND d.metadata @> $5));"
);

/// Sample root whose content carries nothing usable.
pub fn empty_sample_criteria() -> Value {
    json!({
        "dataType": 2,
        "model": "Sample",
        "content": [{"specializedQuery": "Sample"}, {}]
    })
}

/// Gene panel stored in a repeatable metadata block.
pub fn gene_loop_criteria(comparator: &str, value: Value) -> Value {
    json!({
        "dataType": 7,
        "content": [{
            "comparator": comparator,
            "fieldName": "gene_name",
            "fieldType": "text",
            "fieldValue": value,
            "isList": value.is_array(),
            "isInLoop": true
        }]
    })
}

/// A chain of `depth` entity nodes (root included), each one level deeper.
pub fn chain(depth: usize) -> Value {
    let classes = ["Subject", "Sample", "Data"];
    let mut current: Option<Value> = None;
    for level in (0..depth).rev() {
        let model = classes[level.min(classes.len() - 1)];
        let content = match current.take() {
            Some(child) => vec![child],
            None => vec![],
        };
        current = Some(json!({
            "dataType": level + 1,
            "model": model,
            "content": content
        }));
    }
    current.unwrap_or_else(|| json!({"dataType": 1}))
}
