//! End-to-end mapping tests
//!
//! Loads the mapping configurations under `tests/fixtures` and checks the
//! mapped output trees, the guards and the determinism of `map()`.

use std::path::PathBuf;

use datamapper::{
    ConfigLoader, Directive, DirectiveKind, DirectiveTable, DocumentTree, Error, Limits, Mapper,
    NamespaceTable, Operand, SchemaModel, SchemaNode, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn load_mapper(name: &str) -> Mapper {
    ConfigLoader::new().load_mapper(fixture(name)).unwrap()
}

fn load_input(name: &str) -> DocumentTree {
    let content = std::fs::read_to_string(fixture(name)).unwrap();
    DocumentTree::from_json_str(&content).unwrap()
}

#[test]
fn test_lead_conversion() {
    let mapper = load_mapper("lead_mapping.json");
    let output = mapper.map(&load_input("lead_input.json")).unwrap();

    assert_eq!(
        output.to_json(),
        json!({
            "soapenv_Header": {
                "urn_SessionHeader": {"urn_sessionId": "sess-1"}
            },
            "soapenv_Body": {
                "urn_convertLead": {
                    "urn_leadConverts": [
                        {"convertedStatus": "true", "leadId": "00Q1", "opportunityName": "Acme Co"}
                    ],
                    "urn_sendNotificationEmail": true,
                    "urn_overwriteLeadSource": false
                }
            }
        })
    );

    let body = output.root().get("soapenv_Body").unwrap();
    let flags = body.get("urn_convertLead").unwrap();
    assert_eq!(flags.get("urn_sendNotificationEmail"), Some(&Value::Bool(true)));
    assert_eq!(flags.get("urn_overwriteLeadSource"), Some(&Value::Bool(false)));
}

#[test]
fn test_lead_conversion_key_order_follows_output_schema() {
    let mapper = load_mapper("lead_mapping.json");
    let output = mapper.map(&load_input("lead_input.json")).unwrap();
    let text = output.to_json_string(false).unwrap();

    let header = text.find("soapenv_Header").unwrap();
    let body = text.find("soapenv_Body").unwrap();
    let converted = text.find("convertedStatus").unwrap();
    let lead_id = text.find("leadId").unwrap();
    assert!(header < body);
    assert!(converted < lead_id);
}

#[test]
fn test_lead_conversion_optional_output_field() {
    let mapper = load_mapper("lead_mapping.json");
    let input = DocumentTree::from_json(json!({
        "lead": [{"ID": "00Q1"}, {"ID": "00Q2", "name": "Initech"}],
        "sendNotificationEmail": "TRUE",
        "overwriteLeadSource": "no",
        "sessionId": "sess-2"
    }));

    // `name` is required in the input schema
    let err = mapper.map(&input).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
    assert_eq!(err.diagnostic().unwrap().path_string(), "/convertLeads/lead/0/name");

    let output = mapper.with_input_validation(false).map(&input).unwrap();
    let converts = &output.to_json()["soapenv_Body"]["urn_convertLead"]["urn_leadConverts"];
    assert_eq!(
        converts,
        &json!([
            {"convertedStatus": "true", "leadId": "00Q1"},
            {"convertedStatus": "true", "leadId": "00Q2", "opportunityName": "Initech"}
        ])
    );
}

#[test]
fn test_employee_to_engineer() {
    let mapper = load_mapper("employee_mapping.json");
    let output = mapper.map(&load_input("employee_input.json")).unwrap();

    assert_eq!(
        output.to_json(),
        json!({
            "engineer": [{
                "fullname": "John Doe",
                "address": [
                    {"attr_location": "HOME", "city": {"name": "Colombo", "postalcode": 10100}},
                    {"attr_location": "WORK", "city": {"name": "Kandy", "postalcode": 20000}}
                ]
            }]
        })
    );
}

#[test]
fn test_employee_wrong_attribute_type_rejected() {
    let mapper = load_mapper("employee_mapping.json");
    let input = DocumentTree::from_json(json!({
        "emp_employee": [{
            "firstname": "John",
            "lastname": "Doe",
            "address": [{"attr_location": "home", "city": {"attr_postalcode": "10100", "_ELEMVAL": "Colombo"}}]
        }]
    }));

    let err = mapper.map(&input).unwrap_err();
    let diag = err.diagnostic().unwrap();
    assert!(matches!(err, Error::SchemaViolation(_)));
    assert_eq!(diag.path_string(), "/employees/emp:employee/0/address/0/city/@postalcode");
    assert_eq!(diag.expected.as_deref(), Some("number"));
}

#[test]
fn test_employee_error_path_without_input_validation() {
    let mapper = load_mapper("employee_mapping.json").with_input_validation(false);
    let input = DocumentTree::from_json(json!({
        "emp_employee": [{
            "firstname": "John",
            "lastname": "Doe",
            "address": [{"attr_location": "home", "city": {"attr_postalcode": 10100}}]
        }]
    }));

    let err = mapper.map(&input).unwrap_err();
    let diag = err.diagnostic().unwrap();
    assert!(diag.message.starts_with("required field is missing"));
    assert_eq!(diag.path_string(), "/engineers/engineer/0/address/0/city/name");
    assert_eq!(diag.directive, Some(DirectiveKind::Copy));
}

#[test]
fn test_unqualified_namespaced_key_is_absent() {
    let mapper = load_mapper("employee_mapping.json").with_input_validation(false);
    let input = DocumentTree::from_json(json!({"employee": []}));

    let err = mapper.map(&input).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
    assert_eq!(err.diagnostic().unwrap().path_string(), "/engineers/engineer");
}

#[test]
fn test_empty_list_maps_to_empty_list() {
    let mapper = load_mapper("employee_mapping.json");
    let output = mapper.map(&DocumentTree::from_json(json!({"emp_employee": []}))).unwrap();
    assert_eq!(output.to_json(), json!({"engineer": []}));
}

#[test]
fn test_map_is_deterministic() {
    let mapper = load_mapper("lead_mapping.json");
    let input = load_input("lead_input.json");

    let first = mapper.map(&input).unwrap().to_json_string(false).unwrap();
    let second = mapper.map(&input).unwrap().to_json_string(false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_mapping() {
    let mapper = load_mapper("employee_mapping.json");
    let input = load_input("employee_input.json");
    let expected = mapper.map(&input).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| mapper.map(&input).unwrap())).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_over_deep_input_rejected() {
    let mapper = load_mapper("lead_mapping.json");

    let mut nested = json!("leaf");
    for _ in 0..300 {
        nested = json!({ "x": nested });
    }
    let input = DocumentTree::from_json(json!({"lead": [], "deep": nested}));

    let err = mapper.map(&input).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded(_)));
}

#[test]
fn test_array_size_guard() {
    let limits = Limits {
        max_array_len: 2,
        ..Limits::default()
    };
    let mapper = load_mapper("employee_mapping.json").with_limits(limits).unwrap();
    let address = json!({"attr_location": "home", "city": {"attr_postalcode": 1, "_ELEMVAL": "X"}});
    let input = DocumentTree::from_json(json!({
        "emp_employee": [{
            "firstname": "A",
            "lastname": "B",
            "address": [address.clone(), address.clone(), address]
        }]
    }));

    let err = mapper.map(&input).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded(_)));
    assert_eq!(err.diagnostic().unwrap().path_string(), "/engineers/engineer/0/address");
}

#[test]
fn test_fan_out_depth_guard() {
    let limits = Limits {
        max_fanout_depth: 1,
        ..Limits::default()
    };
    let err = load_mapper("employee_mapping.json").with_limits(limits).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded(_)));
}

fn list_schemas() -> (SchemaModel, SchemaModel) {
    let input = SchemaModel::new(
        SchemaNode::object(
            "in",
            vec![SchemaNode::array("item", vec![SchemaNode::scalar("flag"), SchemaNode::scalar("n")])],
        ),
        NamespaceTable::new(),
    )
    .unwrap();
    let output = SchemaModel::new(
        SchemaNode::object(
            "out",
            vec![SchemaNode::array(
                "entry",
                vec![SchemaNode::scalar("flag"), SchemaNode::scalar("n")],
            )
            .in_namespace("o")],
        ),
        NamespaceTable::new().with_prefix("o", "urn:out"),
    )
    .unwrap();
    (input, output)
}

fn list_mapper() -> Mapper {
    let (input, output) = list_schemas();
    let table = DirectiveTable::new().with(
        "entry",
        Directive::fan_out(
            "item".parse().unwrap(),
            DirectiveTable::new()
                .with("flag", Directive::operator("toBoolean", vec![Operand::path("flag".parse().unwrap())]))
                .with("n", Directive::copy("n".parse().unwrap())),
        ),
    );
    Mapper::new(input, output, table).unwrap()
}

proptest! {
    #[test]
    fn prop_fan_out_preserves_cardinality(flags in prop::collection::vec(".{0,8}", 0..40)) {
        let items: Vec<_> = flags
            .iter()
            .enumerate()
            .map(|(i, f)| json!({"flag": f, "n": i}))
            .collect();
        let input = DocumentTree::from_json(json!({ "item": items }));
        let output = list_mapper().map(&input).unwrap();

        let entries = output.root().get("o_entry").unwrap().as_array().unwrap();
        prop_assert_eq!(entries.len(), flags.len());
        for (i, (entry, flag)) in entries.iter().zip(&flags).enumerate() {
            prop_assert_eq!(entry.get("n"), Some(&Value::Number(i as f64)));
            let expected = flag.trim().eq_ignore_ascii_case("true");
            prop_assert_eq!(entry.get("flag"), Some(&Value::Bool(expected)));
        }
    }
}
