//! Builds the employee-to-engineer mapping in code and maps one document.
//!
//! Run with `cargo run --example employee_to_engineer`.

use datamapper::{
    Directive, DirectiveTable, DocumentTree, Mapper, NamespaceTable, Operand, Path, ScalarType, SchemaModel,
    SchemaNode,
};
use serde_json::json;

fn path(text: &str) -> datamapper::Result<Path> {
    text.parse()
}

fn main() -> datamapper::Result<()> {
    let input = SchemaModel::new(
        SchemaNode::object(
            "employees",
            vec![SchemaNode::array(
                "employee",
                vec![
                    SchemaNode::scalar("firstname"),
                    SchemaNode::scalar("lastname"),
                    SchemaNode::array(
                        "address",
                        vec![
                            SchemaNode::scalar("location").attribute(),
                            SchemaNode::object(
                                "city",
                                vec![SchemaNode::scalar("postalcode").attribute().typed(ScalarType::Number)],
                            )
                            .mixed(),
                        ],
                    ),
                ],
            )
            .in_namespace("emp")],
        ),
        NamespaceTable::new().with_prefix("emp", "http://wso2.org/employee"),
    )?;

    let output = SchemaModel::new(
        SchemaNode::object(
            "engineers",
            vec![SchemaNode::array(
                "engineer",
                vec![
                    SchemaNode::scalar("fullname"),
                    SchemaNode::array(
                        "address",
                        vec![
                            SchemaNode::scalar("location").attribute(),
                            SchemaNode::object(
                                "city",
                                vec![SchemaNode::scalar("name"), SchemaNode::scalar("postalcode")],
                            ),
                        ],
                    ),
                ],
            )],
        ),
        NamespaceTable::new(),
    )?;

    let address = DirectiveTable::new()
        .with(
            "@location",
            Directive::operator("toUppercase", vec![Operand::path(path("@location")?)]),
        )
        .with(
            "city",
            Directive::object_at(
                path("city")?,
                DirectiveTable::new()
                    .with("name", Directive::copy(path("$")?))
                    .with("postalcode", Directive::copy(path("@postalcode")?)),
            ),
        );

    let engineer = DirectiveTable::new()
        .with(
            "fullname",
            Directive::operator(
                "concat",
                vec![
                    Operand::path(path("firstname")?),
                    Operand::literal(" "),
                    Operand::path(path("lastname")?),
                ],
            ),
        )
        .with("address", Directive::fan_out(path("address")?, address));

    let directives = DirectiveTable::new().with("engineer", Directive::fan_out(path("emp:employee")?, engineer));
    let mapper = Mapper::new(input, output, directives)?;

    let document = DocumentTree::from_json(json!({
        "emp_employee": [{
            "firstname": "John",
            "lastname": "Doe",
            "address": [
                {"attr_location": "home", "city": {"attr_postalcode": 10100, "_ELEMVAL": "Colombo"}},
                {"attr_location": "work", "city": {"attr_postalcode": 20000, "_ELEMVAL": "Kandy"}}
            ]
        }]
    }));

    println!("{}", mapper.map(&document)?.to_json_string(true)?);
    Ok(())
}
