//! End-to-end queries against a fixture inventory.

use invql_core::{
    host_registry, host_scope, Conjunction, Inventory, PostTransform, PreTransform, QueryResult,
    Scope, ScopeOptions, Value, HOSTS_TABLE,
};
use invql_lang::{parse, parse_and_compile, run, ConditionExpr, ErrorKind};
use pretty_assertions::assert_eq;

const FIXTURE: &str = r#"{
    "tables": {
        "architectures": [
            {"id": 1, "name": "x86_64"},
            {"id": 2, "name": "aarch64"}
        ],
        "systems": [
            {"id": 1, "name": "SLES 15"}
        ],
        "users": [
            {"id": 1, "username": "alice", "email": "alice@example.com"}
        ],
        "enclosures": [
            {"id": 1, "name": "rack-a", "location_room": "Lab 1", "platform": "blade"}
        ],
        "hosts": [
            {"id": 1, "fqdn": "a.test", "cpu_model": "Intel(R) Xeon(R) Gold 6130",
             "cpu_physical": 2, "ram_amount": 65536, "efi": true, "active": true,
             "administrative": false, "comment": "GPU box", "architecture": 1,
             "system": 1, "enclosure": 1, "reserved_by": 1,
             "reserved_until": "9999-12-31T23:59:59.999999"},
            {"id": 2, "fqdn": "b.test", "cpu_model": "AMD EPYC 7402",
             "cpu_physical": 1, "ram_amount": 32768, "efi": false, "active": true,
             "administrative": false, "comment": "", "architecture": 2,
             "system": 1, "reserved_until": null},
            {"id": 3, "fqdn": "c.test", "cpu_model": "Intel(R) Core(TM) i7",
             "cpu_physical": 1, "efi": true, "active": false,
             "administrative": false, "comment": "spare", "architecture": 1,
             "system": 1},
            {"id": 4, "fqdn": "admin.test", "cpu_model": "Intel(R) Xeon(R)",
             "cpu_physical": 4, "efi": true, "active": true,
             "administrative": true, "comment": "", "architecture": 1,
             "system": 1}
        ],
        "network_interfaces": [
            {"id": 10, "host": 1, "mac_address": "52:54:00:00:00:01",
             "ipv4_address": "10.0.0.1", "primary": true},
            {"id": 11, "host": 1, "mac_address": "52:54:00:00:00:02"}
        ]
    }
}"#;

fn inventory() -> Inventory {
    Inventory::from_json(FIXTURE).unwrap()
}

fn query(source: &str) -> QueryResult {
    let inventory = inventory();
    let scope = host_scope(&inventory, ScopeOptions::default());
    run(source, host_registry(), &scope).unwrap()
}

fn query_err(source: &str) -> ErrorKind {
    let inventory = inventory();
    let scope = host_scope(&inventory, ScopeOptions::default());
    run(source, host_registry(), &scope).unwrap_err().kind()
}

fn column(result: &QueryResult, token: &str) -> Vec<Value> {
    let pos = result.columns().position(|c| c == token).unwrap();
    result.rows.iter().map(|row| row[pos].1.clone()).collect()
}

fn fqdns(result: &QueryResult) -> Vec<String> {
    column(result, "fqdn").iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_field_list_returns_whole_scope() {
    let result = query("fqdn, cpu_physical");
    assert_eq!(
        result.header,
        vec![
            ("fqdn".to_string(), "Fqdn".to_string()),
            ("cpu_physical".to_string(), "Cpu physical".to_string()),
        ]
    );
    assert_eq!(
        result.rows,
        vec![
            vec![
                ("fqdn".to_string(), Value::from("a.test")),
                ("cpu_physical".to_string(), Value::Int(2)),
            ],
            vec![
                ("fqdn".to_string(), Value::from("b.test")),
                ("cpu_physical".to_string(), Value::Int(1)),
            ],
        ]
    );
}

#[test]
fn test_scope_order_and_widening() {
    let inventory = inventory();
    let scope = Scope::all(&inventory, HOSTS_TABLE);
    let result = run("fqdn", host_registry(), &scope).unwrap();
    assert_eq!(fqdns(&result), vec!["a.test", "b.test", "c.test", "admin.test"]);
}

#[test]
fn test_unary_text_condition() {
    assert_eq!(fqdns(&query("fqdn where comment")), vec!["a.test"]);
    assert_eq!(fqdns(&query("fqdn where !comment")), vec!["b.test"]);
}

#[test]
fn test_contains_or_negated_boolean() {
    let parsed = parse("fqdn where cpu_model =~ Intel OR !efi").unwrap();
    assert_eq!(parsed.conditions.len(), 2);
    assert_eq!(parsed.conjunctions[0].value, Conjunction::Or);
    assert!(matches!(
        &parsed.conditions[1],
        ConditionExpr::Unary { field, negated: true } if field.value == "efi"
    ));

    assert_eq!(
        fqdns(&query("fqdn where cpu_model =~ Intel OR !efi")),
        vec!["a.test", "b.test"]
    );
    assert_eq!(fqdns(&query("fqdn where cpu_model =* amd")), vec!["b.test"]);
}

#[test]
fn test_infinite_sentinel() {
    let inventory = inventory();
    let exact =
        parse_and_compile("fqdn where reserved_until == infinite", host_registry(), &inventory)
            .unwrap();
    assert!(matches!(exact.conditions[0].value, Value::DateTime(_)));
    let ordered =
        parse_and_compile("fqdn where reserved_until > infinite", host_registry(), &inventory)
            .unwrap();
    assert!(matches!(ordered.conditions[0].value, Value::DateTimeTz(_)));

    let result = query("fqdn, reserved_until where reserved_until == infinite");
    assert_eq!(column(&result, "reserved_until"), vec![Value::from("infinite")]);
    assert_eq!(
        query_err("fqdn where reserved_until > infinite"),
        ErrorKind::EmptyResult
    );
}

#[test]
fn test_reference_display_and_filter() {
    let result = query("fqdn, arch, reserved_by, location");
    assert_eq!(
        column(&result, "arch"),
        vec![Value::from("x86_64"), Value::from("aarch64")]
    );
    assert_eq!(
        column(&result, "reserved_by"),
        vec![Value::from("alice"), Value::Null]
    );
    assert_eq!(
        column(&result, "location"),
        vec![Value::from("Lab 1"), Value::Null]
    );

    assert_eq!(fqdns(&query("fqdn where arch = aarch64")), vec!["b.test"]);
    assert_eq!(fqdns(&query("fqdn where arch != aarch64")), vec!["a.test"]);
    assert_eq!(fqdns(&query("fqdn where reserved_by")), vec!["a.test"]);
    assert_eq!(
        fqdns(&query("fqdn where enclosure__location_room = 'lab 1'")),
        vec!["a.test"]
    );
}

#[test]
fn test_text_match_on_references_uses_names() {
    assert_eq!(fqdns(&query("fqdn where arch =~ x86")), vec!["a.test"]);
    assert_eq!(fqdns(&query("fqdn where arch =* aarch")), vec!["b.test"]);
    assert_eq!(fqdns(&query("fqdn where architecture =~ 64")), vec!["a.test", "b.test"]);
    assert_eq!(fqdns(&query("fqdn where reserved_by =* ALI")), vec!["a.test"]);
    assert_eq!(fqdns(&query("fqdn where location =~ lab")), vec!["a.test"]);
    assert_eq!(
        fqdns(&query("fqdn where arch =~ 86 AND arch = x86_64")),
        vec!["a.test"]
    );
    assert_eq!(query_err("fqdn where system =~ ubuntu"), ErrorKind::EmptyResult);
}

#[test]
fn test_dynamic_fields_are_projected() {
    let result = query("fqdn, ipv4, mac, interfaces");
    assert_eq!(
        result.rows[0],
        vec![
            ("fqdn".to_string(), Value::from("a.test")),
            ("ipv4".to_string(), Value::from("10.0.0.1")),
            ("mac".to_string(), Value::from("52:54:00:00:00:01")),
            ("interfaces".to_string(), Value::Int(2)),
        ]
    );
    assert_eq!(result.rows[1][1], ("ipv4".to_string(), Value::Null));
}

#[test]
fn test_identifier_only_when_requested() {
    assert_eq!(query("fqdn").columns().collect::<Vec<_>>(), vec!["fqdn"]);
    let result = query("id, fqdn");
    assert_eq!(column(&result, "id"), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_duplicate_fields_keep_header_order() {
    let result = query("fqdn, ram, fqdn");
    assert_eq!(result.columns().collect::<Vec<_>>(), vec!["fqdn", "ram", "fqdn"]);
    assert_eq!(result.header[1].1, "RAM (MB)");
    assert_eq!(result.rows[0][0], result.rows[0][2]);
    assert_eq!(result.rows[0][1], ("ram".to_string(), Value::Int(65536)));
}

#[test]
fn test_left_to_right_without_precedence() {
    // (efi OR cpu_physical = 1) AND comment
    assert_eq!(
        fqdns(&query("fqdn where efi OR cpu_physical = 1 AND comment")),
        vec!["a.test"]
    );
    // (comment AND efi) OR cpu_physical = 1
    assert_eq!(
        fqdns(&query("fqdn where comment AND efi OR cpu_physical = 1")),
        vec!["a.test", "b.test"]
    );
}

#[test]
fn test_idempotent() {
    let first = query("fqdn, arch where cpu_model =~ intel OR ram >= 32768");
    let second = query("fqdn, arch where cpu_model =~ intel OR ram >= 32768");
    assert_eq!(first, second);
}

#[test]
fn test_error_taxonomy() {
    assert_eq!(query_err("fqdn where efi where comment"), ErrorKind::Syntax);
    assert_eq!(query_err("fqdn where"), ErrorKind::Syntax);
    assert_eq!(query_err("fqdn where efi AND"), ErrorKind::Syntax);
    assert_eq!(query_err("fqdn where fqdn > a"), ErrorKind::Syntax);
    assert_eq!(query_err("fqdn, bogus"), ErrorKind::UnknownField);
    assert_eq!(query_err("fqdn where bogus"), ErrorKind::UnknownField);
    assert_eq!(query_err("fqdn where mac = x"), ErrorKind::UnsupportedOperation);
    assert_eq!(
        query_err("fqdn where interfaces > 1"),
        ErrorKind::UnsupportedOperation
    );
    assert_eq!(query_err("fqdn where fqdn = nowhere"), ErrorKind::EmptyResult);
}

#[test]
fn test_empty_scope() {
    let inventory = inventory();
    let scope = Scope::filtered(&inventory, HOSTS_TABLE, |_| false);
    let err = run("fqdn", host_registry(), &scope).unwrap_err();
    assert!(err.is_empty_result());
}

#[test]
fn test_reference_round_trip() {
    let inventory = inventory();
    let registry = host_registry();
    for field in registry.descriptors() {
        let (Some(pre), Some(post)) = (field.pre_transform, field.post_transform) else {
            continue;
        };
        let table = match pre {
            PreTransform::LookupId { table, .. } => table,
        };
        for record in inventory.table(table) {
            let PostTransform::LookupField { field: name, .. } = post else {
                continue;
            };
            let Some(display) = record.get(name) else {
                continue;
            };
            let text = display.to_string();
            let stored = pre.apply(&inventory, &field.token, &text).unwrap();
            assert_eq!(post.apply(&inventory, &stored), display);
        }
    }
}
