//! The host inventory catalog.

use std::sync::OnceLock;

use super::field::{ComputeFn, FieldDescriptor, FieldKind};
use super::transform::{PostTransform, PreTransform};
use super::Registry;
use crate::store::{Inventory, Record, RecordId, Scope, ScopeOptions};
use crate::value::Value;

/// Primary table of the inventory.
pub const HOSTS_TABLE: &str = "hosts";

const INTERFACES_TABLE: &str = "network_interfaces";

static HOST_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide host registry, built on first use.
pub fn host_registry() -> &'static Registry {
    HOST_REGISTRY.get_or_init(build_host_registry)
}

/// The default caller scope: active, non-administrative hosts unless the
/// options widen it.
pub fn host_scope(inventory: &Inventory, options: ScopeOptions) -> Scope<'_> {
    Scope::filtered(inventory, HOSTS_TABLE, |host| {
        (options.include_inactive || flag(host, "active", true))
            && (options.include_administrative || !flag(host, "administrative", false))
    })
}

fn flag(record: &Record, field: &str, default: bool) -> bool {
    record
        .get(field)
        .map(|v| v.coerce(FieldKind::Boolean))
        .and_then(|v| v.as_bool())
        .unwrap_or(default)
}

fn reference(name: &str, table: &'static str, field: &'static str) -> FieldDescriptor {
    FieldDescriptor::stored(name, FieldKind::Reference)
        .with_pre(PreTransform::LookupId { table, field })
        .with_post(PostTransform::LookupField { table, field })
}

fn build_host_registry() -> Registry {
    use FieldKind::*;

    Registry::new(HOSTS_TABLE)
        .with_field(FieldDescriptor::stored("id", Numeric).with_display("ID"))
        .with_field(FieldDescriptor::stored("fqdn", Text))
        .with_field(FieldDescriptor::stored("cpu_model", Text))
        .with_field(FieldDescriptor::stored("cpu_physical", Numeric))
        .with_field(FieldDescriptor::stored("cpu_cores", Numeric))
        .with_field(FieldDescriptor::stored("cpu_threads", Numeric))
        .with_field(FieldDescriptor::stored("ram_amount", Numeric))
        .with_field(FieldDescriptor::stored("efi", Boolean).with_display("EFI"))
        .with_field(FieldDescriptor::stored("active", Boolean))
        .with_field(FieldDescriptor::stored("administrative", Boolean))
        .with_field(FieldDescriptor::stored("comment", LongText))
        .with_field(FieldDescriptor::stored("kernel_options", Text))
        .with_field(FieldDescriptor::stored("reserved_reason", LongText).nullable())
        .with_field(reference("reserved_by", "users", "username").nullable())
        .with_field(FieldDescriptor::stored("reserved_at", DateTime).nullable())
        .with_field(
            FieldDescriptor::stored("reserved_until", DateTime)
                .nullable()
                .with_post(PostTransform::InfiniteSentinel),
        )
        .with_field(FieldDescriptor::stored("last_check", DateTime).nullable())
        .with_field(FieldDescriptor::stored("bios_date", Date).nullable())
        .with_field(reference("architecture", "architectures", "name"))
        .with_field(reference("system", "systems", "name"))
        .with_field(reference("enclosure", "enclosures", "name").nullable())
        .with_alias(
            reference("architecture", "architectures", "name")
                .renamed("arch")
                .with_display("Architecture"),
        )
        .with_alias(
            FieldDescriptor::stored("ram_amount", Numeric)
                .renamed("ram")
                .with_display("RAM (MB)"),
        )
        .with_alias(
            FieldDescriptor::stored("email", Text)
                .through("reserved_by", "users")
                .renamed("reserved_by_email")
                .with_display("Reserved by (email)")
                .nullable(),
        )
        .with_alias(
            FieldDescriptor::stored("location_room", Text)
                .through("enclosure", "enclosures")
                .renamed("location")
                .with_display("Location"),
        )
        .with_alias(
            FieldDescriptor::stored("platform", Text)
                .through("enclosure", "enclosures")
                .renamed("platform")
                .with_display("Platform"),
        )
        .with_dynamic(
            FieldDescriptor::dynamic("ipv4", Text, ComputeFn::new("ipv4", primary_ipv4))
                .with_display("IPv4"),
        )
        .with_dynamic(
            FieldDescriptor::dynamic("ipv6", Text, ComputeFn::new("ipv6", primary_ipv6))
                .with_display("IPv6"),
        )
        .with_dynamic(
            FieldDescriptor::dynamic("mac", Text, ComputeFn::new("mac", primary_mac))
                .with_display("MAC address"),
        )
        .with_dynamic(FieldDescriptor::dynamic(
            "interfaces",
            Numeric,
            ComputeFn::new("interfaces", interface_count),
        ))
}

/// The host's primary interface, or its first one if none is flagged.
fn primary_interface(inventory: &Inventory, host: RecordId) -> Option<&Record> {
    let mut first = None;
    for interface in inventory.referencing(INTERFACES_TABLE, "host", host) {
        if flag(interface, "primary", false) {
            return Some(interface);
        }
        first.get_or_insert(interface);
    }
    first
}

fn interface_attribute(inventory: &Inventory, host: RecordId, field: &str) -> Value {
    primary_interface(inventory, host)
        .and_then(|interface| interface.get(field))
        .unwrap_or(Value::Null)
}

fn primary_ipv4(inventory: &Inventory, host: RecordId) -> Value {
    interface_attribute(inventory, host, "ipv4_address")
}

fn primary_ipv6(inventory: &Inventory, host: RecordId) -> Value {
    interface_attribute(inventory, host, "ipv6_address")
}

fn primary_mac(inventory: &Inventory, host: RecordId) -> Value {
    interface_attribute(inventory, host, "mac_address")
}

fn interface_count(inventory: &Inventory, host: RecordId) -> Value {
    Value::Int(inventory.referencing(INTERFACES_TABLE, "host", host).count() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::from_tables([
            (
                HOSTS_TABLE,
                vec![
                    Record::new(1).with("fqdn", "a.test").with("active", true),
                    Record::new(2)
                        .with("fqdn", "b.test")
                        .with("active", true)
                        .with("administrative", true),
                    Record::new(3).with("fqdn", "c.test").with("active", false),
                ],
            ),
            (
                INTERFACES_TABLE,
                vec![
                    Record::new(10)
                        .with("host", 1)
                        .with("mac_address", "52:54:00:00:00:01")
                        .with("ipv4_address", "10.0.0.1"),
                    Record::new(11)
                        .with("host", 1)
                        .with("primary", true)
                        .with("mac_address", "52:54:00:00:00:02")
                        .with("ipv4_address", "10.0.0.2"),
                ],
            ),
        ])
    }

    #[test]
    fn test_registry_is_shared() {
        assert!(std::ptr::eq(host_registry(), host_registry()));
        assert_eq!(host_registry().entity(), HOSTS_TABLE);
    }

    #[test]
    fn test_every_token_resolves() {
        let registry = host_registry();
        for token in registry.all_valid_tokens() {
            assert!(registry.resolve(&token).is_ok(), "token {} did not resolve", token);
        }
        assert!(registry.resolve("reserved_by__email").is_ok());
        assert!(registry.resolve("enclosure__platform").is_ok());
    }

    #[test]
    fn test_stored_and_computed_are_exclusive() {
        for field in host_registry().descriptors() {
            assert_ne!(
                field.is_dynamic(),
                !field.storage_field.is_empty(),
                "field {}",
                field.token
            );
        }
    }

    #[test]
    fn test_default_scope() {
        let inventory = inventory();
        let scope = host_scope(&inventory, ScopeOptions::default());
        let ids: Vec<_> = scope.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);

        let wide = host_scope(
            &inventory,
            ScopeOptions {
                include_inactive: true,
                include_administrative: true,
            },
        );
        assert_eq!(wide.len(), 3);
    }

    #[test]
    fn test_primary_interface_fields() {
        let inventory = inventory();
        assert_eq!(primary_ipv4(&inventory, 1), Value::from("10.0.0.2"));
        assert_eq!(primary_mac(&inventory, 1), Value::from("52:54:00:00:00:02"));
        assert_eq!(primary_ipv6(&inventory, 1), Value::Null);
        assert_eq!(interface_count(&inventory, 1), Value::Int(2));
        assert_eq!(primary_ipv4(&inventory, 2), Value::Null);
    }
}
