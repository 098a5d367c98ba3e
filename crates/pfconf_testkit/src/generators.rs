//! Property-based test generators using proptest.
//!
//! Strategies produce desired states that the fixtures can satisfy:
//! encrypted transports always reference a certificate authority that
//! exists in [`crate::BASE_CONFIG`].

use pfconf_core::{LdapServer, ProtocolVersion, SearchScope, Transport};
use proptest::prelude::*;

/// Strategy for server names, including ones that collide with fixtures.
pub fn server_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("AD".to_string()),
        Just("RADIUS".to_string()),
        prop::string::string_regex("[A-Za-z][A-Za-z0-9_-]{0,15}").expect("Invalid regex"),
    ]
}

/// Strategy for transports.
pub fn transport_strategy() -> impl Strategy<Value = Transport> {
    prop_oneof![
        Just(Transport::Tcp),
        Just(Transport::StartTls),
        Just(Transport::Ssl),
    ]
}

/// Strategy for free-form field values.
///
/// Covers printable ASCII including XML-special characters, padding and
/// whitespace-only values, as stored passwords and queries may contain
/// any of them.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(" s3cret ".to_string()),
        Just("a&b<c>\"d'".to_string()),
        Just("  ".to_string()),
        prop::string::string_regex("[ -~]{0,16}").expect("Invalid regex"),
    ]
}

/// Strategy for distinguished names.
pub fn dn_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("(cn|ou|dc)=[a-z]{1,8}(,(cn|ou|dc)=[a-z]{1,8}){0,3}")
        .expect("Invalid regex")
}

/// Strategy for desired LDAP servers whose CA resolves in the fixtures.
pub fn ldap_server_strategy() -> impl Strategy<Value = LdapServer> {
    (
        server_name_strategy(),
        prop::string::string_regex("[a-z]{1,10}\\.example\\.com").expect("Invalid regex"),
        transport_strategy(),
        prop_oneof![Just(SearchScope::One), Just(SearchScope::Subtree)],
        dn_strategy(),
        any::<u16>(),
        prop_oneof![Just(ProtocolVersion::V2), Just(ProtocolVersion::V3)],
        1u32..300,
        prop::option::of(prop_oneof![dn_strategy(), text_value_strategy()]),
        prop::option::of((text_value_strategy(), text_value_strategy())),
        prop::option::of(text_value_strategy()),
        prop_oneof![Just("InternalCA"), Just("PartnerCA")],
    )
        .prop_map(
            |(name, host, transport, scope, authcn, port, version, timeout, base_dn, bind, query, ca)| {
                let mut server = LdapServer::new(name, host, transport, scope, authcn)
                    .port(port)
                    .protocol_version(version)
                    .timeout(timeout)
                    .ca(ca);
                server.base_dn = base_dn;
                if let Some((dn, password)) = bind {
                    server = server.bind(dn, password);
                }
                if let Some(query) = query {
                    server = server.extended_query(query);
                }
                server
            },
        )
}
