//! Desired state of an LDAP authentication server.

use crate::types::{Identity, ProtocolVersion, SearchScope, Transport, LDAP_KIND};

/// Stored tag of the bind password.
pub const BIND_PASSWORD_FIELD: &str = "ldap_bindpw";
/// Stored tag of the resolved certificate authority reference.
pub const CA_REF_FIELD: &str = "ldap_caref";
/// Certificate authority name used when none is given.
pub const DEFAULT_CA: &str = "global";

/// Desired state of one LDAP authentication server.
///
/// Unsupplied optional fields (`None`) are omitted on create and left
/// untouched on update. Bind credentials are treated as unsupplied when
/// empty, so an empty password is never written. The `ca` display name is resolved to a reference at reconciliation time
/// and is never stored itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapServer {
    /// Server name, half of the identity.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Connection transport.
    pub transport: Transport,
    /// LDAP protocol version.
    pub protocol_version: ProtocolVersion,
    /// Server timeout in seconds.
    pub timeout: u32,
    /// Search scope.
    pub scope: SearchScope,
    /// Search base DN.
    pub base_dn: Option<String>,
    /// Authentication containers, joined with `;`.
    pub auth_containers: String,
    /// Whether the extended query is enabled.
    pub extended_enabled: bool,
    /// Extended query.
    pub extended_query: String,
    /// Search bind DN.
    pub bind_dn: Option<String>,
    /// Search bind password.
    pub bind_password: Option<String>,
    /// User naming attribute.
    pub attr_user: String,
    /// Group naming attribute.
    pub attr_group: String,
    /// Group member attribute.
    pub attr_member: String,
    /// Group objectClass.
    pub attr_group_object: String,
    /// Display name of the certificate authority.
    pub ca: String,
}

impl LdapServer {
    /// Creates a desired state with the required fields and defaults for
    /// everything else.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        transport: Transport,
        scope: SearchScope,
        auth_containers: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 389,
            transport,
            protocol_version: ProtocolVersion::V3,
            timeout: 25,
            scope,
            base_dn: None,
            auth_containers: auth_containers.into(),
            extended_enabled: false,
            extended_query: String::new(),
            bind_dn: None,
            bind_password: None,
            attr_user: "cn".to_string(),
            attr_group: "cn".to_string(),
            attr_member: "member".to_string(),
            attr_group_object: "posixGroup".to_string(),
            ca: DEFAULT_CA.to_string(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = seconds;
        self
    }

    /// Sets the search base DN.
    #[must_use]
    pub fn base_dn(mut self, dn: impl Into<String>) -> Self {
        self.base_dn = Some(dn.into());
        self
    }

    /// Enables the extended query.
    #[must_use]
    pub fn extended_query(mut self, query: impl Into<String>) -> Self {
        self.extended_enabled = true;
        self.extended_query = query.into();
        self
    }

    /// Sets the search bind credentials.
    #[must_use]
    pub fn bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self.bind_password = Some(password.into());
        self
    }

    /// Sets the user naming attribute.
    #[must_use]
    pub fn attr_user(mut self, attr: impl Into<String>) -> Self {
        self.attr_user = attr.into();
        self
    }

    /// Sets the group member attribute.
    #[must_use]
    pub fn attr_member(mut self, attr: impl Into<String>) -> Self {
        self.attr_member = attr.into();
        self
    }

    /// Sets the group objectClass.
    #[must_use]
    pub fn attr_group_object(mut self, attr: impl Into<String>) -> Self {
        self.attr_group_object = attr.into();
        self
    }

    /// Sets the certificate authority display name.
    #[must_use]
    pub fn ca(mut self, name: impl Into<String>) -> Self {
        self.ca = name.into();
        self
    }

    /// Returns the identity of this server.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::ldap(self.name.clone())
    }

    /// Returns the stored fields in their stored order.
    ///
    /// `ca_ref` is the resolved certificate authority reference; `None`
    /// omits the reference. Unsupplied optional fields are omitted.
    #[must_use]
    pub fn fields(&self, ca_ref: Option<&str>) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("type", LDAP_KIND.to_string()),
            ("host", self.host.clone()),
            ("ldap_port", self.port.to_string()),
            ("ldap_urltype", self.transport.url_type().to_string()),
            ("ldap_protver", self.protocol_version.as_str().to_string()),
            ("ldap_timeout", self.timeout.to_string()),
            ("ldap_scope", self.scope.as_str().to_string()),
        ];
        if let Some(dn) = &self.base_dn {
            fields.push(("ldap_basedn", dn.clone()));
        }
        fields.push(("ldap_authcn", self.auth_containers.clone()));
        let enabled = if self.extended_enabled { "yes" } else { "" };
        fields.push(("ldap_extended_enabled", enabled.to_string()));
        fields.push(("ldap_extended_query", self.extended_query.clone()));
        if let Some(dn) = self.bind_dn.as_ref().filter(|dn| !dn.is_empty()) {
            fields.push(("ldap_binddn", dn.clone()));
        }
        if let Some(password) = self.bind_password.as_ref().filter(|pw| !pw.is_empty()) {
            fields.push((BIND_PASSWORD_FIELD, password.clone()));
        }
        fields.push(("ldap_attr_user", self.attr_user.clone()));
        fields.push(("ldap_attr_group", self.attr_group.clone()));
        fields.push(("ldap_attr_member", self.attr_member.clone()));
        fields.push(("ldap_attr_groupobj", self.attr_group_object.clone()));
        if let Some(reference) = ca_ref {
            fields.push((CA_REF_FIELD, reference.to_string()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(fields: &[(&'static str, String)]) -> Vec<&'static str> {
        fields.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn defaults_match_stored_defaults() {
        let server = LdapServer::new("AD", "ad", Transport::Tcp, SearchScope::One, "cn=users");
        let fields = server.fields(None);
        let get = |key: &str| fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("ldap_port"), Some("389"));
        assert_eq!(get("ldap_protver"), Some("3"));
        assert_eq!(get("ldap_timeout"), Some("25"));
        assert_eq!(get("ldap_urltype"), Some("TCP - Standard"));
        assert_eq!(get("ldap_extended_enabled"), Some(""));
        assert_eq!(get("ldap_attr_groupobj"), Some("posixGroup"));
        assert_eq!(server.ca, "global");
    }

    #[test]
    fn unsupplied_optionals_are_omitted() {
        let server = LdapServer::new("AD", "ad", Transport::Tcp, SearchScope::One, "cn=users");
        let names = keys(&server.fields(None));
        assert!(!names.contains(&"ldap_basedn"));
        assert!(!names.contains(&"ldap_binddn"));
        assert!(!names.contains(&BIND_PASSWORD_FIELD));
        assert!(!names.contains(&CA_REF_FIELD));
    }

    #[test]
    fn empty_bind_credentials_are_omitted() {
        let server = LdapServer::new("AD", "ad", Transport::Tcp, SearchScope::One, "cn=users")
            .bind("", "");
        let names = keys(&server.fields(None));
        assert!(!names.contains(&"ldap_binddn"));
        assert!(!names.contains(&BIND_PASSWORD_FIELD));
    }

    #[test]
    fn identity_fields_lead() {
        let server = LdapServer::new("AD", "ad", Transport::Ssl, SearchScope::Subtree, "cn=users")
            .extended_query("memberOf=vpn")
            .bind("cn=bind", "pw");
        let fields = server.fields(Some("5f3c"));
        assert_eq!(&keys(&fields)[..2], &["name", "type"]);
        assert!(fields.contains(&("ldap_extended_enabled", "yes".to_string())));
        assert_eq!(fields.last(), Some(&(CA_REF_FIELD, "5f3c".to_string())));
    }
}
