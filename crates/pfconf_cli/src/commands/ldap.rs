//! LDAP authentication server command implementation.

use super::{mask_secrets, CliError, MASK};
use clap::{Args, ValueEnum};
use pfconf_core::{
    Config, Desired, Identity, LdapServer, ProtocolVersion, Reconciliation, SearchScope, Session,
    Transport, BIND_PASSWORD_FIELD, DEFAULT_CA,
};
use pfconf_tree::{FileStore, DEFAULT_USERNAME};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Lifecycle state requested for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum State {
    /// The server must exist.
    Present,
    /// The server must not exist.
    Absent,
}

/// Arguments of the `ldap` command.
#[derive(Debug, Args)]
pub struct LdapArgs {
    /// Name of the authentication server
    #[arg(long)]
    pub name: String,

    /// State in which to leave the authentication server
    #[arg(long, value_enum)]
    pub state: State,

    /// Hostname or IP address of the authentication server
    #[arg(long)]
    pub host: Option<String>,

    /// Port to connect to
    #[arg(long, default_value_t = 389)]
    pub port: u16,

    /// Transport to use (tcp, starttls, ssl)
    #[arg(long)]
    pub transport: Option<Transport>,

    /// Certificate authority
    #[arg(long, default_value = DEFAULT_CA)]
    pub ca: String,

    /// LDAP protocol version (2, 3)
    #[arg(long, default_value = "3")]
    pub protver: ProtocolVersion,

    /// Server timeout in seconds
    #[arg(long, default_value_t = 25)]
    pub timeout: u32,

    /// Search scope (one, subtree)
    #[arg(long)]
    pub scope: Option<SearchScope>,

    /// Search base DN
    #[arg(long)]
    pub basedn: Option<String>,

    /// Authentication containers added to basedn
    #[arg(long)]
    pub authcn: Option<String>,

    /// Enable extended query
    #[arg(long)]
    pub extended_enabled: bool,

    /// Extended query
    #[arg(long, default_value = "")]
    pub extended_query: String,

    /// Search bind DN
    #[arg(long)]
    pub binddn: Option<String>,

    /// Search bind password
    #[arg(long)]
    pub bindpw: Option<String>,

    /// LDAP user naming attribute
    #[arg(long, default_value = "cn")]
    pub attr_user: String,

    /// LDAP group naming attribute
    #[arg(long, default_value = "cn")]
    pub attr_group: String,

    /// LDAP group member naming attribute
    #[arg(long, default_value = "member")]
    pub attr_member: String,

    /// LDAP group objectClass naming attribute
    #[arg(long, default_value = "posixGroup")]
    pub attr_groupobj: String,

    /// Dry run - show what would change without writing
    #[arg(long)]
    pub check: bool,

    /// Keep a copy of the previous configuration in this directory
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Username recorded in the revision stamp
    #[arg(long, default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

impl LdapArgs {
    /// Maps the arguments to a desired state.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the name is empty or arguments required for
    /// `present` are missing.
    pub fn desired(&self) -> Result<Desired, CliError> {
        if self.name.trim().is_empty() {
            return Err(CliError::InvalidArgument {
                argument: "name",
                message: "must not be empty".to_string(),
            });
        }
        if self.state == State::Absent {
            return Ok(Desired::Absent(Identity::ldap(self.name.clone())));
        }

        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.transport.is_none() {
            missing.push("transport");
        }
        if self.scope.is_none() {
            missing.push("scope");
        }
        if self.authcn.is_none() {
            missing.push("authcn");
        }
        let (Some(host), Some(transport), Some(scope), Some(authcn)) =
            (&self.host, self.transport, self.scope, &self.authcn)
        else {
            return Err(CliError::MissingArguments {
                state: "present",
                missing: missing.join(", "),
            });
        };

        let mut server =
            LdapServer::new(self.name.clone(), host.clone(), transport, scope, authcn.clone())
                .port(self.port)
                .protocol_version(self.protver)
                .timeout(self.timeout)
                .attr_user(self.attr_user.clone())
                .attr_member(self.attr_member.clone())
                .attr_group_object(self.attr_groupobj.clone())
                .ca(self.ca.clone());
        server.attr_group = self.attr_group.clone();
        server.base_dn = self.basedn.clone();
        server.extended_enabled = self.extended_enabled;
        server.extended_query = self.extended_query.clone();
        server.bind_dn = self.binddn.clone();
        server.bind_password = self.bindpw.clone();
        Ok(Desired::Present(server))
    }
}

/// Runs the ldap command.
pub fn run(config: &Path, args: &LdapArgs) -> Result<(), Box<dyn std::error::Error>> {
    let desired = args.desired()?;

    let mut store = FileStore::open(config)?.with_username(args.username.as_str());
    if let Some(dir) = &args.backup_dir {
        store = store.with_backup_dir(dir);
    }

    let mut session = Session::new(store, Config::new().dry_run(args.check));
    let result = session.apply(&desired)?;

    match args.format.as_str() {
        "json" => {
            let mut masked = result.clone();
            mask_secrets(&mut masked.diff.before);
            mask_secrets(&mut masked.diff.after);
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
        _ => {
            print!("{}", render_text(&args.name, &result, args.check));
        }
    }

    Ok(())
}

/// Renders a reconciliation as human-readable lines.
///
/// `+` marks added fields, `-` removed fields and `~` changed fields.
/// Secrets are masked after the comparison, so a changed password still
/// shows up as changed.
pub fn render_text(name: &str, result: &Reconciliation, dry_run: bool) -> String {
    let before = &result.diff.before;
    let after = &result.diff.after;

    let verb = match (result.changed, before.is_empty(), after.is_empty()) {
        (false, _, _) => "unchanged",
        (true, true, _) => "added",
        (true, _, true) => "removed",
        (true, false, false) => "updated",
    };
    let mut out = format!("{name}: {verb}");
    if dry_run && result.changed {
        out.push_str(" (dry run)");
    }
    out.push('\n');

    let show = |key: &str, value: &str| -> String {
        if key == BIND_PASSWORD_FIELD && !value.is_empty() {
            MASK.to_string()
        } else {
            value.to_string()
        }
    };

    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    for key in keys {
        match (before.get(key), after.get(key)) {
            (None, Some(new)) => out.push_str(&format!("  + {key}: {}\n", show(key, new))),
            (Some(old), None) => out.push_str(&format!("  - {key}: {}\n", show(key, old))),
            (Some(old), Some(new)) if old != new => out.push_str(&format!(
                "  ~ {key}: {} -> {}\n",
                show(key, old),
                show(key, new)
            )),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pfconf_testkit::{find_entry, TestConfigFile, INTERNAL_CA_REF};

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: LdapArgs,
    }

    fn parse(argv: &[&str]) -> LdapArgs {
        let mut full = vec!["pfconf"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    const AD: &[&str] = &[
        "--name", "AD", "--state", "present", "--host", "ad.example.com", "--port", "636",
        "--transport", "ssl", "--scope", "subtree", "--authcn", "cn=users", "--ca", "InternalCA",
    ];

    #[test]
    fn present_maps_all_fields() {
        let mut argv = AD.to_vec();
        argv.extend_from_slice(&["--bindpw", "pw", "--attr-groupobj", "group", "--extended-enabled"]);
        let Desired::Present(server) = parse(&argv).desired().unwrap() else {
            panic!("expected present");
        };
        assert_eq!(server.port, 636);
        assert_eq!(server.transport, Transport::Ssl);
        assert_eq!(server.attr_group_object, "group");
        assert_eq!(server.bind_password.as_deref(), Some("pw"));
        assert_eq!(server.bind_dn, None);
        assert!(server.extended_enabled);
        assert_eq!(server.ca, "InternalCA");
    }

    #[test]
    fn present_requires_connection_arguments() {
        let err = parse(&["--name", "AD", "--state", "present", "--host", "h"])
            .desired()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "state is present but all of the following are missing: transport, scope, authcn"
        );
    }

    #[test]
    fn absent_needs_only_name() {
        let desired = parse(&["--name", "AD", "--state", "absent"]).desired().unwrap();
        assert_eq!(desired, Desired::Absent(Identity::ldap("AD")));
    }

    #[test]
    fn rejects_unknown_transport() {
        let argv = ["pfconf", "--name", "AD", "--state", "present", "--transport", "tls"];
        assert!(Harness::try_parse_from(argv).is_err());
    }

    #[test]
    fn run_applies_to_config_file() {
        let file = TestConfigFile::base();
        run(file.path(), &parse(AD)).unwrap();

        let tree = file.read_tree();
        let entry = find_entry(&tree, "system", "authserver", "AD").unwrap();
        assert_eq!(entry.child_text("ldap_caref"), Some(INTERNAL_CA_REF));
    }

    #[test]
    fn run_check_mode_writes_nothing() {
        let file = TestConfigFile::base();
        let mut argv = AD.to_vec();
        argv.push("--check");
        run(file.path(), &parse(&argv)).unwrap();

        assert!(find_entry(&file.read_tree(), "system", "authserver", "AD").is_none());
    }

    #[test]
    fn render_text_masks_changed_password() {
        let mut result = Reconciliation {
            changed: true,
            diff: Default::default(),
            description: String::new(),
            index: Some(0),
        };
        result.diff.before.insert("host".into(), "a".into());
        result.diff.before.insert(BIND_PASSWORD_FIELD.into(), "old".into());
        result.diff.after.insert("host".into(), "b".into());
        result.diff.after.insert(BIND_PASSWORD_FIELD.into(), "new".into());

        let text = render_text("AD", &result, true);
        assert!(text.starts_with("AD: updated (dry run)\n"));
        assert!(text.contains("  ~ host: a -> b\n"));
        assert!(text.contains("  ~ ldap_bindpw: ******** -> ********\n"));
        assert!(!text.contains("old"));
    }
}
