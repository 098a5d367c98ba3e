//! List command implementation.

use super::mask_secrets;
use pfconf_core::{Config, Session};
use pfconf_tree::{FileStore, Snapshot};
use std::path::Path;

/// Runs the list command.
pub fn run(config: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(config)?;
    let session = Session::new(store, Config::default());
    let mut entries = session.entries()?;
    entries.iter_mut().for_each(mask_secrets);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => print!("{}", render_table(&entries)),
    }

    Ok(())
}

/// Renders entries as an aligned table.
pub fn render_table(entries: &[Snapshot]) -> String {
    const COLUMNS: [&str; 4] = ["name", "type", "host", "refid"];

    if entries.is_empty() {
        return "No authentication servers\n".to_string();
    }

    let cell = |entry: &Snapshot, column: &str| entry.get(column).cloned().unwrap_or_default();
    let mut widths = COLUMNS.map(str::len);
    for entry in entries {
        for (width, column) in widths.iter_mut().zip(COLUMNS) {
            *width = (*width).max(cell(entry, column).len());
        }
    }

    let mut out = String::new();
    let mut push_row = |values: [String; 4]| {
        let line: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_row(COLUMNS.map(str::to_uppercase));
    for entry in entries {
        push_row(COLUMNS.map(|column| cell(entry, column)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pairs: &[(&str, &str)]) -> Snapshot {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn table_aligns_columns() {
        let entries = vec![
            entry(&[("name", "RADIUS"), ("type", "radius"), ("host", "10.0.0.2")]),
            entry(&[("name", "AD"), ("type", "ldap"), ("host", "ad.example.com"), ("refid", "abc")]),
        ];
        let table = render_table(&entries);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "NAME    TYPE    HOST            REFID");
        assert_eq!(lines[1], "RADIUS  radius  10.0.0.2");
        assert_eq!(lines[2], "AD      ldap    ad.example.com  abc");
    }

    #[test]
    fn empty_table() {
        assert_eq!(render_table(&[]), "No authentication servers\n");
    }

    #[test]
    fn run_reads_fixture_file() {
        let file = pfconf_testkit::TestConfigFile::base();
        run(file.path(), "json").unwrap();
        run(file.path(), "text").unwrap();
    }
}
