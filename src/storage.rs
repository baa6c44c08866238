//! Loading and writing item collections.
//!
//! The [`TreeStore`](crate::TreeStore) itself knows nothing about files. This
//! module reads a flat list of items from JSON or YAML so a store can be
//! built from it, and writes a collection back out in either format.

use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

use tracing::instrument;

use crate::domain::Item;

/// Serialization format for an item collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// A JSON array of flat item records.
    #[default]
    Json,
    /// A YAML sequence of flat item records.
    Yaml,
}

impl Format {
    /// Infers the format from a file extension (`json`, `yaml` or `yml`,
    /// case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Errors that can occur when loading an item collection.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The format could not be inferred from the file name.
    #[error("cannot infer format of '{0}': expected a .json, .yaml or .yml extension")]
    UnknownFormat(String),

    /// Reading failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The content is not a valid JSON item list.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The content is not a valid YAML item list.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Reads items from a file, choosing the format from its extension.
///
/// # Errors
///
/// Returns an error if the format cannot be inferred, the file cannot be
/// opened or read, or its content is not a list of items.
#[instrument(level = "debug")]
pub fn load_items(path: &Path) -> Result<Vec<Item>, LoadError> {
    let format = Format::from_path(path)
        .ok_or_else(|| LoadError::UnknownFormat(path.display().to_string()))?;

    let file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
        _ => LoadError::Io(io_error),
    })?;

    let items = read_items(BufReader::new(file), format)?;
    tracing::debug!(count = items.len(), "loaded items");
    Ok(items)
}

/// Reads items from any reader in the given format.
///
/// # Errors
///
/// Returns an error if the content is not a list of items.
pub fn read_items<R: Read>(reader: R, format: Format) -> Result<Vec<Item>, LoadError> {
    Ok(match format {
        Format::Json => serde_json::from_reader(reader)?,
        Format::Yaml => serde_yaml::from_reader(reader)?,
    })
}

/// Writes items to any writer in the given format.
///
/// JSON output is pretty-printed and newline-terminated.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_items<W: Write>(
    mut writer: W,
    items: &[Item],
    format: Format,
) -> Result<(), LoadError> {
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut writer, items)?;
            writeln!(writer)?;
        }
        Format::Yaml => serde_yaml::to_writer(&mut writer, items)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use serde_json::json;

    use super::*;
    use crate::ItemId;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/items.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("items.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("items.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("items.toml")), None);
        assert_eq!(Format::from_path(Path::new("items")), None);
    }

    #[test]
    fn reads_json_items() {
        let input = r#"[
            {"id": 1, "parent": null, "label": "Root"},
            {"id": "a", "parent": 1, "label": "Child", "color": "red"}
        ]"#;

        let items = read_items(input.as_bytes(), Format::Json).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id(), &ItemId::from("a"));
        assert_eq!(items[1].parent(), Some(&ItemId::Int(1)));
        assert_eq!(items[1].attribute("color"), Some(&json!("red")));
    }

    #[test]
    fn reads_yaml_items() {
        let input = "- id: 1\n  label: Root\n- id: 2\n  parent: 1\n  label: Child\n  tags: [x, y]\n";

        let items = read_items(input.as_bytes(), Format::Yaml).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].parent(), None);
        assert_eq!(items[1].attribute("tags"), Some(&json!(["x", "y"])));
    }

    #[test]
    fn written_json_reads_back() {
        let items = vec![
            Item::root(1, "Root").with_attribute("open", true),
            Item::child(2, 1, "Child"),
        ];
        let mut buffer = Vec::new();

        write_items(&mut buffer, &items, Format::Json).unwrap();

        assert_eq!(read_items(buffer.as_slice(), Format::Json).unwrap(), items);
    }

    #[test]
    fn load_items_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"id": 1, "label": "only"}]"#).unwrap();

        let items = load_items(file.path()).unwrap();

        assert_eq!(items, vec![Item::root(1, "only")]);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();

        let error = load_items(&tmp.path().join("missing.json")).unwrap_err();

        assert!(matches!(error, LoadError::NotFound(_)));
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let error = load_items(Path::new("items.csv")).unwrap_err();

        assert!(matches!(error, LoadError::UnknownFormat(_)));
    }

    #[test]
    fn missing_label_is_an_error() {
        let error = read_items(r#"[{"id": 1}]"#.as_bytes(), Format::Json).unwrap_err();

        assert!(matches!(error, LoadError::Json(_)));
    }
}
