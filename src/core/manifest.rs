//! Manifest emission.
//!
//! Two manifest shapes come out of a conversion. Every package gets its own
//! manifest carrying name, version, and the export table. The root manifest
//! is updated in place: it gains the workspace member list and registry
//! import mappings while every unrelated field survives untouched.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::exports::ExportEntry;
use crate::core::package::Package;

/// Exports field of a package manifest.
///
/// A package whose only export is its own module root uses the string
/// shorthand; everything else gets the full table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportsField {
    Single(String),
    Table(Map<String, Value>),
}

impl ExportsField {
    /// Collapse an export table to the manifest form.
    pub fn from_entries(entries: &[ExportEntry]) -> ExportsField {
        if let [only] = entries {
            if only.key == "." {
                return ExportsField::Single(only.path.clone());
            }
        }
        let mut table = Map::new();
        for entry in entries {
            table.insert(entry.key.clone(), Value::String(entry.path.clone()));
        }
        ExportsField::Table(table)
    }
}

/// Manifest written into each package directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub exports: ExportsField,
}

impl PackageManifest {
    /// Build the manifest for a package under the given scope.
    pub fn for_package(package: &Package, scope: &str, version: &str) -> Self {
        PackageManifest {
            name: format!("{}/{}", scope, package.name()),
            version: version.to_string(),
            exports: ExportsField::from_entries(package.exports()),
        }
    }

    /// Serialize to the on-disk form, 2-space indented with a trailing
    /// newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let text = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        Ok(format!("{}\n", text))
    }
}

/// Read the `version` field of a manifest, if present.
pub fn manifest_version(text: &str) -> Result<Option<String>> {
    let value: Value = serde_json::from_str(text).context("failed to parse root manifest")?;
    Ok(value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Replace the `exports` field of an existing package manifest, leaving
/// every other field alone.
pub fn updated_package_exports(text: &str, exports: &ExportsField) -> Result<String> {
    let mut value: Value = serde_json::from_str(text).context("failed to parse package manifest")?;
    let object = value
        .as_object_mut()
        .context("package manifest is not a JSON object")?;

    let exports_value = serde_json::to_value(exports).context("failed to serialize exports")?;
    object.insert("exports".to_string(), exports_value);

    let updated =
        serde_json::to_string_pretty(&value).context("failed to serialize package manifest")?;
    Ok(format!("{}\n", updated))
}

/// Rewrite the root manifest text for the converted workspace.
///
/// Sets `workspaces` to the members in dependency order and maps each
/// scoped package name (bare and slash-suffixed) to its registry specifier
/// under `imports`. Existing fields keep their positions; new fields are
/// appended.
pub fn update_root_manifest(
    text: &str,
    topo_packages: &[String],
    scope: &str,
    registry: &str,
    version: &str,
) -> Result<String> {
    let mut value: Value = serde_json::from_str(text).context("failed to parse root manifest")?;
    let object = value
        .as_object_mut()
        .context("root manifest is not a JSON object")?;

    let members: Vec<Value> = topo_packages
        .iter()
        .map(|name| Value::String(format!("./{}", name)))
        .collect();
    object.insert("workspaces".to_string(), Value::Array(members));

    if !object.contains_key("imports") {
        object.insert("imports".to_string(), json!({}));
    }
    let imports = object
        .get_mut("imports")
        .and_then(Value::as_object_mut)
        .context("root manifest `imports` is not a JSON object")?;

    for name in topo_packages {
        imports.insert(
            format!("{}/{}", scope, name),
            Value::String(format!("{}:{}/{}@^{}", registry, scope, name, version)),
        );
        imports.insert(
            format!("{}/{}/", scope, name),
            Value::String(format!("{}:/{}/{}@^{}/", registry, scope, name, version)),
        );
    }

    let updated = serde_json::to_string_pretty(&value).context("failed to serialize root manifest")?;
    Ok(format!("{}\n", updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exports::ExportEntry;
    use std::path::PathBuf;

    fn entry(key: &str, path: &str) -> ExportEntry {
        ExportEntry {
            key: key.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_single_root_export_uses_shorthand() {
        let pkg = Package::new(
            "bytes",
            PathBuf::from("/ws/bytes"),
            vec![entry(".", "./mod.ts")],
        );

        let manifest = PackageManifest::for_package(&pkg, "@std", "1.0.0");

        assert_eq!(manifest.name, "@std/bytes");
        assert_eq!(manifest.exports, ExportsField::Single("./mod.ts".to_string()));

        let text = manifest.to_pretty_string().unwrap();
        assert!(text.contains("\"exports\": \"./mod.ts\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_multi_export_table_keeps_order() {
        let pkg = Package::new(
            "collections",
            PathBuf::from("/ws/collections"),
            vec![
                entry(".", "./mod.ts"),
                entry("./chunk", "./chunk.ts"),
                entry("./zip", "./zip.ts"),
            ],
        );

        let manifest = PackageManifest::for_package(&pkg, "@std", "0.213.1");
        let text = manifest.to_pretty_string().unwrap();

        let dot = text.find("\".\"").unwrap();
        let chunk = text.find("\"./chunk\"").unwrap();
        let zip = text.find("\"./zip\"").unwrap();
        assert!(dot < chunk && chunk < zip);
    }

    #[test]
    fn test_updated_exports_preserves_other_fields() {
        let original = r#"{
  "name": "@std/bytes",
  "version": "1.0.0",
  "exports": "./mod.ts",
  "lock": false
}"#;

        let exports = ExportsField::from_entries(&[
            entry(".", "./mod.ts"),
            entry("./concat", "./concat.ts"),
        ]);
        let updated = updated_package_exports(original, &exports).unwrap();

        let value: Value = serde_json::from_str(&updated).unwrap();
        assert_eq!(value["name"], json!("@std/bytes"));
        assert_eq!(value["lock"], json!(false));
        assert_eq!(value["exports"]["./concat"], json!("./concat.ts"));
    }

    #[test]
    fn test_root_manifest_gains_workspaces_and_imports() {
        let original = r#"{
  "version": "0.213.1",
  "imports": {
    "existing": "./tools/existing.ts"
  },
  "tasks": {
    "test": "deno test"
  }
}"#;

        let updated = update_root_manifest(
            original,
            &["bytes".to_string(), "io".to_string()],
            "@std",
            "jsr",
            "0.213.1",
        )
        .unwrap();

        let value: Value = serde_json::from_str(&updated).unwrap();
        assert_eq!(
            value["workspaces"],
            json!(["./bytes", "./io"])
        );
        assert_eq!(value["imports"]["@std/bytes"], json!("jsr:@std/bytes@^0.213.1"));
        assert_eq!(
            value["imports"]["@std/bytes/"],
            json!("jsr:/@std/bytes@^0.213.1/")
        );
        assert_eq!(value["imports"]["existing"], json!("./tools/existing.ts"));
        assert_eq!(value["tasks"]["test"], json!("deno test"));
        assert!(updated.ends_with("\n"));
    }

    #[test]
    fn test_root_manifest_without_imports_gets_one() {
        let updated =
            update_root_manifest(r#"{"version": "1.0.0"}"#, &["io".to_string()], "@std", "jsr", "1.0.0")
                .unwrap();

        let value: Value = serde_json::from_str(&updated).unwrap();
        assert_eq!(value["imports"]["@std/io"], json!("jsr:@std/io@^1.0.0"));
    }

    #[test]
    fn test_manifest_version_read() {
        assert_eq!(
            manifest_version(r#"{"version": "0.213.1"}"#).unwrap(),
            Some("0.213.1".to_string())
        );
        assert_eq!(manifest_version(r#"{"name": "x"}"#).unwrap(), None);
        assert!(manifest_version("not json").is_err());
    }
}
