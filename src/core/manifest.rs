//! Wrapforge.toml manifest parsing and schema.
//!
//! The manifest describes one extension module: the SWIG interface file,
//! the native translation units compiled into it, the binding language
//! header search path, and the tools used to build it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

/// Canonical manifest filename.
pub const MANIFEST_NAME: &str = "Wrapforge.toml";

/// Extension-header search path used when the manifest names none.
pub const DEFAULT_PYTHON_INCLUDE: &str = "/usr/include/python2.7";

const CXX_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "C"];

/// The parsed Wrapforge.toml manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Manifest {
    /// The extension module being produced
    pub module: ModuleConfig,

    /// Native translation units linked into the module
    #[serde(default)]
    pub units: Vec<Unit>,

    /// Binding language settings
    #[serde(default)]
    pub binding: BindingConfig,

    /// External tools and their extra flags
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[module]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModuleConfig {
    /// SWIG module name (matches `%module` in the interface file)
    pub name: String,

    /// Interface description file
    pub interface: PathBuf,

    /// Directory receiving every generated file
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

/// A native source file and the header it is paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Unit {
    /// C++ source file
    pub source: PathBuf,

    /// Companion header; a prerequisite of the unit's object and the wrapper
    #[serde(default)]
    pub header: Option<PathBuf>,
}

impl Unit {
    /// Object file name for this unit (`SerialInterface.cpp` -> `SerialInterface.o`).
    pub fn object_name(&self) -> String {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}.o", stem)
    }
}

/// Target language of the generated bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingLanguage {
    #[default]
    Python,
}

impl BindingLanguage {
    /// SWIG language-mode flag.
    pub fn swig_flag(&self) -> &'static str {
        match self {
            BindingLanguage::Python => "-python",
        }
    }

    /// Extension of the generated binding stub.
    pub fn stub_extension(&self) -> &'static str {
        match self {
            BindingLanguage::Python => "py",
        }
    }
}

/// `[binding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BindingConfig {
    #[serde(default)]
    pub language: BindingLanguage,

    /// Header search path for the binding language's extension headers
    #[serde(default = "default_include_dirs")]
    pub include_dirs: Vec<PathBuf>,
}

fn default_include_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_PYTHON_INCLUDE)]
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            language: BindingLanguage::default(),
            include_dirs: default_include_dirs(),
        }
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolsConfig {
    /// Binding generator
    #[serde(default = "default_swig")]
    pub swig: PathBuf,

    /// C++ compiler, also used as the linker driver
    #[serde(default = "default_cxx")]
    pub cxx: PathBuf,

    /// Extra compile flags, appended after `-c -fPIC`
    #[serde(default)]
    pub cxxflags: Vec<String>,

    /// Extra link flags
    #[serde(default)]
    pub ldflags: Vec<String>,
}

fn default_swig() -> PathBuf {
    PathBuf::from("swig")
}

fn default_cxx() -> PathBuf {
    PathBuf::from("g++")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            swig: default_swig(),
            cxx: default_cxx(),
            cxxflags: Vec::new(),
            ldflags: Vec::new(),
        }
    }
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse and validate manifest text.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let name = &self.module.name;
        if !is_identifier(name) {
            bail!(
                "module name `{}` is not a valid identifier (letters, digits, `_`; not starting with a digit)",
                name
            );
        }

        if self.units.is_empty() {
            bail!("manifest declares no [[units]]; at least one source file is required");
        }

        let mut objects = HashSet::new();
        objects.insert(self.wrapper_object_name());

        for unit in &self.units {
            let ext = unit
                .source
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !CXX_EXTENSIONS.contains(&ext.as_str()) {
                bail!(
                    "unit source `{}` is not a C++ file (expected one of: {})",
                    unit.source.display(),
                    CXX_EXTENSIONS.join(", ")
                );
            }

            let object = unit.object_name();
            if !objects.insert(object.clone()) {
                bail!(
                    "unit `{}` would produce `{}`, which another unit or the wrapper already produces",
                    unit.source.display(),
                    object
                );
            }
        }

        if self.binding.include_dirs.is_empty() {
            tracing::warn!("[binding] include-dirs is empty; the wrapper will likely fail to compile");
        }

        Ok(())
    }

    /// Generated wrapper source name (`<module>_wrap.cxx`).
    pub fn wrapper_source_name(&self) -> String {
        format!("{}_wrap.cxx", self.module.name)
    }

    /// Wrapper object name (`<module>_wrap.o`).
    pub fn wrapper_object_name(&self) -> String {
        format!("{}_wrap.o", self.module.name)
    }

    /// Binding stub name (`<module>.py`).
    pub fn stub_name(&self) -> String {
        format!(
            "{}.{}",
            self.module.name,
            self.binding.language.stub_extension()
        )
    }

    /// Shared module name (`_<module>.so`).
    pub fn shared_module_name(&self) -> String {
        format!("_{}.so", self.module.name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Default manifest text written by `wrapforge init`.
pub fn default_manifest(name: &str) -> String {
    format!(
        r#"[module]
name = "{name}"
interface = "{name}.i"

[[units]]
source = "SerialInterface.cpp"
header = "SerialInterface.h"

[[units]]
source = "SerialCommands.cpp"
header = "SerialCommands.h"

[binding]
language = "python"
include-dirs = ["{include}"]

[tools]
swig = "swig"
cxx = "g++"
"#,
        name = name,
        include = DEFAULT_PYTHON_INCLUDE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[module]
name = "SerialInterface"
interface = "SerialInterface.i"

[[units]]
source = "SerialInterface.cpp"
header = "SerialInterface.h"
"#;

    #[test]
    fn test_parse_applies_defaults() {
        let manifest = Manifest::parse(MINIMAL).unwrap();
        assert_eq!(manifest.module.out_dir, PathBuf::from("."));
        assert_eq!(manifest.binding.language, BindingLanguage::Python);
        assert_eq!(
            manifest.binding.include_dirs,
            vec![PathBuf::from(DEFAULT_PYTHON_INCLUDE)]
        );
        assert_eq!(manifest.tools, ToolsConfig::default());
    }

    #[test]
    fn test_derived_names() {
        let manifest = Manifest::parse(MINIMAL).unwrap();
        assert_eq!(manifest.wrapper_source_name(), "SerialInterface_wrap.cxx");
        assert_eq!(manifest.wrapper_object_name(), "SerialInterface_wrap.o");
        assert_eq!(manifest.stub_name(), "SerialInterface.py");
        assert_eq!(manifest.shared_module_name(), "_SerialInterface.so");
        assert_eq!(manifest.units[0].object_name(), "SerialInterface.o");
    }

    #[test]
    fn test_default_manifest_round_trips() {
        let manifest = Manifest::parse(&default_manifest("SerialInterface")).unwrap();
        assert_eq!(manifest.units.len(), 2);
        assert_eq!(manifest.units[1].source, PathBuf::from("SerialCommands.cpp"));
    }

    #[test]
    fn test_rejects_no_units() {
        let err = Manifest::parse(
            r#"
[module]
name = "m"
interface = "m.i"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no [[units]]"));
    }

    #[test]
    fn test_rejects_bad_module_name() {
        let err = Manifest::parse(&MINIMAL.replace("\"SerialInterface\"\n", "\"1bad-name\"\n"))
            .unwrap_err();
        assert!(err.to_string().contains("not a valid identifier"));
    }

    #[test]
    fn test_rejects_duplicate_objects() {
        let text = format!(
            "{}\n[[units]]\nsource = \"other/SerialInterface.cc\"\n",
            MINIMAL
        );
        let err = Manifest::parse(&text).unwrap_err();
        assert!(err.to_string().contains("SerialInterface.o"));
    }

    #[test]
    fn test_rejects_non_cxx_source() {
        let text = MINIMAL.replace("SerialInterface.cpp", "SerialInterface.txt");
        let err = Manifest::parse(&text).unwrap_err();
        assert!(err.to_string().contains("not a C++ file"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let text = format!("{}\n[tools]\ncc = \"gcc\"\n", MINIMAL);
        assert!(Manifest::parse(&text).is_err());
    }
}
