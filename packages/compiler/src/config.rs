//! Code generation settings

use serde::{Deserialize, Serialize};

const NAMESPACE_DELIM: char = '.';
const DIR_DELIM: char = '/';

/// Options that affect emitted source, never the intermediate representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeGenSettings {
    pub indent: String,
    pub newline: String,
    pub convert_line_endings: bool,
    pub normalize_whitespace: bool,
    pub xhtml_style: bool,
    pub encode_non_ascii: bool,
    pub script_type_attr: bool,
    pub lowercase_client_paths: bool,
    pub client_prefix: Option<String>,
    pub server_prefix: Option<String>,
}

impl Default for CodeGenSettings {
    fn default() -> Self {
        CodeGenSettings {
            indent: "\t".to_string(),
            newline: "\n".to_string(),
            convert_line_endings: false,
            normalize_whitespace: false,
            xhtml_style: false,
            encode_non_ascii: true,
            script_type_attr: false,
            lowercase_client_paths: true,
            client_prefix: None,
            server_prefix: None,
        }
    }
}

impl CodeGenSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_client_prefix(&self) -> bool {
        prefix(&self.client_prefix).is_some()
    }

    pub fn has_server_prefix(&self) -> bool {
        prefix(&self.server_prefix).is_some()
    }

    /// Fully qualified server-side name for a view.
    pub fn server_name(&self, view_name: &str) -> String {
        qualify(prefix(&self.server_prefix), view_name)
    }

    /// Fully qualified client-side name for a view.
    pub fn client_name(&self, view_name: &str) -> String {
        qualify(prefix(&self.client_prefix), view_name)
    }

    /// Relative path of the generated server file.
    pub fn server_path(&self, view_name: &str, extension: &str) -> String {
        let mut path = self.server_name(view_name).replace(NAMESPACE_DELIM, &DIR_DELIM.to_string());
        path.push_str(extension);
        path
    }

    /// Relative path of the generated client file.
    pub fn client_path(&self, view_name: &str, extension: &str) -> String {
        let mut name = self.client_name(view_name);
        if self.lowercase_client_paths {
            // case-sensitive web servers and file systems
            name = name.to_lowercase();
        }
        let mut path = name.replace(NAMESPACE_DELIM, &DIR_DELIM.to_string());
        path.push_str(extension);
        path
    }
}

fn prefix(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

fn qualify(prefix: Option<&str>, view_name: &str) -> String {
    let view_name = view_name.trim();
    match prefix {
        Some(prefix) => format!("{}{}{}", prefix, NAMESPACE_DELIM, view_name),
        None => view_name.to_string(),
    }
}
