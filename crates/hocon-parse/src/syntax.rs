//! Input syntax selection.

/// The syntax to expect from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSyntax {
    /// Strict JSON: no comments, unquoted strings, substitutions,
    /// includes, concatenations, or brace-less roots.
    Json,
    /// The HOCON superset.
    Conf,
    /// Not yet determined; sources guess from the file extension and
    /// fall back to CONF.
    #[default]
    Unspecified,
}

impl ConfigSyntax {
    /// Guess a syntax from a file name, by extension.
    pub fn from_extension(name: &str) -> ConfigSyntax {
        if name.ends_with(".json") {
            ConfigSyntax::Json
        } else if name.ends_with(".conf") {
            ConfigSyntax::Conf
        } else {
            ConfigSyntax::Unspecified
        }
    }

    /// Whether this is strict JSON.
    pub fn is_json(&self) -> bool {
        matches!(self, ConfigSyntax::Json)
    }
}
