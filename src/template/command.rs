//! # Placeholder Command Parser
//!
//! Parses a placeholder's command text into a [`Command`]:
//!
//! ```text
//! #<name> [ <key>=<value> ... ] [ <freetext> ]
//! ```
//!
//! Tokens are whitespace-separated except the free-text tail, which starts
//! at the first token that is not a `key=value` option and runs verbatim to
//! the end (so it may contain spaces and `=`). A later duplicate key
//! overwrites an earlier one. Parsing is total and side-effect-free; it
//! never resolves `%(field)` references — those are interpolated by the
//! text filter before a consuming filter sees the free text.

use indexmap::IndexMap;

use crate::error::EtiquetaError;

/// A parsed placeholder command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name without the leading `#`.
    pub name: String,
    /// Ordered `key=value` options; on duplicate keys the last value wins.
    pub options: IndexMap<String, String>,
    /// Verbatim free-text tail, empty when absent.
    pub arg: String,
}

impl Command {
    /// Parse command text. Fails when the leading token is not `#<name>` or
    /// an option-position token has a malformed `key=value` shape.
    pub fn parse(text: &str) -> Result<Self, EtiquetaError> {
        let trimmed = text.trim();
        let mut tokens = tokens_with_offsets(trimmed);

        let (_, head) = tokens.next().ok_or_else(|| {
            EtiquetaError::CommandSyntax("empty command text".into())
        })?;
        let name = head.strip_prefix('#').filter(|n| !n.is_empty()).ok_or_else(|| {
            EtiquetaError::CommandSyntax(format!(
                "command '{trimmed}' first element '{head}' didn't start with '#'"
            ))
        })?;

        let mut options = IndexMap::new();
        let mut arg = String::new();
        for (offset, token) in tokens {
            if !token.contains('=') {
                // First non-option token opens the free text, kept verbatim.
                arg = trimmed[offset..].to_string();
                break;
            }
            let mut parts = token.split('=');
            let (key, value) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
            if parts.next().is_some() {
                return Err(EtiquetaError::CommandSyntax(format!(
                    "command '{trimmed}' keyword arg '{token}' must have exactly one '='"
                )));
            }
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(EtiquetaError::CommandSyntax(format!(
                    "command '{trimmed}' keyword arg '{token}' has no valid key"
                )));
            }
            options.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            options,
            arg,
        })
    }

    /// Peek at the command name of `text` without a full parse. `None` when
    /// the text does not look like a command at all.
    pub fn name_of(text: &str) -> Option<&str> {
        let head = text.trim().split_whitespace().next()?;
        head.strip_prefix('#').filter(|n| !n.is_empty())
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Resolve a boolean option, accepting `true`/`True`/`false`/`False`.
    pub fn bool_option(&self, key: &str, default: bool) -> Result<bool, EtiquetaError> {
        match self.option(key) {
            None => Ok(default),
            Some("true") | Some("True") => Ok(true),
            Some("false") | Some("False") => Ok(false),
            Some(other) => Err(EtiquetaError::CommandSyntax(format!(
                "{key}='{other}' not a bool"
            ))),
        }
    }
}

/// Whitespace-split tokens with their byte offsets into the source.
fn tokens_with_offsets(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.split_whitespace()
        .map(move |token| (token.as_ptr() as usize - s.as_ptr() as usize, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_name_only() {
        let cmd = Command::parse("#style").unwrap();
        assert_eq!(cmd.name, "style");
        assert!(cmd.options.is_empty());
        assert_eq!(cmd.arg, "");
    }

    #[test]
    fn test_options_and_freetext() {
        let cmd = Command::parse("#code128 align=xMin quiet=false ACME-001").unwrap();
        assert_eq!(cmd.name, "code128");
        assert_eq!(cmd.option("align"), Some("xMin"));
        assert_eq!(cmd.option("quiet"), Some("false"));
        assert_eq!(cmd.arg, "ACME-001");
    }

    #[test]
    fn test_freetext_keeps_spaces_and_equals() {
        let cmd = Command::parse("#code128 quiet=true lot 7 = batch B").unwrap();
        assert_eq!(cmd.arg, "lot 7 = batch B");
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let cmd = Command::parse("#style fill=red fill=blue").unwrap();
        assert_eq!(cmd.option("fill"), Some("blue"));
        assert_eq!(cmd.options.len(), 1);
    }

    #[test]
    fn test_missing_hash_is_an_error() {
        assert!(Command::parse("code128 x=1").is_err());
        assert!(Command::parse("").is_err());
        assert!(Command::parse("#").is_err());
    }

    #[test]
    fn test_double_equals_in_option_position() {
        assert!(Command::parse("#style fill=a=b").is_err());
    }

    #[test]
    fn test_empty_option_key() {
        assert!(Command::parse("#style =red").is_err());
    }

    #[test]
    fn test_name_of() {
        assert_eq!(Command::name_of("  #code128 quiet=false 1"), Some("code128"));
        assert_eq!(Command::name_of("plain label text"), None);
        assert_eq!(Command::name_of(""), None);
    }

    #[test]
    fn test_bool_option() {
        let cmd = Command::parse("#code128 quiet=False").unwrap();
        assert_eq!(cmd.bool_option("quiet", true).unwrap(), false);
        assert_eq!(cmd.bool_option("absent", true).unwrap(), true);
        let bad = Command::parse("#code128 quiet=maybe").unwrap();
        assert!(bad.bool_option("quiet", true).is_err());
    }
}
