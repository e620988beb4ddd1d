//! Chat command grammar.
//!
//! ```text
//! <prefix><space><commandName>[<space><arg>]*
//! ```
//!
//! The command name is case-folded; arguments are whitespace-delimited with no
//! quoting or escaping.

/// Prefix used when the configuration does not name one.
pub const DEFAULT_PREFIX: &str = ".zybot";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Lower-cased command name.
    pub name: String,
    /// Positional arguments, in order.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Parse a raw chat message.
    ///
    /// Returns `None` when the message does not start with `prefix` followed by
    /// whitespace, or when nothing follows the prefix.
    pub fn parse(prefix: &str, raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(prefix)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_lowercase();
        let args = tokens.map(str::to_string).collect();

        Some(Self { name, args })
    }

    /// Arguments joined back with single spaces.
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}
