use serde::{Deserialize, Serialize};

/// A `scripts` entry: one command line or a list run in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Script {
    Single(String),
    List(Vec<String>),
}

impl Script {
    pub fn commands(&self) -> Vec<&str> {
        match self {
            Script::Single(cmd) => vec![cmd.as_str()],
            Script::List(cmds) => cmds.iter().map(String::as_str).collect(),
        }
    }
}

/// Events pakt fires itself after installing or updating.
pub const POST_INSTALL_CMD: &str = "post-install-cmd";
pub const POST_UPDATE_CMD: &str = "post-update-cmd";

/// How a single script line is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    /// `@other-script`: run another entry from `scripts`.
    Reference(String),
    /// `Vendor\Class::method`: a static PHP callback.
    PhpCallback(String),
    /// Anything else, run through the shell. `@php` is already expanded.
    Shell(String),
}

impl ScriptCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("@php") {
            if rest.is_empty() || rest.starts_with(' ') {
                return ScriptCommand::Shell(format!("php{rest}"));
            }
        }
        if let Some(name) = line.strip_prefix('@') {
            return ScriptCommand::Reference(name.to_string());
        }
        if is_php_callback(line) {
            return ScriptCommand::PhpCallback(line.to_string());
        }
        ScriptCommand::Shell(line.to_string())
    }
}

/// `Foo\Bar::baz` with no whitespace and identifier characters on both sides.
fn is_php_callback(line: &str) -> bool {
    let Some((class, method)) = line.split_once("::") else {
        return false;
    };
    let ident = |s: &str, allow_ns: bool| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || (allow_ns && c == '\\'))
    };
    ident(class, true) && ident(method, false)
}
