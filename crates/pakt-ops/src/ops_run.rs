//! Operation: run scripts from the manifest's `scripts` section.
//!
//! `@other` runs another script, `Vendor\Class::method` is invoked through
//! `php -r` with the generated autoloader loaded, and everything else goes
//! through `sh -c` with `<vendor>/bin` first on `PATH`. Inside a list a
//! failing command is reported and the remaining commands still run.

use std::path::Path;

use pakt_core::package::Project;
use pakt_core::scripts::{Script, ScriptCommand};
use pakt_util::errors::PaktError;
use pakt_util::process::CommandBuilder;
use pakt_util::progress::{status, status_warn};

/// Options for `pakt run`.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub script: String,
    /// Extra arguments appended to shell commands.
    pub args: Vec<String>,
}

/// Run a named script; it must exist.
pub fn run(project_root: &Path, opts: &RunOptions) -> miette::Result<()> {
    let (project, _) = crate::load_project(project_root)?;
    if !project.manifest.scripts.contains_key(&opts.script) {
        let available: Vec<&str> = project.manifest.scripts.keys().map(String::as_str).collect();
        let hint = if available.is_empty() {
            String::new()
        } else {
            format!(" (available: {})", available.join(", "))
        };
        return Err(PaktError::Script {
            message: format!(
                "Script '{}' is not defined in composer.json{hint}",
                opts.script
            ),
        }
        .into());
    }
    ScriptRunner::new(&project)
        .with_args(opts.args.clone())
        .run_event(&opts.script)?;
    Ok(())
}

pub struct ScriptRunner<'a> {
    project: &'a Project,
    args: Vec<String>,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Run the script registered for `event`. Returns `false` when the
    /// manifest defines none.
    pub fn run_event(&self, event: &str) -> miette::Result<bool> {
        self.run_nested(event, &mut Vec::new())
    }

    fn run_nested(&self, event: &str, stack: &mut Vec<String>) -> miette::Result<bool> {
        let Some(script) = self.project.manifest.scripts.get(event) else {
            return Ok(false);
        };
        if stack.iter().any(|s| s == event) {
            stack.push(event.to_string());
            return Err(PaktError::Script {
                message: format!("script '{event}' references itself: {}", stack.join(" -> ")),
            }
            .into());
        }

        stack.push(event.to_string());
        status("Running", &format!("script {event}"));
        match script {
            Script::Single(line) => self.execute(line, stack)?,
            Script::List(lines) => {
                for line in lines {
                    if let Err(e) = self.execute(line, stack) {
                        status_warn("Failed", &e.to_string());
                    }
                }
            }
        }
        stack.pop();
        Ok(true)
    }

    fn execute(&self, line: &str, stack: &mut Vec<String>) -> miette::Result<()> {
        match ScriptCommand::parse(line) {
            ScriptCommand::Reference(name) => {
                if !self.run_nested(&name, stack)? {
                    tracing::warn!("referenced script '{name}' is not defined");
                }
                Ok(())
            }
            ScriptCommand::PhpCallback(callback) => {
                let autoload = self.project.vendor_dir().join("autoload.php");
                if !autoload.is_file() {
                    return Err(PaktError::Script {
                        message: format!(
                            "cannot call PHP class {callback} because {} is missing",
                            autoload.display()
                        ),
                    }
                    .into());
                }
                let code = format!("require '{}'; {callback}();", autoload.display());
                self.spawn(CommandBuilder::new("php").arg("-r").arg(code))
            }
            ScriptCommand::Shell(command) => {
                let mut command = command;
                for arg in &self.args {
                    command.push(' ');
                    command.push_str(&shell_quote(arg));
                }
                self.spawn(CommandBuilder::new("sh").arg("-c").arg(command))
            }
        }
    }

    fn spawn(&self, cmd: CommandBuilder) -> miette::Result<()> {
        let cmd = cmd
            .prepend_path(&self.project.vendor_dir().join("bin"))
            .cwd(&self.project.root_dir);
        let exit = cmd.run()?;
        if exit.success() {
            return Ok(());
        }
        Err(PaktError::Script {
            message: format!("`{}` failed with {exit}", cmd.display()),
        }
        .into())
    }
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
