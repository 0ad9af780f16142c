// src/lint/php.rs

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::Linter;

/// Runs `php -l <file>`; a zero exit status means the file parses.
#[derive(Debug, Clone)]
pub struct PhpLinter {
    binary: String,
}

impl Default for PhpLinter {
    fn default() -> Self {
        Self {
            binary: "php".to_string(),
        }
    }
}

impl PhpLinter {
    /// Use a specific interpreter instead of `php` from `PATH`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Linter for PhpLinter {
    fn name(&self) -> &str {
        "php"
    }

    fn title(&self) -> &str {
        "Php Linter"
    }

    fn check(&self, path: &Path) -> bool {
        let output = Command::new(&self.binary)
            .arg("-l")
            .arg(path)
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                warn!(
                    ?path,
                    stdout = %String::from_utf8_lossy(&out.stdout).trim(),
                    "php lint failed"
                );
                false
            }
            Err(err) => {
                debug!(binary = %self.binary, error = %err, "could not run php linter");
                false
            }
        }
    }
}
