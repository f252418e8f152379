//! Common test utilities and helpers
//!
//! Reusable builders for running the binary against an isolated
//! configuration.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables that would leak the developer's own account into tests
const ISOLATED_ENV: [&str; 3] = [
    "COSMOS_ENDPOINT_URI",
    "COSMOS_AUTH_TOKEN",
    "COSMOS_CONSOLE_CONFIG",
];

/// Test command builder for the cosmos-console binary
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    /// Create a new test command with account-related environment cleared
    pub fn new() -> Self {
        let mut cmd =
            Command::cargo_bin("cosmos-console").expect("Failed to find cosmos-console binary");
        for key in ISOLATED_ENV {
            cmd.env_remove(key);
        }
        cmd.env_remove("RUST_LOG");
        Self { cmd }
    }

    /// Add arguments to the command
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    /// Add a single argument to the command
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    /// Set environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect the given exit code
    pub fn expect_code(mut self, code: i32) -> TestAssertion {
        let assert = self.cmd.assert().code(code);
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    /// Assert stdout contains text
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert stderr contains text
    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert multiple stdout patterns
    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    /// Assert nothing was written to stdout
    pub fn stdout_empty(self) -> Self {
        let assert = self.assert.stdout(predicate::str::is_empty());
        Self { assert }
    }

    /// Finish the assertion
    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// Test environment with its own configuration file
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment; the config file does not exist yet
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");

        Self {
            temp_dir,
            config_path,
        }
    }

    /// Create an environment whose configuration points at `endpoint`
    pub fn with_endpoint(endpoint: &str) -> Self {
        let env = Self::new();
        env.write_config(&format!(
            "[store]\nendpoint_uri = \"{}\"\nauth_token = \"test-token\"\nmax_retry_attempts = 0\n",
            endpoint
        ));
        env
    }

    /// Write the configuration file
    pub fn write_config(&self, content: &str) {
        std::fs::write(&self.config_path, content).expect("Failed to write config file");
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Create a command configured for this environment
    pub fn command(&self) -> TestCommand {
        TestCommand::new()
            .arg("--config")
            .arg(self.config_path().to_string_lossy().as_ref())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
