// Shared helpers for integration tests.
//
// Provides recording doubles for the logger, the process executor, and the
// manifest fetcher, plus a fluent builder that stages a manifest and an
// os-release file in a temporary directory and drives the install command.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use workstation_cli::commands;
use workstation_cli::config::loader::Fetcher;
use workstation_cli::config::{RetryPolicy, RunConfig};
use workstation_cli::error::SetupError;
use workstation_cli::exec::{ExecResult, Executor, command_line};
use workstation_cli::logging::Log;
use workstation_cli::platform::{Os, PlatformResolver};
use workstation_cli::tasks::{InvokingUser, Summary};

/// [`Log`] that keeps every `(level, message)` pair.
#[derive(Debug, Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLog {
    fn push(&self, level: &'static str, msg: &str) {
        self.entries
            .lock()
            .expect("log mutex")
            .push((level, msg.to_string()));
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        self.entries.lock().expect("log mutex").clone()
    }

    pub fn messages(&self, level: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn fatal(&self, msg: &str) {
        self.push("fatal", msg);
    }
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
}

/// Executor with scripted behaviour.
///
/// `id -u` prints the configured uid; programs in `present` are found by
/// `which`; command lines containing a registered failure pattern exit with
/// its code.  Everything else succeeds.  Every command line is recorded.
#[derive(Debug)]
pub struct ScriptedExecutor {
    uid: String,
    present: HashSet<String>,
    failures: Vec<(String, i32)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            uid: "0".to_string(),
            present: HashSet::new(),
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn uid(mut self, uid: &str) -> Self {
        self.uid = uid.to_string();
        self
    }

    pub fn present(mut self, programs: &[&str]) -> Self {
        self.present.extend(programs.iter().map(ToString::to_string));
        self
    }

    pub fn failing(mut self, pattern: &str, code: i32) -> Self {
        self.failures.push((pattern.to_string(), code));
        self
    }

    /// Command lines run so far, excluding the elevation probe.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls mutex")
            .iter()
            .filter(|c| c.as_str() != "id -u")
            .cloned()
            .collect()
    }

    fn respond(&self, program: &str, args: &[&str]) -> ExecResult {
        let line = command_line(program, args);
        self.calls.lock().expect("calls mutex").push(line.clone());
        if line == "id -u" {
            return ExecResult {
                stdout: format!("{}\n", self.uid),
                stderr: String::new(),
                success: true,
                code: Some(0),
            };
        }
        let code = self
            .failures
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map_or(0, |(_, c)| *c);
        ExecResult {
            stdout: String::new(),
            stderr: if code == 0 {
                String::new()
            } else {
                "E: scripted failure".to_string()
            },
            success: code == 0,
            code: Some(code),
        }
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.respond(program, args);
        if !result.success {
            anyhow::bail!("{program} failed (exit {:?})", result.code);
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.respond(program, args))
    }

    fn which(&self, program: &str) -> bool {
        self.present.contains(program)
    }
}

/// Fetcher that serves a fixed body, or fails, and counts calls.
#[derive(Debug, Default)]
pub struct TestFetcher {
    body: Option<String>,
    calls: AtomicUsize,
}

impl TestFetcher {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for TestFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => {
                std::fs::write(dest, body)?;
                Ok(())
            }
            None => anyhow::bail!("GET {url}: connection refused"),
        }
    }
}

/// Everything a finished run left behind.
pub struct RunResult {
    pub result: Result<Summary, SetupError>,
    pub log: Arc<RecordingLog>,
    pub executor: Arc<ScriptedExecutor>,
    pub fetcher: TestFetcher,
    _dir: tempfile::TempDir,
}

/// Fluent builder for an install run in an isolated temp directory.
pub struct InstallRun {
    dir: tempfile::TempDir,
    os: Option<Os>,
    os_release: Option<String>,
    manifest: Option<String>,
    dry_run: bool,
    invoking_user: Option<InvokingUser>,
    executor: ScriptedExecutor,
    fetcher: TestFetcher,
}

impl InstallRun {
    /// An elevated Ubuntu host with no manifest, no invoking user, and an
    /// unreachable URL.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            os: Some(Os::Linux),
            os_release: Some("NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n".to_string()),
            manifest: None,
            dry_run: false,
            invoking_user: None,
            executor: ScriptedExecutor::new(),
            fetcher: TestFetcher::unreachable(),
        }
    }

    pub fn os(mut self, os: Option<Os>) -> Self {
        self.os = os;
        self
    }

    pub fn os_release(mut self, content: &str) -> Self {
        self.os_release = Some(content.to_string());
        self
    }

    pub fn manifest(mut self, json: &str) -> Self {
        self.manifest = Some(json.to_string());
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Run as if started via `sudo` by `name`.
    pub fn sudo_user(mut self, name: &str) -> Self {
        self.invoking_user = Some(InvokingUser {
            name: name.to_string(),
            via_sudo: true,
        });
        self
    }

    pub fn executor(mut self, executor: ScriptedExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn fetcher(mut self, fetcher: TestFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Stage the files and run the install command.
    pub fn run(self) -> RunResult {
        let os_release = self.path("os-release");
        if let Some(content) = &self.os_release {
            std::fs::write(&os_release, content).expect("write os-release");
        }
        let config_path = self.path("tools.json");
        if let Some(json) = &self.manifest {
            std::fs::write(&config_path, json).expect("write manifest");
        }

        let run = RunConfig {
            dry_run: self.dry_run,
            config_path,
            config_url: "https://example.invalid/tools.json".to_string(),
            log_path: self.path("install.log"),
            retry: RetryPolicy {
                attempts: 0,
                delay: std::time::Duration::ZERO,
            },
            invoking_user: self.invoking_user.clone(),
        };
        let log = Arc::new(RecordingLog::default());
        let executor = Arc::new(self.executor);
        let resolver = PlatformResolver::new(self.os, &os_release);

        let result = commands::install::run(
            &run,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::clone(&executor) as Arc<dyn Executor>,
            &self.fetcher,
            &resolver,
        );

        RunResult {
            result,
            log,
            executor,
            fetcher: self.fetcher,
            _dir: self.dir,
        }
    }
}
