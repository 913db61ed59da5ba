//! Manifest loading: local file first, remote fetch as a fallback.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use super::RunConfig;
use super::manifest::Manifest;
use crate::error::ConfigError;
use crate::logging::Log;

/// Upper bound on the whole remote fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads a URL to a local file.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: Send + Sync {
    /// Write the body of `url` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, a non-success HTTP status, or
    /// a write failure.
    fn fetch(&self, url: &str, dest: &Path) -> anyhow::Result<()>;
}

/// [`Fetcher`] backed by a blocking `ureq` agent.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("GET {url}"))?;
        let mut reader = response.into_body().into_reader();
        let mut file =
            fs::File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
        std::io::copy(&mut reader, &mut file)
            .with_context(|| format!("downloading {url}"))?;
        file.flush()?;
        Ok(())
    }
}

/// Load the manifest named by `run`.
///
/// A local file at `run.config_path` wins.  Otherwise the manifest is fetched
/// from `run.config_url` into a temporary file and parsed from there.  A dry
/// run never fetches: a missing local file yields an empty manifest.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the local file cannot be read,
/// [`ConfigError::Unavailable`] if the fetch fails, and
/// [`ConfigError::Parse`] for malformed JSON from either source.
pub fn load(
    run: &RunConfig,
    fetcher: &dyn Fetcher,
    log: &dyn Log,
) -> Result<Manifest, ConfigError> {
    let path = &run.config_path;
    if path.exists() {
        log.info(&format!("loading manifest from {}", path.display()));
        return read_manifest(path, &path.display().to_string());
    }

    if run.dry_run {
        log.warn(&format!("manifest {} not found", path.display()));
        log.dry_run(&format!("would fetch manifest from {}", run.config_url));
        return Ok(Manifest::default());
    }

    log.warn(&format!(
        "manifest {} not found; fetching {}",
        path.display(),
        run.config_url
    ));
    let unavailable = |reason: String| ConfigError::Unavailable {
        path: path.clone(),
        url: run.config_url.clone(),
        reason,
    };
    let staged = tempfile::Builder::new()
        .prefix("workstation-manifest-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| unavailable(format!("cannot create temporary file: {e}")))?;
    fetcher
        .fetch(&run.config_url, staged.path())
        .map_err(|e| unavailable(format!("{e:#}")))?;
    log.debug(&format!("manifest staged at {}", staged.path().display()));
    read_manifest(staged.path(), &run.config_url)
}

fn read_manifest(path: &Path, origin: &str) -> Result<Manifest, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Manifest::parse(&content, origin)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::RecordingLog;
    use mockall::predicate::eq;

    fn run_config(dir: &Path, dry_run: bool) -> RunConfig {
        RunConfig {
            dry_run,
            config_path: dir.join("tools.json"),
            config_url: "https://example.invalid/tools.json".to_string(),
            log_path: dir.join("install.log"),
            ..RunConfig::default()
        }
    }

    fn no_fetch() -> MockFetcher {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().never();
        fetcher
    }

    #[test]
    fn local_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_config(dir.path(), false);
        fs::write(&run.config_path, r#"{"linux": {"apt_packages": ["nmap"]}}"#).unwrap();
        let manifest = load(&run, &no_fetch(), &RecordingLog::default()).unwrap();
        assert_eq!(manifest.linux.apt_packages, ["nmap"]);
    }

    #[test]
    fn malformed_local_file_fails_in_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        for dry_run in [false, true] {
            let run = run_config(dir.path(), dry_run);
            fs::write(&run.config_path, "{ not json").unwrap();
            let err = load(&run, &no_fetch(), &RecordingLog::default()).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }), "dry_run={dry_run}");
        }
    }

    #[test]
    fn unreadable_local_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunConfig {
            config_path: dir.path().to_path_buf(),
            ..run_config(dir.path(), false)
        };
        let err = load(&run, &no_fetch(), &RecordingLog::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn missing_local_file_fetches_remote() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_config(dir.path(), false);
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("https://example.invalid/tools.json"), mockall::predicate::always())
            .times(1)
            .returning(|_, dest| {
                fs::write(dest, r#"{"windows": [{"name": "Git", "id": "Git.Git"}]}"#)?;
                Ok(())
            });
        let log = RecordingLog::default();
        let manifest = load(&run, &fetcher, &log).unwrap();
        assert_eq!(manifest.windows[0].id, "Git.Git");
        assert_eq!(log.messages("warn").len(), 1);
    }

    #[test]
    fn fetch_failure_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_config(dir.path(), false);
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));
        let err = load(&run, &fetcher, &RecordingLog::default()).unwrap_err();
        match err {
            ConfigError::Unavailable { reason, url, .. } => {
                assert!(reason.contains("connection refused"));
                assert_eq!(url, "https://example.invalid/tools.json");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn malformed_remote_manifest_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_config(dir.path(), false);
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|_, dest| {
            fs::write(dest, "<html>not found</html>")?;
            Ok(())
        });
        let err = load(&run, &fetcher, &RecordingLog::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin.starts_with("https://")));
    }

    #[test]
    fn dry_run_missing_file_is_empty_without_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_config(dir.path(), true);
        let log = RecordingLog::default();
        let manifest = load(&run, &no_fetch(), &log).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(
            log.messages("dry_run"),
            ["would fetch manifest from https://example.invalid/tools.json"]
        );
    }
}
