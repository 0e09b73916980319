use std::io::ErrorKind;
use std::path::PathBuf;

use capsule_task::ResultEnvelope;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Result, RunnerError};

/// What to run and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Task file, relative to `cwd`.
    pub file: PathBuf,

    /// Extra arguments passed after `--json`.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; the current directory when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// The capsule executable.
    #[serde(default = "default_capsule_path")]
    pub capsule_path: PathBuf,
}

fn default_capsule_path() -> PathBuf {
    PathBuf::from("capsule")
}

impl RunnerOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            args: Vec::new(),
            cwd: None,
            capsule_path: default_capsule_path(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_capsule_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.capsule_path = path.into();
        self
    }

    /// The absolute working directory for the CLI.
    pub fn resolved_cwd(&self) -> Result<PathBuf> {
        let current = std::env::current_dir()?;
        Ok(match &self.cwd {
            Some(cwd) => current.join(cwd),
            None => current,
        })
    }

    /// The task file as an absolute path, resolved against the working
    /// directory.
    pub fn resolved_file(&self) -> Result<PathBuf> {
        Ok(self.resolved_cwd()?.join(&self.file))
    }
}

/// Run a task file with `capsule run <file> --json <args...>` and decode the
/// result envelope it prints.
pub async fn run(options: &RunnerOptions) -> Result<ResultEnvelope> {
    let cwd = options.resolved_cwd()?;
    let file = cwd.join(&options.file);

    let mut command = Command::new(&options.capsule_path);
    command.arg("run").arg(&file).arg("--json").args(&options.args);
    if options.cwd.is_some() {
        command.current_dir(&cwd);
    }

    tracing::debug!(
        capsule = %options.capsule_path.display(),
        file = %file.display(),
        "running capsule task file"
    );

    let output = match command.output().await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RunnerError::CliNotFound {
                path: options.capsule_path.display().to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() && stdout.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let message = if stderr.trim().is_empty() {
            format!("capsule exited with {}", output.status)
        } else {
            stderr
        };
        return Err(RunnerError::Failed { message });
    }

    serde_json::from_str(&stdout).map_err(|_| RunnerError::Parse { output: stdout })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let options = RunnerOptions::new("main.py");
        assert_eq!(options.capsule_path, PathBuf::from("capsule"));
        assert!(options.args.is_empty());
        assert!(options.cwd.is_none());

        let decoded: RunnerOptions = serde_json::from_str(r#"{"file": "main.ts"}"#).unwrap();
        assert_eq!(decoded, RunnerOptions::new("main.ts"));
    }

    #[test]
    fn file_is_resolved_against_cwd() {
        let options = RunnerOptions::new("tasks/main.py").with_cwd("/srv/app");
        assert_eq!(
            options.resolved_file().unwrap(),
            PathBuf::from("/srv/app/tasks/main.py")
        );

        let absolute = RunnerOptions::new("/opt/main.py").with_cwd("/srv/app");
        assert_eq!(absolute.resolved_file().unwrap(), PathBuf::from("/opt/main.py"));
    }

    #[tokio::test]
    async fn missing_cli_is_reported() {
        let options = RunnerOptions::new("main.py")
            .with_capsule_path("/definitely/not/here/capsule");
        let err = run(&options).await.unwrap_err();
        assert!(matches!(err, RunnerError::CliNotFound { .. }));
    }

    #[cfg(unix)]
    mod with_fake_cli {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_cli(dir: &TempDir, script: &str) -> PathBuf {
            let path = dir.path().join("capsule");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn decodes_the_envelope_and_passes_arguments() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(
                &dir,
                r#"printf '{"success":true,"result":"%s","error":null,"execution":{"task_name":"main","duration_ms":5,"retries":0,"fuel_consumed":42}}' "$*""#,
            );

            let options = RunnerOptions::new("main.py")
                .with_cwd(dir.path())
                .with_args(["--verbose"])
                .with_capsule_path(&cli);
            let envelope = run(&options).await.unwrap();

            let expected = format!("run {} --json --verbose", dir.path().join("main.py").display());
            assert!(envelope.success);
            assert_eq!(envelope.result, serde_json::json!(expected));
            assert_eq!(envelope.execution.fuel_consumed, 42);
        }

        #[tokio::test]
        async fn relative_cwd_is_made_absolute() {
            let dir = tempfile::Builder::new()
                .prefix("runner-cwd")
                .tempdir_in(".")
                .unwrap();
            std::fs::write(dir.path().join("main.py"), "").unwrap();
            let cli = fake_cli(
                &dir,
                r#"if [ -f "$2" ]; then
  echo '{"success":true,"result":"found","error":null,"execution":{"task_name":"main","duration_ms":0,"retries":0,"fuel_consumed":0}}'
else
  echo "missing $2" >&2
  exit 1
fi"#,
            );
            let relative = PathBuf::from(dir.path().file_name().unwrap());

            let options = RunnerOptions::new("main.py")
                .with_cwd(&relative)
                .with_capsule_path(std::fs::canonicalize(&cli).unwrap());
            assert!(options.resolved_file().unwrap().is_absolute());

            let envelope = run(&options).await.unwrap();
            assert_eq!(envelope.result, serde_json::json!("found"));
        }

        #[tokio::test]
        async fn failure_without_output_uses_stderr() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(&dir, "echo 'task file not found' >&2\nexit 2");

            let options = RunnerOptions::new("missing.py").with_capsule_path(&cli);
            let err = run(&options).await.unwrap_err();
            match err {
                RunnerError::Failed { message } => assert_eq!(message.trim(), "task file not found"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn failure_with_envelope_is_decoded() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(
                &dir,
                r#"echo '{"success":false,"result":null,"error":{"error_type":"Timeout","message":"timed out"},"execution":{"task_name":"main","duration_ms":1000,"retries":2,"fuel_consumed":0}}'
exit 1"#,
            );

            let options = RunnerOptions::new("main.py").with_capsule_path(&cli);
            let envelope = run(&options).await.unwrap();
            assert!(!envelope.success);
            assert_eq!(envelope.error.unwrap().error_type, "Timeout");
            assert_eq!(envelope.execution.retries, 2);
        }

        #[tokio::test]
        async fn unparseable_output() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(&dir, "echo 'Hello from a print statement'");

            let options = RunnerOptions::new("main.py").with_capsule_path(&cli);
            let err = run(&options).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                "Failed to parse Capsule output: Hello from a print statement\n"
            );
        }
    }
}
