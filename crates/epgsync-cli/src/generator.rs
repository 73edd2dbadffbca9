//! Runs the external EPG grabber (`npm run grab` by default) as a subprocess.

use async_trait::async_trait;
use epgsync_config::GeneratorConfig;
use epgsync_core::{CoreError, GenerationRequest, GuideGenerator};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    output_file: PathBuf,
    env: BTreeMap<String, String>,
}

impl CommandGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            output_file: config.output_file.clone(),
            env: config.env.clone(),
        }
    }

    /// Arguments with `{channels}`, `{output}`, `{max_connections}` and `{days}` filled in.
    pub fn command_args(&self, request: &GenerationRequest) -> Vec<String> {
        let channels = relative_to(&request.channels_file, &self.working_dir);
        let channels = channels.display().to_string();
        let output = self.output_file.display().to_string();
        let max_connections = request.max_connections.to_string();
        let days = request.days.to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{channels}", &channels)
                    .replace("{output}", &output)
                    .replace("{max_connections}", &max_connections)
                    .replace("{days}", &days)
            })
            .collect()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_file)
    }
}

#[async_trait]
impl GuideGenerator for CommandGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<PathBuf, CoreError> {
        let args = self.command_args(request);
        info!(
            "Generating EPG guide: {} {} (in {:?})",
            self.program,
            args.join(" "),
            self.working_dir
        );

        let start = Instant::now();
        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .status()
            .await
            .map_err(|e| CoreError::Generation(format!("failed to start {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(CoreError::Generation(format!("{} exited with {}", self.program, status)));
        }

        let artifact = self.artifact_path();
        if !artifact.is_file() {
            return Err(CoreError::Generation(format!(
                "{} finished but {} was not created",
                self.program,
                artifact.display()
            )));
        }

        debug!("Guide generator finished in {:?}", start.elapsed());
        Ok(artifact)
    }
}

/// `path` as seen from `base` when it lies below it, otherwise absolute if possible.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    if let Ok(relative) = path.strip_prefix(base) {
        return relative.to_path_buf();
    }
    match (std::fs::canonicalize(path), std::fs::canonicalize(base)) {
        (Ok(path), Ok(base)) => match path.strip_prefix(&base) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path,
        },
        (Ok(path), Err(_)) => path,
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(channels_file: PathBuf) -> GenerationRequest {
        GenerationRequest {
            channels_file,
            max_connections: 3,
            days: 2,
        }
    }

    fn shell_generator(dir: &Path, script: &str) -> CommandGenerator {
        let config = GeneratorConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: dir.to_path_buf(),
            output_file: PathBuf::from("guide.xml"),
            ..GeneratorConfig::default()
        };
        CommandGenerator::from_config(&config)
    }

    #[test]
    fn test_default_arguments() {
        let config = GeneratorConfig::default();
        let generator = CommandGenerator::from_config(&config);
        let args = generator.command_args(&request(config.working_dir.join("channels.xml")));
        assert_eq!(
            args,
            vec![
                "run",
                "grab",
                "--",
                "--channels=channels.xml",
                "--output=guide.xml",
                "--maxConnections=3",
                "--days=2",
            ]
        );
    }

    #[test]
    fn test_channels_outside_working_dir_stay_usable() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("epg");
        std::fs::create_dir_all(&work).unwrap();
        let channels = dir.path().join("channels.xml");
        std::fs::write(&channels, "<channels/>").unwrap();

        let resolved = relative_to(&channels, &work);
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("channels.xml"));
    }

    #[tokio::test]
    async fn test_successful_run_returns_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let generator = shell_generator(dir.path(), "echo \"<tv days='{days}'/>\" > {output}");

        let artifact = generator
            .generate(&request(dir.path().join("channels.xml")))
            .await
            .unwrap();
        assert_eq!(artifact, dir.path().join("guide.xml"));
        assert!(std::fs::read_to_string(&artifact).unwrap().contains("days='2'"));
    }

    #[tokio::test]
    async fn test_env_is_passed_to_the_generator() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = shell_generator(dir.path(), "echo \"$EPG_MARKER\" > {output}");
        generator.env.insert("EPG_MARKER".to_string(), "from-config".to_string());

        let artifact = generator
            .generate(&request(dir.path().join("channels.xml")))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&artifact).unwrap().contains("from-config"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = shell_generator(dir.path(), "exit 3");
        let err = generator
            .generate(&request(dir.path().join("channels.xml")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Generation(_)));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = shell_generator(dir.path(), "true");
        let err = generator
            .generate(&request(dir.path().join("channels.xml")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("was not created"));
    }

    #[tokio::test]
    async fn test_unknown_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = shell_generator(dir.path(), "true");
        generator.program = "epgsync-no-such-program".to_string();
        let err = generator
            .generate(&request(dir.path().join("channels.xml")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
