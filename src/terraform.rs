//! Thin wrapper around the `terraform` binary
//!
//! Only three commands are needed: `plan -out` to produce a plan file,
//! `show -json` to turn a binary plan into the JSON document the estimator
//! reads, and `apply` to run an approved plan.

use crate::error::{CostGuardError, Result};
use crate::plan::{looks_like_json, parse_plan_json, Plan};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Terraform {
    binary: PathBuf,
    working_dir: PathBuf,
}

impl Terraform {
    /// Locate `binary` on PATH (or use it as a path) and run in `working_dir`
    pub fn locate(binary: &str, working_dir: Option<&Path>) -> Result<Self> {
        let binary = which::which(binary).map_err(|e| CostGuardError::Terraform {
            command: binary.to_string(),
            message: format!(
                "binary not found ({})\n\n  Install Terraform or set terraform.binary in the config file",
                e
            ),
        })?;
        let working_dir = working_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!("Using {} in {}", binary.display(), working_dir.display());
        Ok(Self {
            binary,
            working_dir,
        })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// `terraform plan -input=false -out=<plan_file> [extra_args]`
    ///
    /// Terraform's own output is passed through to the terminal. `plan_file`
    /// is relative to the working directory, as `show_json` and `apply` expect.
    pub fn plan(&self, plan_file: &str, extra_args: &[String]) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("plan")
            .arg("-input=false")
            .arg(format!("-out={}", plan_file))
            .args(extra_args);
        self.run_inherited(cmd, "plan")
    }

    /// `terraform show -json <plan_file>`, returning the JSON bytes
    pub fn show_json(&self, plan_file: &Path) -> Result<Vec<u8>> {
        let mut cmd = self.command();
        cmd.arg("show").arg("-json").arg(plan_file);
        info!("Executing: {:?}", cmd);

        let output = cmd.output().map_err(|e| self.spawn_error("show", e))?;
        if !output.status.success() {
            return Err(CostGuardError::Terraform {
                command: "terraform show -json".to_string(),
                message: format!(
                    "exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(output.stdout)
    }

    /// `terraform apply -input=false <plan_file>`
    pub fn apply(&self, plan_file: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("apply").arg("-input=false").arg(plan_file);
        self.run_inherited(cmd, "apply")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.working_dir);
        cmd
    }

    fn run_inherited(&self, mut cmd: Command, name: &str) -> Result<()> {
        info!("Executing: {:?}", cmd);
        let status = cmd.status().map_err(|e| self.spawn_error(name, e))?;
        if !status.success() {
            return Err(CostGuardError::Terraform {
                command: format!("terraform {}", name),
                message: format!("exited with code {:?}", status.code()),
            });
        }
        Ok(())
    }

    fn spawn_error(&self, name: &str, e: std::io::Error) -> CostGuardError {
        CostGuardError::Terraform {
            command: format!("terraform {}", name),
            message: format!("failed to execute {}: {}", self.binary.display(), e),
        }
    }
}

/// Load a plan from a JSON file, or from a binary plan via `terraform show -json`
pub fn load_plan(path: &Path, terraform_binary: &str) -> Result<Plan> {
    let data = std::fs::read(path)?;
    if looks_like_json(&data) {
        return parse_plan_json(&data).map_err(|e| match e {
            CostGuardError::Parse { source, .. } => {
                CostGuardError::parse(path.display().to_string(), source)
            }
            other => other,
        });
    }

    debug!("{} is not JSON, converting with terraform show", path.display());
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let terraform = Terraform::locate(terraform_binary, dir)?;
    let file_name = path.file_name().map(PathBuf::from).unwrap_or_else(|| path.to_path_buf());
    let json = terraform.show_json(&file_name)?;
    parse_plan_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_missing_binary() {
        let err = Terraform::locate("costguard-no-such-terraform-binary", None).unwrap_err();
        assert!(matches!(err, CostGuardError::Terraform { .. }));
        assert!(err.to_string().contains("binary not found"));
    }

    #[test]
    fn test_load_plan_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plan.json");
        std::fs::write(
            &path,
            r#"{"format_version": "1.2", "resource_changes": []}"#,
        )
        .unwrap();

        let plan = load_plan(&path, "costguard-no-such-terraform-binary").unwrap();
        assert_eq!(plan.format_version, "1.2");
    }

    #[test]
    fn test_load_plan_invalid_json_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{\"resource_changes\": [").unwrap();

        let err = load_plan(&path, "terraform").unwrap_err();
        assert!(matches!(err, CostGuardError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_load_binary_plan_without_terraform() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tfplan");
        std::fs::write(&path, b"PK\x03\x04not-json").unwrap();

        let err = load_plan(&path, "costguard-no-such-terraform-binary").unwrap_err();
        assert!(matches!(err, CostGuardError::Terraform { .. }));
    }

    #[cfg(unix)]
    fn stub_terraform(dir: &Path, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("terraform-stub");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> calls.log\n\
                 if [ \"$1\" = show ]; then echo '{{\"format_version\": \"1.2\"}}'; fi\n\
                 exit {}\n",
                exit_code
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_show_apply_run_in_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        let script = stub_terraform(temp_dir.path(), 0);
        let tf = Terraform::locate(script.to_str().unwrap(), Some(temp_dir.path())).unwrap();

        tf.plan("tfplan", &["-var=size=large".to_string()]).unwrap();
        let json = tf.show_json(Path::new("tfplan")).unwrap();
        assert_eq!(parse_plan_json(&json).unwrap().format_version, "1.2");
        tf.apply(Path::new("tfplan")).unwrap();

        let log = std::fs::read_to_string(temp_dir.path().join("calls.log")).unwrap();
        let calls: Vec<&str> = log.lines().collect();
        assert_eq!(
            calls,
            vec![
                "plan -input=false -out=tfplan -var=size=large",
                "show -json tfplan",
                "apply -input=false tfplan",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_failure_is_terraform_error() {
        let temp_dir = TempDir::new().unwrap();
        let script = stub_terraform(temp_dir.path(), 1);
        let tf = Terraform::locate(script.to_str().unwrap(), Some(temp_dir.path())).unwrap();

        let err = tf.plan("tfplan", &[]).unwrap_err();
        assert!(matches!(err, CostGuardError::Terraform { .. }));
        assert!(err.to_string().contains("terraform plan"));
    }
}
