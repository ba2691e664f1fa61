//! Git backend using the system `git` binary

use super::Git;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

/// Git repository driven through `git` subprocesses
#[derive(Debug, Clone)]
pub struct SystemGit {
    work_tree: PathBuf,
}

impl SystemGit {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(|e| Error::Git(format!("failed to execute git: {e}")))?;

        if !output.status.success() {
            return Err(Error::Git(format!(
                "{} is not a git repository: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Self {
            work_tree: PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()),
        })
    }

    /// Root of the working tree
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(?args, "git");
        Command::new("git")
            .arg("-C")
            .arg(&self.work_tree)
            .args(args)
            .output()
            .map_err(|e| Error::Git(format!("failed to execute git: {e}")))
    }

    /// Run git, failing on a non-zero exit; returns trimmed stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run git, reporting only whether it exited successfully
    fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args)?.status.success())
    }
}

impl Git for SystemGit {
    fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self
            .run(&["status", "--porcelain", "--untracked-files=no"])?
            .is_empty())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        self.succeeds(&["show-ref", "--verify", "--quiet", &format!("refs/heads/{name}")])
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        self.succeeds(&["show-ref", "--verify", "--quiet", &format!("refs/tags/{name}")])
    }

    fn branches(&self, prefix: &str) -> Result<Vec<String>> {
        let out = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(out
            .lines()
            .filter(|name| name.starts_with(prefix))
            .map(ToString::to_string)
            .collect())
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")])
            .map_err(|_| Error::Git(format!("unknown revision '{rev}'")))
    }

    fn create_branch(&self, name: &str, start: &str) -> Result<()> {
        self.run(&["branch", name, start]).map(|_| ())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-D", name]).map(|_| ())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-q", name]).map(|_| ())
    }

    fn reset_branch(&self, name: &str, sha: &str) -> Result<()> {
        if self.current_branch()? == name {
            self.run(&["reset", "-q", "--hard", sha]).map(|_| ())
        } else {
            self.run(&["branch", "-f", name, sha]).map(|_| ())
        }
    }

    fn read_file(&self, rev: &str, path: &Path) -> Result<String> {
        let spec = format!("{rev}:{}", path.to_string_lossy().replace('\\', "/"));
        self.run(&["show", &spec])
    }

    fn commit_file(
        &self,
        branch: &str,
        path: &Path,
        contents: &str,
        message: &str,
    ) -> Result<String> {
        self.checkout(branch)?;
        fs::write(self.work_tree.join(path), contents)?;
        let path_arg = path.to_string_lossy();
        let committed = self
            .run(&["add", "--", &path_arg])
            .and_then(|_| self.run(&["commit", "-q", "-m", message]));
        if let Err(e) = committed {
            // Drop the staged edit so the failed step leaves nothing behind
            if let Err(restore) = self.run(&["checkout", "-q", "HEAD", "--", &path_arg]) {
                warn!(path = %path_arg, error = %restore, "failed to restore file");
            }
            return Err(e);
        }
        self.rev_parse("HEAD")
    }

    fn commit_messages(&self, range: &str) -> Result<Vec<String>> {
        let out = self.run(&["log", "--format=%B%x00", range])?;
        Ok(out
            .split('\0')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    fn tags(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{prefix}*");
        let out = self.run(&["tag", "--list", &pattern])?;
        Ok(out.lines().map(ToString::to_string).collect())
    }

    fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", name, "-m", message, target])
            .map(|_| ())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", "-d", name]).map(|_| ())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut args = vec!["push", "--atomic", remote];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).map(|_| ())
    }

    fn remote_branch_exists(&self, remote: &str, name: &str) -> Result<bool> {
        let output = self.output(&["ls-remote", "--exit-code", "--heads", remote, name])?;
        match output.status.code() {
            Some(0) => Ok(true),
            // ls-remote --exit-code uses 2 for "no matching refs"
            Some(2) => Ok(false),
            _ => Err(Error::Git(format!(
                "git ls-remote {remote} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.run(&["push", remote, "--delete", name]).map(|_| ())
    }
}
