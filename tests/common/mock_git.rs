//! In-memory git repository for workflow tests

use relflow::error::{Error, Result};
use relflow::git::Git;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Commit {
    parent: Option<String>,
    message: String,
    files: HashMap<PathBuf, String>,
}

#[derive(Debug, Clone)]
struct Tag {
    target: String,
    message: String,
}

/// Mock git collaborator
///
/// Features:
/// - Commits with parents, file contents and messages
/// - Branches, annotated tags, checked-out branch, remote branches
/// - Call tracking for every mutating operation
/// - Error injection per operation name
pub struct MockGit {
    next_sha: AtomicU64,
    commits: Mutex<HashMap<String, Commit>>,
    branches: Mutex<BTreeMap<String, String>>,
    tags: Mutex<BTreeMap<String, Tag>>,
    current: Mutex<String>,
    clean: Mutex<bool>,
    remote_branches: Mutex<HashSet<String>>,
    // Call tracking
    calls: Mutex<Vec<String>>,
    pushes: Mutex<Vec<Vec<String>>>,
    // Error injection
    failures: Mutex<HashMap<String, String>>,
}

impl MockGit {
    /// Repository with one commit on `main` holding `VERSION` = `version`
    pub fn new(version: &str) -> Self {
        let git = Self {
            next_sha: AtomicU64::new(0),
            commits: Mutex::new(HashMap::new()),
            branches: Mutex::new(BTreeMap::new()),
            tags: Mutex::new(BTreeMap::new()),
            current: Mutex::new("main".to_string()),
            clean: Mutex::new(true),
            remote_branches: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        };
        let root = git.new_commit(None, "Initial commit", HashMap::from([(
            PathBuf::from("VERSION"),
            format!("{version}\n"),
        )]));
        git.branches
            .lock()
            .unwrap()
            .insert("main".to_string(), root);
        git
    }

    fn new_commit(
        &self,
        parent: Option<String>,
        message: &str,
        files: HashMap<PathBuf, String>,
    ) -> String {
        let sha = format!("{:040x}", self.next_sha.fetch_add(1, Ordering::SeqCst) + 1);
        self.commits.lock().unwrap().insert(
            sha.clone(),
            Commit {
                parent,
                message: message.to_string(),
                files,
            },
        );
        sha
    }

    fn resolve(&self, rev: &str) -> Option<String> {
        if let Some(sha) = self.branches.lock().unwrap().get(rev) {
            return Some(sha.clone());
        }
        if let Some(tag) = self.tags.lock().unwrap().get(rev) {
            return Some(tag.target.clone());
        }
        self.commits
            .lock()
            .unwrap()
            .contains_key(rev)
            .then(|| rev.to_string())
    }

    fn ancestry(&self, sha: &str) -> Vec<String> {
        let commits = self.commits.lock().unwrap();
        let mut history = Vec::new();
        let mut next = Some(sha.to_string());
        while let Some(sha) = next {
            next = commits.get(&sha).and_then(|c| c.parent.clone());
            history.push(sha);
        }
        history
    }

    fn record(&self, op: &str, detail: String) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{op} {detail}"));
        match self.failures.lock().unwrap().get(op) {
            Some(msg) => Err(Error::Git(msg.clone())),
            None => Ok(()),
        }
    }

    // === Setup ===

    /// Add a commit on `branch` without recording a call
    pub fn commit(&self, branch: &str, message: &str) -> String {
        let parent = self.branches.lock().unwrap().get(branch).cloned();
        let files = parent
            .as_ref()
            .and_then(|p| self.commits.lock().unwrap().get(p).map(|c| c.files.clone()))
            .unwrap_or_default();
        let sha = self.new_commit(parent, message, files);
        self.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.clone());
        sha
    }

    /// Create branch `name` at `rev` without recording a call
    pub fn add_branch(&self, name: &str, rev: &str) {
        let sha = self.resolve(rev).expect("known revision");
        self.branches.lock().unwrap().insert(name.to_string(), sha);
    }

    /// Create tag `name` at `rev` without recording a call
    pub fn add_tag(&self, name: &str, rev: &str) {
        let target = self.resolve(rev).expect("known revision");
        self.tags.lock().unwrap().insert(
            name.to_string(),
            Tag {
                target,
                message: String::new(),
            },
        );
    }

    /// Check out `name` without recording a call
    pub fn set_current_branch(&self, name: &str) {
        *self.current.lock().unwrap() = name.to_string();
    }

    /// Mark the worktree dirty
    pub fn set_dirty(&self) {
        *self.clean.lock().unwrap() = false;
    }

    /// Pretend `name` exists on the remote
    pub fn add_remote_branch(&self, name: &str) {
        self.remote_branches.lock().unwrap().insert(name.to_string());
    }

    // === Error injection ===

    /// Make operation `op` (e.g. "push", "create_tag") fail with `msg`
    pub fn fail_on(&self, op: &str, msg: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op.to_string(), msg.to_string());
    }

    // === Inspection ===

    /// Every mutating call, formatted as "op args"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Refspecs of every successful push
    pub fn pushes(&self) -> Vec<Vec<String>> {
        self.pushes.lock().unwrap().clone()
    }

    /// Sha of branch `name`
    pub fn branch_sha(&self, name: &str) -> Option<String> {
        self.branches.lock().unwrap().get(name).cloned()
    }

    /// Checked-out branch
    pub fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    /// Message of tag `name`
    pub fn tag_message(&self, name: &str) -> Option<String> {
        self.tags.lock().unwrap().get(name).map(|t| t.message.clone())
    }

    /// Whether `name` exists on the remote
    pub fn has_remote_branch(&self, name: &str) -> bool {
        self.remote_branches.lock().unwrap().contains(name)
    }
}

impl Git for MockGit {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current())
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(*self.clean.lock().unwrap())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branches.lock().unwrap().contains_key(name))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.lock().unwrap().contains_key(name))
    }

    fn branches(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .branches
            .lock()
            .unwrap()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.resolve(rev)
            .ok_or_else(|| Error::Git(format!("unknown revision '{rev}'")))
    }

    fn create_branch(&self, name: &str, start: &str) -> Result<()> {
        self.record("create_branch", format!("{name} {start}"))?;
        if self.branches.lock().unwrap().contains_key(name) {
            return Err(Error::Git(format!("branch {name} already exists")));
        }
        let sha = self.rev_parse(start)?;
        self.branches.lock().unwrap().insert(name.to_string(), sha);
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.record("delete_branch", name.to_string())?;
        if *self.current.lock().unwrap() == name {
            return Err(Error::Git(format!("cannot delete checked-out branch {name}")));
        }
        self.branches
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::Git(format!("no branch {name}")))
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.record("checkout", name.to_string())?;
        if !self.branches.lock().unwrap().contains_key(name) {
            return Err(Error::Git(format!("no branch {name}")));
        }
        self.set_current_branch(name);
        Ok(())
    }

    fn reset_branch(&self, name: &str, sha: &str) -> Result<()> {
        self.record("reset_branch", format!("{name} {sha}"))?;
        let sha = self.rev_parse(sha)?;
        self.branches.lock().unwrap().insert(name.to_string(), sha);
        Ok(())
    }

    fn read_file(&self, rev: &str, path: &Path) -> Result<String> {
        let sha = self.rev_parse(rev)?;
        self.commits
            .lock()
            .unwrap()
            .get(&sha)
            .and_then(|c| c.files.get(path).cloned())
            .ok_or_else(|| Error::Git(format!("{} not found at {rev}", path.display())))
    }

    fn commit_file(
        &self,
        branch: &str,
        path: &Path,
        contents: &str,
        message: &str,
    ) -> Result<String> {
        self.record("commit_file", format!("{branch} {}", path.display()))?;
        let parent = self.rev_parse(branch)?;
        let mut files = self.commits.lock().unwrap()[&parent].files.clone();
        files.insert(path.to_path_buf(), contents.to_string());
        let sha = self.new_commit(Some(parent), message, files);
        self.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.clone());
        self.set_current_branch(branch);
        Ok(sha)
    }

    fn commit_messages(&self, range: &str) -> Result<Vec<String>> {
        let (from, to) = match range.split_once("..") {
            Some((from, to)) => (Some(self.rev_parse(from)?), to),
            None => (None, range),
        };
        let excluded: HashSet<String> = from
            .map(|sha| self.ancestry(&sha).into_iter().collect())
            .unwrap_or_default();
        let history = self.ancestry(&self.rev_parse(to)?);
        let commits = self.commits.lock().unwrap();
        Ok(history
            .into_iter()
            .filter(|sha| !excluded.contains(sha))
            .filter_map(|sha| commits.get(&sha).map(|c| c.message.clone()))
            .collect())
    }

    fn tags(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<()> {
        self.record("create_tag", format!("{name} {target}"))?;
        let target = self.rev_parse(target)?;
        self.tags.lock().unwrap().insert(
            name.to_string(),
            Tag {
                target,
                message: message.to_string(),
            },
        );
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.record("delete_tag", name.to_string())?;
        self.tags
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::Git(format!("no tag {name}")))
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        self.record("push", format!("{remote} {}", refspecs.join(" ")))?;
        let mut remote_branches = self.remote_branches.lock().unwrap();
        for refspec in refspecs {
            remote_branches.insert(refspec.trim_start_matches('+').to_string());
        }
        self.pushes.lock().unwrap().push(refspecs.to_vec());
        Ok(())
    }

    fn remote_branch_exists(&self, _remote: &str, name: &str) -> Result<bool> {
        Ok(self.has_remote_branch(name))
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.record("delete_remote_branch", format!("{remote} {name}"))?;
        self.remote_branches.lock().unwrap().remove(name);
        Ok(())
    }
}
