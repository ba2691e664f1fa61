//! Release lifecycle: start, stage, close

use super::version::{next_trunk_version, parse_version, release_version};
use super::{Workflow, actions, render_release_notes};
use crate::action::{Action, ActionChain, Noop};
use crate::error::{Error, Result};
use crate::git::story_ids;
use crate::tracker::{
    StoryState, close_milestones, ensure_closable, ensure_stageable, label_stories,
};
use crate::types::Story;
use semver::Version;
use std::fmt;
use tracing::debug;

/// Where a release is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    /// No release branch yet
    NotStarted,
    /// Release branch exists
    Running,
    /// The stage branch points at the release branch head
    Staged,
    /// The release tag exists
    Closed,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Staged => "staged",
            Self::Closed => "closed",
        })
    }
}

/// Outcome of `release start`
#[derive(Debug, Clone)]
pub struct StartedRelease {
    /// Released version
    pub version: Version,
    /// New release branch
    pub branch: String,
    /// Version now on trunk
    pub trunk_version: Version,
    /// Candidate stories, all carrying the release label
    pub stories: Vec<Story>,
}

/// Outcome of `release stage`
#[derive(Debug, Clone)]
pub struct StagedRelease {
    /// Staged version
    pub version: Version,
    /// Stories that were labelled staged by this run
    pub staged: Vec<Story>,
    /// Commit the stage branch now points at
    pub head: String,
}

/// Outcome of `release close`
#[derive(Debug, Clone)]
pub struct ClosedRelease {
    /// Closed version
    pub version: Version,
    /// Release tag
    pub tag: String,
    /// Release notes stored in the tag
    pub notes: String,
}

impl Workflow {
    /// Current lifecycle state of `version`
    pub fn release_state(&self, version: &Version) -> Result<ReleaseState> {
        if self.git.tag_exists(&self.release_tag(version))? {
            return Ok(ReleaseState::Closed);
        }
        let branch = self.release_branch(version);
        if !self.git.branch_exists(&branch)? {
            return Ok(ReleaseState::NotStarted);
        }
        let stage = &self.settings.stage_branch;
        if self.git.branch_exists(stage)?
            && self.git.rev_parse(stage)? == self.git.rev_parse(&branch)?
        {
            return Ok(ReleaseState::Staged);
        }
        Ok(ReleaseState::Running)
    }

    /// The release that `release start` would create
    pub fn next_release(&self) -> Result<NextRelease<'_>> {
        let trunk = &self.settings.trunk;
        let text = self.git.read_file(trunk, &self.settings.version_file)?;
        let version = release_version(&parse_version(&text)?);

        let state = self.release_state(&version)?;
        if state != ReleaseState::NotStarted {
            return Err(Error::Release(format!("release {version} is already {state}")));
        }
        self.ensure_clean_worktree()?;
        Ok(NextRelease {
            workflow: self,
            version,
        })
    }

    /// A started, not yet closed release
    ///
    /// Without `version` the single running release is picked; zero or
    /// several running releases are an error.
    pub fn running_release(&self, version: Option<&Version>) -> Result<RunningRelease<'_>> {
        let version = match version {
            Some(version) => version.clone(),
            None => self.infer_running_version()?,
        };
        match self.release_state(&version)? {
            ReleaseState::NotStarted => Err(Error::Release(format!(
                "release {version} has not been started"
            ))),
            ReleaseState::Closed => Err(Error::Release(format!(
                "release {version} is already closed"
            ))),
            state => Ok(RunningRelease {
                workflow: self,
                version,
                state,
            }),
        }
    }

    fn ensure_clean_worktree(&self) -> Result<()> {
        if self.git.is_clean()? {
            Ok(())
        } else {
            Err(Error::Release("working tree has uncommitted changes".to_string()))
        }
    }

    /// Newest release tag older than `version`, by version order
    ///
    /// Release tags sit on release branches, so they are usually not
    /// reachable from trunk.
    fn previous_release_tag(&self, version: &Version) -> Result<Option<String>> {
        let prefix = self.settings.tag_prefix.as_str();
        let tag = self
            .git
            .tags(prefix)?
            .into_iter()
            .filter_map(|tag| {
                let parsed = Version::parse(tag.strip_prefix(prefix)?).ok()?;
                (parsed < *version).then_some((parsed, tag))
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, tag)| tag);
        Ok(tag)
    }

    fn infer_running_version(&self) -> Result<Version> {
        let prefix = self.settings.release_prefix.as_str();
        let mut running = Vec::new();
        for branch in self.git.branches(prefix)? {
            let Some(Ok(version)) = branch.strip_prefix(prefix).map(Version::parse) else {
                debug!(branch, "ignoring release branch without a version");
                continue;
            };
            if !self.git.tag_exists(&self.release_tag(&version))? {
                running.push(version);
            }
        }
        running.sort();

        match running.as_slice() {
            [] => Err(Error::Release("no release is running".to_string())),
            [version] => Ok(version.clone()),
            many => Err(Error::Release(format!(
                "several releases are running ({}), pass a version",
                many.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// A release that can be started
pub struct NextRelease<'a> {
    workflow: &'a Workflow,
    version: Version,
}

impl NextRelease<'_> {
    /// Version to be released
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// Version trunk moves to once the release starts
    pub fn trunk_version(&self) -> Version {
        next_trunk_version(&self.version)
    }

    /// Start the release
    ///
    /// Creates the release branch, bumps trunk, ensures the milestone, labels
    /// the candidate stories and pushes. Any failure undoes the completed
    /// steps in reverse order.
    pub async fn start(self) -> Result<StartedRelease> {
        let mut chain = ActionChain::new();
        let result = self.start_steps(&mut chain).await;
        chain.rollback_on_error(result).await
    }

    async fn start_steps(&self, chain: &mut ActionChain) -> Result<StartedRelease> {
        let wf = self.workflow;
        let settings = &wf.settings;
        let branch = wf.release_branch(&self.version);
        let trunk_sha = wf.git.rev_parse(&settings.trunk)?;

        let candidates = self.candidate_stories().await?;

        wf.step(&format!("Create branch {branch}"), async {
            wf.git.create_branch(&branch, &trunk_sha)
        })
        .await?;
        chain.push(actions::delete_branch(&wf.git, &branch));

        // The bump checks out trunk
        let previous = wf.git.current_branch()?;
        if previous != settings.trunk {
            chain.push(actions::checkout(&wf.git, &previous));
        }

        let trunk_version = self.trunk_version();
        wf.step(
            &format!("Bump {} to {trunk_version}", settings.trunk),
            async {
                wf.git.commit_file(
                    &settings.trunk,
                    &settings.version_file,
                    &format!("{trunk_version}\n"),
                    &format!("Bump version to {trunk_version}"),
                )
            },
        )
        .await?;
        chain.push(actions::reset_branch(&wf.git, &settings.trunk, &trunk_sha));

        let title = self.version.to_string();
        let milestone = wf
            .step(&format!("Ensure milestone {title}"), async {
                let action: Box<dyn Action> = match wf.tracker.find_milestone(&title).await? {
                    Some(_) => Box::new(Noop),
                    None => {
                        let created = wf.tracker.create_milestone(&title).await?;
                        Box::new(actions::delete_milestone(&wf.tracker, created))
                    }
                };
                Ok(action)
            })
            .await?;
        chain.push(milestone);

        let label = wf.tracker.labels().release_label(&self.version);
        let labelled = wf
            .step(
                &format!("Label {} stories {label}", candidates.len()),
                label_stories(&wf.tracker, &wf.bulk, candidates, &label),
            )
            .await?;
        chain.push(labelled.action);

        let refspecs = vec![settings.trunk.clone(), branch.clone()];
        wf.step(
            &format!("Push {} to {}", refspecs.join(", "), settings.remote),
            async { wf.git.push(&settings.remote, &refspecs) },
        )
        .await?;

        Ok(StartedRelease {
            version: self.version.clone(),
            branch,
            trunk_version,
            stories: labelled.updated,
        })
    }

    /// Stories referenced by trunk commits since the last release tag
    async fn candidate_stories(&self) -> Result<Vec<Story>> {
        let wf = self.workflow;
        let trunk = &wf.settings.trunk;
        let range = match wf.previous_release_tag(&self.version)? {
            Some(tag) => format!("{tag}..{trunk}"),
            None => trunk.clone(),
        };
        let ids = story_ids(&wf.git.commit_messages(&range)?);
        debug!(range, stories = ids.len(), "collected release candidates");
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        wf.tracker.stories_by_ids(&ids).await
    }
}

/// A release between start and close
pub struct RunningRelease<'a> {
    workflow: &'a Workflow,
    version: Version,
    state: ReleaseState,
}

impl RunningRelease<'_> {
    /// Release version
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// `Running` or `Staged`
    pub const fn state(&self) -> ReleaseState {
        self.state
    }

    /// Stories carrying the release label
    pub async fn stories(&self) -> Result<Vec<Story>> {
        self.workflow
            .tracker
            .release_stories(&self.version.to_string())
            .await
    }

    /// Fail with a report unless every story allows staging
    pub async fn ensure_stageable(&self) -> Result<Vec<Story>> {
        let tracker = &self.workflow.tracker;
        let stories = self.stories().await?;
        ensure_stageable(
            &self.version,
            &stories,
            |story| tracker.abstract_state(story),
            &tracker.labels().skip_check,
        )?;
        Ok(stories)
    }

    /// Fail with a report unless every story is accepted
    pub async fn ensure_closable(&self) -> Result<Vec<Story>> {
        let tracker = &self.workflow.tracker;
        let stories = self.stories().await?;
        ensure_closable(
            &self.version,
            &stories,
            |story| tracker.abstract_state(story),
            &tracker.labels().skip_check,
        )?;
        Ok(stories)
    }

    /// Stage the release
    pub async fn stage(self) -> Result<StagedRelease> {
        let mut chain = ActionChain::new();
        let result = self.stage_steps(&mut chain).await;
        chain.rollback_on_error(result).await
    }

    async fn stage_steps(&self, chain: &mut ActionChain) -> Result<StagedRelease> {
        let wf = self.workflow;
        let settings = &wf.settings;
        // Moving a checked-out stage branch is a hard reset
        wf.ensure_clean_worktree()?;

        let stories = wf
            .step(
                &format!("Check stories of release {}", self.version),
                self.ensure_stageable(),
            )
            .await?;

        let tested: Vec<Story> = stories
            .into_iter()
            .filter(|story| wf.tracker.abstract_state(story) == StoryState::Tested)
            .collect();
        let label = wf.tracker.labels().staged.clone();
        let staged = wf
            .step(
                &format!("Label {} stories {label}", tested.len()),
                label_stories(&wf.tracker, &wf.bulk, tested, &label),
            )
            .await?;
        chain.push(staged.action);

        let branch = wf.release_branch(&self.version);
        let stage = &settings.stage_branch;
        let head = wf.git.rev_parse(&branch)?;
        let previous = if wf.git.branch_exists(stage)? {
            Some(wf.git.rev_parse(stage)?)
        } else {
            None
        };
        wf.step(&format!("Move {stage} to {branch}"), async {
            match &previous {
                Some(_) => wf.git.reset_branch(stage, &head),
                None => wf.git.create_branch(stage, &head),
            }
        })
        .await?;
        match &previous {
            Some(sha) => chain.push(actions::reset_branch(&wf.git, stage, sha)),
            None => chain.push(actions::delete_branch(&wf.git, stage)),
        }

        wf.step(&format!("Push {stage} to {}", settings.remote), async {
            wf.git.push(&settings.remote, &[format!("+{stage}")])
        })
        .await?;

        Ok(StagedRelease {
            version: self.version.clone(),
            staged: staged.updated,
            head,
        })
    }

    /// Close the release
    pub async fn close(self) -> Result<ClosedRelease> {
        let mut chain = ActionChain::new();
        let result = self.close_steps(&mut chain).await;
        chain.rollback_on_error(result).await
    }

    async fn close_steps(&self, chain: &mut ActionChain) -> Result<ClosedRelease> {
        let wf = self.workflow;
        let settings = &wf.settings;

        let stories = wf
            .step(
                &format!("Check stories of release {}", self.version),
                self.ensure_closable(),
            )
            .await?;

        let title = self.version.to_string();
        match wf.tracker.find_milestone(&title).await? {
            Some(milestone) => {
                let closed = wf
                    .step(
                        &format!("Close {milestone}"),
                        close_milestones(&wf.tracker, &wf.bulk, vec![milestone]),
                    )
                    .await?;
                chain.push(closed.action);
            }
            None => {
                wf.progress
                    .on_message(&format!("No milestone {title}, nothing to close"))
                    .await;
            }
        }

        let notes = render_release_notes(&self.version, &stories, |story| {
            wf.tracker.abstract_state(story)
        });
        let tag = wf.release_tag(&self.version);
        let target = wf.git.rev_parse(&wf.release_branch(&self.version))?;
        wf.step(&format!("Tag {tag}"), async {
            wf.git.create_tag(&tag, &target, &notes)
        })
        .await?;
        chain.push(actions::delete_tag(&wf.git, &tag));

        wf.step(&format!("Push {tag} to {}", settings.remote), async {
            wf.git.push(&settings.remote, &[format!("refs/tags/{tag}")])
        })
        .await?;

        Ok(ClosedRelease {
            version: self.version.clone(),
            tag,
            notes,
        })
    }
}
