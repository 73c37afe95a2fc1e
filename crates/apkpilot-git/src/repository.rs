//! Git repository operations

use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions};
use tracing::{info, instrument};

use apkpilot_core::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(start_path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    /// Create a repository whose unborn HEAD points at `initial_branch`
    #[instrument(fields(path = %path.display()))]
    pub fn init(path: &Path, initial_branch: &str) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(initial_branch);

        let repo = Repository::init_opts(path, &opts)?;
        info!(path = %path.display(), branch = initial_branch, "initialized git repository");

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Open the repository at `path`, creating it when absent.
    ///
    /// Returns the repository and whether it was created.
    pub fn open_or_init(path: &Path, initial_branch: &str) -> Result<(Self, bool)> {
        if path.join(".git").exists() {
            Ok((Self::open(path)?, false))
        } else {
            Ok((Self::init(path, initial_branch)?, true))
        }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the inner git2 Repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Write `user.name` and `user.email` into the repository config
    #[instrument(skip(self, email))]
    pub fn set_identity(&self, name: &str, email: &str) -> Result<()> {
        let mut config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        config.set_str("user.name", name)?;
        config.set_str("user.email", email)?;
        info!(name, "configured commit identity");
        Ok(())
    }

    /// Signature from the repository's configured identity
    pub(crate) fn signature(&self) -> Result<git2::Signature<'static>> {
        self.repo.signature().map_err(|e| {
            GitError::CommitFailed(format!(
                "no commit identity configured (user.name / user.email): {}",
                e.message()
            ))
        })
    }

    /// Get the HEAD commit
    pub fn head_commit(&self) -> Result<git2::Commit<'_>> {
        let head = self.repo.head().map_err(|e| match e.code() {
            git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound => GitError::NoCommits,
            _ => GitError::Git2(e),
        })?;
        head.peel_to_commit().map_err(GitError::Git2)
    }

    /// Full SHA of the HEAD commit
    pub fn head_sha(&self) -> Result<String> {
        Ok(self.head_commit()?.id().to_string())
    }
}
