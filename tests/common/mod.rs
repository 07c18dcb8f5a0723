//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use committy::error::ModelError;
use committy::llm::{GenerationRequest, ModelClient, ModelInfo};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture file as a string.
pub fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Model client returning a canned response and counting calls.
#[derive(Clone)]
pub struct CannedModel {
    response: Result<String, fn() -> ModelError>,
    pub calls: Arc<AtomicU32>,
    pub last_prompt: Arc<std::sync::Mutex<Option<String>>>,
}

impl CannedModel {
    pub fn replying(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            calls: Arc::new(AtomicU32::new(0)),
            last_prompt: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn failing(error: fn() -> ModelError) -> Self {
        Self {
            response: Err(error),
            calls: Arc::new(AtomicU32::new(0)),
            last_prompt: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for CannedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelError> {
        Ok(Vec::new())
    }
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative` inside the working tree.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
    }

    /// Stage `relative` in the index.
    pub fn stage(&self, relative: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_path(Path::new(relative))
            .expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write and stage a file.
    pub fn write_and_stage(&self, relative: &str, contents: &str) {
        self.write(relative, contents);
        self.stage(relative);
    }

    /// Commit whatever is staged. Returns the commit OID.
    pub fn commit_staged(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Message of the commit `HEAD` points at.
    pub fn head_message(&self) -> String {
        let commit = self
            .repo
            .head()
            .expect("No HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit");
        commit.message().unwrap_or_default().to_string()
    }
}
