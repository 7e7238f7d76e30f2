// Shared fixtures for integration tests: throwaway origin repositories built with the git CLI.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const OLD_DATE: &str = "2020-01-01T12:00:00+00:00";
pub const CUTOFF: &str = "2023-01-01T00:00:00Z";

pub struct Author {
    pub name: &'static str,
    pub email: &'static str,
}

pub const ALICE: Author = Author {
    name: "Alice Example",
    email: "alice@example.com",
};

pub const BOB: Author = Author {
    name: "Bob Builder",
    email: "bob@example.com",
};

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str], envs: &[(&str, &str)]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(envs.iter().copied())
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A directory laid out like a hosting service: `<root>/<owner>/<name>.git`.
pub struct Origin {
    pub root: TempDir,
}

impl Origin {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    /// Value for the remote base so `owner/name` resolves into this directory.
    pub fn remote_base(&self) -> String {
        format!("file://{}", self.root.path().display())
    }

    pub fn init_repo(&self, full_name: &str) -> PathBuf {
        let dir = self.root.path().join(format!("{full_name}.git"));
        fs::create_dir_all(&dir).unwrap();
        git(&dir, &["init", "-q"], &[]);
        git(&dir, &["config", "core.autocrlf", "false"], &[]);
        git(&dir, &["config", "user.name", "Fixture"], &[]);
        git(&dir, &["config", "user.email", "fixture@example.com"], &[]);
        dir
    }
}

/// Write `content` to `name` and commit it as `author`, optionally backdated.
pub fn commit_file(dir: &Path, name: &str, content: &str, author: &Author, date: Option<&str>) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();

    git(dir, &["add", "."], &[]);

    let mut envs = vec![
        ("GIT_AUTHOR_NAME", author.name),
        ("GIT_AUTHOR_EMAIL", author.email),
        ("GIT_COMMITTER_NAME", author.name),
        ("GIT_COMMITTER_EMAIL", author.email),
    ];
    if let Some(date) = date {
        envs.push(("GIT_AUTHOR_DATE", date));
        envs.push(("GIT_COMMITTER_DATE", date));
    }
    git(dir, &["commit", "-q", "-m", &format!("update {name}")], &envs);
}

/// One old commit before [`CUTOFF`] and three recent ones:
/// Alice adds 3 Rust lines, Bob adds 2 Python lines, Alice rewrites one Rust line.
pub fn seed_history(dir: &Path) {
    commit_file(dir, "README.md", "# old\n\nlots\nof\nhistory\n", &ALICE, Some(OLD_DATE));
    commit_file(dir, "src/main.rs", "fn main() {\n    run();\n}\n", &ALICE, None);
    commit_file(dir, "tools/gen.py", "import os\nprint(os.name)\n", &BOB, None);
    commit_file(dir, "src/main.rs", "fn main() {\n    start();\n}\n", &ALICE, None);
}
