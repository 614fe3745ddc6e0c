use std::path::Path;
use std::process::Command;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = git_command()
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a repository at `root` with one commit and return its `file://` URL.
pub fn init_source_repo(root: &Path) -> String {
    std::fs::create_dir_all(root).expect("create repo dir");
    run_git(root, &["init"]);
    run_git(root, &["checkout", "-b", "main"]);
    run_git(root, &["config", "user.email", "test@example.com"]);
    run_git(root, &["config", "user.name", "Test User"]);
    run_git(root, &["config", "commit.gpgsign", "false"]);
    commit_file(root, "index.js", "console.log('v1');\n", "init");

    url::Url::from_directory_path(root)
        .expect("repo root should convert to file URL")
        .to_string()
}

pub fn commit_file(root: &Path, name: &str, content: &str, message: &str) {
    std::fs::write(root.join(name), content).expect("write file");
    run_git(root, &["add", "."]);
    run_git(root, &["commit", "-m", message]);
}
