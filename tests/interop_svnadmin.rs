//! Optional interoperability tests against real Subversion tooling.
//!
//! These tests are opt-in: set `SVN_INTEROP=1` and ensure `svnadmin` and
//! `svn` are available on `PATH`. They build a scratch repository, dump
//! it, run the engine over the real dump, and check that the result still
//! loads.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};

use repocutter::{DumpfileSource, SubversionRange, commands};

fn interop_enabled() -> bool {
    matches!(
        std::env::var("SVN_INTEROP").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes") | Ok("YES")
    )
}

fn command_exists(cmd: &str) -> bool {
    Command::new(cmd)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn run_checked(program: &str, args: &[&str], cwd: Option<&Path>) {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    let out = cmd.output().unwrap();
    if !out.status.success() {
        panic!(
            "{program} {:?} failed: {}\nstdout:\n{}\nstderr:\n{}",
            args,
            out.status,
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        );
    }
}

fn file_url(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap();
    let s = canonical.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

struct RepoFixture {
    tmp: tempfile::TempDir,
}

impl RepoFixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let repo = tmp.path().join("repo");
        run_checked("svnadmin", &["create", repo.to_str().unwrap()], None);
        let url = file_url(&repo);
        let wc = tmp.path().join("wc");
        run_checked(
            "svn",
            &["checkout", "-q", &url, wc.to_str().unwrap()],
            None,
        );
        for dir in ["trunk", "branches", "tags"] {
            std::fs::create_dir(wc.join(dir)).unwrap();
        }
        run_checked("svn", &["add", "-q", "trunk", "branches", "tags"], Some(&wc));
        run_checked(
            "svn",
            &["commit", "-q", "-m", "Standard layout."],
            Some(&wc),
        );
        std::fs::write(wc.join("trunk/hello.txt"), "hello interop\n").unwrap();
        run_checked("svn", &["add", "-q", "trunk/hello.txt"], Some(&wc));
        run_checked("svn", &["commit", "-q", "-m", "Add a file."], Some(&wc));
        RepoFixture { tmp }
    }

    fn dump(&self) -> Vec<u8> {
        let repo = self.tmp.path().join("repo");
        let out = Command::new("svnadmin")
            .args(["dump", "-q", repo.to_str().unwrap()])
            .output()
            .unwrap();
        assert!(out.status.success());
        out.stdout
    }

    fn load_into_fresh_repo(&self, dump: &[u8]) {
        let target = self.tmp.path().join("reloaded");
        run_checked("svnadmin", &["create", target.to_str().unwrap()], None);
        let mut child = Command::new("svnadmin")
            .args(["load", "-q", target.to_str().unwrap()])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .unwrap();
        {
            use std::io::Write;
            child.stdin.take().unwrap().write_all(dump).unwrap();
        }
        assert!(child.wait().unwrap().success());
    }
}

#[test]
fn identity_select_round_trips_a_real_dump() {
    if !interop_enabled() || !command_exists("svnadmin") || !command_exists("svn") {
        eprintln!("skipping: set SVN_INTEROP=1 with svnadmin/svn on PATH");
        return;
    }
    let fixture = RepoFixture::new();
    let dump = fixture.dump();
    let mut source = DumpfileSource::new(Cursor::new(dump.clone()));
    let mut out = Vec::new();
    commands::select(&mut source, &mut out, &SubversionRange::all()).unwrap();
    assert_eq!(out, dump);
    fixture.load_into_fresh_repo(&out);
}

#[test]
fn renumber_output_loads_into_a_fresh_repository() {
    if !interop_enabled() || !command_exists("svnadmin") || !command_exists("svn") {
        eprintln!("skipping: set SVN_INTEROP=1 with svnadmin/svn on PATH");
        return;
    }
    let fixture = RepoFixture::new();
    let dump = fixture.dump();
    let mut source = DumpfileSource::new(Cursor::new(dump));
    let mut out = Vec::new();
    commands::renumber(&mut source, &mut out, 0).unwrap();
    fixture.load_into_fresh_repo(&out);
}

#[test]
fn reduce_of_a_real_dump_still_loads() {
    if !interop_enabled() || !command_exists("svnadmin") || !command_exists("svn") {
        eprintln!("skipping: set SVN_INTEROP=1 with svnadmin/svn on PATH");
        return;
    }
    let fixture = RepoFixture::new();
    let dump = fixture.dump();
    let dumpfile = fixture.tmp.path().join("full.dump");
    std::fs::write(&dumpfile, &dump).unwrap();
    let mut source = DumpfileSource::new(File::open(&dumpfile).unwrap());
    let mut out = Vec::new();
    commands::reduce(&mut source, &mut out).unwrap();
    fixture.load_into_fresh_repo(&out);
}
