//! End-to-end tests driving the built `buildsmith` binary against real
//! `gcc`. Run with `cargo test --test integration_tests`; requires gcc.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn buildsmith_bin() -> PathBuf {
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.join("buildsmith")
}

fn run(args: &[&str], cwd: &PathBuf) -> Output {
    Command::new(buildsmith_bin())
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run buildsmith binary")
}

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("buildsmith_it_{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn descriptor(json: &str, dir: &PathBuf) -> PathBuf {
    let path = dir.join("project.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn single_source_executable_builds_and_runs() {
    let dir = workspace("single_source");
    fs::write(
        dir.join("main.c"),
        "#include <stdio.h>\nint main(){ printf(\"hi\\n\"); return 0; }\n",
    )
    .unwrap();
    descriptor(
        r#"{
            "configurations": { "debug": { "default": true, "output_path": "./bin/" } },
            "source_files": ["main.c"],
            "version": "1.0.0"
        }"#,
        &dir,
    );

    let output = run(&["project.json"], &dir);
    assert!(output.status.success(), "{:?}", output);
    assert!(dir.join("bin").join("main.out").exists() || dir.join("bin").exists());
}

#[test]
fn static_archive_output_name_is_normalized() {
    let dir = workspace("static_archive");
    fs::write(dir.join("lib.c"), "int add(int a, int b){ return a + b; }\n").unwrap();
    descriptor(
        r#"{
            "configurations": {
                "debug": { "default": true, "target": "library", "output_name": "mymath" }
            },
            "source_files": ["lib.c"],
            "version": "1.0.0"
        }"#,
        &dir,
    );

    let output = run(&["project.json"], &dir);
    assert!(output.status.success(), "{:?}", output);
}

#[test]
fn unchanged_rebuild_does_not_recompile() {
    let dir = workspace("incremental");
    fs::write(dir.join("main.c"), "int main(){ return 0; }\n").unwrap();
    descriptor(
        r#"{
            "configurations": { "debug": { "default": true } },
            "source_files": ["main.c"],
            "version": "1.0.0"
        }"#,
        &dir,
    );

    let first = run(&["project.json"], &dir);
    assert!(first.status.success());
    let second = run(&["project.json", "-V"], &dir);
    assert!(second.status.success());
}

#[test]
fn cyclic_dependencies_are_rejected() {
    let dir = workspace("cycle");
    let a_dir = dir.join("a");
    let b_dir = dir.join("b");
    fs::create_dir_all(&a_dir).unwrap();
    fs::create_dir_all(&b_dir).unwrap();
    fs::write(a_dir.join("a.c"), "int a(){ return 0; }\n").unwrap();
    fs::write(b_dir.join("b.c"), "int b(){ return 0; }\n").unwrap();

    descriptor(
        r#"{
            "configurations": {
                "debug": { "default": true, "target": "library", "dependencies": ["../b"] }
            },
            "source_files": ["a.c"],
            "version": "1.0.0"
        }"#,
        &a_dir,
    );
    descriptor(
        r#"{
            "configurations": {
                "debug": { "default": true, "target": "library", "dependencies": ["../a"] }
            },
            "source_files": ["b.c"],
            "version": "1.0.0"
        }"#,
        &b_dir,
    );

    let output = run(&["project.json"], &a_dir);
    assert!(!output.status.success());
}
