use indoc::formatdoc;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn install_json_output_is_only_paths() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("buildout");
    let archive = tmp.path().join("Makefile");

    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(&archive, "all:\n").unwrap();

    // `echo` prints its arguments, so a leaking build would show up on stdout.
    let config_path = root.join("buildout.toml");
    let contents = formatdoc! {r#"
        [rabbitmq]
        url = "{url}"
        make = "echo"
    "#, url = archive.display()};

    std::fs::write(&config_path, contents).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rabbitmq-recipe"))
        .arg("install")
        .arg("--config")
        .arg(&config_path)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let paths: Vec<PathBuf> = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(
        paths,
        vec![
            root.join("parts/rabbitmq"),
            root.join("bin/rabbitmq-server"),
            root.join("bin/rabbitmqctl"),
        ]
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("PYTHON=python3"));
}
