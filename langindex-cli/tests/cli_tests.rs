use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn langindex_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("langindex"))
}

fn project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("i18n");
    fs::create_dir(&root).unwrap();
    fs::write(
        root.join("lang.en.json"),
        r#"{ "app.title": "Title", "app.quit": "Quit" }"#,
    )
    .unwrap();
    fs::write(
        root.join("lang.ja.json"),
        r#"{ "app.title": "Title", "app.quit": "終了" }"#,
    )
    .unwrap();
    temp_dir
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    langindex_cmd()
        .current_dir(dir)
        .args(["--root", "i18n", "--main", "en"])
        .args(args)
        .output()
        .unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_scan_lists_bundles() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("i18n/lang.fr.json"), "{ broken").unwrap();

    let output = run_in(temp_dir.path(), &["scan"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lang.en.json"));
    assert!(stdout.contains("lang.ja.json"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lang.fr.json"));
    assert!(!stdout.contains("lang.fr.json"));
}

#[test]
fn test_scan_warns_about_unresolved_files() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("i18n/lang.xx.json"), "{}").unwrap();

    let output = run_in(temp_dir.path(), &["scan"]);
    assert_success(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot resolve a locale for"));
    assert!(stderr.contains("lang.xx.json"));
}

#[test]
fn test_scan_json_output() {
    let temp_dir = project();
    let output = run_in(temp_dir.path(), &["scan", "--json"]);
    assert_success(&output);

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let bundles = value["bundles"].as_array().unwrap();
    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0]["locale"], "en");
    assert_eq!(bundles[0]["keys"], 2);
}

#[test]
fn test_keys_and_lookup() {
    let temp_dir = project();
    let output = run_in(temp_dir.path(), &["keys", "--json"]);
    assert_success(&output);
    let keys: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(keys, vec!["app.title", "app.quit"]);

    let output = run_in(temp_dir.path(), &["lookup", "app.quit"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Quit"));
    assert!(stdout.contains("終了"));

    let output = run_in(temp_dir.path(), &["lookup", "app.missing"]);
    assert!(!output.status.success());
}

#[test]
fn test_add_replaces_selection_and_writes_every_locale() {
    let temp_dir = project();
    let source = temp_dir.path().join("page.js");
    fs::write(&source, "const s = \"Hello\";\n").unwrap();

    let output = run_in(
        temp_dir.path(),
        &[
            "add", "--key", "greeting", "--file", "page.js", "--line", "1", "--start", "12",
            "--end", "17",
        ],
    );
    assert_success(&output);

    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "const s = t('greeting');\n"
    );
    let en = fs::read_to_string(temp_dir.path().join("i18n/lang.en.json")).unwrap();
    assert!(en.contains(r#""greeting": "Hello""#));
    let ja = fs::read_to_string(temp_dir.path().join("i18n/lang.ja.json")).unwrap();
    assert!(ja.contains(r#""greeting": """#));
}

#[test]
fn test_add_existing_key_fails() {
    let temp_dir = project();
    let output = run_in(
        temp_dir.path(),
        &["add", "--key", "app.title", "--text", "Again"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_delete_key() {
    let temp_dir = project();
    let output = run_in(temp_dir.path(), &["delete", "--key", "app.quit"]);
    assert_success(&output);
    let ja = fs::read_to_string(temp_dir.path().join("i18n/lang.ja.json")).unwrap();
    assert!(!ja.contains("app.quit"));

    let output = run_in(temp_dir.path(), &["delete", "--key", "app.quit"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_extract_then_apply() {
    let temp_dir = project();
    let output = run_in(
        temp_dir.path(),
        &["extract", "--lang", "ja", "--out", "scratch.json"],
    );
    assert_success(&output);
    let scratch = fs::read_to_string(temp_dir.path().join("scratch.json")).unwrap();
    assert!(scratch.contains(r#""app.title": "Title""#));
    assert!(!scratch.contains("app.quit"));

    fs::write(
        temp_dir.path().join("scratch.json"),
        r#"{ "app.title": "タイトル" }"#,
    )
    .unwrap();
    let output = run_in(
        temp_dir.path(),
        &["apply", "--lang", "ja", "--from", "scratch.json"],
    );
    assert_success(&output);

    let ja = fs::read_to_string(temp_dir.path().join("i18n/lang.ja.json")).unwrap();
    assert!(ja.contains(r#""app.title": "タイトル""#));
    assert!(ja.contains(r#""app.quit": "終了""#));
}

#[test]
fn test_import_from_other_project() {
    let temp_dir = project();
    let other = TempDir::new().unwrap();
    fs::create_dir_all(other.path().join(".vscode")).unwrap();
    fs::create_dir_all(other.path().join("locales")).unwrap();
    fs::write(
        other.path().join(".vscode/settings.json"),
        r#"{ "langindex.root": "locales", "langindex.main": "en" }"#,
    )
    .unwrap();
    fs::write(
        other.path().join("locales/lang.en.json"),
        r#"{ "extra.key": "Extra", "app.title": "Other title" }"#,
    )
    .unwrap();

    let settings = other.path().join(".vscode/settings.json");
    let output = run_in(
        temp_dir.path(),
        &[
            "import",
            "--from",
            settings.to_str().unwrap(),
            "--keys",
            "extra.key,app.title",
        ],
    );
    assert_success(&output);

    let en = fs::read_to_string(temp_dir.path().join("i18n/lang.en.json")).unwrap();
    assert!(en.contains(r#""extra.key": "Extra""#));
    assert!(en.contains(r#""app.title": "Title""#));
}

#[test]
fn test_hover_and_check() {
    let temp_dir = project();
    fs::write(
        temp_dir.path().join("view.js"),
        "label(t('app.title'));\nlabel(t('app.gone'));\n",
    )
    .unwrap();

    let output = run_in(
        temp_dir.path(),
        &["hover", "--file", "view.js", "--line", "1", "--column", "12"],
    );
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("**app.title**"));

    let output = run_in(temp_dir.path(), &["check", "--file", "view.js"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app.gone"));
    assert!(!stdout.contains("app.title"));
}

#[test]
fn test_hints_follow_display_locale() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("menu.js"), "menu(t('app.quit'));\n").unwrap();

    let output = run_in(temp_dir.path(), &["hints", "--file", "menu.js"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("menu.js:1:19: Quit"));

    let output = run_in(
        temp_dir.path(),
        &["--display", "ja", "hints", "--file", "menu.js"],
    );
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("終了"));
}
