use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn out_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../target/kobind-cli-tests")
        .join(format!("{}-{name}", std::process::id()))
}

#[test]
fn render_writes_bound_output() {
    let out = out_file("hello.html");
    kobind_cli::render_cmd(
        &fixture("hello.html"),
        Some(fixture("hello.json").as_path()),
        Some(out.as_path()),
        None,
        false,
    )
    .expect("render");

    let html = fs::read_to_string(&out).expect("read output");
    assert!(html.contains(r#"<input value="Planet" />"#), "{html}");
    assert!(html.contains("<span>Planet Earth</span>"));
    assert!(html.contains(r#"<button data-bind="click: greet, visible: missing">"#));
}

#[test]
fn render_without_data_keeps_directives() {
    let html = kobind_cli::render_file(
        &fixture("hello.html"),
        None,
        kobind_cli::load_options(None).expect("options"),
    )
    .expect("render");
    let src = fs::read_to_string(fixture("hello.html")).expect("read fixture");
    assert_eq!(html, src);
}

#[test]
fn strict_config_rejects_unresolved() {
    let options = kobind_cli::load_options(Some(fixture("strict.toml").as_path())).expect("options");
    let err = kobind_cli::render_file(
        &fixture("hello.html"),
        Some(fixture("hello.json").as_path()),
        options,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("missing"), "{err:#}");
}

#[test]
fn custom_config_changes_dialect() {
    let options = kobind_cli::load_options(Some(fixture("custom.toml").as_path())).expect("options");
    assert_eq!(options.attribute, "data-ko");
    let data = out_file("custom.json");
    fs::create_dir_all(data.parent().expect("parent")).expect("create dir");
    fs::write(&data, r#"{"firstName": "N"}"#).expect("write data");
    let html = kobind_cli::render_file(&fixture("custom.html"), Some(data.as_path()), options)
        .expect("render");
    assert_eq!(html, "<b>N</b>\n");
}

#[test]
fn check_counts_and_rejects() {
    let count = kobind_cli::check_cmd(&fixture("hello.html"), None).expect("check");
    assert_eq!(count, 4);
    let err = kobind_cli::check_cmd(&fixture("unbalanced.html"), None).unwrap_err();
    assert!(format!("{err:#}").contains("unbalanced.html"));
}

#[test]
fn missing_files_report_their_path() {
    let err = kobind_cli::check_cmd(&fixture("nope.html"), None).unwrap_err();
    assert!(err.to_string().contains("nope.html"));
}
