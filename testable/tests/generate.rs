use std::fs;
use std::path::Path;

use testable::{TestableConfig, TestableMacro, WriteOutcome, discover_sources, update_file};

const MY_CLASS: &str = include_str!("fixtures/MyClass.swift");
const MY_CLASS_EXPANDED: &str = include_str!("fixtures/MyClass.expanded.swift");

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn generate(root: &Path, config: &TestableConfig, check: bool) -> Vec<(String, WriteOutcome)> {
    let generator = TestableMacro::new(config.expansion.clone());
    discover_sources(root, &config.exclude_patterns().unwrap())
        .unwrap()
        .into_iter()
        .map(|file| {
            let report = update_file(&file.path, &generator, check).unwrap();
            (file.relative_path, report.outcome)
        })
        .collect()
}

#[test]
fn project_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Sources/App/MyClass.swift", MY_CLASS);
    write(root, "Sources/App/Plain.swift", "struct Plain {}\n");
    write(root, ".build/checkouts/Dep/Dep.swift", "@Testable\nclass Dep {}\n");
    let config = TestableConfig::from_toml_str(
        "[expansion]\nmodifier_matching = \"substring\"\nargument_labels = \"wildcard\"\n\n[generate]\nexclude = [\"(^|/)\\\\.build/\"]\n",
    )
    .unwrap();

    let check = generate(root, &config, true);
    assert_eq!(check, vec![("Sources/App/MyClass.swift".to_owned(), WriteOutcome::Stale)]);

    let written = generate(root, &config, false);
    assert_eq!(written[0].1, WriteOutcome::Updated);
    let content = fs::read_to_string(root.join("Sources/App/MyClass.swift")).unwrap();
    let expected = format!(
        "{MY_CLASS}\n// testable:begin MyClass\n{}\n// testable:end MyClass\n",
        MY_CLASS_EXPANDED.trim_end()
    );
    assert_eq!(content, expected);

    let again = generate(root, &config, true);
    assert_eq!(again[0].1, WriteOutcome::Unchanged);
}

#[test]
fn removing_the_annotation_removes_the_region() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = "@Testable\nstruct Timer {\n    private var ticks: Int = 0\n}\n";
    write(root, "Timer.swift", source);
    let config = TestableConfig::default();
    generate(root, &config, false);

    let path = root.join("Timer.swift");
    let generated = fs::read_to_string(&path).unwrap();
    fs::write(&path, generated.replacen("@Testable\n", "", 1)).unwrap();

    let outcomes = generate(root, &config, false);
    assert_eq!(outcomes[0].1, WriteOutcome::Updated);
    assert_eq!(fs::read_to_string(&path).unwrap(), "struct Timer {\n    private var ticks: Int = 0\n}\n");

    // Nothing left to discover.
    assert!(generate(root, &config, false).is_empty());
}
