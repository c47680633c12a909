use testable::{
    ExpansionOptions, Member, ParseError, TestableMacro, UnsupportedKind, parse_source, syntax::ParseErrorKind,
};

const NOISY: &str = r##"
import Foundation

/* A block comment with braces { and a nested /* comment */ } */
@MainActor
@Testable
public final class Feed: NSObject, Sendable {
    // }}} unbalanced braces in a line comment
    private let title: String = "{ not a brace }"
    private var greeting: String = "Hello \(name.map { $0 + "}" } ?? "")"
    private let banner = """
        multi-line { text
        """
    private let pattern: String = #"raw "quoted" {"#
    @Published private var items: [Item] = []
    private lazy var cache: [String: Int] = {
        var map = [String: Int]()
        return map
    }()
    private var observed: Int = 0 {
        didSet { print(oldValue) }
    }

    #if os(iOS)
    private func iosOnly() {}
    #endif

    private func refresh(
        force: Bool = false,
        completion: @escaping (Result<[Item], Error>) -> Void
    ) {
        completion(.success([]))
    }
}

func helper() -> Int { 1 }
let global = Feed()
"##;

#[test]
fn noisy_source_still_parses() {
    let file = parse_source(NOISY).unwrap();
    let feed = file.find("Feed").unwrap();
    let names: Vec<Option<&str>> = feed.members.iter().map(Member::name).collect();
    assert!(names.contains(&Some("title")));
    assert!(names.contains(&Some("refresh")));

    let property = |name: &str| match feed.members.iter().find(|m| m.name() == Some(name)) {
        Some(Member::Property(property)) => property.clone(),
        other => panic!("{name} is not a property: {other:?}"),
    };
    assert_eq!(property("greeting").ty.as_deref(), Some("String"));
    assert_eq!(property("banner").ty, None);
    assert_eq!(property("cache").ty.as_deref(), Some("[String: Int]"));
    assert!(property("observed").has_setter);

    let unsupported: Vec<UnsupportedKind> = feed
        .members
        .iter()
        .filter_map(|member| match member {
            Member::Unsupported(unsupported) => Some(unsupported.kind),
            _ => None,
        })
        .collect();
    assert!(unsupported.contains(&UnsupportedKind::PropertyWrapper));
    assert!(unsupported.contains(&UnsupportedKind::ConditionalBlock));
}

#[test]
fn noisy_source_expands() {
    let expansions = TestableMacro::new(ExpansionOptions::default()).expand_source(NOISY).unwrap();
    assert_eq!(expansions.len(), 1);
    let text = &expansions[0].extension().unwrap().source;
    assert!(text.starts_with("extension Feed {"));
    assert!(text.contains("func refresh(force: Bool, completion: @escaping (Result<[Item], Error>) -> Void) {"));
    assert!(text.contains("return target.refresh(force: force, completion: completion)"));
    assert!(text.contains("var observed: Int {"));
    assert!(!text.contains("iosOnly"));
}

#[test]
fn unannotated_types_are_ignored() {
    let expansions = TestableMacro::default()
        .expand_source("class Plain {\n    private var x: Int = 0\n}\n")
        .unwrap();
    assert!(expansions.is_empty());
}

#[test]
fn several_annotated_types_keep_source_order() {
    let source = "@Testable\nstruct B {}\n\nstruct Skip {}\n\n@Testable\nclass A {}\n";
    let names: Vec<String> = TestableMacro::default()
        .expand_source(source)
        .unwrap()
        .into_iter()
        .map(|expansion| expansion.type_name)
        .collect();
    assert_eq!(names, vec!["B".to_owned(), "A".to_owned()]);
}

#[test]
fn malformed_sources_report_positions() {
    let err: ParseError = parse_source("@Testable\nclass Broken {\n    private func f() {\n}\n").unwrap_err();
    assert!(err.line >= 2);

    let err = parse_source("let s = \"never closed\n").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnterminatedString));
    assert_eq!(err.line, 1);

    let err = parse_source("struct S {\n    var a: [Int) = []\n}\n").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MismatchedDelimiter { .. }));
}
