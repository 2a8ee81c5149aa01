use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Build input on a background thread with a hard timeout.
/// Panics if parsing takes longer than the deadline.
fn build_with_timeout(label: &str, source: &str, timeout: Duration) -> Result<String, hbml::ParseError> {
    let src = source.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = hbml::expand_and_serialize(&src, "pathological");
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => panic!("{label}: parser did not terminate within {timeout:?}"),
    }
}

const TIMEOUT: Duration = Duration::from_secs(2);

#[test]
fn stray_closing_braces() {
    let err = build_with_timeout("stray_closing_braces", "}}}", TIMEOUT).unwrap_err();
    assert_eq!(hbml::ErrorKind::Unparseable, err.kind);
}

#[test]
fn unclosed_everything() {
    for source in ["div {", "div {{{{", "p[", "p[a='", "'", "/*", ":m {", "--m {"] {
        assert!(
            build_with_timeout(source, source, TIMEOUT).is_err(),
            "{source:?} should not parse"
        );
    }
}

#[test]
fn lone_slash_is_an_invalid_comment() {
    let err = build_with_timeout("lone_slash", "div > /", TIMEOUT).unwrap_err();
    assert_eq!(hbml::ErrorKind::InvalidComment, err.kind);
}

#[test]
fn deep_inline_nesting() {
    let source = format!("{}'x'", "b > ".repeat(200));
    let html = build_with_timeout("deep_inline_nesting", &source, TIMEOUT).unwrap();
    assert_eq!(format!("{}x{}", "<b>".repeat(200), "</b>".repeat(200)), html);
}

#[test]
fn consume_all_with_no_requirement_runs_once() {
    let html = build_with_timeout(
        "consume_all_zero",
        "--m { :consume-all > p :children } :m { 'a' 'b' }",
        TIMEOUT,
    )
    .unwrap();
    assert_eq!("<p></p>ab", html);
}

#[test]
fn mutually_recursive_macros_terminate() {
    let err = build_with_timeout(
        "mutual_recursion",
        "--a > p > :b\n--b > p > :a\n:a",
        TIMEOUT,
    )
    .unwrap_err();
    assert!(matches!(err.kind, hbml::ErrorKind::Macro(_)));
}

#[test]
fn many_siblings() {
    let source = "li > 'x' ".repeat(10_000);
    let html = build_with_timeout("many_siblings", &source, TIMEOUT).unwrap();
    assert_eq!("<li>x</li>".repeat(10_000), html);
}
