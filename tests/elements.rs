fn p(source: &str) -> String {
    hbml::expand_and_serialize(source, "test env").unwrap()
}

// ── Strings ────────────────────────────────────────────────────────────

#[test]
fn double_quotes() {
    assert_eq!("Test string", p(r#""Test ""string""#));
    assert_eq!(" Test string ", p(r#"" Test string ""#));
    assert_eq!("Test string", p("\"Test\n string\""));
}

#[test]
fn single_quotes() {
    assert_eq!("Test string", p("'Test ''string'"));
    assert_eq!("Test string", p("'Test\n string'"));
}

#[test]
fn backticks_keep_newlines() {
    assert_eq!("Test string", p("`Test ``string`"));
    assert_eq!("Test\n string", p("`Test\n string`"));
}

#[test]
fn empty_and_mixed_literals() {
    assert_eq!("", p("\"\"''``"));
    assert_eq!("All working together", p("\"All \"'working '`together`"));
    assert_eq!(
        "Double quotes and single quotes ignore newlines\nbut backticks keep them",
        p("\"Double \nquotes a\"'nd single\n quotes ignore newlines'`\nbut backticks keep them`")
    );
}

#[test]
fn escapes_in_literals() {
    assert_eq!(
        r#"\ backslash before an escape \", but &lt;&gt; can't"#,
        p(r#""\\ backslash before an escape \\\", but <> can't""#)
    );
}

#[test]
fn strings_between_void_elements() {
    assert_eq!(
        "<hr/>Let's<br/>break<br/>this<br/>up!",
        p("hr\"Let's\"br'break'br\"this\"br`up!`")
    );
}

// ── Comments ───────────────────────────────────────────────────────────

#[test]
fn single_line_comments() {
    assert_eq!("<!---->", p("//"));
    assert_eq!("<!---->", p("//\n"));
    assert_eq!("<!--test comment-->", p("//test comment"));
    assert_eq!("<!-- test comment-->", p("// test comment\n"));
}

#[test]
fn multiline_comments() {
    assert_eq!("<!---->", p("/**/"));
    assert_eq!("<!-- test comment -->", p("/* test comment */"));
    assert_eq!("<!-- a\nb -->", p("/* a\nb */"));
}

// ── Elements ───────────────────────────────────────────────────────────

#[test]
fn blocks() {
    assert_eq!("<div></div>", p("div {}"));
    assert_eq!("<div><p></p></div>", p("div>p"));
    assert_eq!("<div><p></p></div>", p("div > p"));
    assert_eq!("<div></div>", p("div {\n}"));
    assert_eq!("<div>Test</div>", p("div { 'Test' }"));
    assert_eq!("<div><div>Test</div></div>", p("div {div > 'Test'}"));
    assert_eq!("<div><div><i></i></div></div>", p(">>i"));
    assert_eq!("<div></div><div></div><div></div>", p("div{}div{ }div{\n}"));
}

#[test]
fn nested_end_to_end() {
    assert_eq!("<div><p>A</p><p>B</p></div>", p(r#"div { p { "A" } p > "B" }"#));
}

#[test]
fn block_implicits_are_div() {
    assert_eq!("<div></div>", p("{}"));
    assert_eq!("<div></div>", p(">"));
    assert_eq!("<div><p></p></div>", p("> p"));
    assert_eq!("<p><div>Text</div></p>", p("p> {'Text'}"));
}

#[test]
fn inline_implicits_are_span() {
    assert_eq!("<span><span></span></span>", p("span > {}"));
    assert_eq!("<i><span>Test</span><p></p></i>", p("i {{'Test'}p}"));
    assert_eq!(
        r#"<div class="l1"><span class="l2"><span class="l3">Layered</span></span></div>"#,
        p(".l1 > span.l2 > .l3 > 'Layered'")
    );
}

#[test]
fn inline_body_may_continue_on_next_line() {
    assert_eq!("<h1><h2><h3>Layered</h3></h2></h1>", p("h1>h2>h3>\n'Layered'"));
}

#[test]
fn ids_and_classes() {
    assert_eq!(r#"<div id="my-id"></div>"#, p("div#my-id"));
    assert_eq!(
        r#"<div class="class class2 class3"></div>"#,
        p(".class.class2.class3")
    );
    assert_eq!(
        r#"<div id="my-id" class="class class2 class3"></div>"#,
        p("div#my-id.class.class2.class3")
    );
}

#[test]
fn void_element_children_are_replaced_by_a_comment() {
    assert_eq!(
        "<br/><!--Void element br may not have child nodes-->",
        p(r#"br { "x" }"#)
    );
    assert_eq!(
        "<img/><!--Void element img may not have child nodes--><p></p>",
        p("img > 'alt' p")
    );
}

#[test]
fn void_element_ends_at_newline() {
    assert_eq!("<br/><div>text</div>", p("br\n> 'text'"));
}

#[test]
fn style_contents_are_not_escaped() {
    assert_eq!("<style>a > b {}</style>", p("style > 'a > b {}'"));
    assert_eq!("<p>a &gt; b</p>", p("p > 'a > b'"));
}

// ── Attributes ─────────────────────────────────────────────────────────

#[test]
fn attribute_values() {
    assert_eq!(
        r#"<span style="color:red;">Text</span>"#,
        p("span[style=color:red;] > 'Text'")
    );
    assert_eq!(
        r#"<div id="my-id" class="class class2" data-attribute></div>"#,
        p("#my-id.class.class2[data-attribute]")
    );
}

#[test]
fn attribute_lists_across_lines() {
    let source = "link[href=https://cool-website.com/]
        link[rel=stylesheet href=./local-styles/style.css]
        meta[charset=\"UTF-8\"]
        meta[
            name=`viewport`
            content='width=device-width, initial-scale=1'
        ]";
    assert_eq!(
        r#"<link href="https://cool-website.com/"/><link rel="stylesheet" href="./local-styles/style.css"/><meta charset="UTF-8"/><meta name="viewport" content="width=device-width, initial-scale=1"/>"#,
        p(source)
    );
}

#[test]
fn attribute_quoting_styles() {
    let source = r#"input#input-id[type=checkbox name="checkboxName" checked]
        [data-attribute=Test\ value1]
        [data-attribute="Test value2"]
        [data-attribute='Test value3']
        [data-attribute=`Test value4`]
        [data-first-attribute="First attr" data-second-attribute='Second attr']> "Test""#;
    assert_eq!(
        r#"<input id="input-id" type="checkbox" name="checkboxName" checked/><div data-attribute="Test value1"></div><div data-attribute="Test value2"></div><div data-attribute="Test value3"></div><div data-attribute="Test value4"></div><div data-first-attribute="First attr" data-second-attribute="Second attr">Test</div>"#,
        p(source)
    );
}

#[test]
fn attribute_spanning_lines_without_brackets_closing() {
    assert_eq!(r#"<a at1="1" at2="2"></a>"#, p("a[at1=\"1\"\nat2=\"2\"]"));
}

#[test]
fn repeated_classes_merge_without_duplicates() {
    assert_eq!(r#"<p class="a b c"></p>"#, p("p.a.b[class=b class=c]"));
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn parse_errors_carry_kind_and_position() {
    let err = hbml::parse("div {\n  p > \"never closed", "page.hbml").unwrap_err();
    assert_eq!(hbml::ErrorKind::UnclosedString, err.kind);
    assert_eq!("page.hbml", err.path);
    assert_eq!(2, err.line);

    let err = hbml::parse("div[a=1", "page.hbml").unwrap_err();
    assert_eq!(hbml::ErrorKind::UnclosedAttributes, err.kind);

    let err = hbml::parse("div[=1]", "page.hbml").unwrap_err();
    assert_eq!(hbml::ErrorKind::EmptyAttributeKey, err.kind);

    let err = hbml::parse("/* open", "page.hbml").unwrap_err();
    assert_eq!(hbml::ErrorKind::UnclosedComment, err.kind);
}

// ── Full pages ─────────────────────────────────────────────────────────

#[test]
fn small_page() {
    let source = r#":root[lang=en] {
        head {
            title > "Page title"
        }

        body {
            h1 > "Heading Level 1"
            section {
                p > "Paragraph 1"
                p > "Paragraph 2"
            }
        }
    }"#;
    assert_eq!(
        r#"<!DOCTYPE html><html lang="en"><head><title>Page title</title></head><body><h1>Heading Level 1</h1><section><p>Paragraph 1</p><p>Paragraph 2</p></section></body></html>"#,
        p(source)
    );
}

#[test]
fn large_page() {
    let source = r#":root[lang="en-CA"] {
    head {
        meta[charset="UTF-8"]
        title > "Title of webpage"
        style > "
            .highlight {
                background-color: yellow;
            }
        "
    }
    body {
        /* Various inline headings */
        section {
            h1 > "Heading 1"
            h2 > "Heading 2"
        }

        .layer-1 > .layer-2 > .layer-3 {
            "Text directly inside the .layer-3 div"

            br
            > "Some text inside an implicit div"
            div > "Other text inside an explicit div"
            br

            "Text after the child elements"
        }

        a[href="./"] > "Clickable link"
        p {"Text with a highlighted part " span.highlight>"right here" " followed by more text"}
        div {
            "Double quote string" br 'Single quote string' br `Back tick string`
        }
    }
}"#;
    let expected = concat!(
        r#"<!DOCTYPE html><html lang="en-CA"><head><meta charset="UTF-8"/><title>Title of webpage</title>"#,
        "<style>            .highlight {                background-color: yellow;            }        </style></head>",
        "<body><!-- Various inline headings --><section><h1>Heading 1</h1><h2>Heading 2</h2></section>",
        r#"<div class="layer-1"><div class="layer-2"><div class="layer-3">Text directly inside the .layer-3 div<br/>"#,
        "<div>Some text inside an implicit div</div><div>Other text inside an explicit div</div><br/>",
        "Text after the child elements</div></div></div>",
        r#"<a href="./">Clickable link</a>"#,
        r#"<p>Text with a highlighted part <span class="highlight">right here</span> followed by more text</p>"#,
        "<div>Double quote string<br/>Single quote string<br/>Back tick string</div></body></html>",
    );
    assert_eq!(expected, p(source));
}
