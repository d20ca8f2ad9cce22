//! Diagnostic accumulation and rendering over failed resolutions.

use expect_test::expect;
use quartz::ast::{Arg, Call, Def, Node};
use quartz::diagnostics::{Diagnostics, OutputFormat, SourceMap, Span, render};
use quartz::sema::{SemanticContext, analyze, codes};
use quartz::types::Restriction;

fn spanned_call(call: Call, span: Span) -> Node {
    let mut call = call;
    call.span = Some(span);
    Node::Call(call)
}

#[test]
fn failed_calls_render_with_locations_and_codes() {
    let mut sources = SourceMap::new();
    let file = sources.add("main.qz", "foo 1\nbar 'a'\n");

    let mut ctx = SemanticContext::new();
    ctx.declare_top_level(Def::new("foo", vec![Arg::new("x"), Arg::new("y")], Node::Nop))
        .unwrap();
    ctx.declare_top_level(Def::new(
        "bar",
        vec![Arg::restricted("x", Restriction::path("Int32"))],
        Node::Nop,
    ))
    .unwrap();

    let mut program = Node::expressions(vec![
        spanned_call(Call::new("foo", vec![Node::int(1)]), Span::new(file, 0, 3)),
        spanned_call(
            Call::new("bar", vec![Node::char_lit('a')]),
            Span::new(file, 6, 9),
        ),
    ]);

    let mut diagnostics = Diagnostics::new();
    let result = analyze(&mut ctx, &mut program, &mut diagnostics);
    assert_eq!(result, None);
    assert!(diagnostics.has_errors());

    let items = diagnostics.into_vec();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].code, Some(codes::WRONG_ARITY));
    assert_eq!(items[1].code, Some(codes::NO_OVERLOAD));

    let rendered = render(&items, &sources, OutputFormat::Short);
    expect![[r#"
        main.qz:1:1: error[SEM002]: wrong number of arguments for 'foo' (given 1, expected 2)
        main.qz:2:1: error[SEM003]: no overload matches 'bar' with types Char (notes: 2)"#]]
    .assert_eq(&rendered);
}

#[test]
fn no_overload_notes_name_each_rejected_candidate() {
    let mut ctx = SemanticContext::new();
    ctx.declare_top_level(Def::new(
        "pick",
        vec![Arg::restricted("x", Restriction::path("Int32"))],
        Node::Nop,
    ))
    .unwrap();
    ctx.declare_top_level(Def::new(
        "pick",
        vec![Arg::restricted("x", Restriction::path("String"))],
        Node::Nop,
    ))
    .unwrap();

    let mut program = Node::expressions(vec![Node::Call(Call::new(
        "pick",
        vec![Node::char_lit('a')],
    ))]);
    let mut diagnostics = Diagnostics::new();
    analyze(&mut ctx, &mut program, &mut diagnostics);

    let items = diagnostics.into_vec();
    assert_eq!(items.len(), 1);
    let diagnostic = &items[0];
    assert_eq!(
        diagnostic.message,
        "no overload matches 'pick' with types Char"
    );
    expect![[r#"
        [
            "overloads are:",
            " - pick(x : Int32): expected argument 'x' to be Int32, not Char",
            " - pick(x : String): expected argument 'x' to be String, not Char",
        ]
    "#]]
    .assert_debug_eq(&diagnostic.notes);
}

#[test]
fn declaration_errors_surface_through_the_accumulator() {
    let mut ctx = SemanticContext::new();
    let mut program = Node::expressions(vec![Node::Def(Box::new(Def::new(
        "broken",
        vec![Arg::new("x"), Arg::new("x")],
        Node::Nop,
    )))]);
    let mut diagnostics = Diagnostics::new();
    analyze(&mut ctx, &mut program, &mut diagnostics);
    assert!(diagnostics.has_errors());
    let items = diagnostics.into_vec();
    assert_eq!(items[0].code, Some(codes::PARAMETER_NAME_DUPLICATE));
    assert_eq!(items[0].message, "duplicated argument name 'x' in 'broken'");
}

#[test]
fn human_rendering_includes_snippet_and_notes() {
    let mut sources = SourceMap::new();
    let file = sources.add("main.qz", "pick 'a'\n");

    let mut ctx = SemanticContext::new();
    ctx.declare_top_level(Def::new(
        "pick",
        vec![Arg::restricted("x", Restriction::path("Int32"))],
        Node::Nop,
    ))
    .unwrap();
    let mut program = Node::expressions(vec![spanned_call(
        Call::new("pick", vec![Node::char_lit('a')]),
        Span::new(file, 0, 4),
    )]);
    let mut diagnostics = Diagnostics::new();
    analyze(&mut ctx, &mut program, &mut diagnostics);

    let rendered = render(&diagnostics.into_vec(), &sources, OutputFormat::Human);
    assert!(rendered.starts_with("error[SEM003]: no overload matches 'pick' with types Char"));
    assert!(rendered.contains("  --> main.qz:1:1"));
    assert!(rendered.contains("   1 | pick 'a'"));
    assert!(rendered.contains("^^^^"));
    assert!(rendered.contains("note:  - pick(x : Int32): expected argument 'x' to be Int32, not Char"));
}

#[test]
fn json_rendering_is_stable_for_tooling() {
    let mut sources = SourceMap::new();
    let file = sources.add("main.qz", "oops\n");

    let mut ctx = SemanticContext::new();
    let mut program = Node::expressions(vec![spanned_call(
        Call::new("oops", vec![]),
        Span::new(file, 0, 4),
    )]);
    let mut diagnostics = Diagnostics::new();
    analyze(&mut ctx, &mut program, &mut diagnostics);

    let rendered = render(&diagnostics.into_vec(), &sources, OutputFormat::Json);
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["severity"], "error");
    assert_eq!(value["code"], "SEM001");
    assert_eq!(value["message"], "undefined method 'oops' for Program");
    assert_eq!(value["source"], "main.qz");
    assert_eq!(value["line"], 1);
    assert_eq!(value["column"], 1);
}
