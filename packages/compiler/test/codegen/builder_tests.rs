/**
 * CodeDOM Builder Tests
 *
 * Template trees are built into view classes and checked statement by
 * statement against the expected render bodies
 */

#[cfg(test)]
mod tests {
    use duel_compiler::ast::{
        CallCommand, CodeBlockNode, CommandNode, ElementNode, IfCommand, Node, PartCommand, TextNode,
        ViewCommand, XorCommand,
    };
    use duel_compiler::codedom::expression::*;
    use duel_compiler::codedom::statement::*;
    use duel_compiler::codedom::utility::render_params;
    use duel_compiler::codedom::{CodeType, Member, Parameter, TypeDeclaration};
    use duel_compiler::{CodeDomBuilder, CodeGenSettings, CompilerError, SourcePosition};

    fn build_with(settings: CodeGenSettings, children: Vec<Node>) -> TypeDeclaration {
        CodeDomBuilder::new(settings)
            .build_view(&ViewCommand::new("foo.Bar", children))
            .expect("builds")
    }

    fn build(children: Vec<Node>) -> TypeDeclaration {
        build_with(CodeGenSettings::default(), children)
    }

    fn build_err(children: Vec<Node>) -> CompilerError {
        CodeDomBuilder::new(CodeGenSettings::default())
            .build_view(&ViewCommand::new("foo.Bar", children))
            .unwrap_err()
    }

    fn render_body(view: &TypeDeclaration) -> Vec<Statement> {
        view.find_method("render").expect("render method").statements.clone()
    }

    fn call(method: &str, args: Vec<Expression>) -> Statement {
        let mut all = vec![context_ref()];
        all.extend(args);
        expr_stmt(invoke_this(CodeType::Void, method, all))
    }

    fn write(value: impl Into<Primitive>) -> Statement {
        call("write", vec![primitive(value)])
    }

    fn data_encode(value: Expression) -> Statement {
        call("dataEncode", vec![value, primitive(1)])
    }

    fn write_extras(needs_tags: bool) -> Statement {
        call("writeExtras", vec![primitive(needs_tags)])
    }

    fn next_id(name: &str) -> Statement {
        var_decl(
            CodeType::String,
            name,
            invoke_this(CodeType::String, "nextID", vec![context_ref()]),
        )
    }

    fn bound(name: &str) -> Expression {
        render_params()
            .iter()
            .find(|param| param.name == name)
            .map(Parameter::var_ref)
            .expect("bound name")
    }

    #[test]
    fn should_name_the_class_from_the_view() {
        let view = CodeDomBuilder::new(CodeGenSettings {
            server_prefix: Some("com.example".to_string()),
            ..CodeGenSettings::default()
        })
        .build_view(&ViewCommand::new("Widget", vec![Node::literal("x")]))
        .unwrap();
        assert_eq!(view.namespace.as_deref(), Some("com.example"));
        assert_eq!(view.name, "Widget");
        assert_eq!(view.full_name(), "com.example.Widget");
    }

    #[test]
    fn should_reject_unnamed_views() {
        let err = CodeDomBuilder::new(CodeGenSettings::default())
            .build_view(&ViewCommand::new("  ", vec![]))
            .unwrap_err();
        assert!(matches!(err, CompilerError::InvalidView { .. }));
        assert_eq!(err.to_string(), "VIEW is missing name");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn should_write_markup_blocks_raw() {
        let view = build(vec![Node::markup("data.html")]);
        assert_eq!(
            render_body(&view),
            vec![call(
                "write",
                vec![property(bound("data"), primitive("html")).with_parens()]
            )]
        );
    }

    #[test]
    fn should_keep_statement_blocks_as_methods() {
        let view = build(vec![Node::statement("data.n = 1;")]);
        let method = view.find_method("code_1").expect("statement method");
        assert_eq!(method.statements.last(), Some(&return_stmt(undefined_expr())));
        assert_eq!(
            render_body(&view),
            vec![call(
                "htmlEncode",
                vec![invoke_this(
                    CodeType::Object,
                    "code_1",
                    render_params().iter().map(Parameter::var_ref).collect()
                )]
            )]
        );
    }

    #[test]
    fn should_encode_literal_text_at_compile_time() {
        let view = build(vec![
            Node::literal("a < b"),
            Node::Comment(TextNode::new(" note ")),
            Node::literal("!"),
        ]);
        assert_eq!(render_body(&view), vec![write("a &lt; b<!-- note -->!")]);
    }

    #[test]
    fn should_keep_template_comments_out_of_markup() {
        let view = build(vec![
            Node::literal("a"),
            Node::CodeComment(TextNode::new("internal")),
            Node::literal("b"),
        ]);
        assert_eq!(render_body(&view), vec![write('a'), comment("internal"), write('b')]);
    }

    #[test]
    fn should_normalize_whitespace_outside_preformatted_text() {
        let settings = CodeGenSettings {
            normalize_whitespace: true,
            ..CodeGenSettings::default()
        };
        let view = build_with(
            settings,
            vec![
                ElementNode::new("p")
                    .with_children(vec![Node::literal("\n  Hello   world\n")])
                    .into(),
                ElementNode::new("pre")
                    .with_children(vec![Node::literal("a\n  b")])
                    .into(),
            ],
        );
        assert_eq!(render_body(&view), vec![write("<p> Hello world</p><pre>a\n  b</pre>")]);
    }

    #[test]
    fn should_pass_script_contents_through() {
        let view = build(vec![ElementNode::new("script")
            .with_children(vec![Node::literal("if (a < b) {}")])
            .into()]);
        assert_eq!(
            render_body(&view),
            vec![write_extras(true), write("<script>if (a < b) {}</script>")]
        );
    }

    #[test]
    fn should_write_extras_before_closing_body_with_scripts() {
        let view = build(vec![ElementNode::new("body")
            .with_children(vec![Node::expression("this.x")])
            .into()]);
        let body = render_body(&view);
        // once for the deferred block; the top-level path needs no second setup
        let extras = body.iter().filter(|stmt| **stmt == write_extras(false)).count();
        assert_eq!(extras, 1);
        assert_eq!(body.last(), Some(&write(");</script>\n</body>")));
    }

    #[test]
    fn should_defer_hybrid_values_when_undefined() {
        let view = build(vec![Node::expression("total")]);
        let val = variable(CodeType::Object, "val_1");
        let id = variable(CodeType::String, "id_1");
        assert_eq!(
            render_body(&view),
            vec![
                var_decl(CodeType::Object, "val_1", extra_ref("total").with_parens()),
                condition(
                    binary(BinaryOperator::IdentityInequality, val.clone(), undefined_expr()),
                    vec![call("htmlEncode", vec![val])],
                    vec![
                        write("<script id=\""),
                        next_id("id_1"),
                        call("write", vec![id.clone()]),
                        write("\">"),
                        write_extras(false),
                        write("duel(function(){return(total);})().toDOM("),
                        data_encode(id),
                        write(");</script>"),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn should_defer_untranslatable_attributes_to_a_script() {
        let element = ElementNode::new("div")
            .with_attr("id", Some(Node::literal("main")))
            .with_attr("title", Some(Node::expression("this.t")));
        let view = build(vec![element.into()]);
        assert_eq!(
            render_body(&view),
            vec![
                write("<div id=\"main\"></div><script>"),
                write_extras(false),
                write("duel({title:function(){return(this.t);}})().toDOM('main',1);</script>"),
            ]
        );
    }

    #[test]
    fn should_generate_ids_for_deferred_attributes() {
        let element = ElementNode::new("span").with_attr("title", Some(Node::expression("this.t")));
        let view = build(vec![element.into()]);
        let id = variable(CodeType::String, "id_1");
        assert_eq!(
            render_body(&view),
            vec![
                next_id("id_1"),
                write("<span id=\""),
                call("write", vec![id.clone()]),
                write("\"></span><script>"),
                write_extras(false),
                write("duel({title:function(){return(this.t);}})().toDOM("),
                data_encode(id),
                write(",1);</script>"),
            ]
        );
    }

    #[test]
    fn should_defer_calls_when_asked() {
        let call_cmd = CommandNode::Call(CallCommand {
            view: Some(Box::new(Node::literal("foo.Other"))),
            data: None,
            index: None,
            count: None,
            key: None,
            defer: true,
            children: vec![],
            position: None,
        });
        let view = build(vec![call_cmd.into()]);
        let id = variable(CodeType::String, "id_1");
        assert_eq!(
            render_body(&view),
            vec![
                write("<script id=\""),
                next_id("id_1"),
                call("write", vec![id.clone()]),
                write("\">"),
                write_extras(false),
                write("foo.Other("),
                data_encode(bound("data")),
                write(','),
                data_encode(bound("index")),
                write(','),
                data_encode(bound("count")),
                write(','),
                data_encode(bound("key")),
                write(").toDOM("),
                data_encode(id),
                write(");</script>"),
            ]
        );
        // deferred calls never hold a server-side view
        assert!(view.find_method("init").is_none());
    }

    #[test]
    fn should_pass_parts_to_called_views() {
        let call_cmd = CommandNode::Call(CallCommand {
            view: Some(Box::new(Node::literal("foo.Layout"))),
            data: None,
            index: None,
            count: None,
            key: None,
            defer: false,
            children: vec![Node::Command(CommandNode::Part(PartCommand {
                name: "title".into(),
                children: vec![Node::literal("Home")],
                position: None,
            }))],
            position: None,
        });
        let view = build(vec![call_cmd.into()]);

        let part = view
            .members
            .iter()
            .find_map(|member| match member {
                Member::Type(t) => Some(t),
                _ => None,
            })
            .expect("part type");
        assert_eq!(part.name, "part_1");
        assert_eq!(
            part.find_method("getPartName").unwrap().statements,
            vec![return_stmt(primitive("title"))]
        );

        let init = view.find_method("init").expect("init method");
        assert_eq!(
            init.statements,
            vec![expr_stmt(binary(
                BinaryOperator::Assign,
                field_ref(this_ref(), "view_1", CodeType::View),
                object_create("foo.Layout", vec![object_create("part_1", vec![])])
            ))]
        );
    }

    #[test]
    fn should_treat_standalone_if_without_test_as_unconditional() {
        let branch = CommandNode::If(IfCommand {
            test: None,
            children: vec![Node::literal("always")],
            position: None,
        });
        let view = build(vec![branch.into()]);
        assert_eq!(
            render_body(&view),
            vec![condition(primitive(true), vec![write("always")], vec![])]
        );
    }

    #[test]
    fn should_position_translation_errors_in_the_template() {
        let xor = CommandNode::Xor(XorCommand {
            branches: vec![IfCommand {
                test: Some(CodeBlockNode::expression("data.foo()").at(SourcePosition::new(40, 3, 12))),
                children: vec![],
                position: None,
            }],
            position: None,
        });
        let err = build_err(vec![xor.into()]);
        assert_eq!(err.to_string(), "Unsupported function call (foo)");
        assert!(err.is_translation());
        assert_eq!(err.position(), Some(SourcePosition::new(40, 3, 12)));
    }

    #[test]
    fn should_reject_unnamed_parts() {
        let part = CommandNode::Part(PartCommand {
            name: " ".into(),
            children: vec![],
            position: Some(SourcePosition::new(5, 1, 5)),
        });
        let err = build_err(vec![part.into()]);
        assert_eq!(err.to_string(), "PART command is missing name");
        assert_eq!(err.position(), Some(SourcePosition::new(5, 1, 5)));
    }

    #[test]
    fn should_reject_nested_views() {
        let nested = CommandNode::View(ViewCommand::new("Inner", vec![]));
        assert_eq!(build_err(vec![nested.into()]).to_string(), "Invalid command node type: VIEW");
    }

    #[test]
    fn should_reuse_a_builder_across_views() {
        let mut builder = CodeDomBuilder::new(CodeGenSettings::default());
        let first = builder
            .build_view(&ViewCommand::new("A", vec![Node::expression("this.x")]))
            .unwrap();
        let second = builder
            .build_view(&ViewCommand::new("B", vec![Node::expression("this.x")]))
            .unwrap();
        assert_eq!(first.name, "A");
        assert_eq!(second.name, "B");
        // identifiers restart with each class
        assert_eq!(render_body(&first), render_body(&second));
    }
}
