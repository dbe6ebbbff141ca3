/**
 * Server Code Generator Tests
 *
 * Whole views compiled to Java source and compared as text
 */

#[cfg(test)]
mod tests {
    use duel_compiler::ast::{CallCommand, CommandNode, ForCommand, IfCommand, Node, XorCommand};
    use duel_compiler::codedom::expression::{unary, variable, UnaryOperator};
    use duel_compiler::codedom::CodeType;
    use duel_compiler::{compile_server, CodeGenSettings, CodeGenerator, ServerCodeGen, ViewCommand};

    const IMPORTS: &str = "import java.io.*;\nimport java.util.*;\nimport java.util.Map.Entry;\nimport org.duelengine.duel.*;\n\n";

    const RENDER_SIGNATURE: &str =
        "(DuelContext context, Object data, int index, int count, String key) throws IOException {";

    fn compile(views: &[ViewCommand]) -> String {
        compile_server(views, &CodeGenSettings::default()).expect("compiles")
    }

    fn class_header(name: &str) -> String {
        format!(
            "public class {name} extends DuelView {{\n\n\
             \tpublic {name}() {{\n\t}}\n\n\
             \tpublic {name}(DuelPart... parts) {{\n\t\tsuper(parts);\n\t}}\n\n",
            name = name
        )
    }

    #[test]
    fn should_report_java_extension() {
        assert_eq!(ServerCodeGen::default().file_extension(), ".java");
    }

    #[test]
    fn should_compile_a_literal_view() {
        let output = compile(&[ViewCommand::new("foo.Bar", vec![Node::literal("Hello")])]);
        let expected = format!(
            "package foo;\n\n{}{}\t@Override\n\tprotected void render{}\n\t\tthis.write(context, \"Hello\");\n\t}}\n}}\n",
            IMPORTS,
            class_header("Bar"),
            RENDER_SIGNATURE
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn should_omit_package_for_top_level_views() {
        let output = compile(&[ViewCommand::new("Bar", vec![Node::literal("x")])]);
        assert!(output.starts_with(IMPORTS));
        assert!(output.contains("\t\tthis.write(context, 'x');\n"));
    }

    #[test]
    fn should_compile_array_iteration_into_helper_method() {
        let each = CommandNode::For(ForCommand {
            each: Some(Box::new(Node::expression("data.items"))),
            in_: None,
            count: None,
            data: None,
            children: vec![Node::expression("data")],
            position: None,
        });
        let output = compile(&[ViewCommand::new("Loop", vec![each.into()])]);
        let expected = format!(
            "{}{}\t@Override\n\tprotected void render{}\n\
             \t\tCollection items_1 = DuelData.coerceCollection(this.getProperty(data, \"items\"));\n\
             \t\tint index_1 = 0,\n\
             \t\t\tcount_1 = items_1.size();\n\
             \t\tfor (Iterator iterator_1=items_1.iterator(); iterator_1.hasNext(); index_1++) {{\n\
             \t\t\tthis.render_2(context, iterator_1.next(), index_1, count_1, null);\n\
             \t\t}}\n\
             \t}}\n\n\
             \tprivate void render_2{}\n\
             \t\tthis.htmlEncode(context, data);\n\
             \t}}\n}}\n",
            IMPORTS,
            class_header("Loop"),
            RENDER_SIGNATURE,
            RENDER_SIGNATURE
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn should_iterate_object_entries_with_keys() {
        let each = CommandNode::For(ForCommand {
            each: None,
            in_: Some(Box::new(Node::expression("data"))),
            count: None,
            data: None,
            children: vec![Node::expression("key")],
            position: None,
        });
        let output = compile(&[ViewCommand::new("Props", vec![each.into()])]);
        assert!(output.contains("\t\tCollection items_1 = DuelData.coerceMap(data).entrySet();\n"));
        assert!(output.contains("\t\t\tEntry entry_1 = (Entry)iterator_1.next();\n"));
        assert!(output.contains(
            "\t\t\tthis.render_2(context, entry_1.getValue(), index_1, count_1, DuelData.coerceString(entry_1.getKey()));\n"
        ));
    }

    #[test]
    fn should_compile_conditional_chains() {
        let xor = CommandNode::Xor(XorCommand {
            branches: vec![
                IfCommand {
                    test: Some(duel_compiler::ast::CodeBlockNode::expression("data === 0")),
                    children: vec![Node::literal("zero")],
                    position: None,
                },
                IfCommand {
                    test: None,
                    children: vec![Node::literal("many")],
                    position: None,
                },
            ],
            position: None,
        });
        let output = compile(&[ViewCommand::new("Cond", vec![xor.into()])]);
        assert!(output.contains(
            "\t\tif (this.equal(data, 0)) {\n\
             \t\t\tthis.write(context, \"zero\");\n\
             \t\t} else {\n\
             \t\t\tthis.write(context, \"many\");\n\
             \t\t}\n"
        ));
    }

    #[test]
    fn should_initialize_called_views() {
        let call = CommandNode::Call(CallCommand {
            view: Some(Box::new(Node::literal("foo.Item"))),
            data: Some(Box::new(Node::expression("data.item"))),
            index: None,
            count: None,
            key: None,
            defer: false,
            children: vec![],
            position: None,
        });
        let output = compile(&[ViewCommand::new("foo.Page", vec![call.into()])]);
        let expected = format!(
            "package foo;\n\n{}{}\t@Override\n\tprotected void render{}\n\
             \t\tthis.renderView(context, this.view_1, this.getProperty(data, \"item\"), index, count, key);\n\
             \t}}\n\n\
             \tprivate DuelView view_1;\n\n\
             \t@Override\n\tprotected void init() {{\n\
             \t\tthis.view_1 = new foo.Item();\n\
             \t}}\n}}\n",
            IMPORTS,
            class_header("Page"),
            RENDER_SIGNATURE
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn should_write_package_once_and_skip_client_only_views() {
        let mut hidden = ViewCommand::new("foo.Hidden", vec![Node::literal("h")]);
        hidden.client_only = true;
        let output = compile(&[
            ViewCommand::new("foo.A", vec![Node::literal("a")]),
            hidden,
            ViewCommand::new("foo.B", vec![Node::literal("b")]),
        ]);
        assert_eq!(output.matches("package foo;").count(), 1);
        assert_eq!(output.matches("import java.io.*;").count(), 1);
        assert!(output.contains("}\n\npublic class B extends DuelView {"));
        assert!(!output.contains("Hidden"));
    }

    #[test]
    fn should_convert_line_endings_and_indentation() {
        let settings = CodeGenSettings {
            newline: "\r\n".to_string(),
            indent: "  ".to_string(),
            convert_line_endings: true,
            ..CodeGenSettings::default()
        };
        let output = compile_server(&[ViewCommand::new("Bar", vec![Node::literal("a\nb")])], &settings).unwrap();
        assert_eq!(
            output,
            "import java.io.*;\r\nimport java.util.*;\r\nimport java.util.Map.Entry;\r\nimport org.duelengine.duel.*;\r\n\r\n\
             public class Bar extends DuelView {\r\n\r\n\
             \x20 public Bar() {\r\n  }\r\n\r\n\
             \x20 public Bar(DuelPart... parts) {\r\n    super(parts);\r\n  }\r\n\r\n\
             \x20 @Override\r\n  protected void render(DuelContext context, Object data, int index, int count, String key) throws IOException {\r\n\
             \x20   this.write(context, \"a\\r\\nb\");\r\n  }\r\n}\r\n"
        );
    }

    #[test]
    fn should_encode_non_ascii_text_as_entities_by_default() {
        let output = compile(&[ViewCommand::new("Bar", vec![Node::literal("caf\u{e9}")])]);
        assert!(output.contains("this.write(context, \"caf&eacute;\");"));
    }

    #[test]
    fn should_escape_raw_non_ascii_in_java_strings() {
        let settings = CodeGenSettings {
            encode_non_ascii: false,
            ..CodeGenSettings::default()
        };
        let output = compile_server(&[ViewCommand::new("Bar", vec![Node::literal("\u{3b1}=1")])], &settings).unwrap();
        assert!(output.contains("this.write(context, \"\\u03B1=1\");"));
    }

    #[test]
    fn should_stop_at_the_first_failing_view() {
        let bad = ViewCommand::new("Bad", vec![Node::Command(CommandNode::For(ForCommand {
            each: None,
            in_: None,
            count: None,
            data: None,
            children: vec![Node::literal("x")],
            position: None,
        }))]);
        let err = compile_server(&[bad], &CodeGenSettings::default()).unwrap_err();
        assert_eq!(err.to_string(), "FOR loop missing arguments");
    }

    #[test]
    fn should_render_part_types_nested_in_the_view() {
        let part = CommandNode::Part(duel_compiler::ast::PartCommand {
            name: "title".into(),
            children: vec![Node::literal("Default")],
            position: None,
        });
        let output = compile(&[ViewCommand::new("Layout", vec![part.into()])]);
        assert!(output.contains("\tprivate class part_1 extends DuelPart {\n"));
        assert!(output.contains("\t\t@Override\n\t\tpublic String getPartName() {\n\t\t\treturn \"title\";\n\t\t}\n"));
        assert!(output.contains("\t\tthis.renderPart(context, \"title\", data, index, count, key);\n"));
        assert!(output.contains("\t\tthis.addPart(new part_1());\n"));
    }

    #[test]
    fn should_keep_nested_signs_apart() {
        let output = compile(&[ViewCommand::new("Neg", vec![Node::expression("- -index")])]);
        assert!(output.contains("this.write(context, (- -index));"));
        assert!(!output.contains("--index"));

        let x = variable(CodeType::Int, "x");
        let cases = [
            (unary(UnaryOperator::Negation, unary(UnaryOperator::PreDecrement, x.clone())), "- --x"),
            (unary(UnaryOperator::Positive, unary(UnaryOperator::Positive, x.clone())), "+ +x"),
            (unary(UnaryOperator::Positive, unary(UnaryOperator::PreIncrement, x.clone())), "+ ++x"),
            (unary(UnaryOperator::Negation, unary(UnaryOperator::LogicalNegation, x.clone())), "-!x"),
            (unary(UnaryOperator::PreIncrement, x), "++x"),
        ];
        let codegen = ServerCodeGen::new(CodeGenSettings::default());
        for (expr, expected) in cases {
            let mut text = String::new();
            codegen.write_expression_code(&mut text, &expr);
            assert_eq!(text, expected);
        }
    }
}
