/**
 * Binding Translator Tests
 *
 * Fragments are translated into CodeDOM and, where the shape matters more
 * than the tree, rendered through the server emitter for comparison
 */

#[cfg(test)]
mod tests {
    use duel_compiler::codedom::expression::*;
    use duel_compiler::codedom::statement::*;
    use duel_compiler::codedom::utility::*;
    use duel_compiler::codedom::{CodeType, IdentAllocator};
    use duel_compiler::script::{ScriptTranslator, TranslationResult};
    use duel_compiler::{CompilerError, ServerCodeGen, SourcePosition};

    fn translate(source: &str) -> TranslationResult {
        let mut scope = IdentAllocator::new();
        ScriptTranslator::new(&mut scope).translate(source).expect("translates")
    }

    fn translate_err(source: &str) -> CompilerError {
        let mut scope = IdentAllocator::new();
        ScriptTranslator::new(&mut scope).translate(source).unwrap_err()
    }

    fn body(result: &TranslationResult) -> Vec<Statement> {
        result.method().expect("method").statements.clone()
    }

    /// Renders the value of the fragment's final return.
    fn java(source: &str) -> String {
        let result = translate(source);
        let value = match body(&result).pop() {
            Some(Statement::Return(ret)) => ret.expr.expect("return value"),
            other => panic!("expected return, got {:?}", other),
        };
        let mut output = String::new();
        ServerCodeGen::default().write_expression_code(&mut output, &value);
        output
    }

    fn java_statement(statement: &Statement) -> String {
        let mut output = String::new();
        ServerCodeGen::default().write_statement_code(&mut output, statement);
        output
    }

    #[test]
    fn should_read_properties_through_helpers() {
        assert_eq!(java("function(data){return data.name;}"), "this.getProperty(data, \"name\")");
        assert_eq!(
            java("function(data, index){return data.items[index];}"),
            "this.getProperty(this.getProperty(data, \"items\"), index)"
        );
    }

    #[test]
    fn should_lower_strict_equality_to_helper() {
        assert_eq!(
            java("function(data){return data.a === 'x';}"),
            "this.equal(this.getProperty(data, \"a\"), \"x\")"
        );
        assert_eq!(
            java("function(data){return data.a !== 'x';}"),
            "!this.equal(this.getProperty(data, \"a\"), \"x\")"
        );
    }

    #[test]
    fn should_keep_strict_equality_native_against_null() {
        assert_eq!(java("function(data){return data === null;}"), "data == null");
        assert_eq!(
            java("function(data){return data.x !== undefined;}"),
            "this.getProperty(data, \"x\") != JSUtility.UNDEFINED"
        );
    }

    #[test]
    fn should_lower_loose_equality_to_coercion() {
        assert_eq!(java("function(data){return data == null;}"), "this.coerceEqual(data, null)");
        assert_eq!(java("function(index){return index != 2;}"), "!this.coerceEqual(index, 2)");
    }

    #[test]
    fn should_add_numbers_natively() {
        assert_eq!(java("function(index){return index + 1;}"), "index + 1");
        assert_eq!(
            java("function(index, count){return (index + 1) * count;}"),
            "(index + 1) * count"
        );
    }

    #[test]
    fn should_concatenate_when_either_side_is_a_string() {
        assert_eq!(
            java("function(data){return 'n=' + data.n;}"),
            "\"n=\" + DuelData.coerceString(this.getProperty(data, \"n\"))"
        );
        assert_eq!(
            java("function(key, index){return key + index;}"),
            "key + DuelData.coerceString(index)"
        );
    }

    #[test]
    fn should_coerce_arithmetic_operands() {
        assert_eq!(
            java("function(data){return data.price * 2;}"),
            "DuelData.coerceNumber(this.getProperty(data, \"price\")) * 2"
        );
        assert_eq!(
            java("function(data){return -data.n;}"),
            "-DuelData.coerceNumber(this.getProperty(data, \"n\"))"
        );
    }

    #[test]
    fn should_short_circuit_on_truthiness() {
        assert_eq!(
            java("function(data){return data.a || 'none';}"),
            "this.LogicalOR(this.getProperty(data, \"a\"), \"none\")"
        );
        assert_eq!(java("function(){return true && false;}"), "true && false");
    }

    #[test]
    fn should_coerce_negation_and_conditional_tests() {
        assert_eq!(
            java("function(data){return !data.hidden;}"),
            "!DuelData.coerceBoolean(this.getProperty(data, \"hidden\"))"
        );
        assert_eq!(
            java("function(data){return data.a ? 1 : 2;}"),
            "DuelData.coerceBoolean(this.getProperty(data, \"a\")) ? 1 : 2"
        );
    }

    #[test]
    fn should_rewrite_compound_assignment_on_properties() {
        let result = translate("function(data){ data.n -= 1; }");
        let target = property(variable(CodeType::Object, "data"), primitive("n"));
        let expected = expr_stmt(as_assignment(
            BinaryOperator::Subtract,
            target.clone(),
            ensure_number(target),
            primitive(1),
        ));
        assert_eq!(body(&result)[0], expected);
        assert_eq!(
            java_statement(&expected),
            "\nthis.setProperty(data, \"n\", (DuelData.coerceNumber(this.getProperty(data, \"n\")) - 1));"
        );
    }

    #[test]
    fn should_increment_dynamic_values_safely() {
        let result = translate("function(data){ ++data.n; }");
        let target = property(variable(CodeType::Object, "data"), primitive("n"));
        assert_eq!(body(&result)[0], expr_stmt(safe_pre_increment(target)));
    }

    #[test]
    fn should_track_extras_in_first_use_order() {
        let result = translate("function(){ return b + a + b; }");
        assert_eq!(result.extra_refs.iter().cloned().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(!result.extra_assign);
        assert!(result.has_extras());
        assert_eq!(
            java("function(){ return foo; }"),
            "this.getExtra(context, \"foo\")"
        );
    }

    #[test]
    fn should_write_extras_through_put() {
        let result = translate("function(data){ total = data; }");
        assert!(result.extra_assign);
        assert!(result.extra_refs.is_empty());
        assert_eq!(
            java_statement(&body(&result)[0]),
            "\nthis.putExtra(context, \"total\", data);"
        );
    }

    #[test]
    fn should_not_treat_globals_as_extras() {
        let result = translate("function(){ return undefined; }");
        assert!(!result.has_extras());
        assert_eq!(body(&result), vec![return_stmt(undefined_expr())]);
    }

    #[test]
    fn should_map_substr_onto_substring() {
        assert_eq!(
            java("function(data){return data.name.substr(0, 3);}"),
            "DuelData.coerceString(this.getProperty(data, \"name\")).substring(0, 0 + 3)"
        );
        assert_eq!(
            java("function(data){return data.toString();}"),
            "DuelData.coerceString(data)"
        );
    }

    #[test]
    fn should_translate_object_and_array_literals() {
        assert_eq!(
            java("function(data){return { a: data, b: [1, 2] };}"),
            "DuelData.asMap(\"a\", data, \"b\", Arrays.asList(1, 2))"
        );
        assert_eq!(java("function(){return new Array(3);}"), "new ArrayList<Object>(3)");
    }

    #[test]
    fn should_rename_statement_locals() {
        let result = translate("function(data){ var x = data.y, z; return x; }");
        assert_eq!(
            body(&result),
            vec![
                compound_decl(vec![
                    VariableDeclStatement::new(
                        CodeType::Object,
                        "x_1",
                        Some(property(variable(CodeType::Object, "data"), primitive("y")))
                    ),
                    VariableDeclStatement::new(CodeType::Object, "z_1", None),
                ]),
                return_stmt(variable(CodeType::Object, "x_1")),
            ]
        );
    }

    #[test]
    fn should_translate_loops_in_statement_blocks() {
        let result = translate("function(){ for (var i = 0; i < 2; i++) { out = i; } }");
        match &body(&result)[0] {
            Statement::Iteration(stmt) => {
                assert!(stmt.init.is_some());
                assert_eq!(stmt.statements.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(result.extra_assign);
    }

    #[test]
    fn should_position_unsupported_calls() {
        let err = translate_err("function(data){ return data.foo(); }");
        assert_eq!(err.to_string(), "Unsupported function call (foo)");
        assert_eq!(err.position(), Some(SourcePosition::new(23, 1, 23)));
        assert!(err.is_translation());
    }

    #[test]
    fn should_reject_invalid_array_lengths() {
        for (source, message) in [
            ("function(){return new Array(-1);}", "Invalid array length (-1)"),
            ("function(){return new Array(2.5);}", "Invalid array length (2.5)"),
            ("function(){return new Array(1e10);}", "Invalid array length (10000000000)"),
        ] {
            let err = translate_err(source);
            assert!(err.is_translation());
            assert_eq!(err.to_string(), message);
            // positioned at the length argument
            assert_eq!(err.position(), Some(SourcePosition::new(28, 1, 28)));
        }

        assert_eq!(java("function(){return new Array(+0);}"), "new ArrayList<Object>()");
        assert_eq!(java("function(){return new Array(1, 2);}"), "Arrays.asList(1, 2)");
    }

    #[test]
    fn should_reject_unsupported_constructs() {
        assert_eq!(
            translate_err("function(data){ return data, 1; }").to_string(),
            "Token not yet supported (,)"
        );
        assert_eq!(
            translate_err("function(){ return this.x; }").to_string(),
            "'this' not legal in binding expressions"
        );
        assert_eq!(
            translate_err("function(){ return new Foo(); }").to_string(),
            "Create object type not yet supported"
        );
        assert_eq!(
            translate_err("function(){ function inner(){} }").to_string(),
            "Nested functions not yet supported."
        );
    }

    #[test]
    fn should_number_methods_per_scope() {
        let mut scope = IdentAllocator::new();
        let names: Vec<String> = (0..3)
            .map(|_| {
                ScriptTranslator::new(&mut scope)
                    .translate("function(data){return data;}")
                    .unwrap()
                    .method()
                    .unwrap()
                    .name
                    .clone()
            })
            .collect();
        assert_eq!(names, vec!["code_1", "code_2", "code_3"]);
    }
}
