/**
 * CodeDOM Tests
 *
 * Identifier scopes, coercion helpers and how hand-built trees read once
 * written as server source
 */

#[cfg(test)]
mod tests {
    use duel_compiler::codedom::expression::*;
    use duel_compiler::codedom::statement::*;
    use duel_compiler::codedom::utility::*;
    use duel_compiler::codedom::{AccessModifier, CodeType, IdentifierScope, Member, Method, Primitive};
    use duel_compiler::{CodeGenSettings, ServerCodeGen};

    fn java(expr: &Expression) -> String {
        let mut output = String::new();
        ServerCodeGen::new(CodeGenSettings::default()).write_expression_code(&mut output, expr);
        output
    }

    #[test]
    fn should_allocate_identifiers_per_type() {
        let mut view = create_view_type(None, "A");
        assert_eq!(view.next_ident("render_"), "render_1");
        assert_eq!(view.next_ident("render_"), "render_2");
        assert_eq!(view.next_ident("items_"), "items_1");

        assert!(!view.is_local_ident("i"));
        let renamed = view.unique_ident("i");
        assert_eq!(renamed, "i_1");
        assert_eq!(view.unique_ident("i"), renamed);
        assert!(view.is_local_ident("i"));

        // a fresh type starts its own counters
        let mut other = create_view_type(None, "B");
        assert_eq!(other.next_ident("render_"), "render_1");
    }

    #[test]
    fn should_ignore_allocator_state_in_equality() {
        let mut a = create_view_type(Some("foo".into()), "Bar");
        let b = create_view_type(Some("foo".into()), "Bar");
        a.next_ident("code_");
        assert_eq!(a, b);
    }

    #[test]
    fn should_write_a_bare_view_class() {
        let mut output = String::new();
        ServerCodeGen::new(CodeGenSettings::default())
            .write_type(&mut output, &create_view_type(Some("foo".into()), "Bar"));
        assert_eq!(
            output,
            "package foo;\n\n\
             import java.io.*;\nimport java.util.*;\nimport java.util.Map.Entry;\nimport org.duelengine.duel.*;\n\n\
             public class Bar extends DuelView {\n\n\
             \tpublic Bar() {\n\t}\n\n\
             \tpublic Bar(DuelPart... parts) {\n\t\tsuper(parts);\n\t}\n}\n"
        );
    }

    #[test]
    fn should_classify_numbers_narrowly() {
        assert_eq!(Primitive::number(3.0), Primitive::Int(3));
        assert_eq!(Primitive::number(1e10), Primitive::Long(10_000_000_000));
        assert_eq!(Primitive::number(0.5), Primitive::Double(0.5));
        assert_eq!(Primitive::number(-0.0), Primitive::Double(-0.0));
        assert_eq!(Primitive::number(f64::NAN), Primitive::Double(f64::NAN));
    }

    #[test]
    fn should_write_numeric_literals() {
        assert_eq!(java(&number(10_000_000_000.0)), "10000000000L");
        assert_eq!(java(&number(1.5)), "1.5");
        assert_eq!(java(&number(f64::NAN)), "Double.NaN");
        assert_eq!(java(&number(f64::NEG_INFINITY)), "Double.NEGATIVE_INFINITY");
    }

    #[test]
    fn should_skip_coercion_for_matching_types() {
        let flag = variable(CodeType::Boolean, "flag");
        assert_eq!(ensure_boolean(flag.clone()), flag);
        assert_eq!(ensure_type(&CodeType::Object, primitive(1)), primitive(1));

        let data = variable(CodeType::Object, "data");
        assert_eq!(java(&ensure_type(&CodeType::Int, data.clone())), "DuelData.coerceNumber(data)");
        assert_eq!(java(&ensure_map(data)), "DuelData.coerceMap(data)");
    }

    #[test]
    fn should_write_post_increment_through_echo() {
        let x = variable(CodeType::Object, "x");
        assert_eq!(
            java(&safe_post_increment(x)),
            "this.echo(DuelData.coerceNumber(x), (x = (DuelData.coerceNumber(x) + 1)))"
        );
    }

    #[test]
    fn should_route_property_assignment_through_setters() {
        let data = variable(CodeType::Object, "data");
        let assign = binary(BinaryOperator::Assign, property(data, primitive("a")), primitive(1));
        assert_eq!(java(&assign), "this.setProperty(data, \"a\", 1)");

        let extra = binary(BinaryOperator::Assign, extra_ref("total"), primitive(true));
        assert_eq!(java(&extra), "this.putExtra(context, \"total\", true)");
    }

    #[test]
    fn should_lower_comparisons_left_in_hand_built_trees() {
        let a = variable(CodeType::Object, "a");
        let b = variable(CodeType::Object, "b");
        assert_eq!(
            java(&binary(BinaryOperator::IdentityEquality, a.clone(), b.clone())),
            "this.equal(a, b)"
        );
        assert_eq!(
            java(&binary(BinaryOperator::ValueInequality, a.clone(), b)),
            "!this.coerceEqual(a, b)"
        );
        // null checks stay native
        assert_eq!(java(&binary(BinaryOperator::IdentityInequality, a, null_expr())), "a != null");
    }

    #[test]
    fn should_inline_single_return_methods_only() {
        let params = render_params();
        let value = property(params[1].var_ref(), primitive("name"));

        let simple = Method::new(AccessModifier::Private, CodeType::Object, "code_1", params.clone())
            .with_statements(vec![return_stmt(value.clone())]);
        assert_eq!(inline_method(&simple), Some(value.clone()));

        let compound = Method::new(AccessModifier::Private, CodeType::Object, "code_2", params)
            .with_statements(vec![expr_stmt(value.clone()), return_stmt(value)]);
        assert_eq!(inline_method(&compound), None);
    }

    #[test]
    fn should_find_methods_by_name() {
        let mut view = create_view_type(None, "A");
        view.add(Member::Method(Method::new(
            AccessModifier::Private,
            CodeType::Object,
            "code_1",
            render_params(),
        )));
        assert!(view.find_method("code_1").is_some());
        assert!(view.find_method("code_2").is_none());
        assert_eq!(view.members.len(), 3);
    }
}
