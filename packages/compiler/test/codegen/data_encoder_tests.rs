/**
 * Data Encoder Tests
 *
 * JavaScript literal and JSON output, compact and pretty-printed, plus
 * namespace declarations for client views
 */

#[cfg(test)]
mod tests {
    use duel_compiler::codegen::data_encoder::js_string;
    use duel_compiler::codegen::{DataEncoder, JsValue};
    use indexmap::IndexMap;
    use serde_json::json;

    fn object(entries: &[(&str, JsValue)]) -> JsValue {
        let map: IndexMap<String, JsValue> =
            entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        JsValue::Object(map)
    }

    #[test]
    fn should_encode_scalars() {
        let encoder = DataEncoder::compact();
        assert_eq!(encoder.encode(&JsValue::Null), "null");
        assert_eq!(encoder.encode(&JsValue::Undefined), "undefined");
        assert_eq!(encoder.encode(&JsValue::Boolean(true)), "true");
        assert_eq!(encoder.encode(&JsValue::Number(3.0)), "3");
        assert_eq!(encoder.encode(&JsValue::Number(0.25)), "0.25");
        assert_eq!(encoder.encode(&JsValue::Number(f64::INFINITY)), "Infinity");
        assert_eq!(encoder.encode(&JsValue::from("x")), "'x'");
    }

    #[test]
    fn should_escape_strings() {
        assert_eq!(js_string("a'b\\c"), "'a\\'b\\\\c'");
        assert_eq!(js_string("\t\r\n"), "'\\t\\r\\n'");
        assert_eq!(js_string("\u{2028}"), "'\\u2028'");
        // surrogate pairs for astral characters
        assert_eq!(js_string("\u{1F600}"), "'\\uD83D\\uDE00'");
    }

    #[test]
    fn should_quote_keys_only_when_needed() {
        let value = object(&[
            ("plain", JsValue::Number(1.0)),
            ("with-dash", JsValue::Number(2.0)),
            ("class", JsValue::Number(3.0)),
        ]);
        assert_eq!(
            DataEncoder::compact().encode(&value),
            "{plain:1,'with-dash':2,'class':3}"
        );
    }

    #[test]
    fn should_always_quote_keys_in_json() {
        let value = object(&[("a", JsValue::from("it's"))]);
        assert_eq!(DataEncoder::compact().encode_json(&value), "{\"a\":\"it's\"}");
    }

    #[test]
    fn should_encode_nested_arrays_compactly() {
        let value: JsValue = json!([1, [2, [3]], { "k": null }]).into();
        assert_eq!(DataEncoder::compact().encode(&value), "[1,[2,[3]],{k:null}]");
    }

    #[test]
    fn should_pretty_print_nested_values() {
        let value: JsValue = json!({ "list": [1, 2], "one": { "x": true } }).into();
        assert_eq!(
            DataEncoder::new("\n", "  ").encode(&value),
            "{\n  list: [\n    1,\n    2\n  ],\n  one: { x: true }\n}"
        );
    }

    #[test]
    fn should_write_empty_containers_tightly() {
        let encoder = DataEncoder::new("\n", "\t");
        assert_eq!(encoder.encode(&JsValue::Array(vec![])), "[]");
        assert_eq!(encoder.encode(&JsValue::Object(IndexMap::new())), "{}");
    }

    #[test]
    fn should_write_snippets_verbatim() {
        let value = JsValue::Array(vec![JsValue::snippet("function(){return(1);}")]);
        assert_eq!(DataEncoder::compact().encode(&value), "[function(){return(1);}]");
    }

    #[test]
    fn should_indent_from_the_given_depth() {
        let encoder = DataEncoder::new("\n", "\t");
        let mut output = String::new();
        encoder.write(&mut output, &json!([1, 2]).into(), 2);
        assert_eq!(output, "[\n\t\t\t1,\n\t\t\t2\n\t\t]");
    }

    #[test]
    fn should_declare_each_namespace_once() {
        let encoder = DataEncoder::compact();
        let mut namespaces = Vec::new();
        let mut output = String::new();
        assert!(encoder.write_namespace(&mut output, &mut namespaces, "a.b.c.View").unwrap());
        assert!(encoder.write_namespace(&mut output, &mut namespaces, "a.b.d.View").unwrap());
        assert!(!encoder.write_namespace(&mut output, &mut namespaces, "a.b.Other").unwrap());
        assert_eq!(output, "var a=a||{};a.b=a.b||{};a.b.c=a.b.c||{};a.b.d=a.b.d||{};");
        assert_eq!(namespaces, vec!["a", "a.b", "a.b.c", "a.b.d"]);
    }

    #[test]
    fn should_never_redeclare_global_roots() {
        let encoder = DataEncoder::new("\n", "\t");
        let mut namespaces = Vec::new();
        let mut output = String::new();
        assert!(encoder.write_namespace(&mut output, &mut namespaces, "window.app.Main").unwrap());
        assert_eq!(output, "window.app = window.app || {};\n");
    }

    #[test]
    fn should_reject_invalid_identifiers() {
        let encoder = DataEncoder::compact();
        let mut namespaces = Vec::new();
        let mut output = String::new();
        assert!(encoder.write_namespace(&mut output, &mut namespaces, "a.1b").is_err());
        assert!(encoder.write_namespace(&mut output, &mut namespaces, "new.View").is_err());
        assert!(output.is_empty());
    }
}
