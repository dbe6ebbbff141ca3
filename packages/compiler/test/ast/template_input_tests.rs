/**
 * Template Input Tests
 *
 * Deserializing view trees from JSON, code block wrappers and the naming
 * settings that place generated views
 */

#[cfg(test)]
mod tests {
    use duel_compiler::ast::{
        BoundParams, CallCommand, CodeBlockKind, CodeBlockNode, CommandNode, ElementNode, ForCommand, Node,
        PartCommand, ViewCommand,
    };
    use duel_compiler::{compile_server, CodeGenSettings, CompilerError, SourcePosition};

    #[test]
    fn should_deserialize_commands_and_positions() -> anyhow::Result<()> {
        let json = r#"{
            "name": "foo.List",
            "clientOnly": true,
            "position": { "index": 0, "line": 1, "column": 0 },
            "children": [
                { "Command": { "For": {
                    "each": { "CodeBlock": { "kind": "expression", "value": "data.items" } },
                    "position": { "index": 12, "line": 2, "column": 4 },
                    "children": [ { "Literal": { "value": "x" } } ]
                } } },
                { "Command": { "Call": {
                    "view": { "Literal": { "value": "foo.Item" } },
                    "defer": true
                } } },
                { "CodeComment": { "value": "note" } }
            ]
        }"#;

        let view: ViewCommand = serde_json::from_str(json)?;
        assert_eq!(view.name, "foo.List");
        assert!(view.client_only);
        assert!(!view.server_only);
        assert_eq!(view.children.len(), 3);

        match &view.children[0] {
            Node::Command(CommandNode::For(each)) => {
                assert_eq!(each.each.as_deref(), Some(&Node::expression("data.items")));
                assert!(each.in_.is_none());
                assert_eq!(each.position, Some(SourcePosition::new(12, 2, 4)));
                assert_eq!(each.children, vec![Node::literal("x")]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &view.children[1] {
            Node::Command(CommandNode::Call(call)) => {
                assert!(call.defer);
                assert!(call.children.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(view.children[2].position(), None);
        Ok(())
    }

    #[test]
    fn should_read_the_in_attribute_of_loops() -> anyhow::Result<()> {
        let each: ForCommand = serde_json::from_str(r#"{ "in": { "Literal": { "value": "data" } } }"#)?;
        assert_eq!(each.in_.as_deref().and_then(Node::as_literal), Some("data"));
        Ok(())
    }

    #[test]
    fn should_reject_unknown_node_kinds() {
        let result = serde_json::from_str::<Node>(r#"{ "Widget": { "value": "x" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn should_surface_json_errors_with_positions() {
        let err: CompilerError = serde_json::from_str::<ViewCommand>("{\n  \"name\": }")
            .map_err(CompilerError::from)
            .unwrap_err();
        let position = err.position().expect("json position");
        assert_eq!(position.line, 2);
    }

    #[test]
    fn should_compile_a_deserialized_view() -> anyhow::Result<()> {
        let view: ViewCommand = serde_json::from_str(
            r#"{ "name": "Hello", "children": [ { "Element": { "tag": "b", "children": [ { "Literal": { "value": "hi" } } ] } } ] }"#,
        )?;
        let output = compile_server(&[view], &CodeGenSettings::default())?;
        assert!(output.contains("this.write(context, \"<b>hi</b>\");"));
        Ok(())
    }

    #[test]
    fn should_detect_bound_names() {
        let block = CodeBlockNode::expression("data.items[index].name + key");
        assert_eq!(
            block.bound_params(),
            BoundParams::DATA | BoundParams::INDEX | BoundParams::KEY
        );
        // the call still passes count to reach key
        assert_eq!(block.arg_size(), 4);
        assert_eq!(
            block.client_code(false),
            "function(data,index,count,key){return(data.items[index].name + key);}"
        );
        assert_eq!(
            block.client_code(true),
            "function(data, index, count, key) { return (data.items[index].name + key); }"
        );
    }

    #[test]
    fn should_wrap_each_block_kind() {
        assert_eq!(CodeBlockNode::statement(" x = 1; ").client_code(false), "function(){x = 1;}");
        assert_eq!(
            CodeBlockNode::markup("data.html").client_code(true),
            "function(data) { return duel.raw(data.html); }"
        );
        let markup = CodeBlockNode::markup("data").at(SourcePosition::new(3, 1, 3));
        let plain = markup.as_expression();
        assert_eq!(plain.kind, CodeBlockKind::Expression);
        assert_eq!(plain.position, markup.position);
        assert_eq!(markup.to_string(), "<%#data%>");
    }

    #[test]
    fn should_gather_call_parts() {
        let call = CallCommand {
            view: Some(Box::new(Node::literal("Layout"))),
            data: None,
            index: None,
            count: None,
            key: None,
            defer: false,
            children: vec![
                Node::literal("  "),
                Node::literal("loose"),
                Node::Command(CommandNode::Part(PartCommand {
                    name: "footer".into(),
                    children: vec![],
                    position: None,
                })),
                Node::literal("more"),
            ],
            position: None,
        };
        let parts = call.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "");
        assert_eq!(parts[0].children, vec![Node::literal("loose"), Node::literal("more")]);
        assert_eq!(parts[1].name, "footer");
    }

    #[test]
    fn should_recognize_link_attributes() {
        assert!(ElementNode::new("img").is_link_attribute("src"));
        assert!(ElementNode::new("form").is_link_attribute("action"));
        let twitter = ElementNode::new("meta")
            .with_attr("name", Some(Node::literal("twitter:image")))
            .with_attr("content", Some(Node::literal("/t.png")));
        assert!(twitter.is_link_attribute("content"));
    }

    #[test]
    fn should_place_views_by_prefix() -> anyhow::Result<()> {
        let settings: CodeGenSettings = serde_json::from_str(
            r#"{ "serverPrefix": "com.acme.views", "clientPrefix": " ", "lowercaseClientPaths": false }"#,
        )?;
        assert!(settings.has_server_prefix());
        // blank prefixes count as none
        assert!(!settings.has_client_prefix());
        assert_eq!(settings.server_name("Shop.Cart"), "com.acme.views.Shop.Cart");
        assert_eq!(settings.client_name("Shop.Cart"), "Shop.Cart");
        assert_eq!(settings.server_path("Shop.Cart", ".java"), "com/acme/views/Shop/Cart.java");
        assert_eq!(settings.client_path("Shop.Cart", ".js"), "Shop/Cart.js");
        Ok(())
    }
}
