//! Markup lowering onto host-qualified element constructors.

#[cfg(test)]
mod tests {
    use crate::config::{HostBindingMap, TransformConfig, TransformOptions};
    use crate::transform::{transform_plugin_source, TransformOutput};

    fn squash(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// `runtime → Host.Lib` with `Host.Lib.make` as the element constructor.
    fn host_lib_options() -> TransformOptions {
        let config: TransformConfig = serde_json::from_str(
            r#"{
                "hostBindings": { "runtime": "Host.Lib" },
                "elementConstructorPath": "Host.Lib.make"
            }"#,
        )
        .unwrap();
        TransformOptions::try_from(&config).unwrap()
    }

    fn lower(source: &str) -> TransformOutput {
        transform_plugin_source(source, "Widget.jsx", &host_lib_options()).unwrap()
    }

    #[test]
    fn test_nested_elements_lower_to_host_constructor() {
        let out = lower("import Lib from \"runtime\";\nconst el = <div><span/></div>;\n");

        assert!(
            squash(&out.code).contains("Host.Lib.make(\"div\",null,Host.Lib.make(\"span\",null))"),
            "expected nested host calls, got: {}",
            out.code
        );
        assert!(!out.code.contains("runtime"), "got: {}", out.code);
        assert_eq!(out.report.lowered_elements, 2);
    }

    #[test]
    fn test_fragment_uses_host_fragment() {
        let out = lower("import Lib from \"runtime\";\nconst el = <><Card/></>;\n");

        assert!(
            squash(&out.code).contains("Host.Lib.make(Host.Lib.Fragment,null,Host.Lib.make(Card,null))"),
            "got: {}",
            out.code
        );
    }

    #[test]
    fn test_member_tag_through_runtime_binding() {
        let out = lower("import Lib from \"runtime\";\nconst el = <Lib.Provider value={1}/>;\n");

        assert!(
            squash(&out.code).contains("Host.Lib.make(Host.Lib.Provider,{value:1})"),
            "member tag on the runtime must be qualified, got: {}",
            out.code
        );
    }

    #[test]
    fn test_attributes_become_props_object() {
        let out = lower("const el = <input disabled data-id=\"x\" {...rest} />;\n");

        assert!(
            squash(&out.code).contains("{disabled:true,\"data-id\":\"x\",...rest}"),
            "got: {}",
            out.code
        );
    }

    #[test]
    fn test_expression_children_are_rewritten() {
        let out = lower("import Lib from \"runtime\";\nconst el = <p>{Lib.version}{/* note */}</p>;\n");

        assert!(
            squash(&out.code).contains("Host.Lib.make(\"p\",null,Host.Lib.version)"),
            "got: {}",
            out.code
        );
    }

    #[test]
    fn test_multiline_text_is_collapsed() {
        let out = lower("const el = (\n  <p>\n    Hello\n    world\n  </p>\n);\n");

        assert!(
            out.code.contains("\"Hello world\""),
            "text should be trimmed and joined, got: {}",
            out.code
        );
    }

    #[test]
    fn test_markup_inside_callbacks_is_lowered() {
        let out = lower(
            "import Lib from \"runtime\";\n\
             const list = items.map((item) => <li key={item.id}>{item.name}</li>);\n",
        );
        let code = squash(&out.code);

        assert!(
            code.contains("Host.Lib.make(\"li\",{key:item.id},item.name)"),
            "got: {}",
            out.code
        );
        assert!(!out.code.contains("<li"), "got: {}", out.code);
    }

    #[test]
    fn test_default_targets_follow_first_binding() {
        let options = TransformOptions::new(
            HostBindingMap::new()
                .bind("react", "window.React")
                .unwrap()
                .bind("react-dom", "window.ReactDOM")
                .unwrap(),
        );
        let out = transform_plugin_source(
            "import React from \"react\";\nexport default function App() { return <div className=\"x\">hi</div>; }\n",
            "App.jsx",
            &options,
        )
        .unwrap();

        assert!(
            squash(&out.code).contains("window.React.createElement(\"div\",{className:\"x\"},\"hi\")"),
            "got: {}",
            out.code
        );
    }

    #[test]
    fn test_lowering_disabled_keeps_markup() {
        let config: TransformConfig = serde_json::from_str(
            r#"{ "hostBindings": { "runtime": "Host.Lib" }, "lowerElements": false }"#,
        )
        .unwrap();
        let options = TransformOptions::try_from(&config).unwrap();
        let out = transform_plugin_source(
            "import Lib from \"runtime\";\nconst el = <div>{Lib.version}</div>;\n",
            "Widget.jsx",
            &options,
        )
        .unwrap();

        assert!(out.code.contains("<div>"), "got: {}", out.code);
        assert!(out.code.contains("Host.Lib.version"), "got: {}", out.code);
        assert_eq!(out.report.lowered_elements, 0);

        let out = transform_plugin_source(
            "import Lib, { Fragment } from \"runtime\";\n\
             export default () => <Fragment><Lib.StrictMode /></Fragment>;\n",
            "Widget.jsx",
            &options,
        )
        .unwrap();

        assert!(
            squash(&out.code)
                .contains("<Host.Lib.Fragment><Host.Lib.StrictMode/></Host.Lib.Fragment>"),
            "kept markup must name the host, got: {}",
            out.code
        );
        assert_eq!(out.report.rewritten_references, 3);
    }

    #[test]
    fn test_kept_markup_without_tag_form_fails() {
        let config: TransformConfig = serde_json::from_str(
            r#"{ "hostBindings": { "ui": "ui" }, "lowerElements": false }"#,
        )
        .unwrap();
        let options = TransformOptions::try_from(&config).unwrap();
        let err = transform_plugin_source(
            "import Card from \"ui\";\nconst el = <Card />;\n",
            "Widget.jsx",
            &options,
        )
        .unwrap_err();

        assert_eq!(err.code(), "PLG-ERR-REWRITE-002");
    }

    #[test]
    fn test_markup_in_embedded_callbacks_is_lowered() {
        let out = lower(
            "import Lib from \"runtime\";\n\
             const el = <ul>{items.map((item) => <li>{item}</li>)}</ul>;\n",
        );

        assert!(
            squash(&out.code).contains(
                "Host.Lib.make(\"ul\",null,items.map((item)=>Host.Lib.make(\"li\",null,item)))"
            ),
            "got: {}",
            out.code
        );
        assert_eq!(out.report.lowered_elements, 2);
    }

    #[test]
    fn test_callback_hiding_host_root_fails() {
        let react = TransformOptions::new(HostBindingMap::new().bind("react", "window.React").unwrap());
        let err = transform_plugin_source(
            "import React from \"react\";\nexport default ({ window }) => <div />;\n",
            "App.jsx",
            &react,
        )
        .unwrap_err();
        assert_eq!(err.code(), "PLG-ERR-REWRITE-001");

        let err = transform_plugin_source(
            "import Lib from \"runtime\";\n\
             const el = <ul>{items.map((Host) => <li />)}</ul>;\n",
            "Widget.jsx",
            &host_lib_options(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "PLG-ERR-REWRITE-001");
    }
}
