//! End-to-end per-file transform behavior.

#[cfg(test)]
mod tests {
    use crate::config::{HostBindingMap, TransformOptions};
    use crate::contract::check_output_contract;
    use crate::transform::transform_plugin_source;
    use pretty_assertions::assert_eq;

    const APP: &str = r#"import React from "react";

function App({ pluginId, theme }) {
  const [items, setItems] = React.useState([]);
  const [currentTheme, setCurrentTheme] = React.useState(theme);

  React.useEffect(() => {
    const onThemeChange = (e) => {
      const next = e.detail?.theme;
      if (next) setCurrentTheme(next);
    };
    window.addEventListener("theme-toggle", onThemeChange);
    return () => window.removeEventListener("theme-toggle", onThemeChange);
  }, []);

  return (
    <div style={{ padding: "30px", color: currentTheme === "dark" ? "white" : "black" }}>
      <h2>Deployments for {pluginId}</h2>
      {items.length === 0 ? (
        <p>No deployments</p>
      ) : (
        <ul>
          {items.map((d) => (
            <li key={d.name}>{d.name}</li>
          ))}
        </ul>
      )}
    </div>
  );
}

export default App;
"#;

    fn react_options() -> TransformOptions {
        TransformOptions::new(HostBindingMap::new().bind("react", "window.React").unwrap())
    }

    #[test]
    fn test_plugin_entry_transform() {
        let options = react_options();
        let out = transform_plugin_source(APP, "App.jsx", &options).unwrap();

        assert!(!out.code.contains("from \"react\""), "got: {}", out.code);
        assert!(out.code.contains("window.React.useState([])"), "got: {}", out.code);
        assert!(out.code.contains("window.React.useEffect("), "got: {}", out.code);
        assert!(
            out.code.contains("window.React.createElement(\"div\""),
            "got: {}",
            out.code
        );
        assert!(!out.code.contains("<div"), "got: {}", out.code);
        assert_eq!(out.report.rewritten_references, 3);
        assert_eq!(out.report.lowered_elements, 5);

        check_output_contract(&out.code, "App.jsx", &options.host_bindings, true).unwrap();
    }

    #[test]
    fn test_transform_is_idempotent() {
        let options = react_options();
        let once = transform_plugin_source(APP, "App.jsx", &options).unwrap();
        let twice = transform_plugin_source(&once.code, "App.jsx", &options).unwrap();

        assert_eq!(once.code, twice.code);
        assert_eq!(twice.report.rewritten_references, 0);
        assert_eq!(twice.report.lowered_elements, 0);
    }

    #[test]
    fn test_already_qualified_source_is_unchanged() {
        let options = TransformOptions::new(HostBindingMap::new().bind("runtime", "Host.Lib").unwrap());
        let source = "Host.Lib.create(x);\n";
        let out = transform_plugin_source(source, "a.js", &options).unwrap();

        assert_eq!(out.code, source);
    }

    #[test]
    fn test_typescript_plugin() {
        let out = transform_plugin_source(
            "import React from \"react\";\n\
             type Props = { title: string };\n\
             export default function Card(props: Props) { return <h1>{props.title}</h1>; }\n",
            "Card.tsx",
            &react_options(),
        )
        .unwrap();

        assert!(
            out.code.contains("window.React.createElement(\"h1\""),
            "got: {}",
            out.code
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = transform_plugin_source("const = ;", "broken.jsx", &react_options()).unwrap_err();

        assert_eq!(err.code(), "PLG-ERR-PARSE-001");
        assert!(err.to_string().contains("broken.jsx"), "got: {}", err);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let out = transform_plugin_source(APP, "App.jsx", &react_options()).unwrap();
        let value = serde_json::to_value(&out).unwrap();

        assert_eq!(value["report"]["rewrittenReferences"], 3);
        assert_eq!(value["report"]["elidedImports"][0]["specifier"], "react");
        assert!(value["code"].as_str().unwrap().contains("window.React"));
    }
}
