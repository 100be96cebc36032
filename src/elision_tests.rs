//! Import elision: which imports go, what the rewrite table learns.

#[cfg(test)]
mod tests {
    use crate::config::{HostBindingMap, TransformOptions};
    use crate::context::ElidedImport;
    use crate::transform::{transform_plugin_source, TransformOutput};

    fn transform(source: &str, bindings: &[(&str, &str)]) -> TransformOutput {
        let mut map = HostBindingMap::new();
        for (specifier, path) in bindings {
            map = map.bind(specifier, path).unwrap();
        }
        transform_plugin_source(source, "test.jsx", &TransformOptions::new(map)).unwrap()
    }

    #[test]
    fn test_host_import_is_removed() {
        let out = transform(
            "import React from \"react\";\nReact.useState(0);\n",
            &[("react", "window.React")],
        );

        assert!(
            !out.code.contains("import"),
            "host import should be elided, got: {}",
            out.code
        );
        assert_eq!(
            out.report.elided_imports,
            vec![ElidedImport {
                specifier: "react".to_string(),
                locals: vec!["React".to_string()],
            }]
        );
    }

    #[test]
    fn test_unmapped_import_is_kept() {
        let out = transform(
            "import React from \"react\";\nimport axios from \"axios\";\naxios.get(React.version);\n",
            &[("react", "window.React")],
        );

        assert!(
            out.code.contains("import axios from \"axios\""),
            "non-host import must stay, got: {}",
            out.code
        );
        assert!(!out.code.contains("from \"react\""), "got: {}", out.code);
        assert_eq!(out.report.elided_imports.len(), 1);
    }

    #[test]
    fn test_table_is_keyed_by_local_name() {
        let out = transform(
            "import { useState as useLocalState, useEffect } from \"react\";\nuseLocalState(1);\nuseEffect(f);\n",
            &[("react", "window.React")],
        );

        assert_eq!(
            out.report.elided_imports[0].locals,
            vec!["useLocalState", "useEffect"]
        );
        assert!(
            out.code.contains("window.React.useState(1)"),
            "renamed import should map to the imported member, got: {}",
            out.code
        );
        assert!(out.code.contains("window.React.useEffect(f)"), "got: {}", out.code);
        assert!(!out.code.contains("useLocalState"), "got: {}", out.code);
    }

    #[test]
    fn test_default_and_namespace_map_to_the_path_itself() {
        let out = transform(
            "import * as R from \"react\";\nimport Dom from \"react-dom\";\nR.memo(x);\nDom.render(y);\n",
            &[("react", "window.React"), ("react-dom", "window.ReactDOM")],
        );

        assert!(out.code.contains("window.React.memo(x)"), "got: {}", out.code);
        assert!(out.code.contains("window.ReactDOM.render(y)"), "got: {}", out.code);
        assert_eq!(out.report.elided_imports.len(), 2);
    }

    #[test]
    fn test_named_default_import() {
        let out = transform(
            "import { default as Lib } from \"runtime\";\nLib.create(x);\n",
            &[("runtime", "Host.Lib")],
        );
        assert!(out.code.contains("Host.Lib.create(x)"), "got: {}", out.code);
    }

    #[test]
    fn test_side_effect_import_is_elided() {
        let out = transform("import \"react\";\nrun();\n", &[("react", "window.React")]);

        assert!(!out.code.contains("react"), "got: {}", out.code);
        assert_eq!(out.report.elided_imports[0].locals, Vec::<String>::new());
    }

    #[test]
    fn test_no_bindings_leaves_imports_alone() {
        let out = transform("import React from \"react\";\nReact.x;\n", &[]);

        assert!(out.code.contains("import React from \"react\""), "got: {}", out.code);
        assert!(out.report.elided_imports.is_empty());
    }

    #[test]
    fn test_reexport_of_host_module_is_not_elided() {
        let out = transform(
            "export { useState } from \"react\";\n",
            &[("react", "window.React")],
        );

        assert!(
            out.code.contains("from \"react\""),
            "re-exports are reported, not rewritten, got: {}",
            out.code
        );
        assert!(out.report.elided_imports.is_empty());
    }

    #[test]
    fn test_type_only_import_is_elided() {
        let options = TransformOptions::new(
            HostBindingMap::new().bind("react", "window.React").unwrap(),
        );
        let out = transform_plugin_source(
            "import type { FC } from \"react\";\nexport const Card: FC = () => null;\n",
            "Card.tsx",
            &options,
        )
        .unwrap();

        assert!(!out.code.contains("from \"react\""), "got: {}", out.code);
        assert!(out.code.contains("Card: FC"), "type positions are untouched, got: {}", out.code);
    }
}
