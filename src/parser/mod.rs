//! Source parsing
//!
//! Thin wrapper around the swc parser with syntax auto-detection, so the
//! rest of the crate deals in modules rather than parser plumbing.

use anyhow::{anyhow, Result};
use std::path::Path;

use swc_core::common::{sync::Lrc, FileName, FilePathMapping, SourceMap};
use swc_core::ecma::ast::Module;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// JavaScript/TypeScript parser with extension-based syntax detection.
pub struct AstParser {
    source_map: Lrc<SourceMap>,
}

impl AstParser {
    pub fn new() -> Self {
        Self {
            source_map: Lrc::new(SourceMap::new(FilePathMapping::empty())),
        }
    }

    /// Parses source into a module.
    ///
    /// `.ts`/`.tsx` parse as TypeScript, `.jsx` as JavaScript with JSX,
    /// anything else as plain JavaScript.
    pub fn parse(&self, code: &str, path: &Path) -> Result<Module> {
        use swc_core::common::GLOBALS;

        GLOBALS.set(&Default::default(), || {
            let syntax = self.detect_syntax(path);
            let source_file = self
                .source_map
                .new_source_file(FileName::Real(path.to_path_buf()).into(), code.to_string());
            let input = StringInput::from(&*source_file);
            let mut parser = Parser::new(syntax, input, None);

            parser
                .parse_module()
                .map_err(|e| anyhow!("parse error in {}: {:?}", path.display(), e))
        })
    }

    fn detect_syntax(&self, path: &Path) -> Syntax {
        match path.extension().and_then(|s| s.to_str()) {
            Some("ts") | Some("tsx") => Syntax::Typescript(TsSyntax {
                tsx: path.extension().is_some_and(|e| e == "tsx"),
                decorators: true,
                dts: false,
                no_early_errors: true,
                disallow_ambiguous_jsx_like: false,
            }),
            ext => Syntax::Es(EsSyntax {
                jsx: matches!(ext, Some("jsx")),
                fn_bind: false,
                decorators: false,
                decorators_before_export: false,
                export_default_from: true,
                import_attributes: true,
                allow_super_outside_method: false,
                allow_return_outside_function: true,
                auto_accessors: false,
                explicit_resource_management: false,
            }),
        }
    }

    pub fn source_map(&self) -> Lrc<SourceMap> {
        self.source_map.clone()
    }
}

impl Default for AstParser {
    fn default() -> Self {
        Self::new()
    }
}
