//! Rendering generated modules to source text and writing them out.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use proc_macro2::TokenStream;

use crate::error::Error;
use crate::fs::write_file;

/// Name of the file declaring every generated module.
pub const MOD_FILE: &str = "mod.rs";

const HEADER: &str = "// This file is @generated by gremlin-build. Do not edit.\n\n";

/// Renders each module to source text, keyed by file name, plus a
/// [`MOD_FILE`] declaring all of them.
pub fn render_modules(
    modules: &BTreeMap<String, TokenStream>,
    skip_format: bool,
) -> Result<BTreeMap<String, String>, Error> {
    let mut files = BTreeMap::new();
    let mut mod_file = String::from(HEADER);

    for (name, tokens) in modules {
        let source = if skip_format {
            tokens.to_string()
        } else {
            let file: syn::File =
                syn::parse2(tokens.clone()).map_err(|err| Error::SynParse(format!("module '{name}': {err}")))?;
            prettyplease::unparse(&file)
        };
        files.insert(format!("{name}.rs"), format!("{HEADER}{source}"));
        let _ = writeln!(mod_file, "pub mod {name};");
    }

    files.insert(MOD_FILE.to_string(), mod_file);
    Ok(files)
}

/// Renders and writes every module into `out_dir`.
pub fn write_modules(out_dir: &Path, modules: &BTreeMap<String, TokenStream>, skip_format: bool) -> Result<(), Error> {
    for (file_name, source) in render_modules(modules, skip_format)? {
        let path = out_dir.join(&file_name);
        tracing::debug!(path = %path.display(), "writing generated module");
        write_file(&path, source.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_render_formats_and_lists_modules() {
        let mut modules = BTreeMap::new();
        modules.insert("alpha".to_string(), quote!(pub struct A { pub x: i32 }));
        modules.insert("beta".to_string(), quote!(pub struct B;));

        let files = render_modules(&modules, false).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files["alpha.rs"].starts_with("// This file is @generated"));
        assert!(files["alpha.rs"].contains("pub struct A {\n    pub x: i32,\n}"));
        assert!(files[MOD_FILE].contains("pub mod alpha;\npub mod beta;\n"));
    }

    #[test]
    fn test_skip_format_keeps_token_text() {
        let mut modules = BTreeMap::new();
        modules.insert("raw".to_string(), quote!(pub struct R;));

        let files = render_modules(&modules, true).unwrap();
        assert!(files["raw.rs"].contains("pub struct R ;"));
    }

    #[test]
    fn test_write_modules_creates_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let mut modules = BTreeMap::new();
        modules.insert("pkg".to_string(), quote!(pub struct P;));

        write_modules(&out, &modules, false).unwrap();
        let written = std::fs::read_to_string(out.join("pkg.rs")).unwrap();
        assert!(written.contains("pub struct P;"));
        assert!(out.join(MOD_FILE).exists());
    }
}
