// File: src/module.rs
//
// File-backed module resolution: canonical-path identity, the
// already-imported set, and the per-compile import stack used to
// detect circular imports (spec §4.4 "Module import").

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Native modules are registered as globals at VM init; `IMPORT` for
/// one of these names is a no-op (spec §4.4).
pub const NATIVE_MODULES: &[&str] = &[
    "math", "std.math", "string", "array", "io", "log", "assert", "env", "process", "path", "fs",
    "time", "json", "regex", "ui", "audio", "image", "ipc", "net",
];

pub fn is_native_module(name: &str) -> bool {
    NATIVE_MODULES.contains(&name)
}

#[derive(Debug, Default)]
pub struct ModuleLoader {
    imported: HashSet<PathBuf>,
    import_stack: Vec<PathBuf>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        ModuleLoader::default()
    }

    /// Resolves `path` relative to `importing_file` (or the current
    /// working directory for the top-level program) and canonicalizes
    /// it to an absolute path used as the module-identity key.
    pub fn resolve(&self, path: &str, importing_file: Option<&Path>) -> std::io::Result<PathBuf> {
        let base = importing_file.and_then(|f| f.parent()).unwrap_or_else(|| Path::new("."));
        let candidate = base.join(path);
        candidate.canonicalize()
    }

    pub fn already_imported(&self, canonical: &Path) -> bool {
        self.imported.contains(canonical)
    }

    /// Pushes `canonical` onto the import stack, failing with the
    /// documented message if it is already on the stack (a cycle).
    pub fn enter(&mut self, canonical: PathBuf) -> Result<(), String> {
        if let Some(pos) = self.import_stack.iter().position(|p| p == &canonical) {
            let mut chain: Vec<String> = self.import_stack[pos..]
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(canonical.display().to_string());
            return Err(format!("Circular import detected: {}", chain.join(" \u{2192} ")));
        }
        self.import_stack.push(canonical);
        Ok(())
    }

    /// Pops the current import's stack entry. Must be called even when
    /// compiling the imported file failed, so that failure does not
    /// leave the stack poisoned for sibling imports (spec §4.4
    /// "Exception safety").
    pub fn exit(&mut self) {
        self.import_stack.pop();
    }

    pub fn mark_imported(&mut self, canonical: PathBuf) {
        self.imported.insert(canonical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_direct_cycle() {
        let mut loader = ModuleLoader::new();
        loader.enter(PathBuf::from("/a.iz")).unwrap();
        loader.enter(PathBuf::from("/b.iz")).unwrap();
        let err = loader.enter(PathBuf::from("/a.iz")).unwrap_err();
        assert!(err.starts_with("Circular import detected:"));
        assert!(err.contains("a.iz"));
    }

    #[test]
    fn exit_always_pops_even_after_later_failure() {
        let mut loader = ModuleLoader::new();
        loader.enter(PathBuf::from("/a.iz")).unwrap();
        loader.exit();
        // re-entering the same path now succeeds since the stack is clean
        assert!(loader.enter(PathBuf::from("/a.iz")).is_ok());
    }

    #[test]
    fn native_module_allowlist_matches_spec() {
        assert!(is_native_module("math"));
        assert!(is_native_module("net"));
        assert!(!is_native_module("totally-made-up"));
    }
}
