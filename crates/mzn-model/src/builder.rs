//! Merging items from any number of sources into one namespace.
//!
//! A name is bound at most once. Assignments and declarations may arrive in
//! either order; when both halves are present they are joined into a single
//! declaration. Further declarations of a function-like name are kept as
//! overloads next to the first one.

use crate::config::ModelConfig;
use crate::error::{ModelError, ModelWarning, Result};
use crate::include::{canonical, chain_text, resolve};
use mzn_ast::ast::{
    Assign, Constraint, DeclKind, Declare, Expr, Include, Item, Model, Output, Solve,
};
use mzn_ast::span::Span;
use mzn_ast::{Render, WriteMode, Writer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace, warn};

/// What a namespace entry currently holds.
#[derive(Debug, Clone)]
pub enum Binding {
    Declared(Declare),
    /// A value whose declaration has not been seen yet.
    Assigned(Assign),
}

impl Binding {
    pub fn item(&self) -> Item {
        match self {
            Binding::Declared(d) => Item::Declare(d.clone()),
            Binding::Assigned(a) => Item::Assign(a.clone()),
        }
    }

    pub fn as_declare(&self) -> Option<&Declare> {
        match self {
            Binding::Declared(d) => Some(d),
            Binding::Assigned(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct ModelBuilder {
    namespace: Vec<(String, Binding)>,
    index: HashMap<String, usize>,
    overloads: Vec<(String, Vec<Declare>)>,
    overload_index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    outputs: Vec<Output>,
    solve: Option<Solve>,
    passthrough: Vec<Include>,
    search_dirs: Vec<PathBuf>,
    /// Files being merged right now, outermost first.
    chain: Vec<PathBuf>,
    merged: HashSet<PathBuf>,
    warnings: Vec<ModelWarning>,
    emit_output: bool,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    pub fn with_config(config: ModelConfig) -> Self {
        let mut builder = Self {
            namespace: Vec::new(),
            index: HashMap::new(),
            overloads: Vec::new(),
            overload_index: HashMap::new(),
            constraints: Vec::new(),
            outputs: Vec::new(),
            solve: None,
            passthrough: Vec::new(),
            search_dirs: Vec::new(),
            chain: Vec::new(),
            merged: HashSet::new(),
            warnings: Vec::new(),
            emit_output: config.emit_output,
        };
        for dir in config.search_dirs {
            builder.add_search_dir(dir);
        }
        builder
    }

    pub fn add_search_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.search_dirs.contains(&dir) {
            trace!(dir = %dir.display(), "search directory added");
            self.search_dirs.push(dir);
        }
    }

    /// Parse `src` and merge its items. `name` is used in error messages.
    pub fn add_string(&mut self, name: &str, src: &str) -> Result<()> {
        let model = mzn_parse::parse_str(name, src).map_err(|e| ModelError::Parse {
            source_name: name.to_string(),
            message: format!("{e:#}"),
        })?;
        self.add_model(model)
    }

    /// Read, parse and merge a file. Its directory becomes a search
    /// directory for the includes that follow. A file already merged is
    /// skipped.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = canonical(path.as_ref())?;
        self.merge_file(file)
    }

    pub fn add_model(&mut self, model: Model) -> Result<()> {
        for item in model.items {
            self.add_item(item)?;
        }
        Ok(())
    }

    pub fn add_item(&mut self, item: Item) -> Result<()> {
        match item {
            Item::Solve(s) => self.add_solve(s),
            Item::Output(o) => {
                self.outputs.push(o);
                Ok(())
            }
            Item::Constraint(c) => {
                self.constraints.push(c);
                Ok(())
            }
            Item::Declare(d) if matches!(d.kind, DeclKind::TypeAlias | DeclKind::Enum) => {
                self.add_type(d)
            }
            Item::Assign(a) => self.add_assign(a),
            Item::Declare(d) => self.add_declare(d),
            Item::Include(inc) => self.add_include(inc),
        }
    }

    // ======= merge rules =======

    fn add_solve(&mut self, s: Solve) -> Result<()> {
        if let Some(first) = &self.solve {
            return Err(ModelError::DuplicateSolve {
                first: Item::Solve(first.clone()).minimal(),
                second: Item::Solve(s).minimal(),
            });
        }
        self.solve = Some(s);
        Ok(())
    }

    fn add_type(&mut self, d: Declare) -> Result<()> {
        if let Some(Binding::Declared(_)) = self.get(&d.name.text) {
            return Err(ModelError::DuplicateType {
                name: d.name.text.clone(),
            });
        }
        self.add_declare(d)
    }

    fn add_assign(&mut self, a: Assign) -> Result<()> {
        let name = a.name.text.clone();
        let Some(&slot) = self.index.get(&name) else {
            trace!(name = %name, "value bound ahead of its declaration");
            self.bind(name, Binding::Assigned(a));
            return Ok(());
        };
        let completed = match &self.namespace[slot].1 {
            Binding::Declared(d) if !d.has_initializer() => complete(d, &a.value)?,
            _ => return Err(ModelError::Reassigned { name }),
        };
        debug!(name = %name, "declaration completed by assignment");
        self.namespace[slot].1 = Binding::Declared(completed);
        Ok(())
    }

    fn add_declare(&mut self, d: Declare) -> Result<()> {
        let name = d.name.text.clone();
        let Some(&slot) = self.index.get(&name) else {
            self.bind(name, Binding::Declared(d));
            return Ok(());
        };
        match &self.namespace[slot].1 {
            Binding::Assigned(a) => {
                if d.has_initializer() {
                    return Err(ModelError::Reassigned { name });
                }
                let completed = complete(&d, &a.value)?;
                debug!(name = %name, "declaration absorbed earlier assignment");
                self.namespace[slot].1 = Binding::Declared(completed);
                Ok(())
            }
            Binding::Declared(prev) if prev.kind.is_function_like() && d.kind.is_function_like() => {
                let expected = return_type(prev);
                let found = return_type(&d);
                if expected != found {
                    return Err(ModelError::ConflictingTypes {
                        name,
                        expected,
                        found,
                    });
                }
                self.add_overload(name, d);
                Ok(())
            }
            Binding::Declared(_) => Err(ModelError::Redeclared { name }),
        }
    }

    fn add_overload(&mut self, name: String, d: Declare) {
        trace!(name = %name, "overload added");
        match self.overload_index.get(&name) {
            Some(&i) => self.overloads[i].1.push(d),
            None => {
                self.overload_index.insert(name.clone(), self.overloads.len());
                self.overloads.push((name, vec![d]));
            }
        }
    }

    fn bind(&mut self, name: String, binding: Binding) {
        self.index.insert(name.clone(), self.namespace.len());
        self.namespace.push((name, binding));
    }

    // ======= includes =======

    fn add_include(&mut self, inc: Include) -> Result<()> {
        let path = inc.path.value();
        match resolve(&path, &self.search_dirs)? {
            Some(file) => self.merge_file(file),
            None => {
                warn!(path = %path, "include not found; passing it through");
                if !self.passthrough.iter().any(|p| p.path.value() == path) {
                    self.warnings.push(ModelWarning::UnresolvedInclude { path });
                    self.passthrough.push(inc);
                }
                Ok(())
            }
        }
    }

    #[instrument(level = "debug", skip(self), fields(path = %file.display()))]
    fn merge_file(&mut self, file: PathBuf) -> Result<()> {
        if self.chain.contains(&file) {
            return Err(ModelError::RecursiveInclude {
                chain: chain_text(&self.chain, &file),
                path: file,
            });
        }
        if self.merged.contains(&file) {
            debug!("already merged; skipping");
            return Ok(());
        }

        let src = fs::read_to_string(&file).map_err(|source| ModelError::Io {
            path: file.clone(),
            source,
        })?;
        let source_name = file.display().to_string();
        let model = mzn_parse::parse_str(&source_name, &src).map_err(|e| ModelError::Parse {
            source_name,
            message: format!("{e:#}"),
        })?;
        if let Some(dir) = file.parent() {
            self.add_search_dir(dir);
        }

        self.chain.push(file.clone());
        let merged = self.add_model(model);
        self.chain.pop();
        merged?;

        debug!("merged");
        self.merged.insert(file);
        Ok(())
    }

    // ======= queries =======

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.index.get(name).map(|&i| &self.namespace[i].1)
    }

    /// Bound names in the order they were first seen.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespace.iter().map(|(name, _)| name.as_str())
    }

    /// Every declaration of `name`: the bound one, then its overloads.
    pub fn overloads(&self, name: &str) -> Vec<&Declare> {
        let first = self.get(name).and_then(Binding::as_declare);
        let rest = self
            .overload_index
            .get(name)
            .map(|&i| self.overloads[i].1.as_slice())
            .unwrap_or_default();
        first.into_iter().chain(rest).collect()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn solve(&self) -> Option<&Solve> {
        self.solve.as_ref()
    }

    /// Includes that could not be resolved, kept for a downstream toolchain.
    pub fn unresolved_includes(&self) -> &[Include] {
        &self.passthrough
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn warnings(&self) -> &[ModelWarning] {
        &self.warnings
    }

    // ======= output =======

    /// The merged model as items, in writing order.
    pub fn to_model(&self) -> Model {
        let mut items: Vec<Item> = self.passthrough.iter().cloned().map(Item::Include).collect();
        items.extend(self.namespace.iter().map(|(_, b)| b.item()));
        for (_, decls) in &self.overloads {
            items.extend(decls.iter().cloned().map(Item::Declare));
        }
        items.extend(self.constraints.iter().cloned().map(Item::Constraint));
        items.extend(self.solve.iter().cloned().map(Item::Solve));
        if self.emit_output {
            items.extend(self.outputs.iter().cloned().map(Item::Output));
        }
        Model {
            items,
            span: Span::default(),
        }
    }

    pub fn write(&self, mode: WriteMode) -> String {
        self.to_model().render(mode)
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Join a declaration and a value into one declaration by writing both as
/// `decl = value` and parsing the text again.
fn complete(decl: &Declare, value: &Expr) -> Result<Declare> {
    let mut w = Writer::new(WriteMode::Minimal);
    w.declare(decl);
    w.token("=");
    w.expr(value);
    let text = w.finish();
    let failed = |message: String| ModelError::Completion {
        name: decl.name.text.clone(),
        message,
    };
    match mzn_parse::parse_item(&text) {
        Ok(Item::Declare(d)) => Ok(d),
        Ok(_) => Err(failed(format!("`{text}` is not a declaration"))),
        Err(e) => Err(failed(format!("{e:#}"))),
    }
}

fn return_type(d: &Declare) -> String {
    d.ty.as_ref().map(Render::minimal).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzn_ast::ast::ExprKind;

    #[test]
    fn completion_reparses_the_joined_text() {
        let Ok(Item::Declare(d)) = mzn_parse::parse_item("var 1..3: x :: output_var") else {
            panic!("expected a declaration");
        };
        let value = mzn_parse::parse_expr("2 + 1").unwrap();
        let done = complete(&d, &value).unwrap();
        assert_eq!(done.anns.len(), 1);
        assert!(matches!(
            done.body.map(|b| b.kind),
            Some(ExprKind::Binary { .. })
        ));
    }

    #[test]
    fn return_types_compare_as_text() {
        let Ok(Item::Declare(f)) = mzn_parse::parse_item("function var  int : f(int: x)") else {
            panic!("expected a declaration");
        };
        assert_eq!(return_type(&f), "var int");
        let Ok(Item::Declare(p)) = mzn_parse::parse_item("predicate p()") else {
            panic!("expected a declaration");
        };
        assert_eq!(return_type(&p), "");
    }
}
