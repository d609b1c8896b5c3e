//! Import-only validation of extracted deferred blocks.

use std::collections::BTreeSet;
use std::fmt;

use bumpalo::Bump;
use latebind_core::{DeferredError, QualifiedName};
use latebind_parser::visitor::{Visitor, walk_block};
use latebind_parser::{
    ClassStmt, DeferredStmt, ImportAlias, ImportFromStmt, ImportStmt, InitStmt, MemberStmt, OtherStmt,
    Parser, PassStmt,
};

use super::extract::ExtractedBlock;

/// Which import statement form a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportForm {
    /// `import a.b`
    Import,
    /// `from <dots><module> import name`
    From {
        level: u32,
        module: Option<QualifiedName>,
    },
}

/// One imported name of a deferred block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub form: ImportForm,
    /// `a.b` for `import a.b`, `Y` (possibly `Outer.Inner`) for `from M import Y`.
    pub name: QualifiedName,
    pub alias: Option<String>,
    /// Absolute file line.
    pub line: u32,
}

impl ImportRequest {
    pub fn is_relative(&self) -> bool {
        matches!(self.form, ImportForm::From { level, .. } if level > 0)
    }

    /// The module part as written, with its leading dots.
    pub fn module_spelling(&self) -> String {
        match &self.form {
            ImportForm::Import => self.name.to_string(),
            ImportForm::From { level, module } => {
                let dots = ".".repeat(*level as usize);
                match module {
                    Some(m) => format!("{dots}{m}"),
                    None => dots,
                }
            }
        }
    }
}

impl fmt::Display for ImportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.form {
            ImportForm::Import => write!(f, "import {}", self.name)?,
            ImportForm::From { .. } => write!(f, "from {} import {}", self.module_spelling(), self.name)?,
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// Parse an extracted block and return its imports in source order.
///
/// Fails with `NonImportStatement` listing every offending absolute line if
/// anything but import statements appears, at any nesting depth.
pub fn validate_block(block: &ExtractedBlock) -> Result<Vec<ImportRequest>, DeferredError> {
    let arena = Bump::new();
    let offset = block.line_offset();
    let module = Parser::parse(block.text(), &arena).map_err(|errors| DeferredError::Parse {
        file: block.file().to_path_buf(),
        errors: errors.shifted(offset),
    })?;

    let mut collector = ImportCollector {
        offset,
        imports: Vec::new(),
        offending: BTreeSet::new(),
    };
    collector.visit_module(&module);

    if !collector.offending.is_empty() {
        return Err(DeferredError::NonImportStatement {
            file: block.file().to_path_buf(),
            lines: collector.offending.into_iter().collect(),
        });
    }
    Ok(collector.imports)
}

struct ImportCollector {
    offset: u32,
    imports: Vec<ImportRequest>,
    offending: BTreeSet<u32>,
}

impl ImportCollector {
    fn flag(&mut self, line: u32) {
        self.offending.insert(line + self.offset);
    }

    fn push(&mut self, form: ImportForm, alias: &ImportAlias<'_>) {
        self.imports.push(ImportRequest {
            form,
            name: alias.name.to_qualified_name(),
            alias: alias.alias.map(|a| a.name.to_string()),
            line: alias.span.line + self.offset,
        });
    }
}

impl<'ast> Visitor<'ast> for ImportCollector {
    fn visit_import(&mut self, stmt: &ImportStmt<'ast>) {
        for alias in stmt.names {
            self.push(ImportForm::Import, alias);
        }
    }

    fn visit_import_from(&mut self, stmt: &ImportFromStmt<'ast>) {
        let module = stmt.module.map(|m| m.to_qualified_name());
        for alias in stmt.names {
            let form = ImportForm::From {
                level: stmt.level,
                module: module.clone(),
            };
            self.push(form, alias);
        }
    }

    fn visit_deferred(&mut self, stmt: &DeferredStmt<'ast>) {
        self.flag(stmt.span.line);
        walk_block(self, stmt.body);
    }

    fn visit_class(&mut self, class: &ClassStmt<'ast>) {
        self.flag(class.span.line);
        walk_block(self, class.body);
    }

    fn visit_init(&mut self, stmt: &InitStmt<'ast>) {
        self.flag(stmt.span.line);
    }

    fn visit_static(&mut self, member: &MemberStmt<'ast>) {
        self.flag(member.span.line);
    }

    fn visit_field(&mut self, member: &MemberStmt<'ast>) {
        self.flag(member.span.line);
    }

    fn visit_post_init(&mut self, member: &MemberStmt<'ast>) {
        self.flag(member.span.line);
    }

    fn visit_pass(&mut self, stmt: &PassStmt) {
        self.flag(stmt.span.line);
    }

    fn visit_other(&mut self, stmt: &OtherStmt<'ast>) {
        for line in stmt.lines {
            self.flag(*line);
        }
        walk_block(self, stmt.body);
    }
}
