//! Annotation applications.

use capn_ir::{AnnotationApp, AnnotationTarget};

use super::scope::{ScopeIdx, ScopeKind};
use super::types::Target;
use super::values::Evaluator;
use crate::{AnnotationUse, CompileError, TypeRef, Value};

impl Evaluator<'_, '_> {
    /// Check and evaluate `apps`, written in `from`, on a `target`.
    pub fn annotations(
        &mut self,
        apps: &[AnnotationApp],
        target: AnnotationTarget,
        from: ScopeIdx,
    ) -> Result<Vec<AnnotationUse>, CompileError> {
        apps.iter()
            .map(|app| self.annotation(app, target, from))
            .collect()
    }

    fn annotation(
        &mut self,
        app: &AnnotationApp,
        target: AnnotationTarget,
        from: ScopeIdx,
    ) -> Result<AnnotationUse, CompileError> {
        let table = self.lookup.table();
        let invalid = |message: String| CompileError::InvalidAnnotation {
            message,
            location: table.locate(from, app.span),
        };

        let scope = match self.lookup.resolve_path(&app.path, from)? {
            Target::Scope { scope, .. } => scope,
            _ => return Err(invalid(format!("`{}` is not an annotation", app.path))),
        };
        let ScopeKind::Annotation(decl) = table.scopes[scope].kind else {
            return Err(invalid(format!("`{}` is not an annotation", app.path)));
        };
        if !decl
            .targets
            .iter()
            .any(|t| *t == target || *t == AnnotationTarget::All)
        {
            let allowed: Vec<&str> = decl.targets.iter().map(|t| t.as_str()).collect();
            return Err(invalid(format!(
                "`${}` cannot be applied to a {}; it targets {}",
                app.path,
                target.as_str(),
                allowed.join(", ")
            )));
        }

        let ty = self.types.annotations.get(&scope).cloned().ok_or_else(|| {
            invalid(format!("annotation `{}` has no type", app.path))
        })?;
        let value = match &app.value {
            Some(expr) => self.eval(expr, &ty, from)?,
            None if ty == TypeRef::Void => Value::Void,
            None => {
                return Err(invalid(format!(
                    "`${}` requires a value of type `{}`",
                    app.path,
                    self.lookup.type_display(&ty)
                )))
            }
        };

        Ok(AnnotationUse {
            id: table.scopes[scope].id,
            name: table.scopes[scope].short_name().to_string(),
            value,
        })
    }
}
