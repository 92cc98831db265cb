//! Value evaluation: defaults, constants and annotation arguments.

use capn_ir::{Ident, Path, Span, ValueExpr, ValueExprKind};
use capn_parse::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use super::scope::{ScopeIdx, ScopeKind};
use super::types::{Lookup, Target};
use super::ResolvedTypes;
use crate::{CompileError, TypeRef, Value};

/// Names that are literals in value position.
const LITERAL_NAMES: [&str; 5] = ["void", "true", "false", "inf", "nan"];

/// Checks values against their types. Constants are evaluated on first
/// use and memoized; a constant that reaches itself is an error.
pub(crate) struct Evaluator<'t, 'a> {
    pub(super) lookup: Lookup<'t, 'a>,
    pub(super) types: &'t ResolvedTypes,
    consts: FxHashMap<ScopeIdx, Value>,
    evaluating: Vec<ScopeIdx>,
}

impl<'t, 'a> Evaluator<'t, 'a> {
    pub fn new(lookup: Lookup<'t, 'a>, types: &'t ResolvedTypes) -> Self {
        Evaluator {
            lookup,
            types,
            consts: FxHashMap::default(),
            evaluating: Vec::new(),
        }
    }

    /// Evaluate `expr`, written in `from`, as a value of type `ty`.
    pub fn eval(&mut self, expr: &ValueExpr, ty: &TypeRef, from: ScopeIdx) -> Result<Value, CompileError> {
        ensure_sufficient_stack(|| self.eval_expr(expr, ty, from))
    }

    fn eval_expr(&mut self, expr: &ValueExpr, ty: &TypeRef, from: ScopeIdx) -> Result<Value, CompileError> {
        match &expr.kind {
            ValueExprKind::Path(path) => self.eval_path(expr, path, ty, from),
            ValueExprKind::Int {
                magnitude,
                negative,
            } => self.eval_int(expr, *magnitude, *negative, ty, from),
            ValueExprKind::Float(x) => match ty {
                TypeRef::Float32 => Ok(Value::Float(round_to_f32(*x))),
                TypeRef::Float64 => Ok(Value::Float(*x)),
                _ => Err(self.mismatch(expr, ty, "a floating-point number", from)),
            },
            ValueExprKind::Str(s) => match ty {
                TypeRef::Text => Ok(Value::Text(s.clone())),
                _ => Err(self.mismatch(expr, ty, "text", from)),
            },
            ValueExprKind::Bytes(bytes) => match ty {
                TypeRef::Data => Ok(Value::Data(bytes.clone())),
                _ => Err(self.mismatch(expr, ty, "a byte literal", from)),
            },
            ValueExprKind::List(items) => match ty {
                TypeRef::List(element) => items
                    .iter()
                    .map(|item| self.eval(item, element, from))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                _ => Err(self.mismatch(expr, ty, "a list", from)),
            },
            ValueExprKind::Struct(fields) => match ty {
                TypeRef::Struct { id, .. } => {
                    let table = self.lookup.table();
                    let scope = table.scope_by_id(*id).ok_or_else(|| {
                        self.invalid(from, expr.span, format!("unknown struct @0x{id:016x}"))
                    })?;
                    self.eval_fields(fields, scope, from)
                }
                _ => Err(self.mismatch(expr, ty, "a struct literal", from)),
            },
        }
    }

    fn eval_int(
        &self,
        expr: &ValueExpr,
        magnitude: u64,
        negative: bool,
        ty: &TypeRef,
        from: ScopeIdx,
    ) -> Result<Value, CompileError> {
        let written = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        let out_of_range = || {
            self.invalid(
                from,
                expr.span,
                format!(
                    "{written} is out of range for `{}`",
                    self.lookup.type_display(ty)
                ),
            )
        };

        if let Some((min, max)) = ty.signed_range() {
            if written < i128::from(min) || written > i128::from(max) {
                return Err(out_of_range());
            }
            return i64::try_from(written).map(Value::Int).map_err(|_| out_of_range());
        }
        if let Some(max) = ty.unsigned_max() {
            if (negative && magnitude != 0) || magnitude > max {
                return Err(out_of_range());
            }
            return Ok(Value::UInt(magnitude));
        }
        match ty {
            TypeRef::Float32 | TypeRef::Float64 => {
                let value = int_to_float(magnitude);
                Ok(Value::Float(if negative { -value } else { value }))
            }
            _ => Err(self.mismatch(expr, ty, "an integer", from)),
        }
    }

    fn eval_path(&mut self, expr: &ValueExpr, path: &Path, ty: &TypeRef, from: ScopeIdx) -> Result<Value, CompileError> {
        if let Some(name) = path.as_simple_name() {
            match (name, ty) {
                ("void", TypeRef::Void) => return Ok(Value::Void),
                ("true", TypeRef::Bool) => return Ok(Value::Bool(true)),
                ("false", TypeRef::Bool) => return Ok(Value::Bool(false)),
                ("inf", TypeRef::Float32 | TypeRef::Float64) => return Ok(Value::Float(f64::INFINITY)),
                ("nan", TypeRef::Float32 | TypeRef::Float64) => return Ok(Value::Float(f64::NAN)),
                (_, TypeRef::Enum { id }) => {
                    if let Some(ordinal) = self.enumerant(*id, name) {
                        return Ok(Value::Enum(ordinal));
                    }
                }
                _ => {}
            }
            if LITERAL_NAMES.contains(&name) {
                return Err(self.mismatch(expr, ty, &format!("`{name}`"), from));
            }
        }

        let table = self.lookup.table();
        match self.lookup.resolve_path(path, from)? {
            Target::Scope { scope, .. } if matches!(table.scopes[scope].kind, ScopeKind::Const(_)) => {
                let value = self.const_value(scope)?;
                let const_ty = self.const_type(scope)?;
                if const_ty != *ty {
                    return Err(self.invalid(
                        from,
                        expr.span,
                        format!(
                            "constant `{path}` has type `{}`, expected `{}`",
                            self.lookup.type_display(&const_ty),
                            self.lookup.type_display(ty)
                        ),
                    ));
                }
                Ok(value)
            }
            _ => Err(self.invalid(from, expr.span, format!("`{path}` is not a constant"))),
        }
    }

    fn enumerant(&self, enum_id: u64, name: &str) -> Option<u16> {
        let table = self.lookup.table();
        let scope = table.scope_by_id(enum_id)?;
        let ScopeKind::Enum(decl) = table.scopes[scope].kind else {
            return None;
        };
        decl.enumerants
            .iter()
            .find(|en| en.name.as_str() == name)
            .and_then(|en| u16::try_from(en.ordinal.value).ok())
    }

    fn const_type(&self, scope: ScopeIdx) -> Result<TypeRef, CompileError> {
        self.types.consts.get(&scope).cloned().ok_or_else(|| {
            let table = self.lookup.table();
            self.invalid(
                scope,
                table.scopes[scope].span,
                format!("constant `{}` has no type", table.scopes[scope].display_name),
            )
        })
    }

    /// Value of the constant declared by `scope`.
    pub fn const_value(&mut self, scope: ScopeIdx) -> Result<Value, CompileError> {
        if let Some(value) = self.consts.get(&scope) {
            return Ok(value.clone());
        }
        let table = self.lookup.table();
        let ScopeKind::Const(decl) = table.scopes[scope].kind else {
            return Err(self.invalid(
                scope,
                table.scopes[scope].span,
                format!("`{}` is not a constant", table.scopes[scope].display_name),
            ));
        };
        if self.evaluating.contains(&scope) {
            return Err(self.invalid(
                scope,
                decl.value.span,
                format!("constant `{}` depends on itself", table.scopes[scope].display_name),
            ));
        }
        let ty = self.const_type(scope)?;
        self.evaluating.push(scope);
        let result = self.eval(&decl.value, &ty, scope);
        self.evaluating.pop();
        let value = result?;
        self.consts.insert(scope, value.clone());
        Ok(value)
    }

    /// `(name = value, ...)` against the fields of `scope`.
    fn eval_fields(&mut self, fields: &[(Ident, ValueExpr)], scope: ScopeIdx, from: ScopeIdx) -> Result<Value, CompileError> {
        let table = self.lookup.table();
        let target = &table.scopes[scope];
        let mut out: Vec<(String, Value)> = Vec::with_capacity(fields.len());

        for (name, value) in fields {
            if out.iter().any(|(seen, _)| seen == name.as_str()) {
                return Err(self.invalid(
                    from,
                    name.span,
                    format!("field `{}` is set more than once", name.as_str()),
                ));
            }
            let Some((index, member)) = target
                .members
                .iter()
                .enumerate()
                .find(|(_, m)| m.name == name.as_str())
            else {
                return Err(self.invalid(
                    from,
                    name.span,
                    format!("`{}` has no field named `{}`", target.display_name, name.as_str()),
                ));
            };

            let evaluated = match member.group() {
                Some(group) => match &value.kind {
                    ValueExprKind::Struct(inner) => self.eval_fields(inner, group, from)?,
                    _ => {
                        return Err(self.invalid(
                            from,
                            value.span,
                            format!("group `{}` must be set with a struct literal", name.as_str()),
                        ))
                    }
                },
                None => {
                    let ty = u16::try_from(index)
                        .ok()
                        .and_then(|i| self.types.slots.get(&(scope, i)))
                        .cloned()
                        .ok_or_else(|| {
                            self.invalid(from, name.span, format!("field `{}` has no type", name.as_str()))
                        })?;
                    self.eval(value, &ty, from)?
                }
            };
            out.push((name.as_str().to_string(), evaluated));
        }
        Ok(Value::Struct(out))
    }

    fn mismatch(&self, expr: &ValueExpr, ty: &TypeRef, found: &str, from: ScopeIdx) -> CompileError {
        self.invalid(
            from,
            expr.span,
            format!("expected a value of type `{}`, found {found}", self.lookup.type_display(ty)),
        )
    }

    pub(super) fn invalid(&self, from: ScopeIdx, span: Span, message: String) -> CompileError {
        CompileError::InvalidValue {
            message,
            location: self.lookup.table().locate(from, span),
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "Float32 values are stored rounded to single precision")]
fn round_to_f32(x: f64) -> f64 {
    f64::from(x as f32)
}

#[expect(clippy::cast_precision_loss, reason = "integer literals in float position round like the source language does")]
fn int_to_float(magnitude: u64) -> f64 {
    magnitude as f64
}
