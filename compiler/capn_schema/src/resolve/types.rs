//! Path lookup and type resolution.
//!
//! Names resolve lexically: generic parameters and nested declarations of
//! each enclosing scope, innermost first, then the built-in types. A leading
//! `.` starts at the file scope; `import "x"` starts at another file's root.
//! Later segments look only at members of the previous segment.

use capn_ir::{Ident, Path, PathBase, PathSegment, TypeExpr};

use super::scope::{DeclTable, ScopeIdx, ScopeKind};
use crate::{Brand, BrandBinding, BrandScope, CompileError, TypeRef};

/// What a path names.
#[derive(Clone, Debug)]
pub(crate) enum Target {
    Scope { scope: ScopeIdx, brand: Brand },
    Param { scope_id: u64, index: u16 },
    Builtin(TypeRef),
    /// `List` before its argument is applied.
    List,
}

/// Path resolver. Tracks aliases being expanded to reject alias cycles.
pub(crate) struct Lookup<'t, 'a> {
    table: &'t DeclTable<'a>,
    expanding: Vec<ScopeIdx>,
}

impl<'t, 'a> Lookup<'t, 'a> {
    pub fn new(table: &'t DeclTable<'a>) -> Self {
        Lookup {
            table,
            expanding: Vec::new(),
        }
    }

    pub fn table(&self) -> &'t DeclTable<'a> {
        self.table
    }

    /// Resolve a type expression written in `from`.
    pub fn resolve_type(&mut self, expr: &TypeExpr, from: ScopeIdx) -> Result<TypeRef, CompileError> {
        match self.resolve_path(&expr.path, from)? {
            Target::Scope { scope, brand } => {
                let target = &self.table.scopes[scope];
                match target.kind {
                    ScopeKind::Struct => Ok(TypeRef::Struct {
                        id: target.id,
                        brand: self.finish_brand(scope, brand, from),
                    }),
                    ScopeKind::Interface(_) => Ok(TypeRef::Interface {
                        id: target.id,
                        brand: self.finish_brand(scope, brand, from),
                    }),
                    ScopeKind::Enum(_) => Ok(TypeRef::Enum { id: target.id }),
                    kind => Err(self.invalid_type(
                        from,
                        expr,
                        format!("`{}` is a {}, not a type", expr.path, kind.describe()),
                    )),
                }
            }
            Target::Param { scope_id, index } => Ok(TypeRef::Param { scope_id, index }),
            Target::Builtin(ty) => Ok(ty),
            Target::List => Err(self.invalid_type(
                from,
                expr,
                "`List` requires an element type: `List(T)`".to_string(),
            )),
        }
    }

    pub fn resolve_path(&mut self, path: &Path, from: ScopeIdx) -> Result<Target, CompileError> {
        let mut segments = path.segments.iter();

        let mut current = match &path.base {
            PathBase::Import { path: import, span } => {
                let scope = self.table.import_target(from, import).ok_or_else(|| {
                    CompileError::UnresolvedReference {
                        name: import.clone(),
                        message: format!("import \"{import}\" was not loaded"),
                        location: self.table.locate(from, *span),
                    }
                })?;
                Target::Scope {
                    scope,
                    brand: Brand::default(),
                }
            }
            PathBase::Name => {
                let Some(first) = segments.next() else {
                    return Err(CompileError::UnresolvedReference {
                        name: String::new(),
                        message: "empty path".to_string(),
                        location: self.table.locate(from, path.span),
                    });
                };
                let base = if path.absolute {
                    let file = self.table.file_scope(from);
                    self.member(file, &first.name, from)?
                } else {
                    self.lexical(from, &first.name)?
                };
                self.apply_args(base, first, from)?
            }
        };

        for segment in segments {
            let Target::Scope { scope, brand } = current else {
                return Err(CompileError::UnresolvedReference {
                    name: segment.name.as_str().to_string(),
                    message: format!("`{path}` does not name a declaration with members"),
                    location: self.table.locate(from, segment.name.span),
                });
            };
            let next = match self.member(scope, &segment.name, from)? {
                Target::Scope {
                    scope: inner,
                    brand: inner_brand,
                } => {
                    let mut scopes = brand.scopes;
                    scopes.extend(inner_brand.scopes);
                    Target::Scope {
                        scope: inner,
                        brand: Brand { scopes },
                    }
                }
                other => other,
            };
            current = self.apply_args(next, segment, from)?;
        }
        Ok(current)
    }

    /// Look `name` up in `from` and its enclosing scopes, then built-ins.
    fn lexical(&mut self, from: ScopeIdx, name: &Ident) -> Result<Target, CompileError> {
        let table = self.table;
        let mut current = Some(from);
        while let Some(index) = current {
            let scope = &table.scopes[index];
            if let Some(position) = scope.params.iter().position(|p| p.name == name.name) {
                return Ok(Target::Param {
                    scope_id: scope.id,
                    index: u16::try_from(position).unwrap_or(u16::MAX),
                });
            }
            if let Some(&found) = scope.names.get(name.as_str()) {
                return self.follow(found, from);
            }
            current = scope.parent;
        }

        if name.as_str() == "List" {
            return Ok(Target::List);
        }
        if let Some(ty) = TypeRef::primitive(name.as_str()) {
            return Ok(Target::Builtin(ty));
        }
        Err(CompileError::UnresolvedReference {
            name: name.as_str().to_string(),
            message: format!("unknown name `{}`", name.as_str()),
            location: self.table.locate(from, name.span),
        })
    }

    /// Look `name` up among the declarations nested directly in `scope`.
    fn member(&mut self, scope: ScopeIdx, name: &Ident, from: ScopeIdx) -> Result<Target, CompileError> {
        let table = self.table;
        match table.scopes[scope].names.get(name.as_str()) {
            Some(&found) => self.follow(found, from),
            None => Err(CompileError::UnresolvedReference {
                name: name.as_str().to_string(),
                message: format!(
                    "`{}` has no member named `{}`",
                    table.scopes[scope].display_name,
                    name.as_str()
                ),
                location: table.locate(from, name.span),
            }),
        }
    }

    /// Expand aliases; anything else is its own target.
    fn follow(&mut self, found: ScopeIdx, from: ScopeIdx) -> Result<Target, CompileError> {
        let table = self.table;
        let scope = &table.scopes[found];
        let ScopeKind::Using(alias) = scope.kind else {
            return Ok(Target::Scope {
                scope: found,
                brand: Brand::default(),
            });
        };
        if self.expanding.contains(&found) {
            return Err(CompileError::UnresolvedReference {
                name: scope.short_name().to_string(),
                message: format!("alias `{}` refers to itself", scope.display_name),
                location: table.locate(from, alias.target.span),
            });
        }
        let Some(parent) = scope.parent else {
            return Ok(Target::Scope {
                scope: found,
                brand: Brand::default(),
            });
        };
        self.expanding.push(found);
        let result = self.resolve_path(&alias.target.path, parent);
        self.expanding.pop();
        result
    }

    fn apply_args(&mut self, target: Target, segment: &PathSegment, from: ScopeIdx) -> Result<Target, CompileError> {
        if segment.args.is_empty() {
            return Ok(target);
        }
        let name = segment.name.as_str();
        let table = self.table;
        let location = || table.locate(from, segment.name.span);
        match target {
            Target::List => {
                let [element] = segment.args.as_slice() else {
                    return Err(CompileError::InvalidType {
                        message: format!("`List` takes one type parameter, found {}", segment.args.len()),
                        location: location(),
                    });
                };
                let element = self.resolve_type(element, from)?;
                Ok(Target::Builtin(TypeRef::List(Box::new(element))))
            }
            Target::Scope { scope, mut brand } => {
                let params = table.scopes[scope].params;
                if params.is_empty() {
                    return Err(CompileError::InvalidType {
                        message: format!("`{name}` is not generic"),
                        location: location(),
                    });
                }
                if params.len() != segment.args.len() {
                    return Err(CompileError::InvalidType {
                        message: format!(
                            "`{name}` expects {} type parameters, found {}",
                            params.len(),
                            segment.args.len()
                        ),
                        location: location(),
                    });
                }
                let mut bound = Vec::with_capacity(segment.args.len());
                for arg in &segment.args {
                    let ty = self.resolve_type(arg, from)?;
                    if !ty.is_pointer() {
                        return Err(CompileError::InvalidType {
                            message: format!(
                                "generic arguments must be pointer types, found `{}`",
                                self.type_display(&ty)
                            ),
                            location: self.table.locate(from, arg.span),
                        });
                    }
                    bound.push(ty);
                }
                brand.scopes.push(BrandScope {
                    scope_id: self.table.scopes[scope].id,
                    binding: BrandBinding::Bind(bound),
                });
                Ok(Target::Scope { scope, brand })
            }
            Target::Builtin(_) | Target::Param { .. } => Err(CompileError::InvalidType {
                message: format!("`{name}` does not take type parameters"),
                location: location(),
            }),
        }
    }

    /// Order bindings outermost first and let unbound generic scopes that
    /// enclose `from` pass their own parameters through.
    fn finish_brand(&self, target: ScopeIdx, brand: Brand, from: ScopeIdx) -> Brand {
        let mut chain = Vec::new();
        let mut current = Some(target);
        while let Some(index) = current {
            chain.push(index);
            current = self.table.scopes[index].parent;
        }
        chain.reverse();

        let mut scopes = Vec::new();
        for index in chain {
            let scope = &self.table.scopes[index];
            if scope.params.is_empty() {
                continue;
            }
            if let Some(binding) = brand.binding(scope.id) {
                scopes.push(BrandScope {
                    scope_id: scope.id,
                    binding: binding.clone(),
                });
            } else if self.table.is_within(from, index) {
                scopes.push(BrandScope {
                    scope_id: scope.id,
                    binding: BrandBinding::Inherit,
                });
            }
        }
        Brand { scopes }
    }

    /// Short rendering for error messages.
    pub fn type_display(&self, ty: &TypeRef) -> String {
        if let Some(name) = ty.builtin_name() {
            return name.to_string();
        }
        match ty {
            TypeRef::List(inner) => format!("List({})", self.type_display(inner)),
            TypeRef::Enum { id } | TypeRef::Struct { id, .. } | TypeRef::Interface { id, .. } => self
                .table
                .scope_by_id(*id)
                .map_or_else(|| format!("@0x{id:016x}"), |s| self.table.scopes[s].short_name().to_string()),
            TypeRef::Param { scope_id, index } => self
                .table
                .scope_by_id(*scope_id)
                .and_then(|s| self.table.scopes[s].params.get(usize::from(*index)))
                .map_or_else(|| format!("<param {index}>"), |p| p.as_str().to_string()),
            _ => String::new(),
        }
    }

    fn invalid_type(&self, from: ScopeIdx, expr: &TypeExpr, message: String) -> CompileError {
        CompileError::InvalidType {
            message,
            location: self.table.locate(from, expr.span),
        }
    }
}

