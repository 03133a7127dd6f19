//! Entity lookup for node references.
//!
//! Unqualified references are looked up in the current file, then in the
//! other files of its package, then in the stdlib `builtin` package.
//! Qualified references (`pkg.Name`) go through the file's import aliases
//! and must point at a public entity.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;
use tracing::trace;

use crate::project::Workspace;
use crate::syntax::{Entity, EntityRef, LoweredFile};

/// An entity found through a [`Scope`], with the file that declares it.
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    pub name: SmolStr,
    pub entity: Entity,
    pub declared_in: Arc<LoweredFile>,
}

impl ResolvedEntity {
    /// First port the entity declares twice, if any.
    pub fn duplicate_port(&self) -> Option<&SmolStr> {
        self.declared_in.duplicate_port(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("'{0}' is not an imported package")]
    UnknownImport(SmolStr),
    #[error("entity '{0}' not found")]
    Unresolved(EntityRef),
    #[error("entity '{0}' is not public")]
    Private(EntityRef),
}

/// Lookup context for one file.
pub struct Scope<'w, 'a> {
    workspace: &'w mut Workspace<'a>,
    current: Arc<LoweredFile>,
    current_path: PathBuf,
}

impl<'w, 'a> Scope<'w, 'a> {
    pub fn new(
        workspace: &'w mut Workspace<'a>,
        current: Arc<LoweredFile>,
        current_path: PathBuf,
    ) -> Self {
        Self {
            workspace,
            current,
            current_path,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.workspace.is_cancelled()
    }

    pub fn resolve(&mut self, entity_ref: &EntityRef) -> Result<ResolvedEntity, ScopeError> {
        let resolved = if entity_ref.is_local() {
            self.resolve_local(entity_ref)
        } else {
            self.resolve_imported(entity_ref)
        };
        trace!(reference = %entity_ref, ok = resolved.is_ok(), "resolve entity");
        resolved
    }

    fn resolve_local(&mut self, entity_ref: &EntityRef) -> Result<ResolvedEntity, ScopeError> {
        let name = &entity_ref.name;
        if let Some(entity) = self.current.file.entities.get(name) {
            return Ok(ResolvedEntity {
                name: name.clone(),
                entity: entity.clone(),
                declared_in: self.current.clone(),
            });
        }

        let dir = self.current_path.parent().map(Path::to_path_buf);
        if let Some(package) = dir.and_then(|dir| self.workspace.package(&dir)) {
            if let Some((file, entity)) = package.entity(name, Some(self.current_path.as_path())) {
                return Ok(ResolvedEntity {
                    name: name.clone(),
                    entity: entity.clone(),
                    declared_in: file.lowered.clone(),
                });
            }
        }

        if let Some(builtin) = self.workspace.builtin() {
            if let Some((file, entity)) = builtin.entity(name, None) {
                return Ok(ResolvedEntity {
                    name: name.clone(),
                    entity: entity.clone(),
                    declared_in: file.lowered.clone(),
                });
            }
        }

        Err(ScopeError::Unresolved(entity_ref.clone()))
    }

    fn resolve_imported(&mut self, entity_ref: &EntityRef) -> Result<ResolvedEntity, ScopeError> {
        let Some(import) = self.current.file.imports.get(&entity_ref.pkg) else {
            return Err(ScopeError::UnknownImport(entity_ref.pkg.clone()));
        };
        let package = self
            .workspace
            .import_package(&import.package)
            .ok_or_else(|| ScopeError::Unresolved(entity_ref.clone()))?;
        let (file, entity) = package
            .entity(&entity_ref.name, None)
            .ok_or_else(|| ScopeError::Unresolved(entity_ref.clone()))?;
        if !entity.is_public {
            return Err(ScopeError::Private(entity_ref.clone()));
        }
        Ok(ResolvedEntity {
            name: entity_ref.name.clone(),
            entity: entity.clone(),
            declared_in: file.lowered.clone(),
        })
    }
}
