use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::info;

use crate::{
    catalog::{page::FileId, schema::Schema},
    error::{DbResult, Error},
    io::heap_file::{DbFile, HeapFile},
};

pub mod page;
pub mod schema;
pub mod ty;

/// The table catalog, resolving table ids to their files and schemas.
///
/// A table id is the [`FileId`] of the heap file storing it.
pub trait Catalog: Send + Sync {
    /// Returns the name of the table.
    fn table_name(&self, table_id: FileId) -> DbResult<String>;

    /// Returns the file that stores the table.
    fn database_file(&self, table_id: FileId) -> DbResult<Arc<HeapFile>>;

    /// Returns the schema of the table.
    fn tuple_schema(&self, table_id: FileId) -> DbResult<Arc<Schema>> {
        self.database_file(table_id)
            .map(|file| Arc::clone(file.schema()))
    }
}

struct Table {
    name: String,
    file: Arc<HeapFile>,
}

/// An in-memory [`Catalog`].
///
/// Besides the mapping itself, the registry guards against file id
/// collisions: registering a file whose id is already taken by a *different*
/// path fails, instead of letting both tables share pages in the buffer pool.
#[derive(Default)]
pub struct TableRegistry {
    tables: DashMap<FileId, Table>,
    names: DashMap<String, FileId>,
}

impl TableRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `name`, returning the table id.
    ///
    /// Registering the same path again replaces the previous definition. A
    /// name already bound to another table is rebound to this one.
    pub fn add_table(&self, file: HeapFile, name: impl Into<String>) -> DbResult<FileId> {
        let name = name.into();
        let id = file.id();

        match self.tables.entry(id) {
            Entry::Occupied(mut entry) => {
                if entry.get().file.path() != file.path() {
                    return Err(Error::FileIdCollision {
                        id,
                        path: file.path().display().to_string(),
                    });
                }
                let previous = std::mem::replace(&mut entry.get_mut().name, name.clone());
                if previous != name {
                    self.names.remove_if(&previous, |_, bound| *bound == id);
                }
                entry.get_mut().file = Arc::new(file);
            }
            Entry::Vacant(entry) => {
                entry.insert(Table {
                    name: name.clone(),
                    file: Arc::new(file),
                });
            }
        }

        if let Some(old_id) = self.names.insert(name.clone(), id) {
            if old_id != id {
                info!(?name, ?old_id, "table name rebound, dropping previous table");
                self.tables.remove(&old_id);
            }
        }
        info!(?name, ?id, "registered table");
        Ok(id)
    }

    /// Returns the id of the table with the given name.
    pub fn table_id(&self, name: &str) -> DbResult<FileId> {
        self.names
            .get(name)
            .map(|id| *id)
            .ok_or_else(|| Error::InvalidArgument(format!("no table named `{name}`").into()))
    }

    /// Returns the ids of all registered tables.
    pub fn table_ids(&self) -> Vec<FileId> {
        self.tables.iter().map(|entry| *entry.key()).collect()
    }
}

impl Catalog for TableRegistry {
    fn table_name(&self, table_id: FileId) -> DbResult<String> {
        self.tables
            .get(&table_id)
            .map(|table| table.name.clone())
            .ok_or(Error::NoSuchTable(table_id))
    }

    fn database_file(&self, table_id: FileId) -> DbResult<Arc<HeapFile>> {
        self.tables
            .get(&table_id)
            .map(|table| Arc::clone(&table.file))
            .ok_or(Error::NoSuchTable(table_id))
    }
}
