use std::sync::{Arc, RwLock};

use anyhow::anyhow;

use crate::error::{LibError, Result};
use crate::models::MemberId;
use crate::operations::{FamilyTree, TreeOperation, TreeOperationResult};
use crate::resolver::RelativeSummary;
use crate::snapshot::TreeSnapshot;

/// Cloneable handle to one tree. Queries share a read lock; every mutation holds the
/// write lock for its whole duration.
#[derive(Debug, Clone)]
pub struct SharedFamilyTree {
    inner: Arc<RwLock<FamilyTree>>,
}

impl SharedFamilyTree {
    pub fn new(tree: FamilyTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn read<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&FamilyTree) -> T,
    {
        let tree = self.inner.read().map_err(|_| poisoned())?;
        Ok(query(&tree))
    }

    pub fn write<T, F>(&self, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut FamilyTree) -> Result<T>,
    {
        let mut tree = self.inner.write().map_err(|_| poisoned())?;
        mutation(&mut tree)
    }

    pub fn execute(&self, operation: TreeOperation) -> Result<TreeOperationResult> {
        self.write(|tree| tree.execute(operation))
    }

    pub fn relatives_of(&self, member_id: MemberId) -> Result<Option<RelativeSummary>> {
        self.read(|tree| tree.relatives_of(member_id))
    }

    pub fn save(&self) -> Result<TreeSnapshot> {
        self.read(FamilyTree::save)
    }
}

impl From<FamilyTree> for SharedFamilyTree {
    fn from(tree: FamilyTree) -> Self {
        Self::new(tree)
    }
}

fn poisoned() -> LibError {
    LibError::unknown(
        "Family tree is unavailable",
        anyhow!("family tree lock poisoned by a panicked writer"),
    )
}
