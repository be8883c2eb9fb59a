//! Catalog use-case service.
//!
//! Thin wrapper over [`ItemRepository`] that trims input and rejects blank
//! names before they reach storage.

use crate::model::item::{Item, ItemId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::item_repo::ItemRepository;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CatalogServiceError {
    EmptyName,
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "item name cannot be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyName => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct CatalogService<I: ItemRepository> {
    repo: I,
}

impl<I: ItemRepository> CatalogService<I> {
    pub fn new(repo: I) -> Self {
        Self { repo }
    }

    /// Full catalog; seeds the defaults on first use.
    pub fn list_items(&self) -> RepoResult<Vec<Item>> {
        self.repo.get_predefined_items()
    }

    pub fn create_item(&self, name: &str, description: &str) -> Result<Item, CatalogServiceError> {
        let name = normalize_name(name)?;
        Ok(self.repo.create_item(name, description.trim())?)
    }

    pub fn update_item(
        &self,
        id: ItemId,
        name: &str,
        description: &str,
    ) -> Result<Item, CatalogServiceError> {
        let name = normalize_name(name)?;
        Ok(self.repo.update_item(id, name, description.trim())?)
    }

    pub fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        self.repo.delete_item(id)
    }
}

fn normalize_name(name: &str) -> Result<&str, CatalogServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CatalogServiceError::EmptyName)
    } else {
        Ok(trimmed)
    }
}
