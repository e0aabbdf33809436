//! Event categories and tags

use crate::database::DatabaseService;
use crate::models::tag::{normalize_category_name, normalize_tag_names, EventCategory, Tag};
use crate::utils::errors::Result;

#[derive(Clone)]
#[derive(Debug)]
pub struct TaxonomyService {
    db: DatabaseService,
}

impl TaxonomyService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn create_category(&self, name: &str) -> Result<EventCategory> {
        let name = normalize_category_name(name)?;
        self.db.taxonomy.get_or_create_category(&name).await
    }

    pub async fn list_categories(&self) -> Result<Vec<EventCategory>> {
        self.db.taxonomy.list_categories().await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.db.taxonomy.list_tags().await
    }

    pub async fn get_or_create_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let names = normalize_tag_names(names)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.db.taxonomy.get_or_create_tags(&names).await
    }
}
