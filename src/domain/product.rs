use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, UserId};
use crate::error::{MarketError, MarketResult};

/// Listing categories offered by the marketplace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Books,
    Electronics,
    Others,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Books, Category::Electronics, Category::Others];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Books => "Books",
            Category::Electronics => "Electronics",
            Category::Others => "Others",
        }
    }
}

impl core::str::FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MarketError::validation(format!("unknown category '{}'", s)))
    }
}

/// A single sellable unit listed by a seller.
///
/// `sold` starts `false` and is flipped exactly once, by the approval of a
/// purchase request. Nothing else writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    /// Price in the smallest currency unit.
    pub price: u64,
    pub category: Category,
    /// Reference to the stored listing image.
    pub image: String,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for listing a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category: Category,
    pub image: String,
}

impl ProductCreate {
    pub fn validate(&self) -> MarketResult<()> {
        non_blank("title", &self.title)?;
        non_blank("description", &self.description)?;
        non_blank("image", &self.image)
    }
}

/// Seller-editable fields. There is no `sold` field; only an approval writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub category: Option<Category>,
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(title) = &self.title {
            non_blank("title", title)?;
        }
        if let Some(description) = &self.description {
            non_blank("description", description)?;
        }
        if let Some(image) = &self.image {
            non_blank("image", image)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image.is_none()
    }
}

impl Product {
    pub fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
    }
}

fn non_blank(field: &str, value: &str) -> MarketResult<()> {
    if value.trim().is_empty() {
        return Err(MarketError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
