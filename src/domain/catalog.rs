//! Catalog domain types: categories, rooms, banners, colors, attributes.
//!
//! These are the shapes the catalog handlers serialize; image fields are
//! opaque URLs managed by an external hosting collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub banner: Option<String>,
    /// 1 = visible, 0 = hidden
    pub status: i16,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Category plus the number of products assigned to it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// Showroom grouping of products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub slug: String,
    pub status: i16,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Room plus the number of products assigned via the join table
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomWithCount {
    #[serde(flatten)]
    pub room: Room,
    pub product_count: i64,
}

/// Promotional banner tied to a storefront page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub page_type: String,
    pub position: i32,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Banner {
    /// Derived status string the storefront expects.
    pub fn status(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "inactive"
        }
    }
}

/// Banner projection with the derived `status` field and category name
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BannerView {
    #[serde(flatten)]
    pub banner: Banner,
    pub status: &'static str,
    pub category_name: Option<String>,
}

impl BannerView {
    pub fn new(banner: Banner, category_name: Option<String>) -> Self {
        let status = banner.status();
        Self {
            banner,
            status,
            category_name,
        }
    }
}

/// Product color swatch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Color {
    pub id: i64,
    pub name: String,
    pub hex: String,
    pub slug: Option<String>,
    pub priority: i32,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Color plus the number of products referencing it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ColorWithCount {
    #[serde(flatten)]
    pub color: Color,
    pub product_count: i64,
}

/// Specification attribute attached to a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attribute {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub value_type: String,
    pub unit: Option<String>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

/// Product projection used by category/room listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
