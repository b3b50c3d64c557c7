//! Data models
//!
//! Plain records shared by the repositories, services and HTTP layer.
//! JSON uses camelCase field names, matching what the web front end sends.

mod article;
mod blog;
mod category;
mod contact;
mod directory;
mod listing;
mod session;
mod slider;
mod user;
mod wishlist;

pub use article::{
    Article, ArticleCategory, ArticleFilter, CreateArticleCategoryInput, CreateArticleInput,
    PageCount, UpdateArticleCategoryInput, UpdateArticleInput,
};
pub use blog::{
    BlogPost, CreateBlogPostInput, CreateVideoInput, TagsInput, UpdateBlogPostInput,
    UpdateVideoInput, Video,
};
pub use category::{
    Category, CategoryWithSubcategories, CreateCategoryInput, CreateSubcategoryInput,
    Subcategory, UpdateCategoryInput,
};
pub use contact::{ContactMessage, CreateContactMessageInput, NewsletterSubscriber};
pub use directory::{
    Agency, CreateAgencyInput, CreateFaqInput, CreateLocationInput, Faq, Location,
    UpdateAgencyInput, UpdateFaqInput, UpdateLocationInput,
};
pub use listing::{
    CreateListingInput, Listing, ListingFilter, ListingKind, ListingSection, PriceInput,
    UpdateListingInput, RESERVED_LISTING_FIELDS,
};
pub use session::Session;
pub use slider::{CreateSliderInput, Slider, UpdateSliderInput};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};
pub use wishlist::{WishlistEntryInput, WishlistItem};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be absent, `null`, or set.
///
/// Used with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`, a value gives `Some(Some(v))`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
