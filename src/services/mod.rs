//! Services layer - Business logic
//!
//! Services own validation and business rules, coordinate repositories and
//! the cache, and report failures through one error enum each.

pub mod article;
pub mod blog;
pub mod category;
pub mod contact;
pub mod directory;
pub mod listing;
pub mod password;
pub mod rate_limiter;
pub mod search;
pub mod slider;
pub mod user;
pub mod wishlist;

pub use article::{ArticleService, ArticleServiceError};
pub use blog::{BlogService, BlogServiceError};
pub use category::{generate_slug, slug_or_fallback, CategoryService, CategoryServiceError};
pub use contact::{ContactService, ContactServiceError};
pub use directory::{DirectoryService, DirectoryServiceError};
pub use listing::{ListingService, ListingServiceError, SellerDashboard};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use search::{SearchQuery, SearchResponse, SearchService, SearchServiceError};
pub use slider::{SliderService, SliderServiceError};
pub use user::{
    AdminUpdateUserInput, LoginInput, LoginResult, NewUserInput, SignupInput, UserService,
    UserServiceError,
};
pub use wishlist::{ToggleResult, WishlistService, WishlistServiceError};
