mod draft;
mod entitlement;
mod generation;
mod payout;
mod product;
mod product_type;
mod profile;
mod prompt;
mod purchase;
mod stats;
mod template;

pub use draft::{DraftInput, DraftStatus, PromptDraft, PublishOutcome};
pub use entitlement::{owned_product_types, resolve_access, AccessResolution, OwnedPrompt};
pub use generation::{fill_template, GenerationInput};
pub use payout::{PayoutDetails, PayoutMethod, PayoutMethodKind};
pub use product::{builtin_product, BuiltinProduct, ProductRef, SELLER_TYPE_PREFIX};
pub use product_type::ProductType;
pub use profile::{Profile, UserRole};
pub use prompt::Prompt;
pub use purchase::{NewPurchase, Purchase, PurchaseRecord, PurchaseStatus};
pub use stats::{aggregate_seller_stats, PromptSales, SellerStatsReport};
pub use template::{CatalogFilter, PromptTemplate};
