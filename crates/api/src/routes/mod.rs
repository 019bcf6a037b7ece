mod checkout;
mod drafts;
mod generate;
mod ownership;
mod payout;
mod product_types;
mod profile;
mod prompts;
mod stats;

pub use checkout::checkout_routes;
pub use drafts::draft_routes;
pub use generate::generation_routes;
pub use ownership::ownership_routes;
pub use payout::payout_routes;
pub use product_types::product_type_routes;
pub use profile::profile_routes;
pub use prompts::prompt_routes;
pub use stats::stats_routes;
