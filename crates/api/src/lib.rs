mod env;
mod global_state;
pub mod middleware;
pub mod response;
mod routes;
mod utils;

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use middleware::{authenticate, ensure_profile, ensure_seller};
pub use response::{AppError, AppSuccess, GenericResponse};
pub use routes::{
    checkout_routes, draft_routes, generation_routes, ownership_routes, payout_routes,
    product_type_routes, profile_routes, prompt_routes, stats_routes,
};
pub use utils::{extract_bearer_token, setup_tracing};
