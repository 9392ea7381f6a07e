// Entity Models
//
// Each entity validates itself: no code path can build or mutate one into an
// invalid state. Storage and orchestration live elsewhere.

pub mod user;

pub use user::{validate_email, validate_name, User};
