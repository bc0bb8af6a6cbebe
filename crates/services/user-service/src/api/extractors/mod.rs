//! Custom extractors.

mod json_body;
mod user_id;

pub use json_body::{decode_json, JsonBody};
pub use user_id::{parse_user_id, UserId};
