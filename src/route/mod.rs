pub mod docs;
pub mod model;
pub mod post;
pub mod tag;
pub mod user;
