pub mod builder;
pub mod config;
pub mod error;
pub mod recipe;
pub mod scripts;
pub mod source;
pub mod store;

pub use error::{RecipeError, Result};
pub use recipe::{RabbitMq, Recipe};
