pub mod scalar;
pub mod validate;

pub use validate::ValidatedJson;
