pub mod check;
pub mod export;
pub mod layers;
pub mod validate;
