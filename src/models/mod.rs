mod admin;
mod device;
mod product_key;
mod shop;
mod stats;
mod subscription;

pub use admin::*;
pub use device::*;
pub use product_key::*;
pub use shop::*;
pub use stats::*;
pub use subscription::*;
