pub mod category;
pub mod material;
pub mod product;
pub mod user;

pub use category::{Category, CategoryPatch, CategoryWithCount, NewCategory};
pub use material::{Material, MaterialPatch, MaterialWithCount, NewMaterial};
pub use product::{MaterialRef, NewProduct, Product, ProductPatch, ProductRow, ProductView};
pub use user::{NewUser, Role, User, UserCredentials};
