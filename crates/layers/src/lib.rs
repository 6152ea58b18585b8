pub mod feature;
pub mod fields;
pub mod filter;
pub mod layer;
pub mod order;
pub mod query;
pub mod stack;
pub mod widget;

pub use feature::*;
pub use fields::*;
pub use filter::*;
pub use layer::*;
pub use order::*;
pub use query::*;
pub use stack::*;
pub use widget::*;
