// ── Native tree model ──
//
// Typed values held by a service: plain scalars, enums, quantities,
// containers, nested objects and the number-slider widget.

pub mod enums;
pub mod object;
pub mod quantity;
pub mod slider;
pub mod tag;
pub mod value;

pub use enums::{EnumDescriptor, EnumMember, EnumRegistry};
pub use object::{DataObject, Member, Method, Parameter, Property};
pub use quantity::Quantity;
pub use slider::NumberSlider;
pub use tag::TypeTag;
pub use value::Value;
