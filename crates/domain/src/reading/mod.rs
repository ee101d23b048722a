mod codec;
mod entity;

pub use codec::{decode_registers, encode_registers};
pub use entity::Reading;
