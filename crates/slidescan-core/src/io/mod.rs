pub mod image_io;
pub mod layout;
pub mod source;
