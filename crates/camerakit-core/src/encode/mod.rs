//! JPEG encoding of post-processed stills.
//!
//! Every still handed to a listener is JPEG bytes: planar frames are
//! compressed here, and cropped compressed frames are re-encoded here.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError};
