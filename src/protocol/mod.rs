pub mod envelope;
pub mod hash;

pub use envelope::{
    build_envelope, load_content, AckReply, Envelope, MissingFilePolicy, ENVELOPE_KIND,
};
pub use hash::djb2;
