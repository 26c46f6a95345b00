pub mod frame;

pub use frame::{
    decode_frame, encode_frame, encode_record, record_count, FrameDecoder, WireRecord,
    HEARTBEAT_FRAME, RECORD_WIDTH,
};
