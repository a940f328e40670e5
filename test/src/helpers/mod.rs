pub mod recording;
pub mod test_ghosts;
pub mod test_link;
pub mod test_protocol;
pub mod test_scene;

pub use recording::{recording_factory, PrimitiveEvent, PrimitiveLog, RecordingPrimitive};
pub use test_ghosts::TestGhosts;
pub use test_link::{TestClientEnd, TestLink};
pub use test_protocol::{test_protocol, BEACON, BEACON_TYPE_MASK, PULSE, SPARK, TORCH};
pub use test_scene::TestScene;
