pub mod packet_id_generator;
pub mod receive_with_id;
pub mod safe_sock_sendto;

pub use packet_id_generator::PacketIdGenerator;
pub use receive_with_id::{receive_with_id, ReceiveConfig};
pub use safe_sock_sendto::{safe_sock_sendto, SafeSocketSender, SendConfig, SendStats};