mod chat_port;

pub use chat_port::ChatPort;
