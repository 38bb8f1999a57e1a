mod config;
mod envelope;
mod handshake;
mod id;
mod marshal;
mod memory_channel;
mod tables;
