mod handshake;
mod helpers;
mod rpc;
mod websocket;
