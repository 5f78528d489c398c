pub mod explorer_client;
pub mod fogoscan_client;
pub mod rpc_proxy;
pub mod upstream;
