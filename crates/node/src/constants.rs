use std::time::Duration;

/// The APIs exposed over HTTP and websockets by development chains.
pub const ALL_APIS: &str = "admin,clique,debug,eth,miner,net,personal,shh,txpool,web3,ws";

/// The password of the accounts created for development chains. It's written into the data
/// directory of the chain and must never protect anything of value.
pub const DEFAULT_PASSWORD: &str = "this-is-not-a-secure-password";

/// The balance, in wei, that the coinbase of a development chain is allocated in genesis.
pub const COINBASE_BALANCE: &str = "1000000000000000000000000000000";

pub const IPC_FILE: &str = "geth.ipc";
pub const GENESIS_JSON_FILE: &str = "genesis.json";
pub const PASSWORD_FILE: &str = "password";

/// The network id of the sepolia test network.
pub const SEPOLIA_NETWORK_ID: &str = "11155111";

/// The time a single readiness probe is given before it counts as not ready.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// The interval at which the exit status of a stopping child is polled.
pub const EXIT_POLLING_INTERVAL: Duration = Duration::from_millis(100);

/// How long the stream interception threads are given to finish once the child has stopped.
pub const STREAM_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The number of lines buffered between the reading and the consuming side of a stream.
pub const STREAM_QUEUE_CAPACITY: usize = 1024;
