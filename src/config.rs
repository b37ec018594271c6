use std::env;
use dotenvy::dotenv;
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    /// Bind address of the leave ledger service
    pub ledger_addr: String,
    /// RPC endpoint the coordinator calls on the ledger
    pub ledger_url: String,
    /// Base URL embedded into approve/reject capability links.
    /// Must match the coordinator's public address + api prefix, otherwise
    /// issued links never match on approve/reject.
    pub link_base_url: String,
    /// Upper bound on a single coordinator -> ledger call
    pub rpc_timeout_secs: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            ledger_addr: env::var("LEDGER_ADDR").unwrap_or_else(|_| "127.0.0.1:8081".to_string()),
            ledger_url: env::var("LEDGER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8081/rpc".to_string()),
            link_base_url: env::var("LINK_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/v1".to_string()),
            rpc_timeout_secs: env::var("RPC_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap(),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
